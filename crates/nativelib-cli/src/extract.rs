// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils;
use clap::Args as ClapArgs;
use nativelib::{
    bundle::Bundle,
    extract::{self, Retention},
    naming,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Logical library name, e.g. vw_jni
    library: String,

    /// Directory holding bundled copies of the library
    #[arg(short, long)]
    bundle: PathBuf,

    /// Directory under which the extraction directory is created
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Leave the extracted files in place instead of deleting them at exit
    #[arg(long)]
    keep: bool,
}

#[derive(Debug, Serialize)]
struct ExtractReport {
    library: String,
    dir: String,
    path: String,
    bytes: u64,
    kept: bool,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Extract parameters: {:?}", args);

    let bundle = utils::bundle_dir(&args.bundle)?;
    let temp_root = utils::temp_root(args.temp_dir)?;
    let file_name = naming::library_filename(&args.library);

    let resource = bundle
        .open(&file_name)
        .map_err(|e| CliError::Extraction(format!("Failed to open {}: {}", file_name, e)))?
        .ok_or_else(|| {
            CliError::NotFound(format!("{} is not in {}", file_name, args.bundle.display()))
        })?;

    let retention = if args.keep {
        Retention::Keep
    } else {
        Retention::DeleteOnExit
    };
    let extracted = extract::extract(
        resource,
        &temp_root,
        &naming::temp_dir_prefix(&args.library),
        &file_name,
        retention,
    )?;

    let report = ExtractReport {
        library: args.library,
        dir: extracted.dir().display().to_string(),
        path: extracted.path().display().to_string(),
        bytes: extracted.bytes(),
        kept: args.keep,
    };

    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        println!("Extracted {} bytes to {}", report.bytes, report.path);
        if !report.kept {
            log::info!("{} will be deleted at exit", report.dir);
        }
    }

    Ok(())
}
