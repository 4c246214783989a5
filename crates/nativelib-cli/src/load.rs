// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use crate::utils;
use clap::Args as ClapArgs;
use nativelib::{Loaded, LoaderConfig, NativeLibrary, Origin, Probe};
use serde::Serialize;
use std::path::PathBuf;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Logical library name, e.g. vw_jni
    library: String,

    /// Directory holding bundled copies of the library
    #[arg(short, long)]
    bundle: Option<PathBuf>,

    /// Exported symbol which tells that the library is already loaded
    #[arg(short, long)]
    probe: Option<String>,

    /// Directory under which the extraction directory is created
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Keep the library loaded until Ctrl+C
    #[arg(long)]
    hold: bool,
}

#[derive(Debug, Serialize)]
struct LoadReport {
    library: String,
    origin: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
}

impl LoadReport {
    fn new(library: &str, loaded: &Loaded) -> Self {
        let (origin, path) = match loaded.origin() {
            Origin::AlreadyLoaded => ("already_loaded", None),
            Origin::Override(path) => ("override", Some(path.display().to_string())),
            Origin::SystemPath(name) => ("system_path", Some(name.clone())),
            Origin::Extracted(path) => ("extracted", Some(path.display().to_string())),
        };

        LoadReport {
            library: library.to_string(),
            origin,
            path,
            bytes: loaded.extracted().map(|extracted| extracted.bytes()),
        }
    }
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Load parameters: {:?}", args);

    let mut config = LoaderConfig::new(&args.library).temp_root(utils::temp_root(args.temp_dir)?);
    if let Some(symbol) = args.probe {
        config = config.probe(Probe::Symbol(symbol));
    }
    if let Some(bundle) = &args.bundle {
        config = config.bundle(utils::bundle_dir(bundle)?);
    }

    // Install before loading so an early Ctrl+C is not lost
    let term = if args.hold {
        Some(utils::install_signal_handler()?)
    } else {
        None
    };

    let library = NativeLibrary::new(config);
    let loaded = library.ensure_loaded()?;
    let report = LoadReport::new(&args.library, loaded);

    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        match &report.path {
            Some(path) => println!("{}: {} ({})", report.library, report.origin, path),
            None => println!("{}: {}", report.library, report.origin),
        }
        if let Some(bytes) = report.bytes {
            println!("Extracted {} bytes", bytes);
        }
    }

    if let Some(term) = term {
        log::info!("Holding {} loaded (Ctrl+C to exit)...", args.library);
        utils::wait_for_signal(&term);
        log::info!("Received signal, exiting");
    }

    Ok(())
}
