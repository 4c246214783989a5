// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use clap::Args as ClapArgs;
use nativelib::naming;
use serde::Serialize;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Logical library name, e.g. vw_jni
    library: String,
}

#[derive(Debug, Serialize)]
struct NameInfo {
    library: String,
    file_name: String,
    debug_variable: String,
    library_variable: String,
    temp_dir_prefix: String,
}

impl NameInfo {
    fn new(library: &str) -> Self {
        let prefix = naming::env_prefix(library);
        NameInfo {
            library: library.to_string(),
            file_name: naming::library_filename(library),
            debug_variable: format!("{}_DEBUG", prefix),
            library_variable: format!("{}_LIBRARY", prefix),
            temp_dir_prefix: naming::temp_dir_prefix(library),
        }
    }
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    if args.library.is_empty() {
        return Err(CliError::InvalidArgs("library name is empty".to_string()));
    }

    let info = NameInfo::new(&args.library);

    if json {
        let json_str = serde_json::to_string_pretty(&info)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        println!("Library:          {}", info.library);
        println!("File name:        {}", info.file_name);
        println!("Debug variable:   {}", info.debug_variable);
        println!("Library variable: {}", info.library_variable);
        println!("Temp dir prefix:  {}", info.temp_dir_prefix);
    }

    Ok(())
}
