// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use warden_config::load_config;

use crate::cli::{Cli, ValidateArgs};
use crate::error::BinResult;

/// Validates the configuration file without starting the service.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = load_config(&cli.config)?;

    println!("Configuration OK: {}", cli.config.display());

    if args.show_config {
        // Secrets are marked skip_serializing and never appear here.
        let rendered = serde_json::to_string_pretty(&config)
            .map_err(|e| crate::error::BinError::runtime(e.to_string()))?;
        println!("{rendered}");
    }

    Ok(())
}
