// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! WARDEN - identity and access control service.
//!
//! Main binary entry point.

use clap::Parser;

use warden_bin::cli::Cli;
use warden_bin::commands;
use warden_bin::error::report_error_and_exit;
use warden_bin::logging::init_logging;

/// Application entry point.
#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.effective_log_level(), cli.log_format);

    // Execute the command
    if let Err(error) = commands::execute(cli).await {
        report_error_and_exit(error);
    }
}
