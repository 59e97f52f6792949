// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use tracing::info;

use warden_config::load_config;

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::runtime::Runtime;

/// Starts the identity service.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    info!("Starting WARDEN...");

    let config = load_config(&cli.config)?;
    let runtime = Runtime::build(config, !args.no_sweeper).await?;

    runtime.run().await
}
