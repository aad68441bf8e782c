// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — document photo normalisation.
//
// Entry point. Initialises logging, parses the command line, and reports
// failures in plain language.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use folio_core::human_errors::humanize_error;
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("Folio starting");

    match cli::execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}
