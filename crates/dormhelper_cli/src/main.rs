//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store and run the startup sequence once.
//! - Print a deterministic summary for quick local sanity checks.

use dormhelper_core::{init_logging, LoggingConfig, Store, StoreConfig};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match LoggingConfig::from_env() {
        Ok(Some(logging)) => {
            if let Err(err) = init_logging(&logging) {
                eprintln!("logging disabled: {err}");
            }
        }
        Ok(None) => {}
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    let config = StoreConfig::from_env();
    println!("dormhelper_core version={}", dormhelper_core::core_version());
    println!("store location={}", config.describe());

    let (store, report) = match Store::open(&config) {
        Ok(opened) => opened,
        Err(err) => {
            error!("event=cli_open module=cli status=error error={err}");
            eprintln!("failed to open store: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "init warnings={} seeded={} requests_revision={:?}",
        report.warnings.len(),
        report.seeded,
        report.requests_revision
    );
    for warning in &report.warnings {
        println!("warning {warning}");
    }

    match store.table_counts() {
        Ok(counts) => {
            for count in counts {
                println!("table {} rows={}", count.table, count.rows);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to count rows: {err}");
            ExitCode::FAILURE
        }
    }
}
