// src/bin/check_totals.rs
//! Compare each state's reported "Total Taxes" with the sum of its
//! categories and print the quarters that disagree.
//!
//! Usage: `check_totals [--top-level] [tolerance] [workbook.xlsx]`
//! By default every leaf row counts, sectioned categories included;
//! `--top-level` sums plain categories only. Without a path the configured
//! source URL is downloaded.

use anyhow::{Context, Result};
use reqwest::Client;
use statefiscal::{
    config::Settings,
    load::{load_table, table_from_bytes},
    table::{reconcile_with, Components},
};
use std::{env, fs};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_TOLERANCE: f64 = 0.01;

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (flags, positional): (Vec<String>, Vec<String>) =
        env::args().skip(1).partition(|a| a.starts_with("--"));
    let components = if flags.iter().any(|f| f == "--top-level") {
        Components::TopLevel
    } else {
        Components::Leaves
    };
    let mut args = positional.into_iter();
    let tolerance: f64 = match args.next() {
        Some(t) => t
            .parse()
            .with_context(|| format!("tolerance '{}' is not a number", t))?,
        None => DEFAULT_TOLERANCE,
    };
    let settings = Settings::from_env();
    let layout = settings.source.layout.clone();

    let table = match args.next() {
        Some(path) => {
            let bytes = fs::read(&path).with_context(|| format!("Failed to read '{}'", path))?;
            tokio::task::spawn_blocking(move || table_from_bytes(bytes, &layout))
                .await?
                .with_context(|| format!("Failed to normalize '{}'", path))?
        }
        None => load_table(&Client::new(), &settings.source, &settings.fetch)
            .await
            .with_context(|| format!("Failed to load {}", settings.source.url))?,
    };
    info!(records = table.len(), tolerance, ?components, "checking totals");

    let report = reconcile_with(
        &table,
        &settings.source.layout.total_category,
        tolerance,
        components,
    );

    match components {
        Components::Leaves => println!("Summing every category row, sectioned categories included\n"),
        Components::TopLevel => {
            println!("Summing top-level categories only; sectioned categories are left out\n")
        }
    }

    println!(
        "{:<42} {:<12} {:>12} {:>12} {:>10}",
        "State", "Quarter", "Total", "Sum", "Diff"
    );
    println!("{}", "-".repeat(92));
    for d in &report {
        println!(
            "{:<42} {:<12} {:>12.4} {:>12.4} {:>10.4}",
            d.state,
            d.fiscal_quarter,
            d.total,
            d.components,
            d.difference()
        );
    }
    println!("{}", "-".repeat(92));
    println!(
        "{} of {} state-quarters disagree by more than {}",
        report.len(),
        table.states().len() * table.fiscal_quarters().len(),
        tolerance
    );

    Ok(())
}
