// src/bin/rmadison.rs
//! rmadison - lookup client
//!
//! Queries an rmadison-server instance and prints the publications of a
//! package as an aligned table, one row per series, architectures merged.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rmadison::debian::PackageInfo;
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "rmadison")]
#[command(version)]
#[command(about = "Query package publications from an rmadison server", long_about = None)]
struct Cli {
    /// Binary package name to look up
    package: String,

    /// Server to query
    #[arg(short, long, default_value = "http://localhost:8433")]
    server: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let query_url = format!("{}/{}", cli.server.trim_end_matches('/'), cli.package);
    let response = reqwest::blocking::get(&query_url)
        .with_context(|| format!("failed to query {query_url}"))?;

    if !response.status().is_success() {
        bail!("{} returned {}", query_url, response.status());
    }

    let packages: Vec<PackageInfo> = response
        .json()
        .context("failed to decode server response")?;

    for line in format_table(&packages) {
        println!("{line}");
    }

    Ok(())
}

/// One table row: name, version, series (suite + pocket, plus the component
/// unless it is main), architecture list.
fn make_rows(packages: &[PackageInfo]) -> Vec<[String; 4]> {
    packages
        .iter()
        .map(|info| {
            let component = if info.component == "main" {
                String::new()
            } else {
                format!("/{}", info.component)
            };
            [
                info.name.clone(),
                info.version.clone(),
                format!("{}{}{}", info.suite, info.pocket, component),
                info.architecture.clone(),
            ]
        })
        .collect()
}

/// Merge rows that share a series and a version by collecting their
/// architectures into one sorted, comma-separated list.
fn group_by_series(rows: Vec<[String; 4]>) -> Vec<[String; 4]> {
    let mut by_series: BTreeMap<String, [String; 4]> = BTreeMap::new();

    for row in rows {
        let key = row[2].clone();
        match by_series.get_mut(&key) {
            Some(existing) if existing[1] == row[1] => {
                existing[3].push_str(", ");
                existing[3].push_str(&row[3]);
            }
            _ => {
                by_series.insert(key, row);
            }
        }
    }

    let mut out: Vec<[String; 4]> = by_series.into_values().collect();
    for row in &mut out {
        let mut archs: Vec<&str> = row[3].split(", ").collect();
        archs.sort_unstable();
        row[3] = archs.join(", ");
    }
    out
}

fn format_table(packages: &[PackageInfo]) -> Vec<String> {
    let rows = group_by_series(make_rows(packages));

    let mut widths = [0usize; 4];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    rows.iter()
        .map(|row| {
            format!(
                " {:<w0$} | {:<w1$} | {:<w2$} | {:<w3$}",
                row[0],
                row[1],
                row[2],
                row[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
                w3 = widths[3],
            )
        })
        .collect()
}
