//! Command-line report: load a CSV, apply filters, print the view and optionally
//! ask for an insight on one row.
//!
//! Usage:
//!   campaign_report <file.csv> [--search TEXT] [--min-open N] [--max-open N]
//!                   [--min-click N] [--max-click N] [--insight ROW]

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use campaign_insights::config::InsightConfig;
use campaign_insights::{DashboardService, FieldValue, FilterInputs};

struct Args {
    path: String,
    inputs: FilterInputs,
    insight_row: Option<usize>,
}

fn parse_args() -> Result<Args> {
    let mut it = std::env::args().skip(1);
    let mut path = None;
    let mut inputs = FilterInputs::default();
    let mut insight_row = None;

    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().with_context(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--search" => inputs.search = value("--search")?,
            "--min-open" => inputs.min_open_rate = value("--min-open")?,
            "--max-open" => inputs.max_open_rate = value("--max-open")?,
            "--min-click" => inputs.min_click_rate = value("--min-click")?,
            "--max-click" => inputs.max_click_rate = value("--max-click")?,
            "--insight" => {
                let raw = value("--insight")?;
                insight_row = Some(raw.parse().with_context(|| format!("bad row id '{raw}'"))?);
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            p => path = Some(p.to_string()),
        }
    }

    let path = path.context("usage: campaign_report <file.csv> [filters] [--insight ROW]")?;
    Ok(Args {
        path,
        inputs,
        insight_row,
    })
}

fn cell(v: &FieldValue) -> String {
    match v {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let args = parse_args()?;
    let cfg = InsightConfig::load_default()?;
    let svc = Arc::new(DashboardService::from_config(&cfg)?);

    let bytes = std::fs::read(&args.path).with_context(|| format!("reading {}", args.path))?;
    svc.upload(&bytes)?;
    svc.set_filters(&args.inputs);

    let view = svc.view();
    println!("id\t{}", view.headers.join("\t"));
    for row in &view.rows {
        let cells: Vec<String> = row.values.iter().map(cell).collect();
        println!("{}\t{}", row.id, cells.join("\t"));
    }
    println!("-- {} of {} rows", view.rows.len(), view.total_rows);

    if let Some(row) = args.insight_row {
        svc.select(row)?;
        let snap = svc.request_insight().await?;
        if let Some(insight) = snap.insight {
            println!("\nInsight for '{}':\n{}", insight.record_name, insight.text);
        }
    }

    Ok(())
}
