//! CSV import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use spendwise_core::import::parse_csv;
use spendwise_core::models::TransactionSource;
use spendwise_core::pipeline::BatchResult;
use spendwise_core::ProcessingContext;

use super::{money, print_json, App};

pub async fn cmd_import(app: &App, file: &Path, batch_id: Option<String>) -> Result<BatchResult> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let rows = parse_csv(csv_file).with_context(|| format!("Failed to parse {}", file.display()))?;

    if !app.json() {
        println!("📥 Importing {} rows from {}...", rows.len(), file.display());
    }

    let mut ctx = ProcessingContext::new(&app.user, TransactionSource::Import);
    ctx.batch_id = batch_id;
    let batch = app.orchestrator.process_batch(&rows, &ctx).await;

    if app.json() {
        print_json(&batch)?;
        return Ok(batch);
    }

    println!(
        "   Imported {} of {} ({} failed), {}",
        batch.successful,
        batch.total,
        batch.failed,
        money(batch.total_amount)
    );
    for failure in &batch.failures {
        println!("   ❌ Row {}: {}", failure.index + 1, failure.failure);
    }
    for (category, count) in &batch.category_counts {
        println!("   {:20} {:>4}", category, count);
    }
    for insight in &batch.insights {
        println!("   💡 {}", insight);
    }

    Ok(batch)
}
