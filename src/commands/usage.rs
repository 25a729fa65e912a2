//! Storage usage command.

use serde::Serialize;

use vault_core::error::AppError;

use super::Context;
use crate::output::{self, OutputFormat};

/// Usage summary as printed in JSON mode
#[derive(Debug, Serialize)]
struct UsageReport {
    used: u64,
    total: u64,
    free: u64,
    percent_used: f64,
    folders: usize,
    models: usize,
}

/// Execute the usage command
pub async fn execute(ctx: &Context) -> Result<(), AppError> {
    let usage = ctx.library.refresh_usage().await?;
    let (folders, models) = ctx
        .library
        .with_state(|state| (state.tree.len(), state.items.len()));

    match ctx.format {
        OutputFormat::Json => output::print_item(
            &UsageReport {
                used: usage.used,
                total: usage.total,
                free: usage.free(),
                percent_used: usage.percent_used(),
                folders,
                models,
            },
            ctx.format,
        ),
        OutputFormat::Table => {
            println!("Storage");
            output::print_kv("Used", &output::human_bytes(usage.used));
            output::print_kv("Total", &output::human_bytes(usage.total));
            output::print_kv("Free", &output::human_bytes(usage.free()));
            output::print_kv("Percent used", &format!("{:.1}%", usage.percent_used()));
            output::print_kv("Folders", &folders.to_string());
            output::print_kv("Models", &models.to_string());
        }
    }
    Ok(())
}
