//! Placeholder cleanup command handlers

use anyhow::{Context, Result};

use artifact_core::Store;

use crate::output::Output;

/// List artifacts whose names are placeholders
pub fn scan(store: &Store, owner: &str, output: &Output) -> Result<()> {
    let placeholders = store.scan_placeholders(owner)?;
    output.print_placeholders(&placeholders);
    Ok(())
}

/// Rename every placeholder artifact
pub fn fix(store: &mut Store, owner: &str, output: &Output) -> Result<()> {
    let renamed = store
        .fix_placeholders(owner)
        .context("Failed to rename placeholder artifacts")?;

    if output.is_json() {
        println!("{}", serde_json::json!({ "fixed": renamed }));
    } else if output.is_quiet() {
        println!("{}", renamed);
    } else if renamed == 0 {
        output.message("No placeholder names found.");
    } else {
        output.success(&format!("Renamed {} artifact(s)", renamed));
    }
    Ok(())
}
