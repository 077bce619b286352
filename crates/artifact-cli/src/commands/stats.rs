//! Catalog setup and statistics

use anyhow::{Context, Result};

use artifact_core::Store;

use crate::output::Output;

/// Seed the default collections for a new owner
pub fn init(store: &mut Store, owner: &str, output: &Output) -> Result<()> {
    let created = store
        .ensure_default_collections(owner)
        .context("Failed to create default collections")?;

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "database": store.config().sqlite_path(),
                "collections_created": created
            })
        );
    } else if output.is_quiet() {
        println!("{}", created);
    } else {
        println!("Catalog: {}", store.config().sqlite_path().display());
        if created > 0 {
            output.success(&format!("Created {} default collection(s)", created));
        } else {
            println!("Collections already set up.");
        }
    }
    Ok(())
}

/// Show catalog statistics
pub fn show(store: &Store, owner: &str, output: &Output) -> Result<()> {
    let stats = store.stats(owner)?;
    output.print_stats(&stats);
    Ok(())
}
