//! Import and export command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use artifact_core::{ImportDocument, Store};

use crate::output::Output;

/// Export the owner's catalog as a JSON document
pub fn export(store: &Store, owner: &str, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let doc = store
        .export_catalog(owner)
        .context("Failed to export catalog")?;
    let json = doc.to_json_pretty()?;

    match path {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write export file: {:?}", path))?;
            output.success(&format!(
                "Exported {} artifact(s) and {} collection(s) to {}",
                doc.artifacts.len(),
                doc.collections.len(),
                path.display()
            ));
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Merge a JSON document into the owner's catalog
pub fn import(store: &mut Store, owner: &str, path: PathBuf, output: &Output) -> Result<()> {
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read import file: {:?}", path))?;
    let doc = ImportDocument::from_json(&json)
        .with_context(|| format!("Invalid catalog document: {:?}", path))?;

    let summary = store
        .import_catalog(owner, &doc)
        .context("Failed to import catalog")?;

    output.print_import_summary(&summary);
    Ok(())
}
