//! Collection command handlers

use anyhow::{anyhow, Context, Result};
use clap::Args;

use artifact_core::{CollectionPatch, NewCollection, Store};

use crate::output::Output;

/// Fields for a new collection
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Collection name
    pub name: String,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Hex color (e.g. #6366f1)
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
}

/// Changes to an existing collection
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Collection slug
    pub slug: String,
    /// New name (the slug follows the name)
    #[arg(short, long)]
    pub name: Option<String>,
    /// New description ("none" clears it)
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
}

/// List collections with artifact counts
pub fn list(store: &Store, owner: &str, output: &Output) -> Result<()> {
    let collections = store.list_collections(owner)?;
    output.print_collections(&collections);
    Ok(())
}

/// Create a collection
pub fn create(store: &mut Store, owner: &str, args: CreateArgs, output: &Output) -> Result<()> {
    let input = NewCollection {
        name: args.name,
        description: args.description,
        color: args.color,
        icon: args.icon,
    };

    let collection = store
        .create_collection(owner, input)
        .context("Failed to create collection")?;

    output.success(&format!("Created collection: {}", collection.slug));
    output.print_collection(&collection);
    Ok(())
}

/// Edit a collection
pub fn edit(store: &mut Store, owner: &str, args: EditArgs, output: &Output) -> Result<()> {
    let patch = CollectionPatch {
        name: args.name,
        description: args
            .description
            .map(|d| if d.is_empty() || d == "none" { None } else { Some(d) }),
        color: args.color,
        icon: args.icon,
    };

    let collection = store
        .update_collection(owner, &args.slug, patch)
        .with_context(|| format!("Failed to update collection {}", args.slug))?;

    output.success("Collection updated");
    output.print_collection(&collection);
    Ok(())
}

/// Delete a collection; its artifacts stay in the catalog
pub fn delete(store: &mut Store, owner: &str, slug: &str, output: &Output) -> Result<()> {
    if !store.delete_collection(owner, slug)? {
        return Err(anyhow!("Collection not found: {}", slug));
    }

    output.success(&format!("Deleted collection: {}", slug));
    Ok(())
}
