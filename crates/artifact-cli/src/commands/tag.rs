//! Tag command handlers

use anyhow::{anyhow, Result};

use artifact_core::Store;

use crate::output::Output;

/// List all tags with usage counts
pub fn list(store: &Store, owner: &str, output: &Output) -> Result<()> {
    let tags = store.list_tags(owner)?;
    output.print_tags(&tags);
    Ok(())
}

/// Delete a tag and its links
pub fn delete(store: &mut Store, owner: &str, name: &str, output: &Output) -> Result<()> {
    if !store.delete_tag(owner, name)? {
        return Err(anyhow!("Tag not found: {}", name));
    }

    output.success(&format!("Deleted tag: {}", name));
    Ok(())
}
