//! Sharing command handlers and public page rendering

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use artifact_core::{ArtifactId, Page, ShareLayout, ShareSettings, Store};

use crate::output::Output;

/// Publish an artifact under a fresh token
pub fn share_artifact(store: &mut Store, owner: &str, id: ArtifactId, output: &Output) -> Result<()> {
    let share = store
        .share_artifact(owner, id)
        .with_context(|| format!("Failed to share artifact {}", id))?;

    output.print_artifact_share(&share);
    Ok(())
}

/// Revoke an artifact's token
pub fn unshare_artifact(
    store: &mut Store,
    owner: &str,
    id: ArtifactId,
    output: &Output,
) -> Result<()> {
    store
        .unshare_artifact(owner, id)
        .with_context(|| format!("Failed to unshare artifact {}", id))?;

    output.success(&format!("Artifact {} is no longer shared", id));
    Ok(())
}

/// Show whether an artifact is shared
pub fn share_status(store: &Store, owner: &str, id: ArtifactId, output: &Output) -> Result<()> {
    let status = store
        .share_status(owner, id)
        .with_context(|| format!("Failed to read share status of artifact {}", id))?;

    output.print_share_status(&status);
    Ok(())
}

/// Publish a collection page
pub fn share_collection(
    store: &mut Store,
    owner: &str,
    slug: &str,
    layout: &str,
    show_thumbnails: bool,
    output: &Output,
) -> Result<()> {
    let layout: ShareLayout = layout.parse().map_err(|e: String| anyhow!(e))?;
    let settings = ShareSettings {
        show_thumbnails,
        layout,
    };

    let share = store
        .share_collection(owner, slug, settings)
        .with_context(|| format!("Failed to share collection {}", slug))?;

    output.print_collection_share(&share);
    Ok(())
}

/// Show whether a collection is public
pub fn collection_share_status(
    store: &Store,
    owner: &str,
    slug: &str,
    output: &Output,
) -> Result<()> {
    let status = store
        .collection_share_status(owner, slug)
        .with_context(|| format!("Failed to read share status of collection {}", slug))?;

    output.print_collection_share_status(&status);
    Ok(())
}

/// Make a collection private
pub fn unshare_collection(store: &mut Store, owner: &str, slug: &str, output: &Output) -> Result<()> {
    store
        .unshare_collection(owner, slug)
        .with_context(|| format!("Failed to unshare collection {}", slug))?;

    output.success(&format!("Collection {} is no longer public", slug));
    Ok(())
}

/// Render a shared artifact's page
pub fn render_artifact(
    store: &Store,
    token: &str,
    path: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let page = store.render_artifact_page(token)?;
    emit_page(page, path, output)
}

/// Render a shared collection's page
pub fn render_collection(
    store: &Store,
    token: &str,
    path: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let page = store.render_share_page(token)?;
    emit_page(page, path, output)
}

/// Write a page to a file or stdout. Not-found pages become an error.
fn emit_page(page: Page, path: Option<PathBuf>, output: &Output) -> Result<()> {
    if !page.is_found() {
        bail!("No shared page for this token (status {})", page.status);
    }

    match path {
        Some(path) => {
            std::fs::write(&path, &page.body)
                .with_context(|| format!("Failed to write page: {:?}", path))?;
            output.success(&format!("Wrote {}", path.display()));
        }
        None => print!("{}", page.body),
    }
    Ok(())
}
