//! Artifact command handlers

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;

use artifact_core::{
    ArtifactFilter, ArtifactId, ArtifactPatch, ArtifactType, CollectionId, NewArtifact,
    SortOrder, SourceType, Store,
};

use crate::output::Output;

/// Fields for a new artifact
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Artifact name (placeholders such as "Untitled" are replaced)
    pub name: String,
    /// Artifact type (file, image, document, code, html, data, other)
    #[arg(long = "type")]
    pub artifact_type: Option<String>,
    /// Source (published, downloaded)
    #[arg(long)]
    pub source: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Public URL the artifact was published at
    #[arg(short, long)]
    pub url: Option<String>,
    /// Read content from a file (sets file name and size)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    #[arg(short, long)]
    pub language: Option<String>,
    #[arg(long)]
    pub framework: Option<String>,
    /// Model that produced the artifact
    #[arg(long)]
    pub model: Option<String>,
    /// Link to the originating conversation
    #[arg(long)]
    pub conversation: Option<String>,
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Collection slug
    #[arg(short, long)]
    pub collection: Option<String>,
    /// Tags to add (repeatable)
    #[arg(short, long)]
    pub tag: Vec<String>,
    /// Mark as favorite
    #[arg(long)]
    pub favorite: bool,
}

/// Changes to an existing artifact. Text fields accept "none" to clear.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Artifact ID
    pub id: ArtifactId,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "type")]
    pub artifact_type: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub url: Option<String>,
    #[arg(short, long)]
    pub language: Option<String>,
    #[arg(long)]
    pub framework: Option<String>,
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Move to a collection by slug ("none" removes it from its collection)
    #[arg(short, long)]
    pub collection: Option<String>,
    /// Replace the tag set (repeatable)
    #[arg(short, long)]
    pub tag: Vec<String>,
    /// Remove every tag
    #[arg(long, conflicts_with = "tag")]
    pub clear_tags: bool,
}

/// Save a new artifact
pub fn add(store: &mut Store, owner: &str, args: AddArgs, output: &Output) -> Result<()> {
    let mut input = NewArtifact::new(args.name).with_tags(args.tag);
    input.artifact_type = args
        .artifact_type
        .as_deref()
        .map(parse_type)
        .transpose()?;
    input.source_type = args.source.as_deref().map(parse_source).transpose()?;
    input.description = args.description;
    input.published_url = args.url;
    input.language = args.language;
    input.framework = args.framework;
    input.claude_model = args.model;
    input.conversation_url = args.conversation;
    input.notes = args.notes;
    input.is_favorite = args.favorite;

    if let Some(path) = args.file {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        input.file_size = Some(content.len() as i64);
        input.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        input.file_content = Some(content);
        if input.source_type.is_none() {
            input.source_type = Some(SourceType::Downloaded);
        }
    }

    if let Some(slug) = args.collection {
        input.collection_id = Some(collection_id(store, owner, &slug)?);
    }

    let artifact = store
        .create_artifact(owner, input)
        .context("Failed to create artifact")?;

    output.success(&format!("Created artifact {}: {}", artifact.id, artifact.name));
    if !output.is_quiet() && !output.is_json() {
        println!();
    }
    output.print_artifact(&artifact);
    Ok(())
}

/// Build a list filter from command-line options
pub fn build_filter(
    collection: Option<String>,
    tag: Option<String>,
    artifact_type: Option<String>,
    source: Option<String>,
    favorite_only: bool,
    search: Option<String>,
) -> Result<ArtifactFilter> {
    Ok(ArtifactFilter {
        collection_slug: collection,
        tag_name: tag,
        artifact_type: artifact_type.as_deref().map(parse_type).transpose()?,
        source_type: source.as_deref().map(parse_source).transpose()?,
        favorite_only,
        search_text: search,
    })
}

/// List artifacts
pub fn list(
    store: &Store,
    owner: &str,
    filter: &ArtifactFilter,
    sort: SortOrder,
    output: &Output,
) -> Result<()> {
    let artifacts = store.list_artifacts(owner, filter, sort)?;
    output.print_artifacts(&artifacts);
    Ok(())
}

/// Show a single artifact
pub fn show(store: &Store, owner: &str, id: ArtifactId, output: &Output) -> Result<()> {
    let artifact = store
        .get_artifact(owner, id)?
        .ok_or_else(|| anyhow!("Artifact not found: {}", id))?;

    output.print_artifact(&artifact);
    Ok(())
}

/// Edit an artifact
pub fn edit(store: &mut Store, owner: &str, args: EditArgs, output: &Output) -> Result<()> {
    let mut patch = ArtifactPatch {
        name: args.name,
        artifact_type: args.artifact_type.as_deref().map(parse_type).transpose()?,
        description: args.description.map(clearable),
        published_url: args.url.map(clearable),
        language: args.language.map(clearable),
        framework: args.framework.map(clearable),
        notes: args.notes.map(clearable),
        ..Default::default()
    };

    if let Some(slug) = args.collection {
        patch.collection_id = Some(match clearable(slug) {
            Some(slug) => Some(collection_id(store, owner, &slug)?),
            None => None,
        });
    }

    if args.clear_tags {
        patch.tags = Some(Vec::new());
    } else if !args.tag.is_empty() {
        patch.tags = Some(args.tag);
    }

    let artifact = store
        .update_artifact(owner, args.id, patch)
        .with_context(|| format!("Failed to update artifact {}", args.id))?;

    output.success("Artifact updated");
    output.print_artifact(&artifact);
    Ok(())
}

/// Delete an artifact
pub fn delete(store: &mut Store, owner: &str, id: ArtifactId, output: &Output) -> Result<()> {
    if !store.delete_artifact(owner, id)? {
        return Err(anyhow!("Artifact not found: {}", id));
    }

    output.success(&format!("Deleted artifact {}", id));
    Ok(())
}

/// Toggle the favorite flag
pub fn favorite(store: &mut Store, owner: &str, id: ArtifactId, output: &Output) -> Result<()> {
    let is_favorite = store
        .toggle_favorite(owner, id)
        .with_context(|| format!("Failed to toggle favorite on artifact {}", id))?;

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({"id": id, "is_favorite": is_favorite})
        );
    } else if output.is_quiet() {
        println!("{}", is_favorite);
    } else if is_favorite {
        output.success(&format!("Artifact {} marked as favorite", id));
    } else {
        output.success(&format!("Artifact {} removed from favorites", id));
    }
    Ok(())
}

fn collection_id(store: &Store, owner: &str, slug: &str) -> Result<CollectionId> {
    store
        .get_collection(owner, slug)?
        .map(|c| c.id)
        .ok_or_else(|| anyhow!("Collection not found: {}", slug))
}

fn parse_type(value: &str) -> Result<ArtifactType> {
    value.parse().map_err(|e: String| anyhow!(e))
}

fn parse_source(value: &str) -> Result<SourceType> {
    value.parse().map_err(|e: String| anyhow!(e))
}

/// Map "none" or an empty string to a cleared field
fn clearable(value: String) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_parses_types() {
        let filter = build_filter(
            Some("work".into()),
            None,
            Some("HTML".into()),
            Some("downloaded".into()),
            true,
            Some("chart".into()),
        )
        .unwrap();

        assert_eq!(filter.collection_slug.as_deref(), Some("work"));
        assert_eq!(filter.artifact_type, Some(ArtifactType::Html));
        assert_eq!(filter.source_type, Some(SourceType::Downloaded));
        assert!(filter.favorite_only);
        assert_eq!(filter.search_text.as_deref(), Some("chart"));
    }

    #[test]
    fn test_build_filter_rejects_unknown_type() {
        assert!(build_filter(None, None, Some("spreadsheet".into()), None, false, None).is_err());
    }

    #[test]
    fn test_clearable() {
        assert_eq!(clearable("none".into()), None);
        assert_eq!(clearable(String::new()), None);
        assert_eq!(clearable("Rust".into()), Some("Rust".into()));
    }

    #[test]
    fn test_add_resolves_collection_and_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.html");
        std::fs::write(&path, "<h1>Chart</h1>").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let owner = "me@example.com";
        store
            .create_collection(owner, artifact_core::NewCollection::new("Work"))
            .unwrap();

        let args = AddArgs {
            name: "Chart".into(),
            artifact_type: Some("html".into()),
            source: None,
            description: None,
            url: None,
            file: Some(path),
            language: None,
            framework: None,
            model: None,
            conversation: None,
            notes: None,
            collection: Some("work".into()),
            tag: vec!["viz".into()],
            favorite: false,
        };
        let quiet = Output::new(crate::output::OutputFormat::Quiet);
        add(&mut store, owner, args, &quiet).unwrap();

        let artifacts = store
            .list_artifacts(owner, &ArtifactFilter::default(), SortOrder::Newest)
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        let artifact = &artifacts[0];
        assert_eq!(artifact.file_name.as_deref(), Some("chart.html"));
        assert_eq!(artifact.file_size, Some(14));
        assert_eq!(artifact.source_type, SourceType::Downloaded);
        assert_eq!(
            artifact.collection.as_ref().map(|c| c.slug.as_str()),
            Some("work")
        );
        assert_eq!(artifact.tags, vec!["viz".to_string()]);
    }

    #[test]
    fn test_add_with_unknown_collection_fails() {
        let mut store = Store::open_in_memory().unwrap();
        let args = AddArgs {
            name: "Orphan".into(),
            artifact_type: None,
            source: None,
            description: None,
            url: None,
            file: None,
            language: None,
            framework: None,
            model: None,
            conversation: None,
            notes: None,
            collection: Some("missing".into()),
            tag: Vec::new(),
            favorite: false,
        };
        let quiet = Output::new(crate::output::OutputFormat::Quiet);
        assert!(add(&mut store, "me@example.com", args, &quiet).is_err());
    }
}
