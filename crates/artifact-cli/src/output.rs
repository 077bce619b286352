//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use artifact_core::{
    Artifact, ArtifactShare, CatalogStats, Collection, CollectionShare, CollectionShareStatus,
    ImportSummary, PlaceholderArtifact, ShareStatus, TagUsage,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print any value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    /// Print a single artifact
    pub fn print_artifact(&self, artifact: &Artifact) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", artifact.id);
                println!(
                    "Name:        {}{}",
                    artifact.name,
                    if artifact.is_favorite { " ★" } else { "" }
                );
                println!(
                    "Type:        {} ({})",
                    artifact.artifact_type, artifact.source_type
                );
                if let Some(ref desc) = artifact.description {
                    println!("Description: {}", desc);
                }
                if let Some(ref collection) = artifact.collection {
                    println!("Collection:  {} ({})", collection.name, collection.slug);
                }
                if !artifact.tags.is_empty() {
                    println!("Tags:        {}", artifact.tags.join(", "));
                }
                if let Some(ref lang) = artifact.language {
                    println!("Language:    {}", lang);
                }
                if let Some(ref framework) = artifact.framework {
                    println!("Framework:   {}", framework);
                }
                if let Some(ref url) = artifact.published_url {
                    println!("URL:         {}", url);
                }
                if let Some(ref file) = artifact.file_name {
                    match artifact.file_size {
                        Some(size) => println!("File:        {} ({} bytes)", file, size),
                        None => println!("File:        {}", file),
                    }
                }
                if let Some(ref url) = artifact.conversation_url {
                    println!("Chat:        {}", url);
                }
                if let Some(ref model) = artifact.claude_model {
                    println!("Model:       {}", model);
                }
                if artifact.share_token.is_some() {
                    println!("Shared:      yes");
                }
                println!(
                    "Created:     {}",
                    artifact.created_at.format("%Y-%m-%d %H:%M")
                );
                println!(
                    "Updated:     {}",
                    artifact.updated_at.format("%Y-%m-%d %H:%M")
                );
                if let Some(ref notes) = artifact.notes {
                    println!();
                    println!("── Notes ──");
                    println!("{}", notes);
                }
            }
            OutputFormat::Json => self.print_json(artifact),
            OutputFormat::Quiet => println!("{}", artifact.id),
        }
    }

    /// Print a list of artifacts
    pub fn print_artifacts(&self, artifacts: &[Artifact]) {
        match self.format {
            OutputFormat::Human => {
                if artifacts.is_empty() {
                    println!("No artifacts found.");
                    return;
                }
                for artifact in artifacts {
                    let star = if artifact.is_favorite { "★" } else { " " };
                    let tags = if artifact.tags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", artifact.tags.join(", "))
                    };
                    println!(
                        "{:>5} {} {:<8} | {}{}",
                        artifact.id,
                        star,
                        artifact.artifact_type.as_str(),
                        truncate(&artifact.name, 40),
                        tags
                    );
                }
                println!("\n{} artifact(s)", artifacts.len());
            }
            OutputFormat::Json => self.print_json(artifacts),
            OutputFormat::Quiet => {
                for artifact in artifacts {
                    println!("{}", artifact.id);
                }
            }
        }
    }

    /// Print a single collection
    pub fn print_collection(&self, collection: &Collection) {
        match self.format {
            OutputFormat::Human => {
                println!("Name:        {}", collection.name);
                println!("Slug:        {}", collection.slug);
                if let Some(ref desc) = collection.description {
                    println!("Description: {}", desc);
                }
                println!("Color:       {}", collection.color);
                println!("Icon:        {}", collection.icon);
                println!("Artifacts:   {}", collection.artifact_count);
                println!(
                    "Public:      {}",
                    if collection.is_public { "yes" } else { "no" }
                );
            }
            OutputFormat::Json => self.print_json(collection),
            OutputFormat::Quiet => println!("{}", collection.slug),
        }
    }

    /// Print a list of collections
    pub fn print_collections(&self, collections: &[Collection]) {
        match self.format {
            OutputFormat::Human => {
                if collections.is_empty() {
                    println!("No collections found.");
                    return;
                }
                for collection in collections {
                    println!(
                        "{:<24} | {:<30} | {} artifact(s){}",
                        truncate(&collection.slug, 24),
                        truncate(&collection.name, 30),
                        collection.artifact_count,
                        if collection.is_public { " (public)" } else { "" }
                    );
                }
                println!("\n{} collection(s)", collections.len());
            }
            OutputFormat::Json => self.print_json(collections),
            OutputFormat::Quiet => {
                for collection in collections {
                    println!("{}", collection.slug);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[TagUsage]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for tag in tags {
                    println!("{} ({})", tag.name, tag.usage_count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => self.print_json(tags),
            OutputFormat::Quiet => {
                for tag in tags {
                    println!("{}", tag.name);
                }
            }
        }
    }

    /// Print catalog stats
    pub fn print_stats(&self, stats: &CatalogStats) {
        match self.format {
            OutputFormat::Human => {
                println!("Artifacts:   {}", stats.total_artifacts);
                println!("  published: {}", stats.published_count);
                println!("  downloaded: {}", stats.downloaded_count);
                println!("Favorites:   {}", stats.favorites_count);
                println!("Collections: {}", stats.total_collections);
                println!("Tags:        {}", stats.total_tags);
            }
            OutputFormat::Json => self.print_json(stats),
            OutputFormat::Quiet => println!("{}", stats.total_artifacts),
        }
    }

    /// Print a minted artifact share
    pub fn print_artifact_share(&self, share: &ArtifactShare) {
        match self.format {
            OutputFormat::Human => {
                println!("Token: {}", share.token);
                println!("URL:   {}", share.url);
            }
            OutputFormat::Json => self.print_json(share),
            OutputFormat::Quiet => println!("{}", share.url),
        }
    }

    /// Print a minted collection share
    pub fn print_collection_share(&self, share: &CollectionShare) {
        match self.format {
            OutputFormat::Human => {
                println!("Token:  {}", share.token);
                println!("URL:    {}", share.url);
                println!("Layout: {}", share.settings.layout.as_str());
            }
            OutputFormat::Json => self.print_json(share),
            OutputFormat::Quiet => println!("{}", share.url),
        }
    }

    /// Print an artifact's share status
    pub fn print_share_status(&self, status: &ShareStatus) {
        match self.format {
            OutputFormat::Human => match (&status.render_url, status.shared_at) {
                (Some(url), Some(at)) => {
                    println!("Shared since {}", at.format("%Y-%m-%d %H:%M"));
                    println!("URL: {}", url);
                }
                (Some(url), None) => println!("Shared: {}", url),
                _ => println!("Not shared."),
            },
            OutputFormat::Json => self.print_json(status),
            OutputFormat::Quiet => {
                if let Some(ref url) = status.render_url {
                    println!("{}", url);
                }
            }
        }
    }

    /// Print a collection's share status
    pub fn print_collection_share_status(&self, status: &CollectionShareStatus) {
        match self.format {
            OutputFormat::Human => {
                let Some(ref url) = status.share_url else {
                    println!("Not public.");
                    return;
                };
                if let Some(at) = status.shared_at {
                    println!("Public since {}", at.format("%Y-%m-%d %H:%M"));
                }
                println!("URL:    {}", url);
                if let Some(ref settings) = status.settings {
                    println!("Layout: {}", settings.layout.as_str());
                    println!(
                        "Thumbnails: {}",
                        if settings.show_thumbnails { "shown" } else { "hidden" }
                    );
                }
            }
            OutputFormat::Json => self.print_json(status),
            OutputFormat::Quiet => {
                if let Some(ref url) = status.share_url {
                    println!("{}", url);
                }
            }
        }
    }

    /// Print placeholder scan results
    pub fn print_placeholders(&self, placeholders: &[PlaceholderArtifact]) {
        match self.format {
            OutputFormat::Human => {
                if placeholders.is_empty() {
                    println!("No placeholder names found.");
                    return;
                }
                for p in placeholders {
                    println!("{:>5} {:<8} | {:?}", p.id, p.artifact_type.as_str(), p.name);
                }
                println!("\n{} artifact(s) with placeholder names", placeholders.len());
                println!("Run `artifacts cleanup fix` to rename them.");
            }
            OutputFormat::Json => self.print_json(placeholders),
            OutputFormat::Quiet => {
                for p in placeholders {
                    println!("{}", p.id);
                }
            }
        }
    }

    /// Print an import summary
    pub fn print_import_summary(&self, summary: &ImportSummary) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "✓ Imported {} artifact(s) ({} skipped)",
                    summary.imported, summary.skipped
                );
                if summary.collections_created > 0 {
                    println!("  {} collection(s) created", summary.collections_created);
                }
            }
            OutputFormat::Json => self.print_json(summary),
            OutputFormat::Quiet => println!("{}", summary.imported),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max chars, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
