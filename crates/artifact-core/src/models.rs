//! Data models for the artifact catalog
//!
//! Defines the core data structures: Artifact, Collection, and Tag, plus the
//! input/patch types used to create and modify them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Owner-scoped artifact identifier
pub type ArtifactId = i64;

/// Collection identifier
pub type CollectionId = i64;

/// Tag identifier
pub type TagId = i64;

/// Kind of content an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    File,
    Image,
    Document,
    #[default]
    Code,
    Html,
    Data,
    Other,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 7] = [
        ArtifactType::File,
        ArtifactType::Image,
        ArtifactType::Document,
        ArtifactType::Code,
        ArtifactType::Html,
        ArtifactType::Data,
        ArtifactType::Other,
    ];

    /// Stored/wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::File => "file",
            ArtifactType::Image => "image",
            ArtifactType::Document => "document",
            ArtifactType::Code => "code",
            ArtifactType::Html => "html",
            ArtifactType::Data => "data",
            ArtifactType::Other => "other",
        }
    }

    /// Human label, also the base for generated names ("Code", "Code 2", ...)
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactType::File => "File",
            ArtifactType::Image => "Image",
            ArtifactType::Document => "Document",
            ArtifactType::Code => "Code",
            ArtifactType::Html => "HTML",
            ArtifactType::Data => "Data",
            ArtifactType::Other => "Other",
        }
    }

    /// Parse leniently: case-insensitive, unknown values become `Other`
    pub fn from_label(value: &str) -> Self {
        value.parse().unwrap_or(ArtifactType::Other)
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ArtifactType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown artifact type: {}", s))
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Published at a public URL
    #[default]
    Published,
    /// Downloaded as a file
    Downloaded,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Published => "published",
            SourceType::Downloaded => "downloaded",
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "published" => Ok(SourceType::Published),
            "downloaded" => Ok(SourceType::Downloaded),
            _ => Err(format!("Unknown source type: {}", s)),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection fields carried on an artifact row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionRef {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// A saved artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: ArtifactId,
    /// Display name, never a placeholder
    pub name: String,
    pub description: Option<String>,
    pub artifact_type: ArtifactType,
    pub source_type: SourceType,
    /// Public URL for published artifacts
    pub published_url: Option<String>,
    /// Upstream identifier for published artifacts
    pub artifact_id: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_content: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub claude_model: Option<String>,
    pub conversation_url: Option<String>,
    pub notes: Option<String>,
    pub collection_id: Option<CollectionId>,
    /// Denormalized collection fields (None if uncollected)
    pub collection: Option<CollectionRef>,
    /// Tag names, sorted
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub share_token: Option<String>,
    pub shared_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Creation time reported by the source, if any
    pub artifact_created_at: Option<DateTime<Utc>>,
}

impl Artifact {
    /// Whether the render page should embed this artifact as HTML
    pub fn is_html(&self) -> bool {
        self.artifact_type == ArtifactType::Html
            || self
                .language
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case("html"))
    }
}

/// Input for creating an artifact
///
/// Every field except `name` is optional; callers such as the browser
/// extension pass raw scraped values here, so nothing is assumed sanitized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewArtifact {
    pub name: String,
    pub description: Option<String>,
    pub artifact_type: Option<ArtifactType>,
    pub source_type: Option<SourceType>,
    pub published_url: Option<String>,
    pub artifact_id: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub file_content: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub claude_model: Option<String>,
    pub conversation_url: Option<String>,
    pub notes: Option<String>,
    pub collection_id: Option<CollectionId>,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub artifact_created_at: Option<DateTime<Utc>>,
}

impl NewArtifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, artifact_type: ArtifactType) -> Self {
        self.artifact_type = Some(artifact_type);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update for an artifact
///
/// `None` keeps the current value. Nullable fields are `Option<Option<T>>`:
/// `Some(None)` clears them.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub artifact_type: Option<ArtifactType>,
    pub source_type: Option<SourceType>,
    pub published_url: Option<Option<String>>,
    pub artifact_id: Option<Option<String>>,
    pub file_name: Option<Option<String>>,
    pub file_size: Option<Option<i64>>,
    pub file_content: Option<Option<String>>,
    pub language: Option<Option<String>>,
    pub framework: Option<Option<String>>,
    pub claude_model: Option<Option<String>>,
    pub conversation_url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub collection_id: Option<Option<CollectionId>>,
    /// Replaces the full tag set when present
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

/// Layout of a shared collection page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShareLayout {
    #[default]
    Grouped,
    Grid,
    List,
}

impl ShareLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareLayout::Grouped => "grouped",
            ShareLayout::Grid => "grid",
            ShareLayout::List => "list",
        }
    }
}

impl FromStr for ShareLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grouped" => Ok(ShareLayout::Grouped),
            "grid" => Ok(ShareLayout::Grid),
            "list" => Ok(ShareLayout::List),
            _ => Err(format!("Unknown layout: {}", s)),
        }
    }
}

/// Display preferences for a shared collection page
///
/// Unknown keys are ignored on read so newer clients can add options.
/// A bad value falls back to its own default without touching the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareSettings {
    #[serde(deserialize_with = "lenient_thumbnails")]
    pub show_thumbnails: bool,
    #[serde(deserialize_with = "lenient_layout")]
    pub layout: ShareLayout,
}

fn lenient_thumbnails<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(true))
}

fn lenient_layout<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ShareLayout, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            show_thumbnails: true,
            layout: ShareLayout::Grouped,
        }
    }
}

impl ShareSettings {
    /// Parse stored settings, falling back to defaults if unreadable
    pub fn from_stored(raw: Option<&str>) -> Self {
        raw.and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }
}

/// A named group of artifacts, addressed by slug
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub is_public: bool,
    pub share_token: Option<String>,
    pub share_settings: Option<ShareSettings>,
    pub shared_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Number of artifacts in the collection
    pub artifact_count: i64,
}

/// Default collection color
pub const DEFAULT_COLOR: &str = "#6366f1";

/// Default collection icon
pub const DEFAULT_ICON: &str = "folder";

/// Input for creating a collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCollection {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a collection (`None` keeps the current value)
#[derive(Debug, Clone, Default)]
pub struct CollectionPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// A tag with the number of artifacts linked to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagUsage {
    pub id: TagId,
    pub name: String,
    pub usage_count: i64,
}

/// Per-owner catalog counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_artifacts: i64,
    pub published_count: i64,
    pub downloaded_count: i64,
    pub favorites_count: i64,
    pub total_collections: i64,
    pub total_tags: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_type_parse() {
        assert_eq!("code".parse::<ArtifactType>().unwrap(), ArtifactType::Code);
        assert_eq!("HTML".parse::<ArtifactType>().unwrap(), ArtifactType::Html);
        assert_eq!(" Image ".parse::<ArtifactType>().unwrap(), ArtifactType::Image);
        assert!("archive".parse::<ArtifactType>().is_err());
    }

    #[test]
    fn test_artifact_type_lenient() {
        assert_eq!(ArtifactType::from_label("Document"), ArtifactType::Document);
        assert_eq!(ArtifactType::from_label("Archive"), ArtifactType::Other);
    }

    #[test]
    fn test_artifact_type_serde() {
        let json = serde_json::to_string(&ArtifactType::Html).unwrap();
        assert_eq!(json, "\"html\"");
        let parsed: ArtifactType = serde_json::from_str("\"data\"").unwrap();
        assert_eq!(parsed, ArtifactType::Data);
    }

    #[test]
    fn test_source_type_parse() {
        assert_eq!(
            "Downloaded".parse::<SourceType>().unwrap(),
            SourceType::Downloaded
        );
        assert!("stolen".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_share_settings_defaults() {
        let settings = ShareSettings::default();
        assert!(settings.show_thumbnails);
        assert_eq!(settings.layout, ShareLayout::Grouped);
    }

    #[test]
    fn test_share_settings_camel_case_and_unknown_keys() {
        let settings: ShareSettings =
            serde_json::from_str(r#"{"showThumbnails": false, "layout": "list", "theme": "dark"}"#)
                .unwrap();
        assert!(!settings.show_thumbnails);
        assert_eq!(settings.layout, ShareLayout::List);

        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("showThumbnails"));
    }

    #[test]
    fn test_share_settings_from_stored() {
        assert_eq!(ShareSettings::from_stored(None), ShareSettings::default());
        assert_eq!(
            ShareSettings::from_stored(Some("not json")),
            ShareSettings::default()
        );
        assert_eq!(ShareSettings::from_stored(Some("{}")), ShareSettings::default());
        assert_eq!(
            ShareSettings::from_stored(Some(r#"{"layout":"grid"}"#)).layout,
            ShareLayout::Grid
        );
    }

    #[test]
    fn test_share_settings_unknown_layout_keeps_other_fields() {
        let settings =
            ShareSettings::from_stored(Some(r#"{"showThumbnails":false,"layout":"masonry"}"#));
        assert!(!settings.show_thumbnails);
        assert_eq!(settings.layout, ShareLayout::Grouped);

        let settings = ShareSettings::from_stored(Some(r#"{"showThumbnails":"no","layout":"grid"}"#));
        assert!(settings.show_thumbnails);
        assert_eq!(settings.layout, ShareLayout::Grid);
    }

    #[test]
    fn test_new_artifact_builder() {
        let input = NewArtifact::new("Parser")
            .with_type(ArtifactType::Code)
            .with_tags(["rust", "parsing"]);
        assert_eq!(input.name, "Parser");
        assert_eq!(input.artifact_type, Some(ArtifactType::Code));
        assert_eq!(input.tags, vec!["rust", "parsing"]);
    }

    #[test]
    fn test_new_artifact_deserialize_partial() {
        let input: NewArtifact =
            serde_json::from_str(r#"{"name": "Page", "artifact_type": "html"}"#).unwrap();
        assert_eq!(input.name, "Page");
        assert_eq!(input.artifact_type, Some(ArtifactType::Html));
        assert!(input.tags.is_empty());
        assert!(!input.is_favorite);
    }
}
