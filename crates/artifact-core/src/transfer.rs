//! Catalog import and export
//!
//! The export document is plain JSON: collections (keyed by slug) and
//! artifacts carrying their collection slug and tag names instead of ids,
//! so it can be imported into any owner's catalog.
//!
//! Import is a merge. Collections whose slug already exists are reused,
//! artifacts whose exact name already exists are skipped, and a malformed
//! row is skipped without failing the rest of the document. Each artifact
//! is committed on its own, so a partial import is a normal outcome.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::models::{
    Artifact, ArtifactType, Collection, CollectionId, NewArtifact, SourceType, DEFAULT_COLOR,
    DEFAULT_ICON,
};
use crate::naming;
use crate::query::{ArtifactQuery, SortOrder};
use crate::storage::database::{self, insert_artifact, to_millis, ArtifactRecord};
use crate::storage::{StoreError, StoreResult};
use crate::store::Store;
use crate::tags;

/// Current export format version
pub const EXPORT_VERSION: u32 = 1;

/// A full export of one owner's catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub collections: Vec<ExportedCollection>,
    pub artifacts: Vec<ExportedArtifact>,
}

impl CatalogDocument {
    pub fn to_json_pretty(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedCollection {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl From<&Collection> for ExportedCollection {
    fn from(collection: &Collection) -> Self {
        Self {
            name: collection.name.clone(),
            slug: collection.slug.clone(),
            description: collection.description.clone(),
            color: Some(collection.color.clone()),
            icon: Some(collection.icon.clone()),
        }
    }
}

/// An artifact as it appears in an export document.
///
/// Deserialization is lenient: types are free strings, the favorite flag
/// may be a bool or 0/1, and timestamps may be RFC 3339, `YYYY-MM-DD
/// HH:MM:SS` or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedArtifact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub published_url: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub file_content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub claude_model: Option<String>,
    #[serde(default)]
    pub conversation_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub artifact_created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collection_slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Artifact> for ExportedArtifact {
    fn from(artifact: &Artifact) -> Self {
        Self {
            name: artifact.name.clone(),
            description: artifact.description.clone(),
            artifact_type: Some(artifact.artifact_type.as_str().to_string()),
            source_type: Some(artifact.source_type.as_str().to_string()),
            published_url: artifact.published_url.clone(),
            artifact_id: artifact.artifact_id.clone(),
            file_name: artifact.file_name.clone(),
            file_size: artifact.file_size,
            file_content: artifact.file_content.clone(),
            language: artifact.language.clone(),
            framework: artifact.framework.clone(),
            claude_model: artifact.claude_model.clone(),
            conversation_url: artifact.conversation_url.clone(),
            notes: artifact.notes.clone(),
            is_favorite: artifact.is_favorite,
            artifact_created_at: artifact.artifact_created_at,
            created_at: Some(artifact.created_at),
            collection_slug: artifact.collection.as_ref().map(|c| c.slug.clone()),
            tags: artifact.tags.clone(),
        }
    }
}

impl ExportedArtifact {
    fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
            .as_deref()
            .map(ArtifactType::from_label)
            .unwrap_or_default()
    }

    fn source_type(&self) -> SourceType {
        self.source_type
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => parse_timestamp(&s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// Parse RFC 3339 or SQLite's `YYYY-MM-DD HH:MM:SS` (UTC)
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// A document to import.
///
/// Rows are kept as raw JSON so that one malformed row is skipped rather
/// than rejecting the whole document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportDocument {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub collections: Vec<Value>,
    #[serde(default)]
    pub artifacts: Vec<Value>,
}

impl ImportDocument {
    /// Parse an import document. Fails only if the top level is malformed.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<CatalogDocument> for ImportDocument {
    fn from(doc: CatalogDocument) -> Self {
        Self {
            version: Some(doc.version),
            collections: doc
                .collections
                .iter()
                .filter_map(|c| serde_json::to_value(c).ok())
                .collect(),
            artifacts: doc
                .artifacts
                .iter()
                .filter_map(|a| serde_json::to_value(a).ok())
                .collect(),
        }
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub collections_created: usize,
}

impl Store {
    /// Export every collection and artifact of an owner
    pub fn export_catalog(&self, owner: &str) -> StoreResult<CatalogDocument> {
        let collections = self
            .list_collections(owner)?
            .iter()
            .map(ExportedCollection::from)
            .collect();

        let artifacts: Vec<ExportedArtifact> = ArtifactQuery::for_owner(owner)
            .sorted_by(SortOrder::Oldest)
            .fetch(self.conn())?
            .iter()
            .map(ExportedArtifact::from)
            .collect();

        info!("Exported {} artifacts", artifacts.len());
        Ok(CatalogDocument {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            collections,
            artifacts,
        })
    }

    /// Merge a document into an owner's catalog
    pub fn import_catalog(
        &mut self,
        owner: &str,
        doc: &ImportDocument,
    ) -> StoreResult<ImportSummary> {
        if let Some(version) = doc.version.filter(|v| *v > EXPORT_VERSION) {
            warn!(
                "Import document version {} is newer than {}; importing known fields",
                version, EXPORT_VERSION
            );
        }

        let mut summary = ImportSummary::default();

        for raw in &doc.collections {
            match serde_json::from_value::<ExportedCollection>(raw.clone()) {
                Ok(collection) => match self.import_collection(owner, &collection) {
                    Ok(true) => summary.collections_created += 1,
                    Ok(false) => {}
                    Err(e) => warn!("Skipping collection {:?}: {}", collection.name, e),
                },
                Err(e) => warn!("Skipping malformed collection: {}", e),
            }
        }

        let slugs: HashMap<String, CollectionId> = self
            .list_collections(owner)?
            .into_iter()
            .map(|c| (c.slug, c.id))
            .collect();
        let mut existing = database::artifact_names(self.conn(), owner)?;

        for raw in &doc.artifacts {
            let row = match serde_json::from_value::<ExportedArtifact>(raw.clone()) {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping malformed artifact: {}", e);
                    summary.skipped += 1;
                    continue;
                }
            };

            match self.import_artifact(owner, row, &slugs, &mut existing) {
                Ok(true) => summary.imported += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!("Skipping artifact: {}", e);
                    summary.skipped += 1;
                }
            }
        }

        info!(
            "Import finished: {} imported, {} skipped, {} collections created",
            summary.imported, summary.skipped, summary.collections_created
        );
        Ok(summary)
    }

    /// Insert a collection unless its slug exists. Returns whether it was created.
    fn import_collection(&mut self, owner: &str, collection: &ExportedCollection) -> StoreResult<bool> {
        let name = collection.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("Name is required"));
        }
        let slug = match collection.slug.trim() {
            "" => naming::slugify(name),
            given => given.to_string(),
        };
        if slug.is_empty() {
            return Err(StoreError::validation(
                "Collection name must contain letters or digits",
            ));
        }

        let created = self.conn().execute(
            "INSERT INTO collections (name, slug, description, color, icon, user_email, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) ON CONFLICT(slug, user_email) DO NOTHING",
            params![
                name,
                slug,
                collection.description,
                collection.color.as_deref().unwrap_or(DEFAULT_COLOR),
                collection.icon.as_deref().unwrap_or(DEFAULT_ICON),
                owner,
                to_millis(Utc::now()),
            ],
        )?;
        Ok(created > 0)
    }

    /// Insert one artifact unless its name is taken. Returns whether it was imported.
    fn import_artifact(
        &mut self,
        owner: &str,
        row: ExportedArtifact,
        slugs: &HashMap<String, CollectionId>,
        existing: &mut Vec<String>,
    ) -> StoreResult<bool> {
        let artifact_type = row.artifact_type();

        // Placeholders take the type label, and dedup applies to the final name
        let name = naming::sanitize(&row.name, artifact_type.label());
        if existing.contains(&name) {
            return Ok(false);
        }

        let collection_id = row
            .collection_slug
            .as_deref()
            .and_then(|slug| slugs.get(slug).copied());

        let input = NewArtifact {
            name: name.clone(),
            description: row.description.clone(),
            artifact_type: Some(artifact_type),
            source_type: Some(row.source_type()),
            published_url: row.published_url,
            artifact_id: row.artifact_id,
            file_name: row.file_name,
            file_size: row.file_size,
            file_content: row.file_content,
            language: row.language,
            framework: row.framework,
            claude_model: row.claude_model,
            conversation_url: row.conversation_url,
            notes: row.notes,
            collection_id,
            tags: row.tags,
            is_favorite: row.is_favorite,
            artifact_created_at: row.artifact_created_at,
        };

        let tx = self.conn_mut().transaction()?;
        let id = insert_artifact(
            &tx,
            owner,
            &ArtifactRecord {
                name: &name,
                input: &input,
                created_at: row.created_at.unwrap_or_else(Utc::now),
            },
        )?;
        tags::replace_tags(&tx, owner, id, &input.tags)?;
        tx.commit()?;

        existing.push(name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCollection;
    use crate::query::ArtifactFilter;

    const OWNER: &str = "me@example.com";
    const FRESH: &str = "fresh@example.com";

    fn seeded() -> Store {
        let mut store = Store::open_in_memory().unwrap();
        let web = store
            .create_collection(
                OWNER,
                NewCollection {
                    color: Some("#10b981".into()),
                    ..NewCollection::new("Web Apps")
                },
            )
            .unwrap();

        let dashboard = NewArtifact {
            collection_id: Some(web.id),
            file_content: Some("<h1>Dash</h1>".into()),
            is_favorite: true,
            ..NewArtifact::new("Dashboard")
                .with_type(ArtifactType::Html)
                .with_tags(["ui", "charts"])
        };
        store.create_artifact(OWNER, dashboard).unwrap();
        store
            .create_artifact(OWNER, NewArtifact::new("Script").with_tags(["cli"]))
            .unwrap();
        store.create_artifact(OWNER, NewArtifact::new("Bare")).unwrap();
        store
    }

    fn by_name(store: &Store, owner: &str) -> Vec<Artifact> {
        store
            .list_artifacts(owner, &ArtifactFilter::default(), SortOrder::Name)
            .unwrap()
    }

    #[test]
    fn test_export_shape() {
        let store = seeded();
        let doc = store.export_catalog(OWNER).unwrap();

        assert_eq!(doc.version, EXPORT_VERSION);
        assert_eq!(doc.collections.len(), 1);
        assert_eq!(doc.collections[0].slug, "web-apps");
        assert_eq!(doc.artifacts.len(), 3);

        let dashboard = doc.artifacts.iter().find(|a| a.name == "Dashboard").unwrap();
        assert_eq!(dashboard.collection_slug.as_deref(), Some("web-apps"));
        assert_eq!(dashboard.tags, vec!["charts", "ui"]);
        assert_eq!(dashboard.artifact_type.as_deref(), Some("html"));
        assert!(dashboard.is_favorite);

        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\"collection_slug\": \"web-apps\""));
    }

    #[test]
    fn test_round_trip_into_fresh_owner() {
        let mut store = seeded();
        let doc = store.export_catalog(OWNER).unwrap();

        let summary = store
            .import_catalog(FRESH, &ImportDocument::from(doc))
            .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                imported: 3,
                skipped: 0,
                collections_created: 1,
            }
        );

        let original = by_name(&store, OWNER);
        let imported = by_name(&store, FRESH);
        assert_eq!(original.len(), imported.len());
        for (a, b) in original.iter().zip(&imported) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.tags, b.tags);
            assert_eq!(a.artifact_type, b.artifact_type);
            assert_eq!(a.is_favorite, b.is_favorite);
            assert_eq!(a.file_content, b.file_content);
            assert_eq!(
                a.collection.as_ref().map(|c| &c.slug),
                b.collection.as_ref().map(|c| &c.slug)
            );
            assert_eq!(a.created_at.timestamp_millis(), b.created_at.timestamp_millis());
        }

        // The collection was recreated for the new owner, not shared
        let theirs = store.get_collection(FRESH, "web-apps").unwrap().unwrap();
        assert_eq!(theirs.color, "#10b981");
        assert_eq!(theirs.artifact_count, 1);
    }

    #[test]
    fn test_reimport_skips_everything() {
        let mut store = seeded();
        let doc = store.export_catalog(OWNER).unwrap();
        let count = doc.artifacts.len();

        let summary = store
            .import_catalog(OWNER, &ImportDocument::from(doc))
            .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                imported: 0,
                skipped: count,
                collections_created: 0,
            }
        );
        assert_eq!(by_name(&store, OWNER).len(), count);
    }

    #[test]
    fn test_import_skips_malformed_rows() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = ImportDocument::from_json(
            r#"{
                "version": 1,
                "collections": [{"name": "Docs", "slug": "docs"}, {"slug": 5}],
                "artifacts": [
                    {"name": "Good", "collection_slug": "docs", "tags": ["a"]},
                    {"name": 42},
                    "not an object",
                    {"name": "Also Good", "collection_slug": "missing"}
                ]
            }"#,
        )
        .unwrap();

        let summary = store.import_catalog(OWNER, &doc).unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.collections_created, 1);

        let good = by_name(&store, OWNER)
            .into_iter()
            .find(|a| a.name == "Good")
            .unwrap();
        assert_eq!(good.collection.unwrap().slug, "docs");
        assert_eq!(good.tags, vec!["a"]);

        let also_good = by_name(&store, OWNER)
            .into_iter()
            .find(|a| a.name == "Also Good")
            .unwrap();
        assert!(also_good.collection_id.is_none());
    }

    #[test]
    fn test_import_dedups_within_one_document() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = ImportDocument::from_json(
            r#"{"artifacts": [{"name": "Twice"}, {"name": "Twice"}, {"name": " Twice "}]}"#,
        )
        .unwrap();

        let summary = store.import_catalog(OWNER, &doc).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_import_placeholder_names_get_type_labels() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = ImportDocument::from_json(
            r#"{"artifacts": [
                {"name": "Saving...", "artifact_type": "code"},
                {"name": "Untitled 3", "artifact_type": "HTML"},
                {"name": "Loading...", "artifact_type": "mystery"}
            ]}"#,
        )
        .unwrap();

        let summary = store.import_catalog(OWNER, &doc).unwrap();
        assert_eq!(summary.imported, 3);

        let names: Vec<String> = by_name(&store, OWNER).into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Code", "HTML", "Other"]);
    }

    #[test]
    fn test_import_placeholder_matching_existing_label_is_skipped() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .create_artifact(OWNER, NewArtifact::new("Code"))
            .unwrap();
        let doc = ImportDocument::from_json(
            r#"{"artifacts": [
                {"name": "Saving...", "artifact_type": "code"},
                {"name": "", "artifact_type": "code"}
            ]}"#,
        )
        .unwrap();

        let summary = store.import_catalog(OWNER, &doc).unwrap();
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(by_name(&store, OWNER).len(), 1);
    }

    #[test]
    fn test_reimport_with_placeholder_rows_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = ImportDocument::from_json(
            r#"{"artifacts": [
                {"name": "Saving...", "artifact_type": "code"},
                {"name": "Real"}
            ]}"#,
        )
        .unwrap();

        let first = store.import_catalog(OWNER, &doc).unwrap();
        assert_eq!(first.imported, 2);
        assert_eq!(first.skipped, 0);

        let second = store.import_catalog(OWNER, &doc).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(by_name(&store, OWNER).len(), 2);
    }

    #[test]
    fn test_import_accepts_legacy_values() {
        let mut store = Store::open_in_memory().unwrap();
        let doc = ImportDocument::from_json(
            r#"{"artifacts": [{
                "name": "Legacy",
                "is_favorite": 1,
                "source_type": "downloaded",
                "created_at": "2024-03-01 12:30:00",
                "artifact_created_at": "2024-02-29T08:00:00Z"
            }]}"#,
        )
        .unwrap();

        store.import_catalog(OWNER, &doc).unwrap();
        let legacy = &by_name(&store, OWNER)[0];
        assert!(legacy.is_favorite);
        assert_eq!(legacy.source_type, SourceType::Downloaded);
        assert_eq!(
            legacy.created_at,
            parse_timestamp("2024-03-01T12:30:00Z").unwrap()
        );
        assert!(legacy.artifact_created_at.is_some());
    }

    #[test]
    fn test_import_existing_collection_reused() {
        let mut store = Store::open_in_memory().unwrap();
        let existing = store
            .create_collection(OWNER, NewCollection::new("Docs"))
            .unwrap();
        let doc = ImportDocument::from_json(
            r##"{
                "collections": [{"name": "Docs Renamed", "slug": "docs", "color": "#000000"}],
                "artifacts": [{"name": "Readme", "collection_slug": "docs"}]
            }"##,
        )
        .unwrap();

        let summary = store.import_catalog(OWNER, &doc).unwrap();
        assert_eq!(summary.collections_created, 0);

        let docs = store.get_collection(OWNER, "docs").unwrap().unwrap();
        assert_eq!(docs.name, "Docs");
        assert_eq!(docs.id, existing.id);
        assert_eq!(docs.artifact_count, 1);
    }

    #[test]
    fn test_import_document_top_level_errors() {
        assert!(ImportDocument::from_json("not json").is_err());
        let empty = ImportDocument::from_json("{}").unwrap();
        assert!(empty.collections.is_empty());
        assert!(empty.artifacts.is_empty());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-02T03:04:05.678Z").is_some());
        assert!(parse_timestamp("2024-01-02 03:04:05").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
