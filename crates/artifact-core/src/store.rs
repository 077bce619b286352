//! Unified catalog interface
//!
//! The `Store` owns the SQLite database and exposes every catalog operation.
//! All owner-facing methods take the owner identity explicitly and scope
//! every statement to it; ids belonging to another owner behave exactly like
//! ids that do not exist.
//!
//! Sharing, import/export and placeholder cleanup live in their own modules
//! as further `impl Store` blocks.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! let artifact = store.create_artifact(
//!     "me@example.com",
//!     NewArtifact::new("Parser").with_tags(["rust"]),
//! )?;
//!
//! let favorites = store.list_artifacts(
//!     "me@example.com",
//!     &ArtifactFilter { favorite_only: true, ..Default::default() },
//!     SortOrder::Newest,
//! )?;
//! ```

use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{
    Artifact, ArtifactId, ArtifactPatch, CatalogStats, Collection, CollectionId, CollectionPatch,
    NewArtifact, NewCollection, TagId, TagUsage, DEFAULT_COLOR, DEFAULT_ICON,
};
use crate::naming;
use crate::query::{ArtifactFilter, ArtifactQuery, SortOrder};
use crate::storage::database::{
    self, collection_by_slug, collection_from_row, insert_artifact, to_millis,
    update_artifact_row, ArtifactRecord, COLLECTION_SELECT,
};
use crate::storage::error::is_unique_violation;
use crate::storage::{Database, StoreError, StoreResult};
use crate::tags;

/// Collections created for an owner whose catalog has none:
/// (name, color, icon)
pub const DEFAULT_COLLECTIONS: &[(&str, &str, &str)] = &[
    ("Code Snippets", "#10b981", "code"),
    ("Web Apps", "#6366f1", "globe"),
    ("Documents", "#f59e0b", "file-text"),
    ("Data & Analysis", "#ec4899", "bar-chart"),
    ("Experiments", "#8b5cf6", "flask"),
];

const DUPLICATE_COLLECTION: &str = "Collection with this name already exists";

/// Unified catalog interface
pub struct Store {
    db: Database,
    config: Config,
}

impl Store {
    /// Open the store using the configuration from the default location
    pub fn open() -> anyhow::Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config).context("Failed to open catalog database")
    }

    /// Open the store with a specific configuration
    pub fn open_with_config(config: Config) -> StoreResult<Self> {
        let db = Database::open(&config)?;
        debug!("Opened catalog at {:?}", config.sqlite_path());
        Ok(Self { db, config })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_in_memory_with_config(Config::default())
    }

    /// Open an in-memory store with a specific configuration (for testing)
    pub fn open_in_memory_with_config(config: Config) -> StoreResult<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn conn(&self) -> &Connection {
        self.db.connection()
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        self.db.connection_mut()
    }

    // ==================== Artifact Operations ====================

    /// Create an artifact.
    ///
    /// The name is sanitized and then made unique among the owner's
    /// artifacts ("Parser" becomes "Parser 2" if taken). Tags are resolved
    /// and linked in the same transaction as the insert.
    pub fn create_artifact(&mut self, owner: &str, input: NewArtifact) -> StoreResult<Artifact> {
        if input.name.trim().is_empty() {
            return Err(StoreError::validation("Name is required"));
        }
        if let Some(collection_id) = input.collection_id {
            self.ensure_collection_owned(owner, collection_id)?;
        }

        let existing = database::artifact_names(self.conn(), owner)?;
        let name = naming::generate_unique_name(&naming::sanitize_default(&input.name), &existing);

        let tx = self.conn_mut().transaction()?;
        let id = insert_artifact(
            &tx,
            owner,
            &ArtifactRecord {
                name: &name,
                input: &input,
                created_at: Utc::now(),
            },
        )?;
        tags::replace_tags(&tx, owner, id, &input.tags)?;
        tx.commit()?;

        info!("Created artifact {} ({:?})", id, name);
        self.get_artifact(owner, id)?.ok_or(StoreError::NotFound)
    }

    /// Get an artifact by id, with its tags and collection
    pub fn get_artifact(&self, owner: &str, id: ArtifactId) -> StoreResult<Option<Artifact>> {
        Ok(ArtifactQuery::for_owner(owner)
            .with_id(id)
            .fetch_one(self.conn())?)
    }

    /// List artifacts matching `filter`, favorites first
    pub fn list_artifacts(
        &self,
        owner: &str,
        filter: &ArtifactFilter,
        sort: SortOrder,
    ) -> StoreResult<Vec<Artifact>> {
        debug!("Listing artifacts: {:?}, sort={}", filter, sort);
        Ok(ArtifactQuery::for_owner(owner)
            .with_filter(filter)
            .sorted_by(sort)
            .fetch(self.conn())?)
    }

    /// Apply a partial update.
    ///
    /// A supplied name is sanitized but not made unique. A supplied tag list
    /// replaces the whole set.
    pub fn update_artifact(
        &mut self,
        owner: &str,
        id: ArtifactId,
        patch: ArtifactPatch,
    ) -> StoreResult<Artifact> {
        let mut artifact = self.get_artifact(owner, id)?.ok_or(StoreError::NotFound)?;

        if let Some(Some(collection_id)) = patch.collection_id {
            self.ensure_collection_owned(owner, collection_id)?;
        }

        if let Some(name) = patch.name {
            artifact.name = naming::sanitize_default(&name);
        }
        if let Some(v) = patch.description {
            artifact.description = v;
        }
        if let Some(v) = patch.artifact_type {
            artifact.artifact_type = v;
        }
        if let Some(v) = patch.source_type {
            artifact.source_type = v;
        }
        if let Some(v) = patch.published_url {
            artifact.published_url = v;
        }
        if let Some(v) = patch.artifact_id {
            artifact.artifact_id = v;
        }
        if let Some(v) = patch.file_name {
            artifact.file_name = v;
        }
        if let Some(v) = patch.file_size {
            artifact.file_size = v;
        }
        if let Some(v) = patch.file_content {
            artifact.file_content = v;
        }
        if let Some(v) = patch.language {
            artifact.language = v;
        }
        if let Some(v) = patch.framework {
            artifact.framework = v;
        }
        if let Some(v) = patch.claude_model {
            artifact.claude_model = v;
        }
        if let Some(v) = patch.conversation_url {
            artifact.conversation_url = v;
        }
        if let Some(v) = patch.notes {
            artifact.notes = v;
        }
        if let Some(v) = patch.collection_id {
            artifact.collection_id = v;
        }
        if let Some(v) = patch.is_favorite {
            artifact.is_favorite = v;
        }
        artifact.updated_at = Utc::now();

        let tx = self.conn_mut().transaction()?;
        if update_artifact_row(&tx, owner, &artifact)? == 0 {
            return Err(StoreError::NotFound);
        }
        if let Some(tag_names) = patch.tags {
            tags::replace_tags(&tx, owner, id, &tag_names)?;
        }
        tx.commit()?;

        info!("Updated artifact {}", id);
        self.get_artifact(owner, id)?.ok_or(StoreError::NotFound)
    }

    /// Delete an artifact and its tag links. Returns false if nothing matched.
    pub fn delete_artifact(&mut self, owner: &str, id: ArtifactId) -> StoreResult<bool> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "DELETE FROM artifact_tags WHERE artifact_id IN \
             (SELECT id FROM artifacts WHERE id = ?1 AND user_email = ?2)",
            params![id, owner],
        )?;
        let deleted = tx.execute(
            "DELETE FROM artifacts WHERE id = ?1 AND user_email = ?2",
            params![id, owner],
        )?;
        tx.commit()?;

        if deleted > 0 {
            info!("Deleted artifact {}", id);
        }
        Ok(deleted > 0)
    }

    /// Flip the favorite flag, returning the new state
    pub fn toggle_favorite(&mut self, owner: &str, id: ArtifactId) -> StoreResult<bool> {
        let state: Option<bool> = self
            .conn()
            .query_row(
                "UPDATE artifacts SET is_favorite = 1 - is_favorite, updated_at = ?1 \
                 WHERE id = ?2 AND user_email = ?3 RETURNING is_favorite",
                params![to_millis(Utc::now()), id, owner],
                |row| row.get(0),
            )
            .optional()?;

        state.ok_or(StoreError::NotFound)
    }

    // ==================== Collection Operations ====================

    /// Create a collection; its slug is derived from the name
    pub fn create_collection(
        &mut self,
        owner: &str,
        input: NewCollection,
    ) -> StoreResult<Collection> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("Name is required"));
        }
        let slug = naming::slugify(name);
        if slug.is_empty() {
            return Err(StoreError::validation(
                "Collection name must contain letters or digits",
            ));
        }

        let result = self.conn().execute(
            "INSERT INTO collections (name, slug, description, color, icon, user_email, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                name,
                slug,
                input.description,
                input.color.as_deref().unwrap_or(DEFAULT_COLOR),
                input.icon.as_deref().unwrap_or(DEFAULT_ICON),
                owner,
                to_millis(Utc::now()),
            ],
        );
        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Conflict(DUPLICATE_COLLECTION.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        info!("Created collection {:?}", slug);
        self.get_collection(owner, &slug)?.ok_or(StoreError::NotFound)
    }

    /// Get a collection by slug
    pub fn get_collection(&self, owner: &str, slug: &str) -> StoreResult<Option<Collection>> {
        Ok(collection_by_slug(self.conn(), owner, slug)?)
    }

    /// All collections, ordered by name, with artifact counts
    pub fn list_collections(&self, owner: &str) -> StoreResult<Vec<Collection>> {
        let mut stmt = self.conn().prepare(&format!(
            "{COLLECTION_SELECT} WHERE c.user_email = ?1 ORDER BY c.name ASC, c.id ASC"
        ))?;
        let collections = stmt
            .query_map(params![owner], collection_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(collections)
    }

    /// Apply a partial update. Renaming re-derives the slug.
    pub fn update_collection(
        &mut self,
        owner: &str,
        slug: &str,
        patch: CollectionPatch,
    ) -> StoreResult<Collection> {
        let mut collection = self
            .get_collection(owner, slug)?
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(StoreError::validation("Name is required"));
            }
            let new_slug = naming::slugify(name);
            if new_slug.is_empty() {
                return Err(StoreError::validation(
                    "Collection name must contain letters or digits",
                ));
            }
            collection.name = name.to_string();
            collection.slug = new_slug;
        }
        if let Some(v) = patch.description {
            collection.description = v;
        }
        if let Some(v) = patch.color {
            collection.color = v;
        }
        if let Some(v) = patch.icon {
            collection.icon = v;
        }

        let result = self.conn().execute(
            "UPDATE collections SET name = ?1, slug = ?2, description = ?3, color = ?4, icon = ?5 \
             WHERE id = ?6 AND user_email = ?7",
            params![
                collection.name,
                collection.slug,
                collection.description,
                collection.color,
                collection.icon,
                collection.id,
                owner,
            ],
        );
        match result {
            Ok(0) => return Err(StoreError::NotFound),
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Conflict(DUPLICATE_COLLECTION.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        info!("Updated collection {:?}", collection.slug);
        self.get_collection(owner, &collection.slug)?
            .ok_or(StoreError::NotFound)
    }

    /// Delete a collection. Its artifacts are kept, uncollected.
    pub fn delete_collection(&mut self, owner: &str, slug: &str) -> StoreResult<bool> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "UPDATE artifacts SET collection_id = NULL WHERE user_email = ?1 AND collection_id IN \
             (SELECT id FROM collections WHERE slug = ?2 AND user_email = ?1)",
            params![owner, slug],
        )?;
        let deleted = tx.execute(
            "DELETE FROM collections WHERE slug = ?1 AND user_email = ?2",
            params![slug, owner],
        )?;
        tx.commit()?;

        if deleted > 0 {
            info!("Deleted collection {:?}", slug);
        }
        Ok(deleted > 0)
    }

    /// Create the starter collections if the owner has none.
    ///
    /// Returns how many were created.
    pub fn ensure_default_collections(&mut self, owner: &str) -> StoreResult<usize> {
        let existing: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM collections WHERE user_email = ?1",
            params![owner],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(0);
        }

        for (name, color, icon) in DEFAULT_COLLECTIONS {
            self.create_collection(
                owner,
                NewCollection {
                    name: name.to_string(),
                    description: None,
                    color: Some(color.to_string()),
                    icon: Some(icon.to_string()),
                },
            )?;
        }

        info!("Created {} default collections", DEFAULT_COLLECTIONS.len());
        Ok(DEFAULT_COLLECTIONS.len())
    }

    fn ensure_collection_owned(&self, owner: &str, id: CollectionId) -> StoreResult<()> {
        let exists = self
            .conn()
            .prepare("SELECT 1 FROM collections WHERE id = ?1 AND user_email = ?2")?
            .exists(params![id, owner])?;
        if exists {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    // ==================== Tag Operations ====================

    /// Resolve (find or create) one of the owner's tags
    pub fn resolve_tag(&mut self, owner: &str, name: &str) -> StoreResult<TagId> {
        tags::resolve_tag(self.conn(), owner, name)
    }

    /// All tags with usage counts, most used first
    pub fn list_tags(&self, owner: &str) -> StoreResult<Vec<TagUsage>> {
        tags::list_tags(self.conn(), owner)
    }

    /// Delete a tag and unlink it everywhere
    pub fn delete_tag(&mut self, owner: &str, name: &str) -> StoreResult<bool> {
        let tx = self.conn_mut().transaction()?;
        let deleted = tags::delete_tag(&tx, owner, name)?;
        tx.commit()?;

        if deleted {
            info!("Deleted tag {:?}", name);
        }
        Ok(deleted)
    }

    // ==================== Stats ====================

    /// Catalog counters for an owner
    pub fn stats(&self, owner: &str) -> StoreResult<CatalogStats> {
        let conn = self.conn();

        let (total_artifacts, published_count, downloaded_count, favorites_count): (
            i64,
            i64,
            i64,
            i64,
        ) = conn
            .query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(source_type = 'published'), 0),
                       COALESCE(SUM(source_type = 'downloaded'), 0),
                       COALESCE(SUM(is_favorite), 0)
                FROM artifacts WHERE user_email = ?1
                "#,
                params![owner],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let total_collections = conn.query_row(
            "SELECT COUNT(*) FROM collections WHERE user_email = ?1",
            params![owner],
            |row| row.get(0),
        )?;

        let total_tags = conn.query_row(
            "SELECT COUNT(DISTINCT atg.tag_id) FROM artifact_tags atg \
             JOIN artifacts a ON atg.artifact_id = a.id WHERE a.user_email = ?1",
            params![owner],
            |row| row.get(0),
        )?;

        Ok(CatalogStats {
            total_artifacts,
            published_count,
            downloaded_count,
            favorites_count,
            total_collections,
            total_tags,
        })
    }
}
