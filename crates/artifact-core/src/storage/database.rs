//! SQLite connection handling and row mapping
//!
//! Owns the catalog connection and the conversions between SQLite rows and
//! the model types. Higher layers (`store`, `query`, `tags`) issue their own
//! statements against [`Database::connection`].

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::config::Config;
use crate::models::{
    Artifact, ArtifactId, ArtifactType, Collection, CollectionId, CollectionRef, NewArtifact,
    ShareSettings, SourceType,
};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::schema::{init_schema, needs_init};

/// Separator used when aggregating tag names with GROUP_CONCAT.
/// Tag names may contain commas.
pub(crate) const TAG_SEPARATOR: char = '\u{1f}';

/// SQLite-backed catalog database
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the SQLite database under the configured data directory
    pub fn open(config: &Config) -> StoreResult<Self> {
        let path = config.sqlite_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(&path)?;
        Self::prepare(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a mutable reference (needed to start transactions)
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

// ==================== Timestamps ====================

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

fn from_millis_opt(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(DateTime::from_timestamp_millis)
}

// ==================== Artifact rows ====================

/// Columns selected for an artifact row, in the order [`artifact_from_row`]
/// reads them. Expects `artifacts a LEFT JOIN collections c`.
pub(crate) const ARTIFACT_COLUMNS: &str = "a.id, a.name, a.description, a.artifact_type, \
     a.source_type, a.published_url, a.artifact_id, a.file_name, a.file_size, a.file_content, \
     a.language, a.framework, a.claude_model, a.conversation_url, a.notes, a.collection_id, \
     a.is_favorite, a.share_token, a.shared_at, a.created_at, a.updated_at, \
     a.artifact_created_at, c.name, c.slug, c.color";

/// Number of columns in [`ARTIFACT_COLUMNS`]; the aggregated tag list follows
const ARTIFACT_COLUMN_COUNT: usize = 25;

/// Map a row selected with [`ARTIFACT_COLUMNS`] plus a trailing aggregated
/// tag column
pub(crate) fn artifact_from_row(row: &Row) -> rusqlite::Result<Artifact> {
    let artifact_type: String = row.get(3)?;
    let source_type: String = row.get(4)?;
    let collection_id: Option<CollectionId> = row.get(15)?;

    let collection = match (
        collection_id,
        row.get::<_, Option<String>>(22)?,
        row.get::<_, Option<String>>(23)?,
        row.get::<_, Option<String>>(24)?,
    ) {
        (Some(id), Some(name), Some(slug), Some(color)) => Some(CollectionRef {
            id,
            name,
            slug,
            color,
        }),
        _ => None,
    };

    let tag_names: Option<String> = row.get(ARTIFACT_COLUMN_COUNT)?;

    Ok(Artifact {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        artifact_type: ArtifactType::from_label(&artifact_type),
        source_type: source_type.parse().unwrap_or_default(),
        published_url: row.get(5)?,
        artifact_id: row.get(6)?,
        file_name: row.get(7)?,
        file_size: row.get(8)?,
        file_content: row.get(9)?,
        language: row.get(10)?,
        framework: row.get(11)?,
        claude_model: row.get(12)?,
        conversation_url: row.get(13)?,
        notes: row.get(14)?,
        collection_id: collection.as_ref().map(|c| c.id),
        collection,
        tags: split_tag_names(tag_names.as_deref()),
        is_favorite: row.get(16)?,
        share_token: row.get(17)?,
        shared_at: from_millis_opt(row.get(18)?),
        created_at: from_millis(row.get(19)?),
        updated_at: from_millis(row.get(20)?),
        artifact_created_at: from_millis_opt(row.get(21)?),
    })
}

/// Split an aggregated tag column into sorted, de-duplicated names
pub(crate) fn split_tag_names(joined: Option<&str>) -> Vec<String> {
    let mut tags: Vec<String> = joined
        .unwrap_or("")
        .split(TAG_SEPARATOR)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Resolved field values for an artifact insert
pub(crate) struct ArtifactRecord<'a> {
    pub name: &'a str,
    pub input: &'a NewArtifact,
    pub created_at: DateTime<Utc>,
}

/// Insert an artifact row and return its id. Tags are linked separately.
pub(crate) fn insert_artifact(
    conn: &Connection,
    owner: &str,
    record: &ArtifactRecord,
) -> rusqlite::Result<ArtifactId> {
    let input = record.input;
    let now = to_millis(Utc::now());

    conn.execute(
        r#"
        INSERT INTO artifacts (
            name, description, artifact_type, source_type,
            published_url, artifact_id, file_name, file_size, file_content,
            language, framework, claude_model, conversation_url, notes,
            collection_id, user_email, is_favorite, artifact_created_at,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            record.name,
            input.description,
            input.artifact_type.unwrap_or_default().as_str(),
            input.source_type.unwrap_or_default().as_str(),
            input.published_url,
            input.artifact_id,
            input.file_name,
            input.file_size,
            input.file_content,
            input.language,
            input.framework,
            input.claude_model,
            input.conversation_url,
            input.notes,
            input.collection_id,
            owner,
            input.is_favorite,
            input.artifact_created_at.map(to_millis),
            to_millis(record.created_at),
            now,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Write every mutable column of `artifact` back to its row.
///
/// Returns the number of rows changed (0 if the id is not owned by `owner`).
pub(crate) fn update_artifact_row(
    conn: &Connection,
    owner: &str,
    artifact: &Artifact,
) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        UPDATE artifacts SET
            name = ?, description = ?, artifact_type = ?, source_type = ?,
            published_url = ?, artifact_id = ?, file_name = ?, file_size = ?, file_content = ?,
            language = ?, framework = ?, claude_model = ?, conversation_url = ?, notes = ?,
            collection_id = ?, is_favorite = ?, updated_at = ?
        WHERE id = ? AND user_email = ?
        "#,
        params![
            artifact.name,
            artifact.description,
            artifact.artifact_type.as_str(),
            artifact.source_type.as_str(),
            artifact.published_url,
            artifact.artifact_id,
            artifact.file_name,
            artifact.file_size,
            artifact.file_content,
            artifact.language,
            artifact.framework,
            artifact.claude_model,
            artifact.conversation_url,
            artifact.notes,
            artifact.collection_id,
            artifact.is_favorite,
            to_millis(artifact.updated_at),
            artifact.id,
            owner,
        ],
    )
}

/// All artifact names for an owner
pub(crate) fn artifact_names(conn: &Connection, owner: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM artifacts WHERE user_email = ?")?;
    let names = stmt
        .query_map(params![owner], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

// ==================== Collection rows ====================

/// Collection select with a derived artifact count; append a WHERE clause
pub(crate) const COLLECTION_SELECT: &str = r#"
    SELECT c.id, c.name, c.slug, c.description, c.color, c.icon, c.is_public,
           c.share_token, c.share_settings, c.shared_at, c.created_at,
           (SELECT COUNT(*) FROM artifacts a
            WHERE a.collection_id = c.id AND a.user_email = c.user_email) AS artifact_count,
           c.user_email
    FROM collections c
"#;

/// Map a row selected with [`COLLECTION_SELECT`]
pub(crate) fn collection_from_row(row: &Row) -> rusqlite::Result<Collection> {
    let settings: Option<String> = row.get(8)?;

    Ok(Collection {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        icon: row.get(5)?,
        is_public: row.get(6)?,
        share_token: row.get(7)?,
        share_settings: settings
            .as_deref()
            .map(|raw| ShareSettings::from_stored(Some(raw))),
        shared_at: from_millis_opt(row.get(9)?),
        created_at: from_millis(row.get(10)?),
        artifact_count: row.get(11)?,
    })
}

/// Fetch one owner's collection by slug
pub(crate) fn collection_by_slug(
    conn: &Connection,
    owner: &str,
    slug: &str,
) -> rusqlite::Result<Option<Collection>> {
    conn.query_row(
        &format!("{COLLECTION_SELECT} WHERE c.slug = ?1 AND c.user_email = ?2"),
        params![slug, owner],
        collection_from_row,
    )
    .optional()
}

/// Fetch a public collection by share token, with its owner
pub(crate) fn public_collection_by_token(
    conn: &Connection,
    token: &str,
) -> rusqlite::Result<Option<(Collection, String)>> {
    conn.query_row(
        &format!("{COLLECTION_SELECT} WHERE c.share_token = ?1 AND c.is_public = 1"),
        params![token],
        |row| Ok((collection_from_row(row)?, row.get(12)?)),
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_initializes_schema() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i64 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_open_on_disk_creates_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().join("nested"),
            ..Config::default()
        };

        Database::open(&config).unwrap();
        assert!(config.sqlite_path().exists());

        // Reopening an initialized database works
        Database::open(&config).unwrap();
    }

    #[test]
    fn test_split_tag_names() {
        let joined = format!("rust{0}cli{0}rust", TAG_SEPARATOR);
        assert_eq!(split_tag_names(Some(&joined)), vec!["cli", "rust"]);
        assert!(split_tag_names(None).is_empty());
        assert!(split_tag_names(Some("")).is_empty());
    }

    #[test]
    fn test_tag_names_with_commas_survive() {
        let joined = format!("a, b{}c", TAG_SEPARATOR);
        assert_eq!(split_tag_names(Some(&joined)), vec!["a, b", "c"]);
    }

    #[test]
    fn test_millis_round_trip() {
        let now = Utc::now();
        let back = from_millis(to_millis(now));
        assert_eq!(back.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn test_insert_artifact_row() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let input = NewArtifact::new("ignored");
        let id = insert_artifact(
            conn,
            "a@example.com",
            &ArtifactRecord {
                name: "Stored Name",
                input: &input,
                created_at: Utc::now(),
            },
        )
        .unwrap();

        assert_eq!(
            artifact_names(conn, "a@example.com").unwrap(),
            vec!["Stored Name"]
        );
        assert!(artifact_names(conn, "b@example.com").unwrap().is_empty());

        let kind: String = conn
            .query_row(
                "SELECT artifact_type FROM artifacts WHERE id = ?",
                [id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(kind, "code");
    }
}
