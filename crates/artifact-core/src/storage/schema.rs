//! SQLite schema for the artifact catalog
//!
//! Every owned table carries `user_email`; all reads and writes filter on it.
//! Share tokens are unique across the whole table because they are the only
//! key the public pages look rows up by.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Collections (folders)
        CREATE TABLE IF NOT EXISTS collections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            description TEXT,
            color TEXT NOT NULL DEFAULT '#6366f1',
            icon TEXT NOT NULL DEFAULT 'folder',
            is_public INTEGER NOT NULL DEFAULT 0,
            share_token TEXT UNIQUE,
            share_settings TEXT,
            shared_at INTEGER,
            user_email TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE (slug, user_email)
        );

        -- Artifacts
        CREATE TABLE IF NOT EXISTS artifacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            artifact_type TEXT NOT NULL DEFAULT 'code',
            source_type TEXT NOT NULL DEFAULT 'published',
            published_url TEXT,
            artifact_id TEXT,
            file_name TEXT,
            file_size INTEGER,
            file_content TEXT,
            language TEXT,
            framework TEXT,
            claude_model TEXT,
            conversation_url TEXT,
            notes TEXT,
            collection_id INTEGER,
            is_favorite INTEGER NOT NULL DEFAULT 0,
            share_token TEXT UNIQUE,
            shared_at INTEGER,
            user_email TEXT NOT NULL,
            artifact_created_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE SET NULL
        );

        -- Tags (normalized, per owner)
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            user_email TEXT NOT NULL,
            UNIQUE (name, user_email)
        );

        -- Artifact-tag junction table (many-to-many)
        CREATE TABLE IF NOT EXISTS artifact_tags (
            artifact_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY (artifact_id, tag_id),
            FOREIGN KEY (artifact_id) REFERENCES artifacts(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        );

        -- Indexes for common query patterns
        CREATE INDEX IF NOT EXISTS idx_artifacts_user ON artifacts(user_email);
        CREATE INDEX IF NOT EXISTS idx_artifacts_collection ON artifacts(collection_id);
        CREATE INDEX IF NOT EXISTS idx_artifacts_created_at ON artifacts(created_at);
        CREATE INDEX IF NOT EXISTS idx_artifacts_updated_at ON artifacts(updated_at);
        CREATE INDEX IF NOT EXISTS idx_artifacts_name ON artifacts(user_email, name);
        CREATE INDEX IF NOT EXISTS idx_collections_user ON collections(user_email);
        CREATE INDEX IF NOT EXISTS idx_tags_user ON tags(user_email);
        CREATE INDEX IF NOT EXISTS idx_artifact_tags_tag_id ON artifact_tags(tag_id);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"artifacts".to_string()));
        assert!(tables.contains(&"collections".to_string()));
        assert!(tables.contains(&"tags".to_string()));
        assert!(tables.contains(&"artifact_tags".to_string()));
    }

    #[test]
    fn test_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_init(&conn));

        init_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
        assert!(!needs_init(&conn));
    }

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_tag_unique_per_owner() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO tags (name, user_email) VALUES ('rust', 'a@example.com')",
            [],
        )
        .unwrap();
        // Same name, different owner is fine
        conn.execute(
            "INSERT INTO tags (name, user_email) VALUES ('rust', 'b@example.com')",
            [],
        )
        .unwrap();
        // Same (name, owner) is rejected
        assert!(conn
            .execute(
                "INSERT INTO tags (name, user_email) VALUES ('rust', 'a@example.com')",
                [],
            )
            .is_err());
    }

    #[test]
    fn test_share_token_unique_across_owners() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let insert = "INSERT INTO artifacts (name, user_email, share_token, created_at, updated_at) \
                      VALUES (?, ?, ?, 0, 0)";
        conn.execute(insert, ["One", "a@example.com", "abcdefghijkl"])
            .unwrap();
        assert!(conn
            .execute(insert, ["Two", "b@example.com", "abcdefghijkl"])
            .is_err());
    }

    #[test]
    fn test_indexes_exist() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.contains(&"idx_artifacts_user".to_string()));
        assert!(indexes.contains(&"idx_artifact_tags_tag_id".to_string()));
    }
}
