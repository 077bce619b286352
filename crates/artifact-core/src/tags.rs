//! Tag resolution
//!
//! Tags are normalized per owner: one row per (name, owner), linked to
//! artifacts through `artifact_tags`. Resolution is an upsert, so two
//! writers racing on the same new name both end up with the same id.

use rusqlite::{params, Connection};

use crate::models::{ArtifactId, TagId, TagUsage};
use crate::storage::error::{StoreError, StoreResult};

/// Return the id of the owner's tag `name`, creating it if needed.
///
/// Names are trimmed; matching after that is exact.
pub fn resolve_tag(conn: &Connection, owner: &str, name: &str) -> StoreResult<TagId> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::validation("Tag name cannot be empty"));
    }

    conn.execute(
        "INSERT INTO tags (name, user_email) VALUES (?1, ?2) \
         ON CONFLICT(name, user_email) DO NOTHING",
        params![name, owner],
    )?;

    let id = conn.query_row(
        "SELECT id FROM tags WHERE name = ?1 AND user_email = ?2",
        params![name, owner],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Link a tag to an artifact. Returns false if the link already existed.
pub fn link_tag(conn: &Connection, artifact_id: ArtifactId, tag_id: TagId) -> StoreResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO artifact_tags (artifact_id, tag_id) VALUES (?1, ?2)",
        params![artifact_id, tag_id],
    )?;
    Ok(inserted > 0)
}

/// Replace an artifact's tag set with `names`.
///
/// Blank names are dropped and duplicates collapse to one link. Returns the
/// resulting tag names, sorted.
pub fn replace_tags<S: AsRef<str>>(
    conn: &Connection,
    owner: &str,
    artifact_id: ArtifactId,
    names: &[S],
) -> StoreResult<Vec<String>> {
    conn.execute(
        "DELETE FROM artifact_tags WHERE artifact_id = ?1",
        params![artifact_id],
    )?;

    let mut applied: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        let tag_id = resolve_tag(conn, owner, name)?;
        if link_tag(conn, artifact_id, tag_id)? {
            applied.push(name.to_string());
        }
    }

    applied.sort();
    Ok(applied)
}

/// Delete an owner's tag and all its links. Returns false if it didn't exist.
pub fn delete_tag(conn: &Connection, owner: &str, name: &str) -> StoreResult<bool> {
    conn.execute(
        "DELETE FROM artifact_tags WHERE tag_id IN \
         (SELECT id FROM tags WHERE name = ?1 AND user_email = ?2)",
        params![name.trim(), owner],
    )?;
    let deleted = conn.execute(
        "DELETE FROM tags WHERE name = ?1 AND user_email = ?2",
        params![name.trim(), owner],
    )?;
    Ok(deleted > 0)
}

/// All of an owner's tags with usage counts, most used first
pub fn list_tags(conn: &Connection, owner: &str) -> StoreResult<Vec<TagUsage>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.id, t.name, COUNT(atg.artifact_id) AS usage_count
        FROM tags t
        LEFT JOIN artifact_tags atg ON atg.tag_id = t.id
        WHERE t.user_email = ?1
        GROUP BY t.id
        ORDER BY usage_count DESC, t.name ASC
        "#,
    )?;

    let tags = stmt
        .query_map(params![owner], |row| {
            Ok(TagUsage {
                id: row.get(0)?,
                name: row.get(1)?,
                usage_count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}
