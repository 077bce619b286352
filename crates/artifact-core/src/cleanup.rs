//! Placeholder name cleanup
//!
//! Older clients could store transient labels ("Saving...", "Untitled 3")
//! as names. Scanning lists them; fixing renames each one after its type
//! ("Code", "Code 2", ...).

use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{ArtifactId, ArtifactType};
use crate::naming;
use crate::storage::database::{self, to_millis};
use crate::storage::StoreResult;
use crate::store::Store;

/// An artifact whose name is a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderArtifact {
    pub id: ArtifactId,
    pub name: String,
    pub artifact_type: ArtifactType,
}

impl Store {
    /// List the owner's artifacts whose names are placeholders
    pub fn scan_placeholders(&self, owner: &str) -> StoreResult<Vec<PlaceholderArtifact>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, artifact_type FROM artifacts WHERE user_email = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![owner], |row| {
                let kind: String = row.get(2)?;
                Ok(PlaceholderArtifact {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    artifact_type: ArtifactType::from_label(&kind),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter(|a| naming::is_placeholder(&a.name))
            .collect())
    }

    /// Rename every placeholder to a unique name derived from its type.
    ///
    /// Returns the number of artifacts renamed.
    pub fn fix_placeholders(&mut self, owner: &str) -> StoreResult<usize> {
        let placeholders = self.scan_placeholders(owner)?;
        if placeholders.is_empty() {
            return Ok(0);
        }

        let mut existing = database::artifact_names(self.conn(), owner)?;
        let now = to_millis(Utc::now());

        let tx = self.conn_mut().transaction()?;
        for placeholder in &placeholders {
            let name =
                naming::generate_unique_name(placeholder.artifact_type.label(), &existing);
            tx.execute(
                "UPDATE artifacts SET name = ?1, updated_at = ?2 WHERE id = ?3 AND user_email = ?4",
                params![name, now, placeholder.id, owner],
            )?;
            existing.push(name);
        }
        tx.commit()?;

        info!("Renamed {} placeholder artifacts", placeholders.len());
        Ok(placeholders.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewArtifact;
    use crate::query::{ArtifactFilter, SortOrder};

    const OWNER: &str = "me@example.com";

    /// Insert a row directly, bypassing the sanitizer
    fn insert_raw(store: &Store, owner: &str, name: &str, kind: &str) -> ArtifactId {
        store
            .conn()
            .execute(
                "INSERT INTO artifacts (name, artifact_type, user_email, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, 0, 0)",
                params![name, kind, owner],
            )
            .unwrap();
        store.conn().last_insert_rowid()
    }

    #[test]
    fn test_scan_finds_only_placeholders() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .create_artifact(OWNER, NewArtifact::new("Real Name"))
            .unwrap();
        let saving = insert_raw(&store, OWNER, "Saving...", "code");
        let untitled = insert_raw(&store, OWNER, "Untitled 3", "html");
        insert_raw(&store, OWNER, "Untitled Project", "code");
        insert_raw(&store, "other@example.com", "Loading...", "code");

        let found = store.scan_placeholders(OWNER).unwrap();
        assert_eq!(
            found,
            vec![
                PlaceholderArtifact {
                    id: saving,
                    name: "Saving...".into(),
                    artifact_type: ArtifactType::Code,
                },
                PlaceholderArtifact {
                    id: untitled,
                    name: "Untitled 3".into(),
                    artifact_type: ArtifactType::Html,
                },
            ]
        );
    }

    #[test]
    fn test_fix_renames_by_type_label() {
        let mut store = Store::open_in_memory().unwrap();
        store.create_artifact(OWNER, NewArtifact::new("Code")).unwrap();
        insert_raw(&store, OWNER, "Saving...", "code");
        insert_raw(&store, OWNER, "Loading...", "code");
        insert_raw(&store, OWNER, "", "document");
        insert_raw(&store, OWNER, "New Artifact", "html");

        assert_eq!(store.fix_placeholders(OWNER).unwrap(), 4);
        assert!(store.scan_placeholders(OWNER).unwrap().is_empty());

        let mut names: Vec<String> = store
            .list_artifacts(OWNER, &ArtifactFilter::default(), SortOrder::Name)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Code", "Code 2", "Code 3", "Document", "HTML"]);
    }

    #[test]
    fn test_fix_with_nothing_to_do() {
        let mut store = Store::open_in_memory().unwrap();
        store.create_artifact(OWNER, NewArtifact::new("Fine")).unwrap();
        assert_eq!(store.fix_placeholders(OWNER).unwrap(), 0);
    }

    #[test]
    fn test_fix_leaves_other_owners_alone() {
        let mut store = Store::open_in_memory().unwrap();
        let theirs = insert_raw(&store, "other@example.com", "Saving...", "code");

        assert_eq!(store.fix_placeholders(OWNER).unwrap(), 0);
        let name: String = store
            .conn()
            .query_row("SELECT name FROM artifacts WHERE id = ?1", [theirs], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "Saving...");
    }
}
