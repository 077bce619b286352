//! Capability-token sharing
//!
//! Two kinds of share exist. An artifact share mints a short alphanumeric
//! token that publishes one artifact at `/render/{token}`. A collection
//! share mints a UUIDv4 token that publishes the whole collection at
//! `/share/{token}`. Knowing the token is the only access check on the
//! public side; revoking clears it and the next lookup misses.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Artifact, ArtifactId, ArtifactType, ShareSettings};
use crate::pages::{self, Page};
use crate::query::ArtifactQuery;
use crate::storage::database::{collection_by_slug, public_collection_by_token, to_millis};
use crate::storage::error::is_unique_violation;
use crate::storage::{StoreError, StoreResult};
use crate::store::Store;

/// Length of an artifact render token
pub const ARTIFACT_TOKEN_LEN: usize = 12;

/// Group name for artifacts without tags on a share page
pub const UNCATEGORIZED: &str = "Uncategorized";

const MAX_TOKEN_ATTEMPTS: usize = 5;

/// Mint an artifact render token: 12 alphanumeric chars from the thread CSPRNG
pub fn generate_artifact_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ARTIFACT_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Mint a collection share token
pub fn generate_collection_token() -> String {
    Uuid::new_v4().to_string()
}

/// A minted artifact share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactShare {
    pub token: String,
    pub url: String,
}

/// Current share state of an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareStatus {
    pub is_shared: bool,
    pub share_token: Option<String>,
    pub shared_at: Option<DateTime<Utc>>,
    pub render_url: Option<String>,
}

/// Current share state of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionShareStatus {
    pub is_public: bool,
    pub share_token: Option<String>,
    pub share_url: Option<String>,
    pub shared_at: Option<DateTime<Utc>>,
    pub settings: Option<ShareSettings>,
}

/// A minted collection share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionShare {
    pub token: String,
    pub url: String,
    pub settings: ShareSettings,
}

/// The public fields of an artifact, as shown on a share page.
///
/// File content is intentionally absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicCard {
    pub name: String,
    pub description: Option<String>,
    pub artifact_type: ArtifactType,
    pub language: Option<String>,
    pub published_url: Option<String>,
    pub conversation_url: Option<String>,
}

impl From<&Artifact> for PublicCard {
    fn from(artifact: &Artifact) -> Self {
        Self {
            name: artifact.name.clone(),
            description: artifact.description.clone(),
            artifact_type: artifact.artifact_type,
            language: artifact.language.clone(),
            published_url: artifact.published_url.clone(),
            conversation_url: artifact.conversation_url.clone(),
        }
    }
}

/// Cards sharing one tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagGroup {
    pub tag: String,
    pub cards: Vec<PublicCard>,
}

/// A public collection as the share page shows it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedCollection {
    pub name: String,
    pub description: Option<String>,
    pub settings: ShareSettings,
    pub groups: Vec<TagGroup>,
}

impl SharedCollection {
    /// Total cards across groups (an artifact counts once per tag)
    pub fn card_count(&self) -> usize {
        self.groups.iter().map(|g| g.cards.len()).sum()
    }
}

/// Group artifacts by tag.
///
/// An artifact appears in every one of its tags' groups; untagged artifacts
/// go to [`UNCATEGORIZED`]. Groups keep first-seen order and artifacts keep
/// input order.
pub fn group_by_tag(artifacts: &[Artifact]) -> Vec<TagGroup> {
    let mut groups: Vec<TagGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for artifact in artifacts {
        let uncategorized = [UNCATEGORIZED.to_string()];
        let tags: &[String] = if artifact.tags.is_empty() {
            &uncategorized
        } else {
            &artifact.tags
        };

        for tag in tags {
            let slot = *index.entry(tag.clone()).or_insert_with(|| {
                groups.push(TagGroup {
                    tag: tag.clone(),
                    cards: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].cards.push(PublicCard::from(artifact));
        }
    }

    groups
}

impl Store {
    // ==================== Artifact render sharing ====================

    /// Mint a new render token for an artifact, replacing any previous one
    pub fn share_artifact(&mut self, owner: &str, id: ArtifactId) -> StoreResult<ArtifactShare> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = generate_artifact_token();
            let result = self.conn().execute(
                "UPDATE artifacts SET share_token = ?1, shared_at = ?2, updated_at = ?2 \
                 WHERE id = ?3 AND user_email = ?4",
                params![token, to_millis(Utc::now()), id, owner],
            );

            match result {
                Ok(0) => return Err(StoreError::NotFound),
                Ok(_) => {
                    info!("Shared artifact {}", id);
                    let url = self.config().public_url(&format!("/render/{}", token));
                    return Ok(ArtifactShare { token, url });
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!("Share token collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Conflict(
            "Could not mint a unique share token".to_string(),
        ))
    }

    /// Revoke an artifact's render token
    pub fn unshare_artifact(&mut self, owner: &str, id: ArtifactId) -> StoreResult<()> {
        let updated = self.conn().execute(
            "UPDATE artifacts SET share_token = NULL, shared_at = NULL, updated_at = ?1 \
             WHERE id = ?2 AND user_email = ?3",
            params![to_millis(Utc::now()), id, owner],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }

        info!("Unshared artifact {}", id);
        Ok(())
    }

    /// Report an artifact's share state without minting
    pub fn share_status(&self, owner: &str, id: ArtifactId) -> StoreResult<ShareStatus> {
        let artifact = self.get_artifact(owner, id)?.ok_or(StoreError::NotFound)?;
        let render_url = artifact
            .share_token
            .as_ref()
            .map(|token| self.config().public_url(&format!("/render/{}", token)));

        Ok(ShareStatus {
            is_shared: artifact.share_token.is_some(),
            share_token: artifact.share_token,
            shared_at: artifact.shared_at,
            render_url,
        })
    }

    /// Look up an artifact by render token. No owner is involved.
    pub fn shared_artifact(&self, token: &str) -> StoreResult<Option<Artifact>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(ArtifactQuery::by_share_token(token).fetch_one(self.conn())?)
    }

    /// Render the public page for an artifact token
    pub fn render_artifact_page(&self, token: &str) -> StoreResult<Page> {
        match self.shared_artifact(token)? {
            Some(artifact) => Ok(pages::artifact_page(&artifact)),
            None => {
                debug!("Render token did not resolve");
                Ok(pages::artifact_not_found())
            }
        }
    }

    // ==================== Collection page sharing ====================

    /// Publish a collection under a fresh token with the given display settings
    pub fn share_collection(
        &mut self,
        owner: &str,
        slug: &str,
        settings: ShareSettings,
    ) -> StoreResult<CollectionShare> {
        let stored_settings = serde_json::to_string(&settings)?;

        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = generate_collection_token();
            let result = self.conn().execute(
                "UPDATE collections SET is_public = 1, share_token = ?1, share_settings = ?2, \
                 shared_at = ?3 WHERE slug = ?4 AND user_email = ?5",
                params![token, stored_settings, to_millis(Utc::now()), slug, owner],
            );

            match result {
                Ok(0) => return Err(StoreError::NotFound),
                Ok(_) => {
                    info!("Shared collection {:?}", slug);
                    let url = self.config().public_url(&format!("/share/{}", token));
                    return Ok(CollectionShare {
                        token,
                        url,
                        settings,
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!("Share token collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Conflict(
            "Could not mint a unique share token".to_string(),
        ))
    }

    /// Make a collection private again
    pub fn unshare_collection(&mut self, owner: &str, slug: &str) -> StoreResult<()> {
        let updated = self.conn().execute(
            "UPDATE collections SET is_public = 0, share_token = NULL, share_settings = NULL, \
             shared_at = NULL WHERE slug = ?1 AND user_email = ?2",
            params![slug, owner],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }

        info!("Unshared collection {:?}", slug);
        Ok(())
    }

    /// Report a collection's share state without minting.
    ///
    /// A token left on a private row is not reported; it no longer resolves.
    pub fn collection_share_status(
        &self,
        owner: &str,
        slug: &str,
    ) -> StoreResult<CollectionShareStatus> {
        let collection =
            collection_by_slug(self.conn(), owner, slug)?.ok_or(StoreError::NotFound)?;
        if !collection.is_public {
            return Ok(CollectionShareStatus {
                is_public: false,
                share_token: None,
                share_url: None,
                shared_at: None,
                settings: None,
            });
        }

        let share_url = collection
            .share_token
            .as_ref()
            .map(|token| self.config().public_url(&format!("/share/{}", token)));

        Ok(CollectionShareStatus {
            is_public: collection.share_token.is_some(),
            share_token: collection.share_token,
            share_url,
            shared_at: collection.shared_at,
            settings: collection.share_settings,
        })
    }

    /// Load a public collection by token, grouped for display
    pub fn shared_collection(&self, token: &str) -> StoreResult<Option<SharedCollection>> {
        if token.is_empty() {
            return Ok(None);
        }
        let Some((collection, owner)) = public_collection_by_token(self.conn(), token)? else {
            return Ok(None);
        };

        let mut artifacts = ArtifactQuery::for_owner(&owner)
            .in_collection(collection.id)
            .fetch(self.conn())?;
        // Newest first; favorites get no special placement here
        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(Some(SharedCollection {
            name: collection.name,
            description: collection.description,
            settings: collection.share_settings.unwrap_or_default(),
            groups: group_by_tag(&artifacts),
        }))
    }

    /// Render the public page for a collection token
    pub fn render_share_page(&self, token: &str) -> StoreResult<Page> {
        match self.shared_collection(token)? {
            Some(shared) => Ok(pages::share_page(&shared)),
            None => {
                debug!("Share token did not resolve");
                Ok(pages::collection_not_found())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{NewArtifact, NewCollection, ShareLayout};

    const OWNER: &str = "me@example.com";
    const OTHER: &str = "other@example.com";

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    fn add_html(store: &mut Store, name: &str, content: &str) -> Artifact {
        let input = NewArtifact {
            file_content: Some(content.into()),
            ..NewArtifact::new(name).with_type(ArtifactType::Html)
        };
        store.create_artifact(OWNER, input).unwrap()
    }

    #[test]
    fn test_artifact_token_shape() {
        let token = generate_artifact_token();
        assert_eq!(token.len(), ARTIFACT_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_collection_token_is_uuid() {
        let token = generate_collection_token();
        assert_eq!(token.len(), 36);
        assert!(Uuid::parse_str(&token).is_ok());
    }

    #[test]
    fn test_share_then_render() {
        let mut store = store();
        let artifact = add_html(&mut store, "Demo", "<h1>Hi</h1>");

        let share = store.share_artifact(OWNER, artifact.id).unwrap();
        assert_eq!(share.url, format!("/render/{}", share.token));

        let page = store.render_artifact_page(&share.token).unwrap();
        assert!(page.is_found());
        assert!(page.body.contains("<iframe"));
    }

    #[test]
    fn test_share_url_uses_base_url() {
        let config = Config {
            base_url: Some("https://artifacts.example.com/".into()),
            ..Config::default()
        };
        let mut store = Store::open_in_memory_with_config(config).unwrap();
        let artifact = add_html(&mut store, "Demo", "x");

        let share = store.share_artifact(OWNER, artifact.id).unwrap();
        assert_eq!(
            share.url,
            format!("https://artifacts.example.com/render/{}", share.token)
        );
    }

    #[test]
    fn test_revoke_then_render_is_404_and_reshare_mints_new_token() {
        let mut store = store();
        let artifact = add_html(&mut store, "Demo", "<p>x</p>");

        let first = store.share_artifact(OWNER, artifact.id).unwrap();
        store.unshare_artifact(OWNER, artifact.id).unwrap();

        let page = store.render_artifact_page(&first.token).unwrap();
        assert_eq!(page.status, 404);
        assert_eq!(page, store.render_artifact_page("nonexistent1").unwrap());

        let second = store.share_artifact(OWNER, artifact.id).unwrap();
        assert_ne!(first.token, second.token);
        assert!(store.render_artifact_page(&first.token).unwrap().status == 404);
        assert!(store.render_artifact_page(&second.token).unwrap().is_found());
    }

    #[test]
    fn test_share_status() {
        let mut store = store();
        let artifact = add_html(&mut store, "Demo", "x");

        let status = store.share_status(OWNER, artifact.id).unwrap();
        assert!(!status.is_shared);
        assert!(status.render_url.is_none());

        let share = store.share_artifact(OWNER, artifact.id).unwrap();
        let status = store.share_status(OWNER, artifact.id).unwrap();
        assert!(status.is_shared);
        assert_eq!(status.share_token.as_deref(), Some(share.token.as_str()));
        assert_eq!(status.render_url, Some(share.url));
        assert!(status.shared_at.is_some());
    }

    #[test]
    fn test_share_requires_ownership() {
        let mut store = store();
        let artifact = add_html(&mut store, "Demo", "x");

        assert!(matches!(
            store.share_artifact(OTHER, artifact.id).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            store.unshare_artifact(OTHER, artifact.id).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            store.share_status(OTHER, artifact.id).unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_empty_token_never_resolves() {
        let store = store();
        assert!(store.shared_artifact("").unwrap().is_none());
        assert_eq!(store.render_share_page("").unwrap().status, 404);
    }

    #[test]
    fn test_group_by_tag_no_dedup() {
        let mut store = store();
        let collection = store
            .create_collection(OWNER, NewCollection::new("Demos"))
            .unwrap();
        for (name, tags) in [
            ("Old", vec!["b"]),
            ("Loose", vec![]),
            ("New", vec!["a", "b"]),
        ] {
            let input = NewArtifact {
                collection_id: Some(collection.id),
                ..NewArtifact::new(name).with_tags(tags)
            };
            store.create_artifact(OWNER, input).unwrap();
        }

        let share = store
            .share_collection(OWNER, "demos", ShareSettings::default())
            .unwrap();
        let shared = store.shared_collection(&share.token).unwrap().unwrap();

        let layout: Vec<(&str, Vec<&str>)> = shared
            .groups
            .iter()
            .map(|g| {
                (
                    g.tag.as_str(),
                    g.cards.iter().map(|c| c.name.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            layout,
            vec![
                ("a", vec!["New"]),
                ("b", vec!["New", "Old"]),
                (UNCATEGORIZED, vec!["Loose"]),
            ]
        );
        assert_eq!(shared.card_count(), 4);
    }

    #[test]
    fn test_share_page_never_shows_content() {
        let mut store = store();
        let collection = store
            .create_collection(OWNER, NewCollection::new("Secrets"))
            .unwrap();
        let input = NewArtifact {
            collection_id: Some(collection.id),
            file_content: Some("TOP-SECRET-CONTENT".into()),
            ..NewArtifact::new("Card")
        };
        store.create_artifact(OWNER, input).unwrap();

        let share = store
            .share_collection(OWNER, "secrets", ShareSettings::default())
            .unwrap();
        let page = store.render_share_page(&share.token).unwrap();
        assert!(page.is_found());
        assert!(page.body.contains("<h3>Card</h3>"));
        assert!(!page.body.contains("TOP-SECRET-CONTENT"));
    }

    #[test]
    fn test_share_collection_settings_persisted() {
        let mut store = store();
        store
            .create_collection(OWNER, NewCollection::new("Grid"))
            .unwrap();
        let settings = ShareSettings {
            show_thumbnails: false,
            layout: ShareLayout::Grid,
        };

        let share = store.share_collection(OWNER, "grid", settings).unwrap();
        assert_eq!(share.url, format!("/share/{}", share.token));

        let collection = store.get_collection(OWNER, "grid").unwrap().unwrap();
        assert!(collection.is_public);
        assert_eq!(collection.share_settings, Some(settings));
        let status = store.collection_share_status(OWNER, "grid").unwrap();
        assert!(status.is_public);
        assert_eq!(status.share_token.as_deref(), Some(share.token.as_str()));
        assert_eq!(status.share_url, Some(share.url));
        assert_eq!(status.settings, Some(settings));
        assert!(status.shared_at.is_some());

        let page = store.render_share_page(&share.token).unwrap();
        assert!(page.body.contains("layout-grid"));
    }

    #[test]
    fn test_unshared_collection_stale_token_is_404() {
        let mut store = store();
        store
            .create_collection(OWNER, NewCollection::new("Private"))
            .unwrap();
        let share = store
            .share_collection(OWNER, "private", ShareSettings::default())
            .unwrap();

        store.unshare_collection(OWNER, "private").unwrap();
        assert!(store.shared_collection(&share.token).unwrap().is_none());
        assert_eq!(store.render_share_page(&share.token).unwrap().status, 404);

        let collection = store.get_collection(OWNER, "private").unwrap().unwrap();
        assert!(!collection.is_public);
        assert!(collection.share_token.is_none());
        assert!(collection.share_settings.is_none());
        let status = store.collection_share_status(OWNER, "private").unwrap();
        assert!(!status.is_public);
        assert!(status.share_token.is_none());
        assert!(status.share_url.is_none());
        assert!(status.shared_at.is_none());
    }

    #[test]
    fn test_collection_share_status() {
        let mut store = store();
        store
            .create_collection(OWNER, NewCollection::new("Never"))
            .unwrap();

        let status = store.collection_share_status(OWNER, "never").unwrap();
        assert!(!status.is_public);
        assert!(status.share_url.is_none());
        assert!(status.settings.is_none());

        assert!(matches!(
            store.collection_share_status(OWNER, "missing"),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.collection_share_status(OTHER, "never"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_private_collection_with_token_not_retrievable() {
        let mut store = store();
        store
            .create_collection(OWNER, NewCollection::new("Half"))
            .unwrap();
        store
            .conn()
            .execute(
                "UPDATE collections SET share_token = 'stale-token', is_public = 0",
                [],
            )
            .unwrap();

        assert!(store.shared_collection("stale-token").unwrap().is_none());
        assert_eq!(store.render_share_page("stale-token").unwrap().status, 404);
    }

    #[test]
    fn test_share_collection_requires_ownership() {
        let mut store = store();
        store
            .create_collection(OWNER, NewCollection::new("Mine"))
            .unwrap();
        assert!(matches!(
            store
                .share_collection(OTHER, "mine", ShareSettings::default())
                .unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            store.unshare_collection(OTHER, "mine").unwrap_err(),
            StoreError::NotFound
        ));
    }
}
