//! Artifact Catalog Core Library
//!
//! This crate provides the core of the artifact catalog: a per-owner store
//! of saved artifacts (code, documents, HTML pages, data) organized into
//! collections and tags, with token-based public sharing and a JSON
//! import/export format.
//!
//! # Architecture
//!
//! - **SQLite**: the whole catalog lives in one database; every row carries
//!   its owner and every statement is scoped to it
//! - **Store**: the single entry point for catalog operations
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! let artifact = store.create_artifact(owner, NewArtifact::new("Parser"))?;
//! let share = store.share_artifact(owner, artifact.id)?;
//! let page = store.render_artifact_page(&share.token)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified catalog interface (main entry point)
//! - `models`: Artifacts, collections, tags and their inputs
//! - `naming`: Placeholder detection, unique names and slugs
//! - `query`: Filtered, sorted artifact listing
//! - `tags`: Tag resolution and linking
//! - `sharing`: Share tokens for artifacts and collections
//! - `pages`: Public HTML pages
//! - `transfer`: Import and export
//! - `cleanup`: Placeholder name repair
//! - `storage`: SQLite schema, connection and errors
//! - `config`: Application configuration

pub mod cleanup;
pub mod config;
pub mod models;
pub mod naming;
pub mod pages;
pub mod query;
pub mod sharing;
pub mod storage;
pub mod store;
pub mod tags;
pub mod transfer;

pub use cleanup::PlaceholderArtifact;
pub use config::Config;
pub use models::{
    Artifact, ArtifactId, ArtifactPatch, ArtifactType, CatalogStats, Collection, CollectionId,
    CollectionPatch, CollectionRef, NewArtifact, NewCollection, ShareLayout, ShareSettings,
    SourceType, TagId, TagUsage,
};
pub use pages::Page;
pub use query::{ArtifactFilter, SortOrder};
pub use sharing::{
    ArtifactShare, CollectionShare, CollectionShareStatus, ShareStatus, SharedCollection,
};
pub use storage::{StoreError, StoreResult};
pub use store::Store;
pub use transfer::{CatalogDocument, ImportDocument, ImportSummary};
