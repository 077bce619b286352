//! Artifact list queries
//!
//! Filters are composed from typed predicates. Each predicate renders its
//! own SQL fragment and pushes its bound values, so user input only ever
//! reaches SQLite as a parameter. The owner predicate is always present.
//!
//! ```ignore
//! let filter = ArtifactFilter {
//!     tag_name: Some("rust".into()),
//!     favorite_only: true,
//!     ..ArtifactFilter::default()
//! };
//! let artifacts = store.list_artifacts("me@example.com", &filter, SortOrder::Name)?;
//! ```

use std::fmt;
use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::models::{Artifact, ArtifactId, ArtifactType, CollectionId, SourceType};
use crate::storage::database::{artifact_from_row, ARTIFACT_COLUMNS, TAG_SEPARATOR};

/// List ordering. Favorites always come first; this orders within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently created first
    #[default]
    Newest,
    /// Oldest first
    Oldest,
    /// Alphabetical by name
    Name,
    /// Most recently updated first
    Updated,
    /// Grouped by artifact type, then by name
    Type,
}

impl SortOrder {
    fn order_by(&self) -> &'static str {
        match self {
            SortOrder::Newest => "a.created_at DESC, a.id DESC",
            SortOrder::Oldest => "a.created_at ASC, a.id ASC",
            SortOrder::Name => "a.name ASC, a.id ASC",
            SortOrder::Updated => "a.updated_at DESC, a.id DESC",
            SortOrder::Type => "a.artifact_type ASC, a.name ASC, a.id ASC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Name => "name",
            SortOrder::Updated => "updated",
            SortOrder::Type => "type",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "name" => Ok(SortOrder::Name),
            "updated" => Ok(SortOrder::Updated),
            "type" => Ok(SortOrder::Type),
            _ => Err(format!(
                "Unknown sort order: {} (expected newest, oldest, name, updated or type)",
                s
            )),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional constraints for listing artifacts. Unset fields do not filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactFilter {
    /// Only artifacts in the collection with this slug
    pub collection_slug: Option<String>,
    /// Only artifacts linked to this tag name
    pub tag_name: Option<String>,
    pub artifact_type: Option<ArtifactType>,
    pub source_type: Option<SourceType>,
    pub favorite_only: bool,
    /// Case-insensitive substring over name, description, notes, language
    /// and file name
    pub search_text: Option<String>,
}

/// One WHERE constraint on the artifact query
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Owner(String),
    Id(ArtifactId),
    ShareToken(String),
    CollectionId(CollectionId),
    CollectionSlug(String),
    Tag(String),
    ArtifactType(ArtifactType),
    SourceType(SourceType),
    FavoritesOnly,
    Search(String),
}

/// Columns matched by a free-text search
const SEARCH_COLUMNS: &[&str] = &[
    "a.name",
    "a.description",
    "a.notes",
    "a.language",
    "a.file_name",
];

impl Predicate {
    /// Render this predicate's SQL, appending its bound values to `params`
    fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Predicate::Owner(owner) => {
                params.push(Value::Text(owner.clone()));
                "a.user_email = ?".to_string()
            }
            Predicate::Id(id) => {
                params.push(Value::Integer(*id));
                "a.id = ?".to_string()
            }
            Predicate::ShareToken(token) => {
                params.push(Value::Text(token.clone()));
                "a.share_token = ?".to_string()
            }
            Predicate::CollectionId(id) => {
                params.push(Value::Integer(*id));
                "a.collection_id = ?".to_string()
            }
            Predicate::CollectionSlug(slug) => {
                params.push(Value::Text(slug.clone()));
                "c.slug = ?".to_string()
            }
            Predicate::Tag(name) => {
                params.push(Value::Text(name.clone()));
                "a.id IN (SELECT ft.artifact_id FROM artifact_tags ft \
                 JOIN tags t2 ON ft.tag_id = t2.id \
                 WHERE t2.name = ? AND t2.user_email = a.user_email)"
                    .to_string()
            }
            Predicate::ArtifactType(kind) => {
                params.push(Value::Text(kind.as_str().to_string()));
                "a.artifact_type = ?".to_string()
            }
            Predicate::SourceType(source) => {
                params.push(Value::Text(source.as_str().to_string()));
                "a.source_type = ?".to_string()
            }
            Predicate::FavoritesOnly => "a.is_favorite = 1".to_string(),
            Predicate::Search(text) => {
                let pattern = format!("%{}%", escape_like(text));
                let clauses: Vec<String> = SEARCH_COLUMNS
                    .iter()
                    .map(|column| {
                        params.push(Value::Text(pattern.clone()));
                        format!("{} LIKE ? ESCAPE '\\'", column)
                    })
                    .collect();
                format!("({})", clauses.join(" OR "))
            }
        }
    }
}

/// Escape LIKE wildcards so search text matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A composed artifact SELECT
#[derive(Debug, Clone)]
pub(crate) struct ArtifactQuery {
    predicates: Vec<Predicate>,
    sort: SortOrder,
}

impl ArtifactQuery {
    /// All artifacts of one owner
    pub fn for_owner(owner: &str) -> Self {
        Self {
            predicates: vec![Predicate::Owner(owner.to_string())],
            sort: SortOrder::default(),
        }
    }

    /// The artifact published under a share token, whoever owns it
    pub fn by_share_token(token: &str) -> Self {
        Self {
            predicates: vec![Predicate::ShareToken(token.to_string())],
            sort: SortOrder::default(),
        }
    }

    pub fn with_id(mut self, id: ArtifactId) -> Self {
        self.predicates.push(Predicate::Id(id));
        self
    }

    pub fn in_collection(mut self, id: CollectionId) -> Self {
        self.predicates.push(Predicate::CollectionId(id));
        self
    }

    /// Add a predicate for every constraint set on `filter`
    pub fn with_filter(mut self, filter: &ArtifactFilter) -> Self {
        if let Some(slug) = non_blank(&filter.collection_slug) {
            self.predicates
                .push(Predicate::CollectionSlug(slug.to_string()));
        }
        if let Some(tag) = non_blank(&filter.tag_name) {
            self.predicates.push(Predicate::Tag(tag.to_string()));
        }
        if let Some(kind) = filter.artifact_type {
            self.predicates.push(Predicate::ArtifactType(kind));
        }
        if let Some(source) = filter.source_type {
            self.predicates.push(Predicate::SourceType(source));
        }
        if filter.favorite_only {
            self.predicates.push(Predicate::FavoritesOnly);
        }
        if let Some(text) = non_blank(&filter.search_text) {
            self.predicates.push(Predicate::Search(text.to_string()));
        }
        self
    }

    pub fn sorted_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Render SQL and bound values
    pub fn build(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let conditions: Vec<String> = self
            .predicates
            .iter()
            .map(|p| p.render(&mut params))
            .collect();

        let sql = format!(
            "SELECT {columns}, GROUP_CONCAT(t.name, char({sep})) AS tag_names \
             FROM artifacts a \
             LEFT JOIN collections c ON a.collection_id = c.id AND c.user_email = a.user_email \
             LEFT JOIN artifact_tags atg ON atg.artifact_id = a.id \
             LEFT JOIN tags t ON atg.tag_id = t.id \
             WHERE {conditions} \
             GROUP BY a.id \
             ORDER BY a.is_favorite DESC, {order}",
            columns = ARTIFACT_COLUMNS,
            sep = TAG_SEPARATOR as u32,
            conditions = conditions.join(" AND "),
            order = self.sort.order_by(),
        );

        (sql, params)
    }

    /// Run the query
    pub fn fetch(&self, conn: &Connection) -> rusqlite::Result<Vec<Artifact>> {
        let (sql, params) = self.build();
        let mut stmt = conn.prepare(&sql)?;
        let artifacts = stmt
            .query_map(params_from_iter(params.iter()), artifact_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artifacts)
    }

    /// Run the query expecting at most one row
    pub fn fetch_one(&self, conn: &Connection) -> rusqlite::Result<Option<Artifact>> {
        Ok(self.fetch(conn)?.into_iter().next())
    }
}
