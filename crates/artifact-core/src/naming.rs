//! Artifact and collection naming rules
//!
//! Clients save artifacts while a page is still loading, so transient labels
//! like "Saving..." can arrive as names. These helpers detect and replace
//! them, derive unique names, and derive collection slugs. Every writer in
//! the catalog goes through this module; nothing else re-implements the rules.

use std::sync::OnceLock;

use regex::Regex;

/// Fallback used when a name is a placeholder
pub const DEFAULT_NAME: &str = "Artifact";

/// Exact-match placeholder labels (case-sensitive)
const PLACEHOLDER_NAMES: &[&str] = &[
    "Saving...",
    "Loading...",
    "Downloading...",
    "New Artifact",
    "",
];

fn untitled_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Untitled(\s\d+)?$").expect("valid placeholder pattern"))
}

/// Whether `name` is a transient placeholder rather than a real title.
///
/// Matching is case-sensitive: "SAVING..." is a legitimate title.
pub fn is_placeholder(name: &str) -> bool {
    let trimmed = name.trim();
    PLACEHOLDER_NAMES.contains(&trimmed) || untitled_pattern().is_match(trimmed)
}

/// Trim `name`, replacing it with `fallback` if it is a placeholder
pub fn sanitize(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if is_placeholder(trimmed) {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// [`sanitize`] with the default "Artifact" fallback
pub fn sanitize_default(name: &str) -> String {
    sanitize(name, DEFAULT_NAME)
}

/// Return `base` if unused, else the first free `"{base} N"` for N = 2, 3, ...
///
/// This is a sequential scan, not max+1: with "File", "File 2" and "File 5"
/// taken, the result is "File 3".
pub fn generate_unique_name<S: AsRef<str>>(base: &str, existing: &[S]) -> String {
    let taken = |candidate: &str| existing.iter().any(|n| n.as_ref() == candidate);

    let mut name = base.to_string();
    let mut counter = 1;
    while taken(&name) {
        counter += 1;
        name = format!("{} {}", base, counter);
    }
    name
}

/// Derive a collection slug: lowercase, runs of anything other than
/// `[a-z0-9]` collapsed to a single `-`, no leading or trailing `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_detected() {
        for name in [
            "Saving...",
            "Loading...",
            "Downloading...",
            "New Artifact",
            "",
            "   ",
            "\t\n",
            "Untitled",
            "Untitled 7",
            "Untitled 42",
            "  Saving...  ",
        ] {
            assert!(is_placeholder(name), "{:?} should be a placeholder", name);
        }
    }

    #[test]
    fn test_real_names_not_placeholders() {
        for name in [
            "My Document",
            "README.md",
            "SAVING...",
            "saving...",
            "Untitled Project",
            "Untitled7",
            "code.swift",
        ] {
            assert!(!is_placeholder(name), "{:?} should not be a placeholder", name);
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_default("Saving..."), "Artifact");
        assert_eq!(sanitize_default(""), "Artifact");
        assert_eq!(sanitize_default("Untitled 3"), "Artifact");
        assert_eq!(sanitize("Loading...", "Document"), "Document");
        assert_eq!(sanitize("", "File"), "File");
        assert_eq!(sanitize_default("Valid Name"), "Valid Name");
        assert_eq!(sanitize_default("  Trimmed  "), "Trimmed");
    }

    #[test]
    fn test_unique_name_no_conflict() {
        let existing: [&str; 0] = [];
        assert_eq!(generate_unique_name("Document", &existing), "Document");
    }

    #[test]
    fn test_unique_name_sequence() {
        assert_eq!(generate_unique_name("Artifact", &["Artifact"]), "Artifact 2");
        assert_eq!(
            generate_unique_name("Artifact", &["Artifact", "Artifact 2", "Artifact 3"]),
            "Artifact 4"
        );
    }

    #[test]
    fn test_unique_name_first_free_slot() {
        assert_eq!(
            generate_unique_name("File", &["File", "File 2", "File 5", "File 10"]),
            "File 3"
        );
    }

    #[test]
    fn test_unique_name_base_free_but_suffixes_taken() {
        // Base itself is free, so it wins regardless of suffixed names
        assert_eq!(generate_unique_name("Code", &["Code 2", "Code 3"]), "Code");
    }

    #[test]
    fn test_unique_name_accepts_owned_strings() {
        let existing = vec!["Notes".to_string()];
        assert_eq!(generate_unique_name("Notes", &existing), "Notes 2");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Code Snippets"), "code-snippets");
        assert_eq!(slugify("Data & Analysis"), "data-analysis");
        assert_eq!(slugify("  --Web Apps!!  "), "web-apps");
        assert_eq!(slugify("v2.0 Release"), "v2-0-release");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Café Menu"), "caf-menu");
    }
}
