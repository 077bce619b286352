//! Public HTML pages
//!
//! Renders the two unauthenticated pages: a single shared artifact and a
//! shared collection. Every stored string is escaped before it reaches the
//! markup. A miss renders the same themed 404 regardless of why the token
//! did not resolve.

use std::fmt::Write;

use serde::Serialize;

use crate::models::{Artifact, ShareLayout};
use crate::sharing::{PublicCard, SharedCollection};

/// A rendered page, ready for any HTTP host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

const HTML: &str = "text/html; charset=utf-8";

impl Page {
    fn ok(body: String) -> Self {
        Self {
            status: 200,
            content_type: HTML,
            body,
        }
    }

    fn not_found(body: String) -> Self {
        Self {
            status: 404,
            content_type: HTML,
            body,
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == 200
    }
}

/// Escape text for use in HTML content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn document(title: &str, style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n\
         <body>\n{body}\n</body>\n</html>\n"
    )
}

// ==================== Artifact render page ====================

const DARK_STYLE: &str = "\
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: system-ui, -apple-system, sans-serif; background: #09090b; color: #fafafa; min-height: 100vh; display: flex; flex-direction: column; }
.toolbar { background: #18181b; border-bottom: 1px solid #27272a; padding: 0.75rem 1rem; display: flex; align-items: center; gap: 1rem; }
.toolbar h1 { font-size: 1rem; font-weight: 600; }
.badge { font-size: 0.75rem; padding: 0.25rem 0.5rem; background: #27272a; color: #a1a1aa; border-radius: 0.25rem; }
.render-frame { flex: 1; border: none; width: 100%; background: white; }
.content { padding: 1.5rem; }
pre { background: #18181b; border: 1px solid #27272a; border-radius: 0.5rem; padding: 1rem; overflow-x: auto; }
code { font-family: 'SF Mono', Consolas, monospace; font-size: 0.875rem; white-space: pre-wrap; word-break: break-all; }
.error { margin: auto; text-align: center; padding: 2rem; }
.error p { color: #a1a1aa; margin-top: 1rem; }
";

/// Render a shared artifact.
///
/// HTML artifacts with content are embedded in a sandboxed iframe; anything
/// else is shown as escaped preformatted text.
pub fn artifact_page(artifact: &Artifact) -> Page {
    let name = escape_html(&artifact.name);
    let content = artifact.file_content.as_deref().unwrap_or("");

    let (badge, main) = if artifact.is_html() && !content.is_empty() {
        (
            "HTML".to_string(),
            format!(
                "<iframe class=\"render-frame\" sandbox=\"allow-scripts\" srcdoc=\"{}\"></iframe>",
                escape_html(content)
            ),
        )
    } else {
        let badge = artifact
            .language
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(artifact.artifact_type.label());
        (
            escape_html(badge),
            format!(
                "<div class=\"content\"><pre><code>{}</code></pre></div>",
                escape_html(content)
            ),
        )
    };

    let body = format!(
        "<div class=\"toolbar\"><h1>{name}</h1><span class=\"badge\">{badge}</span></div>\n{main}"
    );
    Page::ok(document(&name, DARK_STYLE, &body))
}

/// The 404 for any artifact token that does not resolve
pub fn artifact_not_found() -> Page {
    Page::not_found(document(
        "Artifact Not Found",
        DARK_STYLE,
        "<div class=\"error\"><h1>404 - Artifact Not Found</h1>\
         <p>This artifact doesn't exist or is no longer shared.</p></div>",
    ))
}

// ==================== Collection share page ====================

const LIGHT_STYLE: &str = "\
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: system-ui, -apple-system, sans-serif; background: #f9fafb; color: #111827; line-height: 1.5; }
.share-header { background: linear-gradient(135deg, #6366f1 0%, #8b5cf6 100%); color: white; padding: 3rem 2rem; text-align: center; }
.share-header h1 { font-size: 2.5rem; font-weight: 700; }
.share-header p { font-size: 1.125rem; opacity: 0.95; margin-top: 0.5rem; }
.share-content { max-width: 1200px; margin: 2rem auto; padding: 0 1rem; }
.tag-group { margin-bottom: 2rem; }
.tag-header { font-size: 1.25rem; font-weight: 600; padding: 0.5rem 0; cursor: pointer; }
.count { color: #6b7280; font-weight: 400; }
.layout-grouped .cards, .layout-grid .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 1rem; }
.layout-list .cards { display: flex; flex-direction: column; gap: 0.5rem; }
.artifact-card { background: white; border: 1px solid #e5e7eb; border-radius: 0.75rem; overflow: hidden; }
.thumb { height: 6rem; display: flex; align-items: center; justify-content: center; background: #eef2ff; color: #6366f1; font-size: 2rem; font-weight: 700; }
.card-body { padding: 1rem; }
.card-body p { color: #4b5563; margin-top: 0.25rem; }
.card-meta { display: flex; gap: 0.5rem; margin: 0.75rem 0; }
.card-meta span { font-size: 0.75rem; padding: 0.125rem 0.5rem; background: #f3f4f6; border-radius: 9999px; }
.card-actions { display: flex; gap: 0.5rem; }
.card-actions a { font-size: 0.875rem; color: #6366f1; text-decoration: none; }
.share-footer { text-align: center; padding: 2rem; color: #6b7280; font-size: 0.875rem; }
.error { display: flex; flex-direction: column; align-items: center; justify-content: center; height: 100vh; text-align: center; }
.error h1 { color: #374151; }
";

fn card(out: &mut String, card: &PublicCard, show_thumbnails: bool) {
    out.push_str("<div class=\"artifact-card\">");
    if show_thumbnails {
        let initial = card.artifact_type.label().chars().next().unwrap_or('?');
        let _ = write!(out, "<div class=\"thumb\">{}</div>", initial);
    }
    let _ = write!(out, "<div class=\"card-body\"><h3>{}</h3>", escape_html(&card.name));
    if let Some(desc) = card.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, "<p>{}</p>", escape_html(desc));
    }

    let _ = write!(
        out,
        "<div class=\"card-meta\"><span>{}</span>",
        card.artifact_type.as_str()
    );
    if let Some(lang) = card.language.as_deref().filter(|l| !l.is_empty()) {
        let _ = write!(out, "<span>{}</span>", escape_html(lang));
    }
    out.push_str("</div><div class=\"card-actions\">");

    if let Some(url) = card.published_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = write!(
            out,
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">View Artifact</a>",
            escape_html(url)
        );
    }
    if let Some(url) = card.conversation_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = write!(
            out,
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">See Conversation</a>",
            escape_html(url)
        );
    }
    out.push_str("</div></div></div>");
}

/// Render a shared collection grouped by tag
pub fn share_page(shared: &SharedCollection) -> Page {
    let name = escape_html(&shared.name);
    let settings = shared.settings;
    let mut out = String::new();

    let _ = write!(out, "<header class=\"share-header\"><h1>{}</h1>", name);
    if let Some(desc) = shared.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, "<p>{}</p>", escape_html(desc));
    }
    let _ = write!(
        out,
        "<p>{} artifacts</p></header>\n<main class=\"share-content layout-{}\">",
        shared.card_count(),
        settings.layout.as_str()
    );

    for group in &shared.groups {
        if settings.layout == ShareLayout::Grouped {
            let _ = write!(
                out,
                "<details class=\"tag-group\" open><summary class=\"tag-header\">{} \
                 <span class=\"count\">({})</span></summary>",
                escape_html(&group.tag),
                group.cards.len()
            );
        } else {
            let _ = write!(
                out,
                "<section class=\"tag-group\"><h2 class=\"tag-header\">{}</h2>",
                escape_html(&group.tag)
            );
        }

        out.push_str("<div class=\"cards\">");
        for c in &group.cards {
            card(&mut out, c, settings.show_thumbnails);
        }
        out.push_str("</div>");

        out.push_str(if settings.layout == ShareLayout::Grouped {
            "</details>"
        } else {
            "</section>"
        });
    }

    out.push_str("</main>\n<footer class=\"share-footer\">Shared with Artifact Manager</footer>");
    Page::ok(document(&name, LIGHT_STYLE, &out))
}

/// The 404 for any collection token that does not resolve or is private
pub fn collection_not_found() -> Page {
    Page::not_found(document(
        "Collection Not Found",
        LIGHT_STYLE,
        "<div class=\"error\"><h1>404 - Collection Not Found</h1>\
         <p>This collection doesn't exist or is no longer shared.</p></div>",
    ))
}
