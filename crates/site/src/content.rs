//! Markdown content pages (about, privacy, terms).
//!
//! Pages are loaded from `content/pages/*.md` once at startup. Each file has
//! YAML frontmatter with at least a `title`; the slug is the file stem.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;
use thiserror::Error;

/// Errors loading content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Frontmatter of a content page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// All content pages, held in memory.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load every page under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store; a page that fails to parse
    /// is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "Pages directory does not exist");
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                match std::fs::read_to_string(&path)
                    .map_err(|e| ContentError::Io(e.to_string()))
                    .and_then(|raw| parse_page(&path, &raw))
                {
                    Ok(page) => {
                        tracing::info!(slug = %page.slug, "Loaded page");
                        pages.insert(page.slug.clone(), page);
                    }
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "Failed to load page");
                    }
                }
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Build a store from already-parsed pages.
    #[must_use]
    pub fn from_pages(pages: impl IntoIterator<Item = Page>) -> Self {
        Self {
            pages: Arc::new(pages.into_iter().map(|p| (p.slug.clone(), p)).collect()),
        }
    }

    /// Get a page by slug
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Every loaded page, in no particular order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }
}

/// Parse one markdown file with frontmatter.
///
/// # Errors
///
/// Returns `ContentError::Parse` if the filename or frontmatter is invalid.
pub fn parse_page(path: &Path, raw: &str) -> Result<Page, ContentError> {
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?
        .to_string();

    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(raw)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug,
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

/// Render markdown to HTML with the GFM extensions the pages use.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(content, &options)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PRIVACY: &str = "---\ntitle: Privacy Policy\ndescription: How we handle your information\nupdated_at: 2026-02-01\n---\n\n## What we collect\n\nOnly what you send us.\n";

    #[test]
    fn parses_frontmatter_and_markdown() {
        let page = parse_page(Path::new("content/pages/privacy.md"), PRIVACY).unwrap();
        assert_eq!(page.slug, "privacy");
        assert_eq!(page.meta.title, "Privacy Policy");
        assert_eq!(page.meta.updated_at, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert!(page.content_html.contains("<h2"));
        assert!(page.content_html.contains("What we collect"));
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        let err = parse_page(Path::new("terms.md"), "# Terms\n").unwrap_err();
        assert!(matches!(err, ContentError::Parse(_)));
    }

    #[test]
    fn raw_html_is_not_rendered() {
        let page = parse_page(
            Path::new("about.md"),
            "---\ntitle: About\n---\n<script>alert(1)</script>\n",
        )
        .unwrap();
        assert!(!page.content_html.contains("<script>"));
    }

    #[test]
    fn missing_directory_is_empty() {
        let store = ContentStore::load(Path::new("/nonexistent/content")).unwrap();
        assert!(store.get_page("about").is_none());
    }
}
