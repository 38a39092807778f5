//! `robots.txt` and `sitemap.xml`.

use std::fmt::Write;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;

use crate::catalog;
use crate::state::AppState;

/// Indexable paths that are not services or content pages.
const STATIC_PATHS: &[&str] = &["/", "/services", "/fees", "/locations", "/contact", "/book"];

/// Serve `robots.txt`.
pub async fn robots(State(state): State<AppState>) -> Response {
    let body = format!(
        "User-agent: *\n\
         Allow: /\n\
         Disallow: /api/\n\
         Disallow: /book/\n\
         \n\
         Sitemap: {}\n",
        state.config().absolute_url("/sitemap.xml")
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// Serve `sitemap.xml`.
pub async fn sitemap(State(state): State<AppState>) -> Response {
    let config = state.config();
    let mut entries: Vec<(String, Option<NaiveDate>)> = STATIC_PATHS
        .iter()
        .map(|p| (config.absolute_url(p), None))
        .collect();
    entries.extend(
        catalog::services()
            .iter()
            .map(|s| (config.absolute_url(&s.path()), None)),
    );
    let mut pages: Vec<_> = state.content().pages().collect();
    pages.sort_by(|a, b| a.slug.cmp(&b.slug));
    entries.extend(
        pages
            .into_iter()
            .map(|p| (config.absolute_url(&format!("/{}", p.slug)), p.meta.updated_at)),
    );

    ([(header::CONTENT_TYPE, "application/xml")], render_sitemap(&entries)).into_response()
}

fn render_sitemap(entries: &[(String, Option<NaiveDate>)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (loc, lastmod) in entries {
        let _ = write!(xml, "  <url><loc>{}</loc>", xml_escape(loc));
        if let Some(date) = lastmod {
            let _ = write!(xml, "<lastmod>{}</lastmod>", date.format("%Y-%m-%d"));
        }
        xml.push_str("</url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sitemap_lists_entries_with_lastmod() {
        let xml = render_sitemap(&[
            ("https://stillwaters.test/".to_string(), None),
            (
                "https://stillwaters.test/privacy".to_string(),
                NaiveDate::from_ymd_opt(2026, 2, 1),
            ),
        ]);
        assert!(xml.contains("<loc>https://stillwaters.test/</loc></url>"));
        assert!(xml.contains("<lastmod>2026-02-01</lastmod>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn locations_are_escaped() {
        assert_eq!(xml_escape("/a?b=1&c=2"), "/a?b=1&amp;c=2");
    }
}
