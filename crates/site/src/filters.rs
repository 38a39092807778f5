//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the fingerprinted stylesheet URL.
///
/// Falls back to the plain file when the build could not hash it.
///
/// Usage in templates: `{{ ""|css_href }}`
#[askama::filter_fn]
pub fn css_href(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(stylesheet_href(env!("CSS_HASH")))
}

/// Formats a `YYYY-MM-DD` date as `Tuesday 10 March 2026`.
///
/// Anything that does not parse is passed through unchanged.
///
/// Usage in templates: `{{ date|long_date }}`
#[askama::filter_fn]
pub fn long_date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_or(raw, |d| d.format("%A %-d %B %Y").to_string()))
}

fn stylesheet_href(hash: &str) -> String {
    if hash.is_empty() {
        "/static/css/main.css".to_string()
    } else {
        format!("/static/css/derived/main.{hash}.css")
    }
}
