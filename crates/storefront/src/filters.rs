//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// The current year, for the footer copyright line.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// The build-time content hash of `static/css/main.css`, for cache-busted
/// stylesheet URLs.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Reduce a WooCommerce HTML fragment to plain text with single spaces,
/// for `<meta name="description">` content.
///
/// Usage in templates: `{{ product.short_description|strip_tags }}`
#[askama::filter_fn]
pub fn strip_tags(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(strip_html(&value.to_string()))
}

/// Drop `<...>` runs and collapse whitespace. Markup-aware only to that
/// extent; WooCommerce short descriptions are simple paragraph markup.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_removes_markup() {
        assert_eq!(
            strip_html("<p>Recznie pleciona <strong>torba</strong>.</p>"),
            "Recznie pleciona torba."
        );
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        assert_eq!(
            strip_html("<p>Lniana\n  torba</p>\n<p>z frędzlami</p>"),
            "Lniana torba z frędzlami"
        );
    }

    #[test]
    fn test_strip_html_plain_text_unchanged() {
        assert_eq!(strip_html("Makrama"), "Makrama");
    }
}
