//! Template parsing and metadata extraction.

use crate::patterns;
use crate::Result;
use serde_json::Value;

const HEAD: &str = r"(?is)<head[^>]*>(.*?)</head>";
const BODY: &str = r"(?is)<body[^>]*>(.*?)</body>";
const STYLE: &str = r"(?is)<style[^>]*>(.*?)</style>";
const SCRIPT: &str = r"(?is)<script([^>]*)>(.*?)</script>";
const TITLE: &str = r"(?is)<title[^>]*>([^<]*)</title>";
const META_DESCRIPTION: &str = r#"(?i)<meta\s+name="description"\s+content="([^"]*)"[^>]*>"#;
const META_KEYWORDS: &str = r#"(?i)<meta\s+name="keywords"\s+content="([^"]*)"[^>]*>"#;
const JSON_LD: &str = r#"(?is)<script\s+type="application/ld\+json"[^>]*>(.*?)</script>"#;
const IMAGE_SRC: &str = r#"(?i)src="([^"]*\.(?:jpg|jpeg|png|gif|webp|svg))""#;
const FONT_IMPORT: &str = r#"(?i)@import\s+url\(\s*['"]?([^'")]+)['"]?\s*\)"#;
const FONT_FILE: &str = r#"(?i)url\(\s*['"]?([^'")]+\.(?:woff2?|ttf|otf|eot))['"]?\s*\)"#;
const ICON_CLASS: &str = r#"class="([^"]*\bfa[srbl]?\b[^"]*)""#;

/// A template split into the parts the mapper works on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTemplate {
    pub head: String,
    /// Body content, or the whole input when there is no `<body>`
    pub body: String,
    /// Inline `<style>` contents
    pub css: String,
    /// Inline scripts, JSON-LD and external scripts excluded
    pub js: String,
}

pub fn parse_template(template: &str) -> Result<ParsedTemplate> {
    let head = patterns::regex(HEAD)?
        .captures(template)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let body = patterns::regex(BODY)?
        .captures(template)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| template.to_string());

    let css = patterns::regex(STYLE)?
        .captures_iter(template)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let js = patterns::regex(SCRIPT)?
        .captures_iter(template)
        .filter(|c| {
            let attrs = c.get(1).map(|m| m.as_str()).unwrap_or_default();
            !attrs.contains("src=") && !attrs.contains("application/ld+json")
        })
        .filter_map(|c| c.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ParsedTemplate { head, body, css, js })
}

fn first_capture(pattern: &'static str, text: &str) -> Result<Option<String>> {
    Ok(patterns::regex(pattern)?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string()))
}

fn all_captures(pattern: &'static str, text: &str) -> Result<Vec<String>> {
    let mut found: Vec<String> = Vec::new();
    for caps in patterns::regex(pattern)?.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            let value = m.as_str().trim().to_string();
            if !found.contains(&value) {
                found.push(value);
            }
        }
    }
    Ok(found)
}

pub fn title(head: &str) -> Result<String> {
    Ok(first_capture(TITLE, head)?.unwrap_or_default())
}

pub fn meta_description(head: &str) -> Result<String> {
    Ok(first_capture(META_DESCRIPTION, head)?.unwrap_or_default())
}

pub fn keywords(head: &str) -> Result<Vec<String>> {
    Ok(first_capture(META_KEYWORDS, head)?
        .map(|k| {
            k.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

/// Parsed JSON-LD blocks; unparseable ones are skipped
pub fn structured_data(html: &str) -> Result<Vec<Value>> {
    Ok(patterns::regex(JSON_LD)?
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .filter_map(|m| serde_json::from_str(m.as_str().trim()).ok())
        .collect())
}

pub fn image_paths(html: &str) -> Result<Vec<String>> {
    all_captures(IMAGE_SRC, html)
}

pub fn font_paths(css: &str) -> Result<Vec<String>> {
    let mut fonts = all_captures(FONT_IMPORT, css)?;
    for font in all_captures(FONT_FILE, css)? {
        if !fonts.contains(&font) {
            fonts.push(font);
        }
    }
    Ok(fonts)
}

pub fn icon_classes(html: &str) -> Result<Vec<String>> {
    all_captures(ICON_CLASS, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<title>Lorem Title</title>
<meta name="description" content="Old">
<meta name="keywords" content="plombier, Lyon ,">
<style>.hero { color: #007bff; }</style>
<script type="application/ld+json">{"@type": "LocalBusiness"}</script>
</head>
<body>
<section class="hero"><img src="/img/hero.webp"><i class="fas fa-phone"></i></section>
<script src="/app.js"></script>
<script>const site = { companyName: 'X' };</script>
</body></html>"#;

    #[test]
    fn test_parse_template_parts() {
        let parsed = parse_template(PAGE).unwrap();
        assert!(parsed.head.contains("<title>Lorem Title</title>"));
        assert!(parsed.body.trim_start().starts_with("<section class=\"hero\">"));
        assert_eq!(parsed.css, ".hero { color: #007bff; }");
        assert_eq!(parsed.js, "const site = { companyName: 'X' };");
    }

    #[test]
    fn test_parse_fragment_without_body() {
        let parsed = parse_template("<p>Lorem ipsum</p>").unwrap();
        assert_eq!(parsed.body, "<p>Lorem ipsum</p>");
        assert!(parsed.head.is_empty());
    }

    #[test]
    fn test_metadata_and_assets() {
        let parsed = parse_template(PAGE).unwrap();
        assert_eq!(title(&parsed.head).unwrap(), "Lorem Title");
        assert_eq!(meta_description(&parsed.head).unwrap(), "Old");
        assert_eq!(keywords(&parsed.head).unwrap(), vec!["plombier", "Lyon"]);
        assert_eq!(structured_data(&parsed.head).unwrap()[0]["@type"], "LocalBusiness");
        assert_eq!(image_paths(&parsed.body).unwrap(), vec!["/img/hero.webp"]);
        assert_eq!(icon_classes(&parsed.body).unwrap(), vec!["fas fa-phone"]);
        assert!(icon_classes(r#"<a class="facebook">"#).unwrap().is_empty());

        let css = "@import url('https://fonts.googleapis.com/css2?family=Inter'); @font-face { src: url(/f/inter.woff2); }";
        assert_eq!(
            font_paths(css).unwrap(),
            vec!["https://fonts.googleapis.com/css2?family=Inter", "/f/inter.woff2"]
        );
    }
}
