//! Brand colours applied to template CSS.

use crate::patterns;
use crate::sanity::SiteColors;
use crate::Result;
use regex::NoExpand;

const PRIMARY_VAR: &str = r"(--primary-color\s*:\s*)[^;}]+";
const SECONDARY_VAR: &str = r"(--secondary-color\s*:\s*)[^;}]+";
const ACCENT_VAR: &str = r"(--accent-color\s*:\s*)[^;}]+";

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    let hex = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => hex.to_string(),
        _ => return None,
    };
    let value = u32::from_str_radix(&hex, 16).ok()?;
    Some(((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

fn shift(color: &str, amount: f32) -> String {
    match parse_hex(color) {
        Some((r, g, b)) => {
            let delta = (255.0 * amount).round() as i32;
            let channel = |c: u8| (c as i32 + delta).clamp(0, 255);
            format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
        }
        None => color.to_string(),
    }
}

/// Add `amount` (0..1) of white to each channel; non-hex colours are returned as-is
pub fn lighten(color: &str, amount: f32) -> String {
    shift(color, amount)
}

pub fn darken(color: &str, amount: f32) -> String {
    shift(color, -amount)
}

/// Rewrite colour variables and generic Bootstrap colours, returning the count
pub fn apply_colors(css: &str, colors: &SiteColors) -> Result<(String, usize)> {
    let mut css = css.to_string();
    let mut replaced = 0;

    for (pattern, color) in [
        (PRIMARY_VAR, &colors.primary),
        (SECONDARY_VAR, &colors.secondary),
        (ACCENT_VAR, &colors.accent),
    ] {
        let re = patterns::regex(pattern)?;
        replaced += re.find_iter(&css).count();
        css = re
            .replace_all(&css, |caps: &regex::Captures| format!("{}{}", &caps[1], color))
            .into_owned();
    }

    let generic = [
        ("background-color: #f8f9fa", format!("background-color: {}", lighten(&colors.primary, 0.95))),
        ("background-color: #e9ecef", format!("background-color: {}", lighten(&colors.secondary, 0.9))),
        ("#007bff", colors.primary.clone()),
        ("#6c757d", colors.secondary.clone()),
        ("#28a745", colors.accent.clone()),
        ("#17a2b8", colors.primary.clone()),
        ("#dc3545", colors.accent.clone()),
    ];
    for (needle, replacement) in generic {
        let re = regex::RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
            .map_err(|e| crate::PipelineError::General(e.to_string()))?;
        replaced += re.find_iter(&css).count();
        css = re.replace_all(&css, NoExpand(&replacement)).into_owned();
    }

    Ok((css, replaced))
}

/// CSS block appended after the template styles
pub fn branding_css(colors: &SiteColors, business_type: &str) -> String {
    let hover = darken(&colors.primary, 0.1);
    let trade = utils::slugify(business_type, 40);
    format!(
        r#"/* Branding */
:root {{
  --primary-color: {primary};
  --secondary-color: {secondary};
  --accent-color: {accent};
}}
.brand-primary {{ color: {primary}; }}
.brand-secondary {{ color: {secondary}; }}
.brand-accent {{ color: {accent}; }}
.btn-primary {{ background-color: {primary}; border-color: {primary}; }}
.btn-primary:hover {{ background-color: {hover}; border-color: {hover}; }}
.text-primary {{ color: {primary}; }}
.bg-primary {{ background-color: {primary}; }}
.{trade}-specific {{ border-left: 3px solid {accent}; padding-left: 1rem; }}
"#,
        primary = colors.primary,
        secondary = colors.secondary,
        accent = colors.accent,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> SiteColors {
        SiteColors {
            primary: "#1e40af".to_string(),
            secondary: "#64748b".to_string(),
            accent: "#f59e0b".to_string(),
        }
    }

    #[test]
    fn test_lighten_darken() {
        assert_eq!(lighten("#000000", 0.5), "#808080");
        assert_eq!(lighten("#fff", 0.2), "#ffffff");
        assert_eq!(darken("#1e40af", 0.1), "#042695");
        assert_eq!(darken("#000", 0.3), "#000000");
        assert_eq!(lighten("rebeccapurple", 0.3), "rebeccapurple");
    }

    #[test]
    fn test_apply_colors() {
        let css = ":root { --primary-color: #000; --accent-color:red }\n.btn { color: #007BFF; }\nbody { background-color: #f8f9fa; }";
        let (out, count) = apply_colors(css, &colors()).unwrap();
        assert!(out.contains("--primary-color: #1e40af;"));
        assert!(out.contains("--accent-color:#f59e0b}"));
        assert!(out.contains(".btn { color: #1e40af; }"));
        assert!(!out.contains("#f8f9fa"));
        assert_eq!(count, 4);
    }

    #[test]
    fn test_branding_css_uses_trade_class() {
        let css = branding_css(&colors(), "Électricien");
        assert!(css.contains(".electricien-specific"));
        assert!(css.contains("--accent-color: #f59e0b;"));
    }
}
