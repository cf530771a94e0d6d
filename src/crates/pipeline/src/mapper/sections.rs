//! Placeholder replacement and enriched-content injection.

use super::BusinessInfo;
use crate::domain::ClientFormData;
use crate::enrichment::{ContactContent, HomeContent};
use crate::patterns;
use crate::{PipelineError, Result};
use regex::{Captures, NoExpand, Regex, RegexBuilder};
use utils::escape_html;

const HERO_SECTION: &str = r#"(?is)(<section[^>]*class="[^"]*\bhero\b[^"]*"[^>]*>)(.*?)(</section>)"#;
const ABOUT_SECTION: &str = r#"(?is)(<section[^>]*class="[^"]*\babout\b[^"]*"[^>]*>)(.*?)(</section>)"#;
const SERVICES_SECTION: &str = r#"(?is)(<section[^>]*class="[^"]*\bservices\b[^"]*"[^>]*>)(.*?)(</section>)"#;
const WHY_US_SECTION: &str = r#"(?is)(<section[^>]*class="[^"]*\bwhy-us\b[^"]*"[^>]*>)(.*?)(</section>)"#;
const PROCESS_SECTION: &str = r#"(?is)(<section[^>]*class="[^"]*\bprocess(?:us)?\b[^"]*"[^>]*>)(.*?)(</section>)"#;
const JS_COMPANY_NAME: &str = r#"companyName:\s*['"][^'"]*['"]"#;
const JS_BUSINESS_TYPE: &str = r#"businessType:\s*['"][^'"]*['"]"#;

fn build(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| PipelineError::General(format!("invalid pattern {}: {}", pattern, e)))
}

/// Replace every match with `replacement` taken literally; returns the match count
fn replace_counted(re: &Regex, text: &str, replacement: &str) -> (String, usize) {
    let count = re.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (re.replace_all(text, NoExpand(replacement)).into_owned(), count)
}

/// Literal or pattern placeholders for the business fields, in application order.
fn business_mappings(form: &ClientFormData, business: &BusinessInfo) -> Vec<(String, bool, String)> {
    let name = business.business_name.clone();
    let metier = business.business_type.clone();
    let ville = business.ville.clone();
    let phone = form.telephone.clone();
    let email = form.email.clone();
    let address = form.adresse.clone();

    let literal = |p: &str, v: &String| (regex::escape(p), false, v.clone());
    let loose = |p: &str, v: String| (p.to_string(), true, v);

    vec![
        literal("{{BUSINESS_NAME}}", &name),
        literal("{{COMPANY_NAME}}", &name),
        literal("{{NOM_ENTREPRISE}}", &name),
        literal("{{BUSINESS_TYPE}}", &metier),
        literal("{{VILLE}}", &ville),
        literal("{{CITY}}", &ville),
        literal("{{CODE_POSTAL}}", &business.code_postal),
        literal("{{POSTAL_CODE}}", &business.code_postal),
        literal("{{TELEPHONE}}", &phone),
        literal("{{PHONE}}", &phone),
        literal("{{EMAIL}}", &email),
        literal("{{ADRESSE}}", &address),
        literal("{{ADDRESS}}", &address),
        loose(
            r"Lorem ipsum dolor sit amet",
            format!("{name}, votre {metier} professionnel à {ville}"),
        ),
        loose(
            r"Consectetur adipiscing elit",
            format!("Services {metier} de qualité dans tout le secteur de {ville}"),
        ),
        loose(r"Sed do eiusmod tempor", format!("Expertise {metier} reconnue à {ville}")),
        loose(
            r"Ut enim ad minim veniam",
            format!("Contactez {name} pour vos besoins {metier}"),
        ),
        literal("[NOM_ENTREPRISE]", &name),
        literal("[METIER]", &metier),
        literal("[VILLE]", &ville),
        literal("[TELEPHONE]", &phone),
        literal("[EMAIL]", &email),
        loose(r"Your Company Name", name.clone()),
        loose(r"Company Name", name.clone()),
        loose(r"Business Name", name.clone()),
        loose(r"Your Business", name.clone()),
        loose(r"Our Company", name.clone()),
        loose(r"Your Phone", phone.clone()),
        loose(r"Your Email", email.clone()),
        loose(r"Your Address", address.clone()),
        loose(r"City Name", ville.clone()),
        loose(r"Your City", ville.clone()),
    ]
}

/// Business placeholders in the body, plus the config objects of inline scripts
pub fn map_business_data(
    body: &str,
    js: &str,
    form: &ClientFormData,
    business: &BusinessInfo,
) -> Result<(String, String, usize)> {
    let mut html = body.to_string();
    let mut replaced = 0;

    for (pattern, case_insensitive, value) in business_mappings(form, business) {
        let re = build(&pattern, case_insensitive)?;
        let (next, count) = replace_counted(&re, &html, &escape_html(&value));
        html = next;
        replaced += count;
    }

    let name_literal = serde_json::to_string(&business.business_name)?;
    let type_literal = serde_json::to_string(&business.business_type)?;
    let (js, _) = replace_counted(
        &patterns::regex(JS_COMPANY_NAME)?,
        js,
        &format!("companyName: {name_literal}"),
    );
    let (js, _) = replace_counted(
        &patterns::regex(JS_BUSINESS_TYPE)?,
        &js,
        &format!("businessType: {type_literal}"),
    );

    Ok((html, js, replaced))
}

/// Rewrite the inner HTML of the first section matching `pattern`.
///
/// `rewrite` receives the inner HTML and returns the new inner HTML with a count.
fn with_section<F>(html: &str, pattern: &'static str, rewrite: F) -> Result<Option<(String, usize)>>
where
    F: FnOnce(&str) -> Result<(String, usize)>,
{
    let re = patterns::regex(pattern)?;
    let Some(caps) = re.captures(html) else {
        return Ok(None);
    };
    let (Some(whole), Some(open), Some(inner), Some(close)) =
        (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
    else {
        return Ok(None);
    };

    let (new_inner, count) = rewrite(inner.as_str())?;
    let mut out = String::with_capacity(html.len() + new_inner.len());
    out.push_str(&html[..whole.start()]);
    out.push_str(open.as_str());
    out.push_str(&new_inner);
    out.push_str(close.as_str());
    out.push_str(&html[whole.end()..]);
    Ok(Some((out, count)))
}

/// `{{KEY}}`, `[KEY]` and `data-content="key"` slots inside a section
fn fill_fields(inner: &str, fields: &[(&str, &str)]) -> Result<(String, usize)> {
    let mut inner = inner.to_string();
    let mut count = 0;

    for (key, value) in fields {
        if value.trim().is_empty() {
            continue;
        }
        let escaped = escape_html(value);
        let upper = key.to_uppercase();

        for pattern in [
            regex::escape(&format!("{{{{{upper}}}}}")),
            regex::escape(&format!("[{upper}]")),
        ] {
            let (next, n) = replace_counted(&build(&pattern, true)?, &inner, &escaped);
            inner = next;
            count += n;
        }

        let slot = build(&format!(r#"(data-content="{}"[^>]*>)[^<]*"#, regex::escape(key)), false)?;
        count += slot.find_iter(&inner).count();
        inner = slot
            .replace_all(&inner, |caps: &Captures| format!("{}{}", &caps[1], escaped))
            .into_owned();
    }

    Ok((inner, count))
}

fn services_html(home: &HomeContent) -> String {
    home.services
        .iter()
        .map(|service| {
            let features: String = service
                .features
                .iter()
                .map(|f| format!("<li>{}</li>", escape_html(f)))
                .collect();
            format!(
                r#"<div class="service-item"><h3>{}</h3><p>{}</p><ul>{}</ul></div>"#,
                escape_html(&service.title),
                escape_html(&service.description),
                features
            )
        })
        .collect()
}

fn why_us_html(home: &HomeContent) -> String {
    home.why_us
        .iter()
        .map(|item| {
            format!(
                r#"<div class="why-us-item"><i class="{}"></i><h4>{}</h4><p>{}</p></div>"#,
                escape_html(&item.icon),
                escape_html(&item.title),
                escape_html(&item.description)
            )
        })
        .collect()
}

fn process_html(home: &HomeContent) -> String {
    home.processus
        .iter()
        .map(|step| {
            format!(
                r#"<div class="process-step"><div class="step-number">{}</div><h4>{}</h4><p>{}</p></div>"#,
                step.step,
                escape_html(&step.title),
                escape_html(&step.description)
            )
        })
        .collect()
}

pub fn hours_html(contact: &ContactContent) -> String {
    contact
        .hours
        .iter()
        .map(|h| {
            let time = if h.open == h.close {
                escape_html(&h.open)
            } else {
                format!("{} - {}", escape_html(&h.open), escape_html(&h.close))
            };
            format!(
                r#"<div class="hours-item"><span class="day">{}:</span> <span class="time">{}</span></div>"#,
                escape_html(&h.day),
                time
            )
        })
        .collect()
}

/// Result of the injection step
#[derive(Debug, Default)]
pub struct Injection {
    pub html: String,
    pub replaced: usize,
    pub sections: Vec<String>,
}

impl Injection {
    fn apply(&mut self, name: &str, result: Option<(String, usize)>) {
        if let Some((html, count)) = result {
            self.html = html;
            self.replaced += count;
            self.sections.push(name.to_string());
        }
    }
}

/// Hero, services, about, why-us, process and contact injection
pub fn inject_enriched(html: &str, home: &HomeContent, contact: &ContactContent) -> Result<Injection> {
    let mut injection = Injection {
        html: html.to_string(),
        ..Default::default()
    };

    let hero = &home.hero;
    let fields = [
        ("title", hero.title.as_str()),
        ("subtitle", hero.subtitle.as_str()),
        ("description", hero.description.as_str()),
        ("cta1", hero.cta_primary.as_str()),
        ("cta2", hero.cta_secondary.as_str()),
    ];
    let result = with_section(&injection.html, HERO_SECTION, |inner| fill_fields(inner, &fields))?;
    injection.apply("hero", result);

    if !home.services.is_empty() {
        let items = services_html(home);
        let count = home.services.len() * 3;
        let result = with_section(&injection.html, SERVICES_SECTION, |_| Ok((items, count)))?;
        injection.apply("services", result);
    }

    let values = home.about.values.join(", ");
    let fields = [
        ("story", home.about.story.as_str()),
        ("mission", home.about.mission.as_str()),
        ("values", values.as_str()),
    ];
    let result = with_section(&injection.html, ABOUT_SECTION, |inner| fill_fields(inner, &fields))?;
    injection.apply("about", result);

    if !home.why_us.is_empty() {
        let items = why_us_html(home);
        let count = home.why_us.len() * 2;
        let result = with_section(&injection.html, WHY_US_SECTION, |_| Ok((items, count)))?;
        injection.apply("why-us", result);
    }

    if !home.processus.is_empty() {
        let items = process_html(home);
        let count = home.processus.len() * 2;
        let result = with_section(&injection.html, PROCESS_SECTION, |_| Ok((items, count)))?;
        injection.apply("process", result);
    }

    let zones = contact.zones.join(", ");
    let hours = hours_html(contact);
    let mut contact_count = 0;
    for (placeholder, value, escape) in [
        ("{{CONTACT_INTRO}}", contact.intro.as_str(), true),
        ("{{EMERGENCY_INFO}}", contact.emergency_info.as_str(), true),
        ("{{ZONES_INTERVENTION}}", zones.as_str(), true),
        ("{{HORAIRES}}", hours.as_str(), false),
    ] {
        let value = if escape { escape_html(value) } else { value.to_string() };
        let (next, n) = replace_counted(&build(&regex::escape(placeholder), false)?, &injection.html, &value);
        injection.html = next;
        contact_count += n;
    }
    if contact_count > 0 {
        injection.replaced += contact_count;
        injection.sections.push("contact".to_string());
    }

    Ok(injection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::content::{Hero, ServiceHighlight};
    use crate::enrichment::fallback;
    use crate::sanity::SiteColors;

    fn business() -> BusinessInfo {
        BusinessInfo {
            business_name: "Dupont & Fils".to_string(),
            business_type: "plombier".to_string(),
            ville: "Lyon".to_string(),
            code_postal: "69001".to_string(),
            domain: "dupont.fr".to_string(),
            colors: SiteColors {
                primary: "#1e40af".to_string(),
                secondary: "#64748b".to_string(),
                accent: "#f59e0b".to_string(),
            },
        }
    }

    #[test]
    fn test_business_placeholders_are_counted() {
        let form = ClientFormData {
            telephone: "04 78 00 00 00".to_string(),
            ..Default::default()
        };
        let body = "<h2>{{BUSINESS_NAME}}</h2><p>lorem ipsum dolor sit amet.</p><p>[VILLE] - Your Phone</p><footer>Your Company Name</footer>";
        let (html, _, count) = map_business_data(body, "", &form, &business()).unwrap();
        assert_eq!(count, 5);
        assert!(html.contains("<h2>Dupont &amp; Fils</h2>"));
        assert!(html.contains("votre plombier professionnel à Lyon"));
        assert!(html.contains("Lyon - 04 78 00 00 00"));
        assert!(html.contains("<footer>Dupont &amp; Fils</footer>"));
    }

    #[test]
    fn test_script_config_rewritten() {
        let js = "const cfg = { companyName: 'Acme', businessType: \"generic\" };";
        let (_, js, _) = map_business_data("", js, &ClientFormData::default(), &business()).unwrap();
        assert_eq!(
            js,
            "const cfg = { companyName: \"Dupont & Fils\", businessType: \"plombier\" };"
        );
    }

    #[test]
    fn test_inject_sections() {
        let home = HomeContent {
            hero: Hero {
                title: "Plombier à Lyon".to_string(),
                description: "Dépannage 7j/7".to_string(),
                ..Default::default()
            },
            services: vec![ServiceHighlight {
                title: "Fuite".to_string(),
                description: "Recherche".to_string(),
                features: vec!["Rapide".to_string()],
            }],
            ..Default::default()
        };
        let form = ClientFormData {
            business_name: "Dupont".to_string(),
            business_type: "plombier".to_string(),
            ville: "Lyon".to_string(),
            ..Default::default()
        };
        let contact = fallback::contact(&crate::enrichment::EnrichmentRequest::from_form(&form));

        let html = r#"<section class="hero main"><h1>{{TITLE}}</h1><p data-content="description">Lorem</p></section>
<section class="services"><div>placeholder</div></section>
<section id="contact" class="contact"><p>{{CONTACT_INTRO}}</p><div>{{HORAIRES}}</div></section>"#;

        let injection = inject_enriched(html, &home, &contact).unwrap();
        assert!(injection.html.contains("<h1>Plombier à Lyon</h1>"));
        assert!(injection.html.contains(r#"<p data-content="description">Dépannage 7j/7</p>"#));
        assert!(injection.html.contains(r#"<div class="service-item"><h3>Fuite</h3>"#));
        assert!(!injection.html.contains("placeholder"));
        assert!(injection.html.contains(r#"<span class="day">Dimanche:</span> <span class="time">Fermé</span>"#));
        assert_eq!(injection.sections, vec!["hero", "services", "contact"]);
        assert_eq!(injection.replaced, 2 + 3 + 2);
    }
}
