//! Schema sets and seed content for new CMS projects.

use chrono::{Duration, Utc};
use serde_json::{json, Value};

/// Schemas deployed on every project
pub const SETUP_BASE_SCHEMAS: &[&str] = &["client-site", "settings", "seo-config", "navigation"];

pub const FALLBACK_SCHEMA: &str = "services-generiques";

pub const DEFAULT_HOURS: &str = "Lun-Ven: 8h-18h, Sam: 8h-12h";

fn trade_schemas(business_type: &str) -> Option<&'static [&'static str]> {
    let schemas: &'static [&'static str] = match business_type {
        "plombier" => &[
            "services-plomberie",
            "urgences-24h",
            "certifications",
            "zones-intervention",
            "tarifs-depannage",
        ],
        "electricien" => &[
            "services-electricite",
            "domotique",
            "mise-aux-normes",
            "certifications-elec",
            "urgences-electriques",
        ],
        "menuisier" => &[
            "services-menuiserie",
            "materiaux",
            "realisations",
            "sur-mesure",
            "garanties",
        ],
        "paysagiste" => &[
            "services-paysagisme",
            "jardins",
            "espaces-verts",
            "entretien",
            "plantations",
        ],
        "macon" => &[
            "services-maconnerie",
            "gros-oeuvre",
            "renovations",
            "extensions",
            "terrassement",
        ],
        _ => return None,
    };
    Some(schemas)
}

/// Base schemas followed by the trade specific ones
pub fn project_schemas(business_type: &str) -> Vec<String> {
    let key = crate::catalog::normalize_business_type(business_type);
    let specific = trade_schemas(&key).unwrap_or(&[FALLBACK_SCHEMA]);
    SETUP_BASE_SCHEMAS
        .iter()
        .chain(specific.iter())
        .map(|s| s.to_string())
        .collect()
}

pub fn tagline(business_type: &str) -> &'static str {
    match crate::catalog::normalize_business_type(business_type).as_str() {
        "plombier" => "Votre plombier de confiance, 24h/7j",
        "electricien" => "Expert en électricité, installation et dépannage",
        "menuisier" => "Menuiserie sur-mesure et rénovation",
        "paysagiste" => "Création et entretien de jardins",
        "macon" => "Maçonnerie traditionnelle et moderne",
        "peintre" => "Peinture intérieure et extérieure",
        "couvreur" => "Couverture et étanchéité",
        "chauffagiste" => "Chauffage et climatisation",
        _ => "Professionnel à votre service",
    }
}

/// Trades that advertise an emergency line
pub fn has_emergency_mode(business_type: &str) -> bool {
    matches!(
        crate::catalog::normalize_business_type(business_type).as_str(),
        "plombier" | "electricien" | "chauffagiste"
    )
}

fn date_days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).format("%Y-%m-%d").to_string()
}

/// Two customer reviews per known trade
pub fn sample_testimonials(business_type: &str, city: &str) -> Vec<Value> {
    let reviews: &[(&str, &str, &str, &str)] = match crate::catalog::normalize_business_type(business_type).as_str() {
        "plombier" => &[
            ("Marie D.", "M.D.", "Intervention très rapide suite à une fuite. Travail propre et tarif correct. Je recommande !", "urgence"),
            ("Pierre M.", "P.M.", "Installation parfaite de notre chauffe-eau. Professionnel sérieux et ponctuel.", "installation"),
        ],
        "electricien" => &[
            ("Sophie L.", "S.L.", "Mise aux normes du tableau électrique réalisée en une journée, explications claires.", "mise-aux-normes"),
            ("Julien R.", "J.R.", "Panne réparée le soir même. Très réactif et de bon conseil.", "depannage"),
        ],
        "menuisier" => &[
            ("Claire B.", "C.B.", "Dressing sur-mesure magnifique, finitions impeccables.", "sur-mesure"),
            ("Antoine G.", "A.G.", "Fenêtres remplacées rapidement, chantier laissé propre.", "renovation"),
        ],
        "paysagiste" => &[
            ("Nathalie P.", "N.P.", "Notre jardin a été entièrement repensé, le résultat dépasse nos attentes.", "creation"),
            ("Laurent V.", "L.V.", "Entretien régulier et soigné, équipe très agréable.", "entretien"),
        ],
        "macon" => &[
            ("Isabelle T.", "I.T.", "Extension réalisée dans les délais, travail solide et soigné.", "extension"),
            ("Marc F.", "M.F.", "Reprise de façade impeccable, devis respecté.", "renovation"),
        ],
        _ => &[],
    };

    reviews
        .iter()
        .enumerate()
        .map(|(i, (name, initials, text, service))| {
            json!({
                "clientName": name,
                "clientInitials": initials,
                "location": city,
                "rating": 5,
                "testimonialText": text,
                "serviceType": service,
                "workDate": date_days_ago(15 * (i as i64 + 1)),
            })
        })
        .collect()
}

/// One showcase project per known trade
pub fn sample_projects(business_type: &str, city: &str) -> Vec<Value> {
    let (title, description, category, duration, budget) =
        match crate::catalog::normalize_business_type(business_type).as_str() {
            "plombier" => (
                "Rénovation complète salle de bain",
                "Rénovation complète avec installation sanitaires haut de gamme",
                "renovation-sdb",
                "5 jours",
                "5000-10000",
            ),
            "electricien" => (
                "Rénovation électrique d'une maison",
                "Remplacement du tableau et mise aux normes NF C 15-100",
                "renovation-electrique",
                "4 jours",
                "3000-6000",
            ),
            "menuisier" => (
                "Cuisine en chêne massif",
                "Conception et pose d'une cuisine sur-mesure",
                "agencement",
                "10 jours",
                "8000-15000",
            ),
            "paysagiste" => (
                "Création d'un jardin paysager",
                "Terrasse bois, massifs et arrosage automatique",
                "creation-jardin",
                "3 semaines",
                "10000-20000",
            ),
            "macon" => (
                "Extension de maison 25 m²",
                "Fondations, élévation des murs et dalle",
                "extension",
                "6 semaines",
                "30000-50000",
            ),
            _ => return Vec::new(),
        };

    vec![json!({
        "title": format!("{} - {}", title, city),
        "shortDescription": description,
        "category": category,
        "location": { "city": city, "district": "Centre-ville" },
        "timeline": {
            "duration": duration,
            "startDate": date_days_ago(45),
            "endDate": date_days_ago(40),
        },
        "budget": { "range": budget, "showBudget": false },
    })]
}

/// Local SEO keywords for a trade in a city
pub fn local_keywords(business_type: &str, city: &str) -> Vec<String> {
    let trade = business_type.to_lowercase();
    let city = city.to_lowercase();
    vec![
        trade.clone(),
        format!("{} {}", trade, city),
        format!("{} professionnel", trade),
        format!("devis gratuit {}", trade),
        format!("dépannage {}", trade),
        format!("intervention {}", trade),
    ]
}

/// Category of a free-form service name
pub fn categorize_service(name: &str, business_type: &str) -> String {
    let lower = name.to_lowercase();
    let prefix = if lower.contains("urgence") || lower.contains("dépannage") || lower.contains("depannage") {
        "urgence"
    } else if lower.contains("installation") {
        "installation"
    } else if lower.contains("rénovation") || lower.contains("renovation") {
        "renovation"
    } else {
        "service"
    };
    format!("{}-{}", prefix, business_type.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_schemas() {
        let plombier = project_schemas("Plombier");
        assert_eq!(plombier.len(), 9);
        assert_eq!(plombier[0], "client-site");
        assert!(plombier.contains(&"urgences-24h".to_string()));

        let unknown = project_schemas("boulanger");
        assert_eq!(unknown.len(), 5);
        assert_eq!(unknown.last().map(String::as_str), Some(FALLBACK_SCHEMA));
    }

    #[test]
    fn test_seed_content() {
        assert_eq!(sample_testimonials("plombier", "Lyon").len(), 2);
        assert!(sample_testimonials("boulanger", "Lyon").is_empty());
        let projects = sample_projects("macon", "Nantes");
        assert_eq!(projects[0]["title"], "Extension de maison 25 m² - Nantes");
        assert_eq!(local_keywords("Plombier", "Lyon")[1], "plombier lyon");
    }

    #[test]
    fn test_categorize_service() {
        assert_eq!(categorize_service("Dépannage fuite", "plombier"), "urgence-plombier");
        assert_eq!(categorize_service("Installation VMC", "electricien"), "installation-electricien");
        assert_eq!(categorize_service("Pose parquet", "menuisier"), "service-menuisier");
    }
}
