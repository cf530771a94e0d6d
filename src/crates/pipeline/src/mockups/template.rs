//! Mockup template catalog and placeholder content.

use crate::catalog::normalize_business_type;
use crate::domain::ClientFormData;
use serde::Serialize;

/// A static site template used to render a mockup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockupTemplate {
    pub name: &'static str,
    pub display_name: &'static str,
    /// Sub-directory of the templates root
    pub base_directory: &'static str,
    pub build_command: &'static str,
    /// Directory the build writes to, relative to the template root
    pub output_directory: &'static str,
    pub business_types: &'static [&'static str],
}

pub const AVAILABLE_TEMPLATES: &[MockupTemplate] = &[
    MockupTemplate {
        name: "classique",
        display_name: "Classique",
        base_directory: "classique",
        build_command: "npm run build",
        output_directory: "dist",
        business_types: &["plombier", "electricien", "menuisier", "paysagiste", "macon"],
    },
    MockupTemplate {
        name: "moderne",
        display_name: "Moderne",
        base_directory: "moderne",
        build_command: "npm run build",
        output_directory: "dist",
        business_types: &["plombier", "electricien", "paysagiste"],
    },
    MockupTemplate {
        name: "premium",
        display_name: "Premium",
        base_directory: "premium",
        build_command: "npm run build",
        output_directory: "dist",
        business_types: &["menuisier", "macon", "paysagiste"],
    },
    MockupTemplate {
        name: "urgence",
        display_name: "Urgence 24/7",
        base_directory: "urgence",
        build_command: "npm run build",
        output_directory: "dist",
        business_types: &["plombier", "electricien", "serrurier", "chauffagiste"],
    },
    MockupTemplate {
        name: "artisan",
        display_name: "Artisan",
        base_directory: "artisan",
        build_command: "npm run build",
        output_directory: "dist",
        business_types: &["menuisier", "macon", "peintre", "carreleur"],
    },
    MockupTemplate {
        name: "nature",
        display_name: "Nature",
        base_directory: "nature",
        build_command: "npm run build",
        output_directory: "dist",
        business_types: &["paysagiste"],
    },
];

pub const DEFAULT_TEMPLATE_SELECTION: &[&str] = &["classique", "moderne", "premium"];

pub fn find_template(name: &str) -> Option<&'static MockupTemplate> {
    AVAILABLE_TEMPLATES.iter().find(|t| t.name == name)
}

/// Templates that list `business_type` explicitly, in catalog order
pub fn compatible_templates(business_type: &str) -> Vec<&'static MockupTemplate> {
    let key = normalize_business_type(business_type);
    AVAILABLE_TEMPLATES
        .iter()
        .filter(|t| t.business_types.contains(&key.as_str()))
        .collect()
}

/// Pick at most `max` templates
///
/// Explicit choices win; otherwise the business type's compatible templates when there
/// are enough of them, otherwise the default trio.
pub fn select_templates(
    business_type: &str,
    requested: &[String],
    max: usize,
) -> Vec<&'static MockupTemplate> {
    if !requested.is_empty() {
        let chosen: Vec<_> = AVAILABLE_TEMPLATES
            .iter()
            .filter(|t| requested.iter().any(|r| r == t.name))
            .take(max)
            .collect();
        if !chosen.is_empty() {
            return chosen;
        }
    }

    let compatible = compatible_templates(business_type);
    if compatible.len() >= max {
        return compatible.into_iter().take(max).collect();
    }

    AVAILABLE_TEMPLATES
        .iter()
        .filter(|t| DEFAULT_TEMPLATE_SELECTION.contains(&t.name))
        .take(max)
        .collect()
}

pub const HERO_TITLE: &str = "{businessName} - Votre {businessType} de confiance";
pub const HERO_SUBTITLE: &str =
    "Intervention rapide à {location} et ses environs. Lorem ipsum dolor sit amet, consectetur adipiscing elit.";
pub const HERO_CTA: &str = "Demander un devis gratuit";
pub const CONTACT_TITLE: &str = "Contactez-nous";
pub const CONTACT_DESCRIPTION: &str =
    "Devis gratuit et sans engagement. Lorem ipsum dolor sit amet, sed do eiusmod tempor.";

const SERVICE_HEADLINES: [&str; 4] = [
    "Service rapide et efficace",
    "Devis gratuit sous 24h",
    "Intervention d'urgence",
    "Garantie sur tous travaux",
];

/// Placeholder → value pairs for a client
pub fn replacements(form: &ClientFormData) -> Vec<(&'static str, String)> {
    vec![
        ("{{BUSINESS_NAME}}", form.business_name.clone()),
        ("{{BUSINESS_TYPE}}", form.business_type.clone()),
        ("{{LOCATION}}", form.ville.clone()),
        ("{{PHONE}}", form.telephone.clone()),
        ("{{EMAIL}}", form.email.clone()),
        (
            "{{HERO_TITLE}}",
            HERO_TITLE
                .replace("{businessName}", &form.business_name)
                .replace("{businessType}", &form.business_type),
        ),
        ("{{HERO_SUBTITLE}}", HERO_SUBTITLE.replace("{location}", &form.ville)),
        ("{{HERO_CTA}}", HERO_CTA.to_string()),
        ("{{CONTACT_TITLE}}", CONTACT_TITLE.to_string()),
        ("{{CONTACT_DESCRIPTION}}", CONTACT_DESCRIPTION.to_string()),
        ("{{SERVICE_ITEMS}}", service_items_html()),
    ]
}

pub fn service_items_html() -> String {
    SERVICE_HEADLINES
        .iter()
        .map(|headline| {
            format!(
                r#"
      <div class="bg-white p-6 rounded-lg shadow-md text-center">
        <h3 class="text-xl font-semibold text-gray-900 mb-4">{}</h3>
        <p class="text-gray-600">Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod tempor incididunt ut labore.</p>
      </div>"#,
                headline
            )
        })
        .collect()
}

/// `package.json` for the generated fallback template
pub fn basic_package_json(template: &MockupTemplate) -> serde_json::Value {
    serde_json::json!({
        "name": format!("mockup-{}", template.name),
        "version": "1.0.0",
        "private": true,
        "scripts": {
            "build": format!("mkdir -p {out} && cp *.html *.css {out}/", out = template.output_directory)
        }
    })
}

pub const BASIC_STYLESHEET: &str = r#":root {
    --primary-color: #4f46e5;
    --secondary-color: #6366f1;
    --accent-color: #8b5cf6;
}
.btn-primary {
    background-color: var(--primary-color);
    color: white;
    padding: 12px 24px;
    border-radius: 6px;
    text-decoration: none;
    display: inline-block;
    transition: all 0.3s ease;
}
.btn-primary:hover {
    background-color: var(--secondary-color);
    transform: translateY(-2px);
}
.accent {
    color: var(--accent-color);
}
"#;

/// Single-page fallback used when a template directory is missing
pub const BASIC_INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{BUSINESS_NAME}} - {{BUSINESS_TYPE}}</title>
    <link href="https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css" rel="stylesheet">
    <link href="styles.css" rel="stylesheet">
</head>
<body class="bg-gray-50">
    <header class="bg-white shadow-sm">
        <nav class="max-w-7xl mx-auto px-4 sm:px-6 lg:px-8">
            <div class="flex justify-between items-center py-6">
                <h1 class="text-2xl font-bold text-gray-900">{{BUSINESS_NAME}}</h1>
                <div class="hidden md:flex items-center space-x-8">
                    <a href="#services" class="text-gray-700 hover:text-gray-900">Services</a>
                    <a href="#contact" class="text-gray-700 hover:text-gray-900">Contact</a>
                    <a href="tel:{{PHONE}}" class="btn-primary">Appeler</a>
                </div>
            </div>
        </nav>
    </header>

    <section class="bg-gradient-to-br from-blue-50 to-indigo-100 py-20">
        <div class="max-w-7xl mx-auto px-4 text-center">
            <h2 class="text-4xl md:text-6xl font-bold text-gray-900 mb-6">{{HERO_TITLE}}</h2>
            <p class="text-xl text-gray-600 mb-8 max-w-3xl mx-auto">{{HERO_SUBTITLE}}</p>
            <div class="flex flex-col sm:flex-row gap-4 justify-center">
                <a href="#contact" class="btn-primary text-lg">{{HERO_CTA}}</a>
                <a href="tel:{{PHONE}}" class="bg-white text-gray-900 px-8 py-3 rounded-lg border-2 border-gray-200">{{PHONE}}</a>
            </div>
        </div>
    </section>

    <section id="services" class="py-20 bg-white">
        <div class="max-w-7xl mx-auto px-4">
            <h2 class="text-3xl font-bold text-center text-gray-900 mb-12">Nos Services</h2>
            <div class="grid md:grid-cols-2 lg:grid-cols-4 gap-8">
                {{SERVICE_ITEMS}}
            </div>
        </div>
    </section>

    <section id="contact" class="py-20 bg-gray-50">
        <div class="max-w-7xl mx-auto px-4 text-center">
            <h2 class="text-3xl font-bold text-gray-900 mb-8">{{CONTACT_TITLE}}</h2>
            <p class="text-xl text-gray-600 mb-8">{{CONTACT_DESCRIPTION}}</p>
            <div class="text-gray-600">
                <p><strong>Téléphone :</strong> {{PHONE}}</p>
                <p><strong>Email :</strong> {{EMAIL}}</p>
                <p><strong>Zone d'intervention :</strong> {{LOCATION}}</p>
            </div>
        </div>
    </section>

    <footer class="bg-gray-900 text-white py-12">
        <div class="max-w-7xl mx-auto px-4 text-center">
            <h3 class="text-xl font-bold mb-4">{{BUSINESS_NAME}}</h3>
            <p class="text-gray-400 mb-4">Votre expert {{BUSINESS_TYPE}} à {{LOCATION}}</p>
            <p class="text-sm text-gray-400">&copy; {{BUSINESS_NAME}}. Tous droits réservés. Propulsé par AWEMA.</p>
        </div>
    </footer>
</body>
</html>
"##;
