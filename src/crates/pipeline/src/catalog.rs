//! Business type catalog
//!
//! Static description of each supported trade: the Sanity schemas a site needs, the
//! services offered out of the box, brand colours, SEO keywords and template variants.
//! Lookups are accent and case insensitive, so `"Électricien"` resolves like
//! `"electricien"`.

use crate::patterns;
use serde::Serialize;
use utils::text::{fold_accents, slugify, to_base36};

/// How a service is priced on the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pricing {
    Fixed,
    Starting,
    Quote,
    Free,
}

impl Pricing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pricing::Fixed => "fixed",
            Pricing::Starting => "starting",
            Pricing::Quote => "quote",
            Pricing::Free => "free",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTemplate {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub pricing: Pricing,
    pub amount: Option<u32>,
    pub urgency: bool,
    pub featured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorScheme {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateVariant {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub preview: &'static str,
    pub premium: bool,
    pub features: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessTypeConfig {
    pub name: &'static str,
    pub display_name: &'static str,
    pub schemas: &'static [&'static str],
    pub default_services: &'static [ServiceTemplate],
    pub seo_keywords: &'static [&'static str],
    pub features: &'static [&'static str],
    pub colors: ColorScheme,
    pub templates: &'static [TemplateVariant],
}

/// Site-level template offered after the mockup phase
#[derive(Debug, Clone, Serialize)]
pub struct TemplateConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub premium: bool,
}

pub const DEFAULT_COLORS: ColorScheme = ColorScheme {
    primary: "#2563eb",
    secondary: "#1e40af",
    accent: "#3b82f6",
};

/// Schemas shared by every site
pub const BASE_SCHEMAS: &[&str] = &[
    "client-site",
    "settings",
    "services",
    "testimonials",
    "projects",
    "navigation",
    "seo-config",
    "blockContent",
];

pub const DEFAULT_WEBHOOK_EVENTS: &[&str] =
    &["content-update", "site-rebuild", "seo-sync", "analytics-update"];

pub const TEMPLATE_CONFIGS: &[TemplateConfig] = &[
    TemplateConfig {
        id: "classique",
        name: "Classique",
        description: "Template épuré et professionnel",
        features: &["responsive", "seo-optimized", "contact-form"],
        premium: false,
    },
    TemplateConfig {
        id: "moderne",
        name: "Moderne",
        description: "Design moderne avec animations",
        features: &["animations", "parallax", "video-background"],
        premium: true,
    },
    TemplateConfig {
        id: "premium",
        name: "Premium",
        description: "Template haut de gamme avec fonctionnalités avancées",
        features: &["advanced-gallery", "booking-system", "live-chat"],
        premium: true,
    },
];

const fn service(
    name: &'static str,
    category: &'static str,
    description: &'static str,
    pricing: Pricing,
    amount: Option<u32>,
    urgency: bool,
    featured: bool,
) -> ServiceTemplate {
    ServiceTemplate {
        name,
        category,
        description,
        pricing,
        amount,
        urgency,
        featured,
    }
}

pub const BUSINESS_TYPES: &[BusinessTypeConfig] = &[
    BusinessTypeConfig {
        name: "plombier",
        display_name: "Plombier",
        schemas: &[
            "client-site",
            "settings",
            "services",
            "testimonials",
            "projects",
            "services-plomberie",
            "urgences-24h",
            "certifications",
            "zones-intervention",
            "tarifs-depannage",
        ],
        default_services: &[
            service(
                "Dépannage urgence 24h/7j",
                "urgence-plomberie",
                "Intervention rapide pour fuites, canalisations bouchées, pannes chauffe-eau",
                Pricing::Starting,
                Some(80),
                true,
                true,
            ),
            service(
                "Installation chauffe-eau",
                "installation-plomberie",
                "Installation et remplacement de chauffe-eau électrique, gaz ou thermodynamique",
                Pricing::Starting,
                Some(200),
                false,
                true,
            ),
            service(
                "Rénovation salle de bain",
                "renovation-plomberie",
                "Rénovation complète : plomberie, sanitaires, carrelage, douche italienne",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Débouchage canalisations",
                "entretien-plomberie",
                "Débouchage haute pression, inspection caméra, détartrage",
                Pricing::Starting,
                Some(90),
                true,
                false,
            ),
        ],
        seo_keywords: &[
            "plombier",
            "dépannage plomberie",
            "installation chauffe-eau",
            "rénovation salle de bain",
            "urgence plomberie",
            "fuite eau",
            "canalisation bouchée",
        ],
        features: &[
            "urgency-24h",
            "online-quote",
            "before-after-gallery",
            "certification-display",
            "intervention-zones",
        ],
        colors: ColorScheme {
            primary: "#2563eb",
            secondary: "#1e40af",
            accent: "#3b82f6",
        },
        templates: &[
            TemplateVariant {
                id: "plombier-classique",
                name: "Classique",
                description: "Template épuré et professionnel",
                preview: "/templates/plombier-classique.jpg",
                premium: false,
                features: &["responsive", "seo-optimized", "contact-form"],
            },
            TemplateVariant {
                id: "plombier-moderne",
                name: "Moderne",
                description: "Design moderne avec animations",
                preview: "/templates/plombier-moderne.jpg",
                premium: true,
                features: &["animations", "parallax", "video-background"],
            },
        ],
    },
    BusinessTypeConfig {
        name: "electricien",
        display_name: "Électricien",
        schemas: &[
            "client-site",
            "settings",
            "services",
            "testimonials",
            "projects",
            "services-electricite",
            "domotique",
            "mise-aux-normes",
            "certifications-elec",
            "urgences-electriques",
        ],
        default_services: &[
            service(
                "Installation électrique complète",
                "installation-electricite",
                "Installation et rénovation de tableaux électriques aux normes NF C 15-100",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Domotique connectée",
                "domotique",
                "Installation de systèmes domotiques : éclairage, volets, chauffage connectés",
                Pricing::Starting,
                Some(300),
                false,
                true,
            ),
            service(
                "Dépannage électrique urgence",
                "depannage-electricite",
                "Intervention rapide pour pannes électriques, court-circuits, disjoncteurs",
                Pricing::Starting,
                Some(90),
                true,
                true,
            ),
            service(
                "Mise aux normes",
                "normes-electricite",
                "Mise en conformité installation électrique selon NF C 15-100",
                Pricing::Quote,
                None,
                false,
                false,
            ),
        ],
        seo_keywords: &[
            "électricien",
            "installation électrique",
            "domotique",
            "tableau électrique",
            "mise aux normes",
            "dépannage électricité",
            "NF C 15-100",
        ],
        features: &[
            "urgency-24h",
            "smart-home-showcase",
            "certification-display",
            "before-after-gallery",
            "quote-calculator",
        ],
        colors: ColorScheme {
            primary: "#f59e0b",
            secondary: "#d97706",
            accent: "#fbbf24",
        },
        templates: &[
            TemplateVariant {
                id: "electricien-pro",
                name: "Professionnel",
                description: "Template axé sur les certifications",
                preview: "/templates/electricien-pro.jpg",
                premium: false,
                features: &["certifications-slider", "service-calculator"],
            },
            TemplateVariant {
                id: "electricien-smart",
                name: "Smart Home",
                description: "Spécialisé domotique et maison connectée",
                preview: "/templates/electricien-smart.jpg",
                premium: true,
                features: &["interactive-demo", "3d-visualization"],
            },
        ],
    },
    BusinessTypeConfig {
        name: "menuisier",
        display_name: "Menuisier",
        schemas: &[
            "client-site",
            "settings",
            "services",
            "testimonials",
            "projects",
            "services-menuiserie",
            "materiaux",
            "realisations",
            "sur-mesure",
            "garanties",
        ],
        default_services: &[
            service(
                "Aménagement sur-mesure",
                "sur-mesure",
                "Conception et fabrication de meubles sur-mesure : placards, bibliothèques, cuisines",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Rénovation parquet",
                "renovation-menuiserie",
                "Pose, rénovation et vitrification de parquets massifs et contrecollés",
                Pricing::Starting,
                Some(45),
                false,
                true,
            ),
            service(
                "Menuiserie extérieure",
                "menuiserie-exterieure",
                "Terrasses bois, pergolas, clôtures, bardages et aménagements extérieurs",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Dépannage menuiserie",
                "depannage-menuiserie",
                "Réparation portes, fenêtres, serrures, ajustements",
                Pricing::Starting,
                Some(80),
                true,
                false,
            ),
        ],
        seo_keywords: &[
            "menuisier",
            "aménagement sur-mesure",
            "parquet",
            "terrasse bois",
            "menuiserie extérieure",
            "placards",
            "rénovation bois",
        ],
        features: &[
            "portfolio-gallery",
            "material-showcase",
            "custom-quote-form",
            "3d-preview",
            "wood-calculator",
        ],
        colors: ColorScheme {
            primary: "#92400e",
            secondary: "#78350f",
            accent: "#a16207",
        },
        templates: &[
            TemplateVariant {
                id: "menuisier-artisan",
                name: "Artisan",
                description: "Template chaleureux avec focus sur le savoir-faire",
                preview: "/templates/menuisier-artisan.jpg",
                premium: false,
                features: &["wood-textures", "craft-showcase"],
            },
            TemplateVariant {
                id: "menuisier-premium",
                name: "Premium",
                description: "Haut de gamme avec galerie interactive",
                preview: "/templates/menuisier-premium.jpg",
                premium: true,
                features: &["360-gallery", "material-visualizer"],
            },
        ],
    },
    BusinessTypeConfig {
        name: "paysagiste",
        display_name: "Paysagiste",
        schemas: &[
            "client-site",
            "settings",
            "services",
            "testimonials",
            "projects",
            "services-paysagisme",
            "jardins",
            "espaces-verts",
            "entretien",
            "plantations",
        ],
        default_services: &[
            service(
                "Création de jardins",
                "creation-jardins",
                "Conception et réalisation de jardins paysagers, massifs, allées",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Entretien espaces verts",
                "entretien-jardins",
                "Tonte, taille, désherbage, traitement, entretien annuel",
                Pricing::Starting,
                Some(35),
                false,
                true,
            ),
            service(
                "Élagage et abattage",
                "elagage",
                "Élagage, taille sanitaire, abattage sécurisé, évacuation",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Arrosage automatique",
                "arrosage",
                "Installation systèmes d'arrosage automatique, programmateurs",
                Pricing::Starting,
                Some(500),
                false,
                false,
            ),
        ],
        seo_keywords: &[
            "paysagiste",
            "création jardin",
            "entretien espaces verts",
            "élagage",
            "arrosage automatique",
            "aménagement extérieur",
            "jardinier",
        ],
        features: &[
            "seasonal-gallery",
            "plant-database",
            "garden-visualizer",
            "maintenance-calendar",
            "quote-by-area",
        ],
        colors: ColorScheme {
            primary: "#16a34a",
            secondary: "#15803d",
            accent: "#22c55e",
        },
        templates: &[
            TemplateVariant {
                id: "paysagiste-nature",
                name: "Nature",
                description: "Template vert avec focus sur les plantes",
                preview: "/templates/paysagiste-nature.jpg",
                premium: false,
                features: &["plant-carousel", "seasonal-colors"],
            },
            TemplateVariant {
                id: "paysagiste-luxury",
                name: "Luxury Gardens",
                description: "Haut de gamme pour jardins d'exception",
                preview: "/templates/paysagiste-luxury.jpg",
                premium: true,
                features: &["drone-videos", "vr-garden-tour"],
            },
        ],
    },
    BusinessTypeConfig {
        name: "macon",
        display_name: "Maçon",
        schemas: &[
            "client-site",
            "settings",
            "services",
            "testimonials",
            "projects",
            "services-maconnerie",
            "gros-oeuvre",
            "renovations",
            "extensions",
            "terrassement",
        ],
        default_services: &[
            service(
                "Extension maison",
                "extension",
                "Extensions, surélévations, agrandissements de maisons",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Rénovation façade",
                "facade",
                "Ravalement, isolation extérieure, enduits, peinture façade",
                Pricing::Quote,
                None,
                false,
                true,
            ),
            service(
                "Terrassement",
                "terrassement",
                "Excavation, nivellement, fondations, VRD",
                Pricing::Starting,
                Some(50),
                false,
                true,
            ),
            service(
                "Création ouvertures",
                "ouverture",
                "Percement murs porteurs, fenêtres, portes, baies vitrées",
                Pricing::Quote,
                None,
                false,
                false,
            ),
        ],
        seo_keywords: &[
            "maçon",
            "extension maison",
            "rénovation façade",
            "terrassement",
            "gros œuvre",
            "construction",
            "ravalement",
        ],
        features: &[
            "project-timeline",
            "construction-phases",
            "material-calculator",
            "permit-assistance",
            "progress-tracking",
        ],
        colors: ColorScheme {
            primary: "#6b7280",
            secondary: "#4b5563",
            accent: "#9ca3af",
        },
        templates: &[
            TemplateVariant {
                id: "macon-construction",
                name: "Construction",
                description: "Template robuste axé sur la construction",
                preview: "/templates/macon-construction.jpg",
                premium: false,
                features: &["construction-timeline", "material-showcase"],
            },
            TemplateVariant {
                id: "macon-renovation",
                name: "Rénovation",
                description: "Spécialisé dans la rénovation et l'extension",
                preview: "/templates/macon-renovation.jpg",
                premium: true,
                features: &["before-after-slider", "3d-modeling"],
            },
        ],
    },
];

/// Canonical catalog key for a free-form business type
pub fn normalize_business_type(business_type: &str) -> String {
    fold_accents(business_type.trim()).to_lowercase()
}

pub fn business_config(business_type: &str) -> Option<&'static BusinessTypeConfig> {
    let key = normalize_business_type(business_type);
    BUSINESS_TYPES.iter().find(|b| b.name == key)
}

/// Per-type schemas, or the base set for unknown types
pub fn schemas_for_business(business_type: &str) -> &'static [&'static str] {
    business_config(business_type).map_or(BASE_SCHEMAS, |b| b.schemas)
}

pub fn default_services(business_type: &str) -> &'static [ServiceTemplate] {
    business_config(business_type).map_or(&[], |b| b.default_services)
}

pub fn templates_for_business(business_type: &str) -> &'static [TemplateVariant] {
    business_config(business_type).map_or(&[], |b| b.templates)
}

pub fn features_for_business(business_type: &str) -> &'static [&'static str] {
    business_config(business_type).map_or(&[], |b| b.features)
}

pub fn colors_for_business(business_type: &str) -> ColorScheme {
    business_config(business_type).map_or(DEFAULT_COLORS, |b| b.colors)
}

pub fn seo_keywords(business_type: &str) -> &'static [&'static str] {
    business_config(business_type).map_or(&[], |b| b.seo_keywords)
}

pub fn supported_business_types() -> Vec<&'static str> {
    BUSINESS_TYPES.iter().map(|b| b.name).collect()
}

/// Display name for a business type, falling back to the raw value capitalized
pub fn display_name(business_type: &str) -> String {
    business_config(business_type)
        .map(|b| b.display_name.to_string())
        .unwrap_or_else(|| utils::capitalize(business_type.trim()))
}

pub fn template_config(id: &str) -> Option<&'static TemplateConfig> {
    TEMPLATE_CONFIGS.iter().find(|t| t.id == id)
}

/// Check the pieces of a new Sanity project configuration
///
/// Returns one French message per problem; empty means valid.
pub fn validate_project_config(
    business_type: Option<&str>,
    domain: Option<&str>,
    template: Option<&str>,
) -> Vec<String> {
    let mut errors = Vec::new();

    if business_type.and_then(business_config).is_none() {
        errors.push("Type de métier invalide ou manquant".to_string());
    }

    let domain_ok = match (domain, patterns::regex(patterns::DOMAIN)) {
        (Some(d), Ok(re)) => re.is_match(d),
        _ => false,
    };
    if !domain_ok {
        errors.push("Nom de domaine invalide".to_string());
    }

    if template.map_or(true, |t| t.trim().is_empty()) {
        errors.push("Template manquant".to_string());
    }

    errors
}

/// `{slug}-{base36 millis}` with the slug capped at 30 characters
pub fn generate_project_id(business_name: &str) -> String {
    let slug = slugify(business_name, 30);
    let timestamp = chrono::Utc::now().timestamp_millis().max(0) as u64;
    format!("{}-{}", slug, to_base36(timestamp))
}
