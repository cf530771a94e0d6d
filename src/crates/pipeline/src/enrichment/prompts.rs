//! Prompts sent to DeepSeek.

use super::content::{EnrichmentRequest, PreviewRequest};

pub const SYSTEM_PROMPT: &str = "Tu es un expert en rédaction web SEO et marketing digital pour les artisans français. Tu génères du contenu professionnel, optimisé SEO et authentique.";

pub const TEMPERATURE: f32 = 0.7;

pub const HOME_MAX_TOKENS: usize = 2000;
pub const SERVICE_MAX_TOKENS: usize = 1500;
pub const ABOUT_MAX_TOKENS: usize = 1200;
pub const PREVIEW_MAX_TOKENS: usize = 500;

fn form_json(request: &EnrichmentRequest) -> String {
    serde_json::to_string_pretty(&request.form).unwrap_or_default()
}

pub fn home_prompt(request: &EnrichmentRequest) -> String {
    format!(
        r#"Génère le contenu d'accueil pour {name}, {metier} à {ville}.

CONTRAINTES STRICTES :
- Minimum {words} mots au total pour la page
- Ton professionnel et rassurant
- Mots-clés naturels : "{metier} {ville}"
- Références locales à {ville}
- Call-to-actions pertinents
- Éviter le jargon technique

SECTIONS À CRÉER :
1. HERO (200 mots) : titre accrocheur avec ville, sous-titre métier, description détaillée, 2 call-to-actions
2. SERVICES (300 mots) : 4-6 services principaux détaillés avec leurs avantages
3. À PROPOS (300 mots) : histoire, mission et valeurs, expertise locale, engagement qualité
4. PROCESSUS (200 mots) : 4-5 étapes, de la demande à la finalisation

Données client disponibles : {form}

Réponds uniquement en JSON avec cette structure :
{{
  "hero": {{ "title": "...", "subtitle": "...", "description": "...", "ctaPrimary": "...", "ctaSecondary": "..." }},
  "services": [{{ "title": "...", "description": "...", "features": ["...", "...", "..."] }}],
  "about": {{ "story": "...", "mission": "...", "values": ["...", "...", "..."] }},
  "processus": [{{ "step": 1, "title": "...", "description": "..." }}],
  "whyUs": [{{ "title": "...", "description": "...", "icon": "..." }}]
}}"#,
        name = request.business_name,
        metier = request.business_type,
        ville = request.ville,
        words = request.target_word_count,
        form = form_json(request),
    )
}

pub fn service_prompt(service: &str, request: &EnrichmentRequest) -> String {
    format!(
        r#"Génère une page service complète pour "{service}" par {name} à {ville}.

CONTRAINTES :
- {words}+ mots minimum
- SEO local optimisé
- Ton professionnel
- Call-to-actions pertinents

SECTIONS :
1. Hero avec titre SEO (100 mots)
2. Description détaillée (400 mots)
3. Avantages et bénéfices (200 mots)
4. Processus d'intervention (200 mots)
5. FAQ spécifique (100 mots)

Mots-clés : "{service} {ville}", "{metier} {ville}"

Réponds en JSON :
{{
  "slug": "...",
  "title": "...",
  "metaDescription": "...",
  "heroContent": "...",
  "detailedDescription": "...",
  "benefits": ["...", "..."],
  "process": [{{ "step": 1, "title": "...", "description": "..." }}],
  "faq": [{{ "question": "...", "answer": "..." }}],
  "localKeywords": ["...", "..."]
}}"#,
        name = request.business_name,
        metier = request.business_type,
        ville = request.ville,
        words = request.target_word_count,
    )
}

pub fn about_prompt(request: &EnrichmentRequest) -> String {
    format!(
        r#"Génère une page "À propos" engageante pour {name}, {metier} à {ville}.

CONTRAINTES :
- 800+ mots minimum
- Histoire authentique et crédible
- Expertise locale mise en avant
- Valeurs d'artisan français
- Certifications et garanties

SECTIONS :
1. Histoire de l'entreprise (300 mots)
2. Équipe et savoir-faire (200 mots)
3. Valeurs et engagement (200 mots)
4. Certifications (100 mots)

Données : {form}

Réponds en JSON :
{{
  "story": "...",
  "team": "...",
  "values": ["...", "...", "..."],
  "certifications": ["...", "..."],
  "experience": "...",
  "localHistory": "..."
}}"#,
        name = request.business_name,
        metier = request.business_type,
        ville = request.ville,
        form = form_json(request),
    )
}

pub fn preview_prompt(request: &PreviewRequest) -> String {
    format!(
        r#"Génère un aperçu en 2 phrases pour {}, {} à {}. Ton professionnel, mots-clés naturels.
Réponds en JSON : {{ "homeExcerpt": "..." }}"#,
        request.business_name, request.business_type, request.ville
    )
}
