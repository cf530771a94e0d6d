//! HTML and text bodies of the outgoing emails.

use super::tracking::add_tracking_params;
use crate::mockups::template::find_template;
use utils::escape_html as escape;

pub const PROPOSAL_SUBJECT: &str = "🎨 Vos 3 propositions de site web sont prêtes !";
pub const FOLLOW_UP_SUBJECT: &str = "⏰ Dernière chance : vos propositions de site web";
pub const COMPLETION_SUBJECT: &str = "🚀 Votre site web est en ligne !";

/// Hours the mockups stay online
pub const OFFER_HOURS: u32 = 72;

/// One mockup card in the proposal email
#[derive(Debug, Clone)]
pub struct MockupLink {
    pub id: String,
    pub name: String,
    pub url: String,
    pub screenshot: Option<String>,
    pub description: String,
}

impl MockupLink {
    pub fn from_template(template_name: &str, url: &str, screenshot: Option<&str>) -> Self {
        let (name, description) = match find_template(template_name) {
            Some(t) => (t.display_name.to_string(), card_description(t.name)),
            None => (utils::capitalize(template_name), "Design personnalisé".to_string()),
        };
        Self {
            id: template_name.to_string(),
            name,
            url: url.to_string(),
            screenshot: screenshot.map(str::to_string),
            description,
        }
    }
}

fn card_description(template: &str) -> String {
    match template {
        "classique" => "Un design intemporel qui inspire confiance",
        "moderne" => "Un style épuré et dynamique",
        "premium" => "Une présentation haut de gamme pour se démarquer",
        "urgence" => "Mis en avant de vos interventions d'urgence",
        "artisan" => "L'authenticité du savoir-faire artisanal",
        "nature" => "Des tons naturels pour vos espaces verts",
        _ => "Design personnalisé",
    }
    .to_string()
}

/// What the proposal email talks about
#[derive(Debug, Clone)]
pub struct ProposalContext<'a> {
    pub client_name: &'a str,
    pub business_name: &'a str,
    pub metier: &'a str,
    pub ville: &'a str,
    pub workflow_id: &'a str,
    pub mockups: &'a [MockupLink],
    pub tracking_id: &'a str,
    /// Base URL of the studio, serving the compare page and the tracking endpoints
    pub tracking_domain: &'a str,
}

impl ProposalContext<'_> {
    fn tracked(&self, url: &str, source: &str) -> String {
        add_tracking_params(url, self.tracking_id, source)
    }

    fn compare_url(&self) -> String {
        self.tracked(
            &format!("{}/compare-mockups?client={}", self.tracking_domain, self.workflow_id),
            "compare-all",
        )
    }

    fn pixel_url(&self) -> String {
        format!("{}/api/emails/track/open/{}", self.tracking_domain, self.tracking_id)
    }
}

const STYLES: &str = r#"body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background: #f7fafc; }
.container { max-width: 600px; margin: 0 auto; background: #fff; }
.header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #fff; padding: 40px 30px; text-align: center; }
.header h1 { margin: 0; font-size: 28px; }
.content { padding: 30px; }
.mockup-card { border: 1px solid #e2e8f0; border-radius: 8px; margin: 20px 0; overflow: hidden; }
.mockup-card img { width: 100%; display: block; }
.mockup-info { padding: 20px; }
.mockup-info h3 { margin: 0 0 8px; color: #2d3748; }
.btn { display: inline-block; padding: 12px 24px; background: #667eea; color: #fff !important; text-decoration: none; border-radius: 6px; font-weight: 600; }
.compare-section { background: #f0fff4; border-radius: 8px; padding: 20px; text-align: center; margin: 30px 0; }
.compare-section .btn { background: #48bb78; }
.urgency { background: #fed7d7; color: #742a2a; border-radius: 8px; padding: 15px; text-align: center; margin: 20px 0; }
.footer { background: #2d3748; color: #a0aec0; padding: 20px 30px; text-align: center; font-size: 12px; }
.footer a { color: #cbd5e0; }"#;

fn mockup_card(ctx: &ProposalContext<'_>, mockup: &MockupLink) -> String {
    let url = ctx.tracked(&mockup.url, &format!("mockup-{}", mockup.id));
    let image = mockup
        .screenshot
        .as_deref()
        .map(|src| format!(r#"<img src="{}" alt="{}">"#, escape(src), escape(&mockup.name)))
        .unwrap_or_default();
    format!(
        r#"<div class="mockup-card">{image}<div class="mockup-info"><h3>{name}</h3><p>{description}</p><a class="btn" href="{url}">Voir cette proposition →</a></div></div>"#,
        image = image,
        name = escape(&mockup.name),
        description = escape(&mockup.description),
        url = escape(&url),
    )
}

fn footer(ctx: &ProposalContext<'_>) -> String {
    format!(
        r#"<div class="footer"><p>AWEMA - Création de sites web pour artisans</p><p><a href="{unsubscribe}">Se désinscrire</a> · <a href="{privacy}">Confidentialité</a></p></div><img src="{pixel}" width="1" height="1" alt="" style="display:none">"#,
        unsubscribe = escape(&ctx.tracked(&format!("{}/unsubscribe", ctx.tracking_domain), "unsubscribe")),
        privacy = escape(&ctx.tracked(&format!("{}/privacy", ctx.tracking_domain), "privacy")),
        pixel = escape(&ctx.pixel_url()),
    )
}

pub fn proposal_html(ctx: &ProposalContext<'_>) -> String {
    let cards: String = ctx.mockups.iter().map(|m| mockup_card(ctx, m)).collect();
    let count = ctx.mockups.len();

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>Vos propositions de site web</title><style>{styles}</style></head>
<body>
<div class="container">
<div class="header"><h1>🎨 Vos propositions sont prêtes !</h1><p>{count} designs uniques pour {business}</p></div>
<div class="content">
<p>Bonjour {client},</p>
<p>Nous avons créé {count} propositions personnalisées pour <strong>{business}</strong>. Chaque design est spécialement adapté à votre activité de {metier} à {ville}.</p>
{cards}
<div class="compare-section"><h3>💡 Besoin d'aide pour choisir ?</h3><p>Comparez les propositions côte à côte et choisissez celle qui vous ressemble.</p><a class="btn" href="{compare}">Comparer les {count} propositions</a></div>
<div class="urgency">⏰ <strong>Offre limitée :</strong> ces propositions sont disponibles pendant {hours} heures</div>
<p>À très bientôt,<br>L'équipe AWEMA</p>
</div>
{footer}
</div>
</body>
</html>"#,
        styles = STYLES,
        count = count,
        business = escape(ctx.business_name),
        client = escape(ctx.client_name),
        metier = escape(ctx.metier),
        ville = escape(ctx.ville),
        cards = cards,
        compare = escape(&ctx.compare_url()),
        hours = OFFER_HOURS,
        footer = footer(ctx),
    )
}

pub fn proposal_text(ctx: &ProposalContext<'_>) -> String {
    let mut text = format!(
        "Bonjour {},\n\nNous avons créé {} propositions personnalisées pour {}.\nChaque design est spécialement adapté à votre activité de {} à {}.\n\n",
        ctx.client_name,
        ctx.mockups.len(),
        ctx.business_name,
        ctx.metier,
        ctx.ville
    );
    for (i, mockup) in ctx.mockups.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} - {}\n   {}\n\n",
            i + 1,
            mockup.name,
            mockup.description,
            ctx.tracked(&mockup.url, &format!("mockup-{}", mockup.id))
        ));
    }
    text.push_str(&format!(
        "Comparer les propositions : {}\n\n⏰ Offre limitée : ces propositions sont disponibles pendant {} heures.\n\nL'équipe AWEMA\n",
        ctx.compare_url(),
        OFFER_HOURS
    ));
    text
}

/// Reminder sent when the proposal was neither opened nor clicked
pub fn follow_up_html(client_name: &str, business_name: &str, link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head><meta charset="utf-8"><style>{styles}</style></head>
<body>
<div class="container">
<div class="content">
<p>Bonjour {client},</p>
<p>Vous avez peut-être manqué nos 3 propositions de site web pour <strong>{business}</strong>.</p>
<div class="urgency">⏰ Plus que 24h pour en profiter !</div>
<p style="text-align:center"><a class="btn" href="{link}">Voir mes propositions →</a></p>
<p>L'équipe AWEMA</p>
</div>
</div>
</body>
</html>"#,
        styles = STYLES,
        client = escape(client_name),
        business = escape(business_name),
        link = escape(link),
    )
}

pub fn follow_up_text(client_name: &str, business_name: &str, link: &str) -> String {
    format!(
        "Bonjour {},\n\nVous avez peut-être manqué nos 3 propositions de site web pour {}.\nPlus que 24h pour en profiter !\n\nVoir mes propositions : {}\n\nL'équipe AWEMA\n",
        client_name, business_name, link
    )
}

pub fn completion_html(client_name: &str, production_url: &str, cms_url: Option<&str>) -> String {
    let cms = cms_url
        .map(|url| {
            format!(
                r#"<p>Modifiez vos contenus à tout moment depuis votre espace d'administration :</p><p style="text-align:center"><a class="btn" href="{}">Accéder à mon CMS</a></p>"#,
                escape(url)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head><meta charset="utf-8"><style>{styles}</style></head>
<body>
<div class="container">
<div class="header"><h1>🚀 Votre site est en ligne !</h1></div>
<div class="content">
<p>Bonjour {client},</p>
<p>Bonne nouvelle : votre site web est publié et accessible dès maintenant.</p>
<p style="text-align:center"><a class="btn" href="{url}">Voir mon site</a></p>
{cms}
<p>Merci de votre confiance,<br>L'équipe AWEMA</p>
</div>
</div>
</body>
</html>"#,
        styles = STYLES,
        client = escape(client_name),
        url = escape(production_url),
        cms = cms,
    )
}

pub fn completion_text(client_name: &str, production_url: &str, cms_url: Option<&str>) -> String {
    let mut text = format!(
        "Bonjour {},\n\nVotre site web est en ligne : {}\n",
        client_name, production_url
    );
    if let Some(cms) = cms_url {
        text.push_str(&format!("Espace d'administration : {}\n", cms));
    }
    text.push_str("\nMerci de votre confiance,\nL'équipe AWEMA\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Vec<MockupLink> {
        vec![
            MockupLink::from_template("classique", "https://mockup-a.netlify.app", Some("https://mockup-a.netlify.app/screenshot.png")),
            MockupLink::from_template("moderne", "https://mockup-b.netlify.app", None),
        ]
    }

    fn context(mockups: &[MockupLink]) -> ProposalContext<'_> {
        ProposalContext {
            client_name: "Jean Dupont",
            business_name: "Plomberie Dupont & Fils",
            metier: "plombier",
            ville: "Lyon",
            workflow_id: "workflow-1",
            mockups,
            tracking_id: "abc123",
            tracking_domain: "https://studio.awema.fr",
        }
    }

    #[test]
    fn test_proposal_html_contents() {
        let mockups = links();
        let html = proposal_html(&context(&mockups));

        assert!(html.contains("Plomberie Dupont &amp; Fils"));
        assert!(html.contains("utm_content=mockup-classique"));
        assert!(html.contains("utm_content=compare-all"));
        assert!(html.contains("/compare-mockups?client=workflow-1&amp;utm_source=email"));
        assert!(html.contains("https://studio.awema.fr/api/emails/track/open/abc123"));
        assert!(html.contains("72 heures"));
        assert!(html.contains("utm_content=unsubscribe"));
        assert!(html.contains("screenshot.png"));
        assert_eq!(html.matches("Voir cette proposition").count(), 2);
    }

    #[test]
    fn test_proposal_text_lists_mockups() {
        let mockups = links();
        let text = proposal_text(&context(&mockups));
        assert!(text.contains("1. Classique"));
        assert!(text.contains("2. Moderne"));
        assert!(text.contains("tid=abc123"));
    }

    #[test]
    fn test_completion_without_cms() {
        let html = completion_html("Jean", "https://dupont.awema.fr", None);
        assert!(html.contains("https://dupont.awema.fr"));
        assert!(!html.contains("Accéder à mon CMS"));
        assert!(completion_text("Jean", "https://x", Some("https://cms")).contains("https://cms"));
    }
}
