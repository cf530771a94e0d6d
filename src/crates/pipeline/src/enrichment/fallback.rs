//! Template content used when DeepSeek is unavailable or answers garbage.
//!
//! Contact and legal pages always come from here.

use super::content::{
    AboutContent, ContactContent, EnrichmentRequest, Faq, Hero, HomeAbout, HomeContent,
    LegalContent, OpeningHours, PreviewRequest, ProcessStep, ServiceHighlight, ServicePage,
    WhyUsItem,
};
use utils::text::slugify;

/// Trades offering a 24/7 emergency service
pub const EMERGENCY_TRADES: [&str; 4] = ["plombier", "electricien", "chauffagiste", "serrurier"];

pub fn has_emergency_service(business_key: &str) -> bool {
    EMERGENCY_TRADES.contains(&business_key)
}

pub fn service_slug(service: &str) -> String {
    slugify(service, 60)
}

pub fn intervention_zones(ville: &str) -> Vec<String> {
    vec![
        ville.to_string(),
        format!("{ville} et alentours"),
        "Dans un rayon de 30km".to_string(),
        "Intervention rapide secteur".to_string(),
    ]
}

pub fn opening_hours() -> Vec<OpeningHours> {
    let day = |day: &str, open: &str, close: &str| OpeningHours {
        day: day.to_string(),
        open: open.to_string(),
        close: close.to_string(),
    };
    vec![
        day("Lundi", "08:00", "18:00"),
        day("Mardi", "08:00", "18:00"),
        day("Mercredi", "08:00", "18:00"),
        day("Jeudi", "08:00", "18:00"),
        day("Vendredi", "08:00", "18:00"),
        day("Samedi", "09:00", "17:00"),
        day("Dimanche", "Fermé", "Fermé"),
    ]
}

pub fn emergency_info(request: &EnrichmentRequest) -> String {
    if has_emergency_service(&request.business_key()) {
        format!(
            "Service d'urgence 24h/7j disponible pour les interventions {} à {}. Appelez-nous pour toute urgence.",
            request.business_type, request.ville
        )
    } else {
        format!(
            "Interventions programmées du lundi au samedi à {}. Devis gratuit sur simple demande.",
            request.ville
        )
    }
}

pub fn preview_excerpt(request: &PreviewRequest) -> String {
    format!(
        "{}, votre {} professionnel à {}. Expertise locale, devis gratuit, intervention rapide et travail de qualité garanti.",
        request.business_name, request.business_type, request.ville
    )
}

pub fn contact(request: &EnrichmentRequest) -> ContactContent {
    ContactContent {
        intro: format!(
            "Vous recherchez un {} professionnel à {} ? {} intervient rapidement dans tout le secteur. Contactez-nous pour un devis gratuit et personnalisé.",
            request.business_type, request.ville, request.business_name
        ),
        zones: intervention_zones(&request.ville),
        hours: opening_hours(),
        emergency_info: emergency_info(request),
        word_count: 0,
    }
}

pub fn legal(request: &EnrichmentRequest) -> LegalContent {
    let form = &request.form;
    let name = &request.business_name;
    let siret = form.siret.as_deref().unwrap_or("en cours d'immatriculation");
    let address = if form.adresse.trim().is_empty() {
        request.ville.clone()
    } else {
        format!("{}, {}", form.adresse.trim(), request.ville)
    };

    LegalContent {
        mentions_legales: format!(
            "Le site est édité par {name}, {metier} à {ville}. Adresse : {address}. SIRET : {siret}. \
             Téléphone : {tel}. Email : {email}. Hébergement : Cloudflare, Inc., 101 Townsend St, San Francisco, CA 94107, USA.",
            metier = request.business_type,
            ville = request.ville,
            tel = form.telephone,
            email = form.email,
        ),
        politique_confidentialite: format!(
            "{name} collecte uniquement les données transmises via le formulaire de contact (nom, téléphone, email, message) \
             afin de répondre à vos demandes de devis. Ces données ne sont jamais cédées à des tiers et sont conservées 3 ans. \
             Conformément au RGPD, vous disposez d'un droit d'accès, de rectification et de suppression en écrivant à {email}.",
            email = form.email,
        ),
        conditions_utilisation: format!(
            "L'utilisation du site de {name} implique l'acceptation des présentes conditions. Les informations et tarifs \
             indiqués sont donnés à titre indicatif ; seul le devis signé engage {name}."
        ),
        cookies: format!(
            "Le site de {name} n'utilise que des cookies techniques nécessaires à son fonctionnement et des mesures \
             d'audience anonymisées. Aucun cookie publicitaire n'est déposé sans votre consentement."
        ),
    }
}

pub fn home(request: &EnrichmentRequest, services: &[String]) -> HomeContent {
    let name = &request.business_name;
    let metier = &request.business_type;
    let ville = &request.ville;

    let description = request
        .form
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "{name} accompagne les particuliers et les professionnels de {ville} pour tous leurs travaux. \
                 Devis gratuit, conseils personnalisés et intervention rapide : nous mettons notre savoir-faire \
                 d'artisan au service de votre confort."
            )
        });

    HomeContent {
        hero: Hero {
            title: format!("{} à {ville}", utils::capitalize(metier)),
            subtitle: request
                .form
                .slogan
                .clone()
                .unwrap_or_else(|| format!("{name}, votre artisan de confiance")),
            description,
            cta_primary: "Demander un devis gratuit".to_string(),
            cta_secondary: "Nous appeler".to_string(),
        },
        services: services
            .iter()
            .take(6)
            .map(|service| ServiceHighlight {
                title: service.clone(),
                description: format!(
                    "{name} réalise vos travaux de {} à {ville} et dans les environs, avec un travail soigné et garanti.",
                    service.to_lowercase()
                ),
                features: vec![
                    "Devis gratuit".to_string(),
                    "Intervention rapide".to_string(),
                    "Travail garanti".to_string(),
                ],
            })
            .collect(),
        about: HomeAbout {
            story: format!(
                "Installée à {ville}, l'entreprise {name} met son expérience de {metier} au service des habitants du secteur."
            ),
            mission: "Offrir à chaque client un travail de qualité, dans les délais annoncés et au juste prix.".to_string(),
            values: vec![
                "Qualité".to_string(),
                "Proximité".to_string(),
                "Transparence".to_string(),
            ],
        },
        why_us: vec![
            WhyUsItem {
                title: "Artisan local".to_string(),
                description: format!("Une équipe basée à {ville} qui connaît votre secteur."),
                icon: "map-pin".to_string(),
            },
            WhyUsItem {
                title: "Devis gratuit".to_string(),
                description: "Un devis clair et détaillé, sans engagement.".to_string(),
                icon: "file-text".to_string(),
            },
            WhyUsItem {
                title: "Intervention rapide".to_string(),
                description: "Nous nous déplaçons rapidement chez vous.".to_string(),
                icon: "clock".to_string(),
            },
            WhyUsItem {
                title: "Travail garanti".to_string(),
                description: "Nos prestations sont couvertes par nos assurances professionnelles.".to_string(),
                icon: "shield".to_string(),
            },
        ],
        processus: vec![
            ProcessStep::new(1, "Prise de contact", "Vous nous expliquez votre besoin par téléphone ou via le formulaire."),
            ProcessStep::new(2, "Diagnostic", "Nous évaluons les travaux sur place ou à distance."),
            ProcessStep::new(3, "Devis", "Vous recevez un devis gratuit et détaillé."),
            ProcessStep::new(4, "Réalisation", "Nous intervenons à la date convenue et vérifions le résultat avec vous."),
        ],
        word_count: 0,
    }
}

pub fn service(service: &str, request: &EnrichmentRequest) -> ServicePage {
    let name = &request.business_name;
    let ville = &request.ville;

    ServicePage {
        slug: service_slug(service),
        title: format!("{service} - {name} à {ville}"),
        meta_description: format!(
            "{service} professionnel à {ville} par {name}. Devis gratuit, intervention rapide, travail de qualité."
        ),
        hero_content: format!("Service {service} professionnel à {ville}"),
        detailed_description: format!(
            "{name} vous propose des services de {service} professionnels à {ville} et dans tout le secteur."
        ),
        benefits: vec![
            "Qualité garantie".to_string(),
            "Intervention rapide".to_string(),
            "Devis gratuit".to_string(),
        ],
        process: vec![
            ProcessStep::new(1, "Contact", "Prise de contact et diagnostic"),
            ProcessStep::new(2, "Devis", "Établissement du devis gratuit"),
            ProcessStep::new(3, "Intervention", "Réalisation des travaux"),
        ],
        faq: vec![Faq {
            question: format!("Intervenez-vous rapidement pour du {service} ?"),
            answer: "Oui, nous intervenons rapidement sur tout le secteur.".to_string(),
        }],
        local_keywords: vec![format!("{service} {ville}")],
        word_count: 0,
    }
}

pub fn about(request: &EnrichmentRequest) -> AboutContent {
    let name = &request.business_name;
    let metier = &request.business_type;
    let ville = &request.ville;

    AboutContent {
        story: format!(
            "{name} est une entreprise de {metier} implantée à {ville}. Depuis sa création, elle accompagne les \
             particuliers comme les professionnels avec la même exigence : écouter, conseiller et réaliser un \
             travail durable."
        ),
        team: format!(
            "Notre équipe réunit des artisans qualifiés, formés aux techniques actuelles du métier de {metier}."
        ),
        values: vec![
            "Respect des engagements".to_string(),
            "Travail soigné".to_string(),
            "Conseil honnête".to_string(),
        ],
        certifications: vec![
            "Assurance responsabilité civile professionnelle".to_string(),
            "Garantie décennale".to_string(),
        ],
        experience: format!("Une expérience solide de {metier} au service de {ville} et de ses environs."),
        local_history: format!(
            "Ancrée à {ville}, l'entreprise connaît les spécificités du bâti local et travaille avec les fournisseurs de la région."
        ),
        word_count: 0,
    }
}

/// Long-form paragraphs about `subject`, used to bring a short page up to its word target.
pub fn long_form_paragraphs(request: &EnrichmentRequest, subject: &str) -> Vec<String> {
    let name = &request.business_name;
    let metier = &request.business_type;
    let ville = &request.ville;

    vec![
        format!(
            "Chez {name}, chaque demande de {subject} commence par une écoute attentive. Nous prenons le temps de \
             comprendre votre situation, vos contraintes de calendrier et votre budget avant de proposer une solution. \
             Cette étape permet d'éviter les mauvaises surprises et de définir ensemble des travaux adaptés à votre \
             logement ou à vos locaux professionnels à {ville}."
        ),
        format!(
            "Le diagnostic est réalisé par un {metier} expérimenté qui examine l'installation existante, repère \
             l'origine du problème et vérifie l'état des équipements voisins. Vous recevez ensuite une explication \
             claire de ce qui doit être fait, de ce qui peut attendre et des options possibles, sans jargon inutile \
             ni pression commerciale."
        ),
        format!(
            "Notre devis pour votre projet de {subject} est gratuit, détaillé poste par poste et valable plusieurs \
             semaines. Il précise les fournitures, la main-d'oeuvre, les délais d'intervention et les garanties \
             applicables. Aucun supplément n'est facturé sans votre accord écrit, et nous restons disponibles pour \
             répondre à vos questions avant la signature."
        ),
        format!(
            "Nous sélectionnons des matériaux reconnus pour leur fiabilité et leur durée de vie, auprès de \
             fournisseurs installés dans la région de {ville}. Ce choix garantit la disponibilité des pièces, \
             facilite l'entretien dans le temps et limite les trajets inutiles, ce qui profite à la fois à votre \
             budget et à l'environnement."
        ),
        format!(
            "Les interventions de {subject} respectent les normes en vigueur et les règles de sécurité propres au \
             métier de {metier}. Le chantier est protégé, les zones de passage restent accessibles et les déchets \
             sont évacués à la fin des travaux. Vous retrouvez un espace propre, prêt à être utilisé dès notre \
             départ."
        ),
        format!(
            "{name} intervient dans tout le secteur de {ville} et des communes voisines. Notre connaissance du bâti \
             local, des maisons anciennes comme des constructions récentes, nous permet d'anticiper les difficultés \
             fréquentes et de proposer des solutions éprouvées, adaptées à la configuration réelle de votre \
             habitation."
        ),
        format!(
            "La réactivité fait partie de nos engagements. Lorsque vous nous contactez, nous vous rappelons \
             rapidement pour fixer un rendez-vous qui vous convient. En cas de besoin urgent, nous faisons le \
             nécessaire pour sécuriser la situation au plus vite, puis nous planifions les travaux définitifs \
             avec vous."
        ),
        format!(
            "Tous nos travaux de {subject} sont couverts par notre assurance responsabilité civile professionnelle \
             et, lorsque la nature des travaux le prévoit, par la garantie décennale. Une facture détaillée vous \
             est remise à la fin du chantier, avec les références des équipements posés et les conseils \
             d'utilisation."
        ),
        format!(
            "Un entretien régulier prolonge la durée de vie de vos installations et évite bien des pannes. Nous \
             vous indiquons les gestes simples à adopter au quotidien et vous proposons, si vous le souhaitez, \
             une visite de contrôle périodique. Cette démarche préventive coûte souvent bien moins cher qu'une \
             réparation en urgence."
        ),
        format!(
            "Nos clients à {ville} apprécient notre transparence : vous savez à tout moment où en sont les \
             travaux, qui intervient chez vous et quand le chantier sera terminé. Nous respectons les horaires \
             annoncés et nous vous prévenons immédiatement si un imprévu nécessite d'ajuster le planning."
        ),
        format!(
            "Chaque projet de {subject} est différent. Une rénovation complète, une mise aux normes ou une simple \
             amélioration demandent des approches distinctes. Nous adaptons nos méthodes à votre besoin réel et \
             nous vous déconseillons franchement les travaux superflus, même lorsqu'ils nous seraient profitables."
        ),
        format!(
            "Nous accompagnons aussi les professionnels, commerçants, syndics et gestionnaires de biens de {ville}. \
             Pour eux, nous organisons les interventions en dehors des heures d'ouverture lorsque c'est possible, \
             afin de limiter la gêne pour leur activité, et nous fournissons tous les justificatifs nécessaires à \
             leur comptabilité."
        ),
        format!(
            "Les économies d'énergie sont au coeur des préoccupations actuelles. Nous vous conseillons sur les \
             équipements les plus performants, sur les aides financières auxquelles vous pouvez prétendre et sur \
             les petits ajustements qui réduisent durablement vos factures, sans sacrifier votre confort au \
             quotidien."
        ),
        format!(
            "Faire appel à {name}, c'est choisir un {metier} de proximité qui engage sa réputation sur chaque \
             chantier. La satisfaction de nos clients et leurs recommandations auprès de leurs proches restent \
             notre meilleure publicité. Contactez-nous dès aujourd'hui pour parler de votre projet de {subject} \
             à {ville}."
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientFormData;

    fn request(business_type: &str) -> EnrichmentRequest {
        let form = ClientFormData {
            business_name: "Dupont".to_string(),
            business_type: business_type.to_string(),
            ville: "Lyon".to_string(),
            email: "contact@dupont.fr".to_string(),
            ..Default::default()
        };
        EnrichmentRequest::from_form(&form)
    }

    #[test]
    fn test_emergency_info_by_trade() {
        assert!(emergency_info(&request("Électricien")).contains("24h/7j"));
        assert!(emergency_info(&request("serrurier")).contains("24h/7j"));
        assert!(emergency_info(&request("menuisier")).starts_with("Interventions programmées"));
    }

    #[test]
    fn test_contact_hours_and_zones() {
        let contact = contact(&request("plombier"));
        assert_eq!(contact.hours.len(), 7);
        assert_eq!(contact.hours[0].day, "Lundi");
        assert_eq!(contact.hours[5].open, "09:00");
        assert_eq!(contact.hours[6].close, "Fermé");
        assert_eq!(contact.zones[1], "Lyon et alentours");
    }

    #[test]
    fn test_fallback_service_page() {
        let page = service("Débouchage canalisation", &request("plombier"));
        assert_eq!(page.slug, "debouchage-canalisation");
        assert_eq!(page.process.len(), 3);
        assert_eq!(page.faq.len(), 1);
        assert!(page.is_usable());
    }

    #[test]
    fn test_fallback_pages_are_usable() {
        let request = request("menuisier");
        let services = vec!["Escaliers".to_string(), "Cuisines".to_string()];
        let home = home(&request, &services);
        assert!(home.is_usable());
        assert_eq!(home.services.len(), 2);
        assert_eq!(home.hero.title, "Menuisier à Lyon");
        assert!(about(&request).is_usable());
        assert!(legal(&request).politique_confidentialite.contains("contact@dupont.fr"));
    }

    #[test]
    fn test_long_form_paragraphs_mention_subject() {
        let paragraphs = long_form_paragraphs(&request("plombier"), "débouchage");
        assert!(paragraphs.len() >= 10);
        assert!(paragraphs.iter().filter(|p| p.contains("débouchage")).count() >= 4);
        assert!(paragraphs.iter().all(|p| utils::count_words(p) >= 40));
    }
}
