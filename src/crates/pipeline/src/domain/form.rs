//! Client intake form.

use crate::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Brand colours chosen by the client (hex strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandColors {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
}

/// Business data posted by the intake form.
///
/// Only the fields used by the pipeline are typed; everything else the form sends is kept
/// in `extra` and round-trips unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientFormData {
    pub business_name: String,
    #[serde(alias = "metier")]
    pub business_type: String,
    pub email: String,
    #[serde(alias = "phone")]
    pub telephone: String,
    #[serde(alias = "city", alias = "location")]
    pub ville: String,
    #[serde(alias = "postalCode")]
    pub code_postal: String,
    #[serde(alias = "address")]
    pub adresse: String,
    #[serde(alias = "customDomain")]
    pub domain: Option<String>,
    pub services: Vec<String>,
    pub description: Option<String>,
    pub slogan: Option<String>,
    pub siret: Option<String>,
    pub horaires: Option<String>,
    #[serde(alias = "brandColors")]
    pub colors: Option<BrandColors>,
    pub logo_url: Option<String>,
    pub selected_templates: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientFormData {
    /// Names of required fields that are missing or blank.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let required: [(&'static str, &str); 5] = [
            ("businessName", &self.business_name),
            ("businessType", &self.business_type),
            ("email", &self.email),
            ("telephone", &self.telephone),
            ("ville", &self.ville),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        missing
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn ensure_valid(&self) -> Result<()> {
        let missing = self.validate();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Validation(format!(
                "Champs requis manquants: {}",
                missing.join(", ")
            )))
        }
    }

    /// Lowercased business type used as catalog key.
    pub fn business_key(&self) -> String {
        utils::fold_accents(self.business_type.trim()).to_lowercase()
    }

    /// String value of an untyped form field.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Boolean value of an untyped form field (`true`, `"oui"`, `"yes"`).
    pub fn extra_bool(&self, key: &str) -> bool {
        match self.extra.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.to_lowercase().as_str(), "true" | "oui" | "yes" | "1"),
            _ => false,
        }
    }

    /// Custom domain if the client gave one.
    pub fn custom_domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn primary_color(&self) -> Option<&str> {
        self.colors.as_ref().and_then(|c| c.primary.as_deref())
    }

    pub fn secondary_color(&self) -> Option<&str> {
        self.colors.as_ref().and_then(|c| c.secondary.as_deref())
    }

    pub fn accent_color(&self) -> Option<&str> {
        self.colors.as_ref().and_then(|c| c.accent.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_reported() {
        let form = ClientFormData {
            business_name: "Dupont Plomberie".into(),
            business_type: "plombier".into(),
            ..Default::default()
        };
        assert_eq!(form.validate(), vec!["email", "telephone", "ville"]);
        assert!(matches!(form.ensure_valid(), Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_aliases_and_extra_fields() {
        let form: ClientFormData = serde_json::from_value(json!({
            "businessName": "Dupont Plomberie",
            "businessType": "Plombier",
            "email": "jean@dupont.fr",
            "phone": "0601020304",
            "location": "Lyon",
            "brandColors": { "primary": "#112233" },
            "urgence": "oui",
            "prixDepannage": "80"
        }))
        .unwrap();

        assert_eq!(form.telephone, "0601020304");
        assert_eq!(form.ville, "Lyon");
        assert_eq!(form.primary_color(), Some("#112233"));
        assert!(form.extra_bool("urgence"));
        assert_eq!(form.extra_str("prixDepannage"), Some("80"));
        assert_eq!(form.business_key(), "plombier");
        assert!(form.validate().is_empty());
    }

    #[test]
    fn test_blank_domain_is_none() {
        let form = ClientFormData {
            domain: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(form.custom_domain(), None);
    }
}
