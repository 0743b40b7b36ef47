use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::PageSize;

use super::company::PaymentLink;

/// Template-level defaults shared by every receipt built from one template.
/// Read-only once configured.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateDefaults {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub amount_gross: Option<f64>,
    pub amount_net: Option<f64>,
    pub currency: Option<String>,
    pub total_text: Option<String>,
    pub total_text_in_words: Option<String>,
    pub payment_link: Option<PaymentLink>,
    pub font: Option<String>,
    pub page_size: Option<PageSize>,
}

/// Values given for a single receipt. Each one wins over the template
/// default of the same name.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallOverrides {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub amount_gross: Option<f64>,
    pub amount_net: Option<f64>,
    pub currency: Option<String>,
    pub total_text: Option<String>,
    pub total_text_in_words: Option<String>,
    pub payment_link: Option<PaymentLink>,
    pub font: Option<String>,
}

/// The merged context of one render pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResolvedContext {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub amount_gross: Option<f64>,
    pub amount_net: Option<f64>,
    pub currency: Option<String>,
    pub total_text: Option<String>,
    pub total_text_in_words: Option<String>,
    pub payment_link: Option<PaymentLink>,
    pub font: Option<String>,
}

impl ResolvedContext {
    /// Per-call value, else template default, else absent.
    pub fn resolve(overrides: &CallOverrides, defaults: &TemplateDefaults) -> Self {
        fn pick<T: Clone>(call: &Option<T>, template: &Option<T>) -> Option<T> {
            call.as_ref().or(template.as_ref()).cloned()
        }
        Self {
            title: pick(&overrides.title, &defaults.title),
            subtitle: pick(&overrides.subtitle, &defaults.subtitle),
            amount_gross: pick(&overrides.amount_gross, &defaults.amount_gross),
            amount_net: pick(&overrides.amount_net, &defaults.amount_net),
            currency: pick(&overrides.currency, &defaults.currency),
            total_text: pick(&overrides.total_text, &defaults.total_text),
            total_text_in_words: pick(
                &overrides.total_text_in_words,
                &defaults.total_text_in_words,
            ),
            payment_link: pick(&overrides.payment_link, &defaults.payment_link),
            font: pick(&overrides.font, &defaults.font),
        }
    }

    pub fn require_title(&self) -> Result<&str, Error> {
        self.title
            .as_deref()
            .ok_or(Error::MissingRequiredField("title"))
    }

    pub fn require_total_text(&self) -> Result<&str, Error> {
        self.total_text
            .as_deref()
            .ok_or(Error::MissingRequiredField("total_text"))
    }

    pub fn require_payment_link(&self) -> Result<&PaymentLink, Error> {
        self.payment_link
            .as_ref()
            .ok_or(Error::MissingRequiredField("payment_link"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_value_beats_template_default() {
        let defaults = TemplateDefaults {
            title: Some("Receipt".into()),
            currency: Some("EUR".into()),
            ..TemplateDefaults::default()
        };
        let overrides = CallOverrides {
            title: Some("Invoice".into()),
            ..CallOverrides::default()
        };
        let ctx = ResolvedContext::resolve(&overrides, &defaults);
        assert_eq!(ctx.title.as_deref(), Some("Invoice"));
        assert_eq!(ctx.currency.as_deref(), Some("EUR"));
        assert_eq!(ctx.subtitle, None);
    }

    #[test]
    fn missing_required_fields_are_named() {
        let ctx = ResolvedContext::default();
        assert!(matches!(
            ctx.require_total_text(),
            Err(Error::MissingRequiredField("total_text"))
        ));
        assert!(matches!(
            ctx.require_payment_link(),
            Err(Error::MissingRequiredField("payment_link"))
        ));
    }

    #[test]
    fn payment_link_comes_from_template() {
        let defaults = TemplateDefaults {
            payment_link: Some(PaymentLink {
                url: "https://pay/1".into(),
                text: "Pay now".into(),
            }),
            ..TemplateDefaults::default()
        };
        let ctx = ResolvedContext::resolve(&CallOverrides::default(), &defaults);
        assert_eq!(ctx.require_payment_link().unwrap().text, "Pay now");
    }
}
