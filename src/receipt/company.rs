use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Contact fields that can appear in the seller block, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyField {
    Address,
    Phone,
    Email,
}

const DEFAULT_DISPLAY: [CompanyField; 3] =
    [CompanyField::Address, CompanyField::Phone, CompanyField::Email];

const FETCH_TIMEOUT_SECS: u64 = 15;

/// Where the header logo comes from.
///
/// Deserialized from a string: `http://` and `https://` values are URLs,
/// anything else is a filesystem path.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum Logo {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

impl From<String> for Logo {
    fn from(s: String) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Logo::Url(s)
        } else {
            Logo::Path(PathBuf::from(s))
        }
    }
}

impl Logo {
    /// Human-readable origin, used in error messages.
    pub fn location(&self) -> String {
        match self {
            Logo::Path(p) => p.display().to_string(),
            Logo::Url(u) => u.clone(),
            Logo::Bytes(b) => format!("<{} bytes in memory>", b.len()),
        }
    }

    /// Read the raw image bytes. URLs are fetched with a blocking request.
    pub fn load(&self) -> Result<Vec<u8>, Error> {
        let failed = |reason: String| Error::ImageLoad {
            location: self.location(),
            reason,
        };
        match self {
            Logo::Path(p) => std::fs::read(p).map_err(|e| failed(e.to_string())),
            Logo::Url(url) => {
                log::debug!("fetching logo from {url}");
                let agent: ureq::Agent = ureq::Agent::config_builder()
                    .timeout_global(Some(Duration::from_secs(FETCH_TIMEOUT_SECS)))
                    .build()
                    .into();
                let mut response = agent.get(url).call().map_err(|e| failed(e.to_string()))?;
                response
                    .body_mut()
                    .read_to_vec()
                    .map_err(|e| failed(e.to_string()))
            }
            Logo::Bytes(b) => Ok(b.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PaymentLink {
    pub url: String,
    pub text: String,
}

/// What the header draws in the top-right corner.
#[derive(Debug, PartialEq)]
pub enum HeaderIdentity<'a> {
    Logo(&'a Logo),
    Name(&'a str),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Company {
    pub name: String,
    pub logo: Option<Logo>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Which contact fields the seller block shows, in order. Defaults to
    /// address, phone, email.
    #[serde(alias = "display")]
    pub display_fields: Option<Vec<CompanyField>>,
    #[serde(default)]
    pub seller_key: String,
    #[serde(default)]
    pub iban_text: String,
    pub collection_signature_text: Option<String>,
    pub issuer_signature_text: Option<String>,
    #[serde(alias = "fullname_person_invoice_issuer")]
    pub issuer_full_name: Option<String>,
    pub contact_text: Option<String>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn display_fields(&self) -> &[CompanyField] {
        self.display_fields.as_deref().unwrap_or(&DEFAULT_DISPLAY)
    }

    pub fn field(&self, field: CompanyField) -> Option<&str> {
        match field {
            CompanyField::Address => self.address.as_deref(),
            CompanyField::Phone => self.phone.as_deref(),
            CompanyField::Email => self.email.as_deref(),
        }
    }

    /// Selected contact values in display order, absent ones skipped.
    pub fn displayed_values(&self) -> Vec<&str> {
        self.display_fields()
            .iter()
            .filter_map(|&f| self.field(f))
            .collect()
    }

    pub fn identity(&self) -> HeaderIdentity<'_> {
        match &self.logo {
            Some(logo) => HeaderIdentity::Logo(logo),
            None => HeaderIdentity::Name(&self.name),
        }
    }

    pub fn contact_text(&self) -> &str {
        self.contact_text.as_deref().unwrap_or("Contact us:")
    }
}

/// `Some(text)` when the value is present and not just whitespace.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
