//! Loading receipt descriptions and template defaults from disk.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::Error;

/// Read a TOML or JSON file into `T`. Files ending in `.json` are parsed as
/// JSON, everything else as TOML.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    if !path.exists() {
        return Err(Error::ConfigFileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| Error::Config {
        path: path.to_path_buf(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::{ReceiptOptions, TemplateDefaults};

    #[test]
    fn json_and_toml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("receipt.json");
        fs::write(&json, r#"{"title": "Invoice", "recipient": ["Bob"]}"#).unwrap();
        let options: ReceiptOptions = load(&json).unwrap();
        assert_eq!(options.overrides.title.as_deref(), Some("Invoice"));

        let toml_path = dir.path().join("template.toml");
        fs::write(&toml_path, "currency = \"EUR\"\nfont = \"DejaVu Sans\"\n").unwrap();
        let defaults: TemplateDefaults = load(&toml_path).unwrap();
        assert_eq!(defaults.currency.as_deref(), Some("EUR"));
        assert_eq!(defaults.font.as_deref(), Some("DejaVu Sans"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "title = [").unwrap();
        let err = load::<ReceiptOptions>(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn missing_file() {
        let err = load::<TemplateDefaults>(Path::new("/no/such/template.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigFileNotFound(_)));
    }
}
