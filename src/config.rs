use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EnumError, Result};

/// `config.yaml`: email delivery settings plus the HTML content filter
/// lists. Read lazily, at first use (email send or, unless `-nf`, the
/// start of enumeration) rather than unconditionally at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub email_host: Option<String>,
    pub email_port: Option<u16>,
    pub email_username: Option<String>,
    pub email_password: Option<String>,
    pub email_sender: Option<String>,
    pub email_receiver: Option<String>,
    #[serde(default)]
    pub title_filters: Vec<String>,
    #[serde(default)]
    pub html_filters: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EnumError::ConfigUnreadable(path.display().to_string(), e))?;
        serde_yaml::from_str(&text)
            .map_err(|e| EnumError::ConfigInvalid(path.display().to_string(), e))
    }

    pub fn filters(&self) -> ContentFilters {
        ContentFilters {
            title_filters: self.title_filters.clone(),
            html_filters: self.html_filters.clone(),
        }
    }
}

/// Substring matches on `<title>` and on the raw body. A host matching
/// either is dropped from results — used to suppress branded CDN/parking
/// pages, which would otherwise pass the wildcard-similarity gate because
/// they differ host-to-host just enough to read as "unique".
#[derive(Debug, Clone, Default)]
pub struct ContentFilters {
    pub title_filters: Vec<String>,
    pub html_filters: Vec<String>,
}

impl ContentFilters {
    pub fn matches(&self, title: &str, body: &str) -> bool {
        self.title_filters.iter().any(|f| title.contains(f.as_str()))
            || self.html_filters.iter().any(|f| body.contains(f.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_on_title_substring() {
        let filters = ContentFilters {
            title_filters: vec!["Parking".to_string()],
            html_filters: vec![],
        };
        assert!(filters.matches("Domain Parking Page", "irrelevant body"));
        assert!(!filters.matches("Welcome", "irrelevant body"));
    }

    #[test]
    fn matches_on_html_substring() {
        let filters = ContentFilters {
            title_filters: vec![],
            html_filters: vec!["This domain is for sale".to_string()],
        };
        assert!(filters.matches("", "text: This domain is for sale today"));
    }

    #[test]
    fn no_filters_never_matches() {
        let filters = ContentFilters::default();
        assert!(!filters.matches("anything", "anything"));
    }
}
