// Classifier configuration
//
// Every field has a default, so a config file only needs to name what it
// overrides. Files are JSON or YAML, chosen by extension.

use crate::{ClassifierError, ClassifierResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration for the URL classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Schemes accepted without a SchemeMismatch finding
    pub allowed_schemes: Vec<String>,

    /// Schemes that can execute script; reported as Malicious
    pub script_schemes: Vec<String>,

    /// Domains commonly impersonated by phishing URLs
    pub brand_domains: Vec<String>,

    /// Query parameter names that commonly carry redirect targets
    pub redirect_params: Vec<String>,

    /// Longest path (in characters) before ExcessiveLength
    pub max_path_length: usize,

    /// Longest query (in characters) before ExcessiveLength
    pub max_query_length: usize,

    /// Most host labels before ExcessiveSubdomains
    pub max_host_labels: usize,

    /// Run the injection/payload pattern checks
    pub detect_payloads: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: strings(&["http", "https", "ftp", "ftps", "ws", "wss"]),
            script_schemes: strings(&["javascript", "vbscript", "data"]),
            brand_domains: strings(&[
                "paypal.com",
                "google.com",
                "apple.com",
                "microsoft.com",
                "amazon.com",
                "facebook.com",
                "netflix.com",
                "github.com",
            ]),
            redirect_params: strings(&[
                "url",
                "redirect",
                "redirect_uri",
                "redirect_url",
                "return",
                "returnto",
                "return_url",
                "next",
                "to",
                "link",
                "goto",
                "dest",
                "destination",
                "continue",
                "target",
            ]),
            max_path_length: 255,
            max_query_length: 1024,
            max_host_labels: 5,
            detect_payloads: true,
        }
    }
}

impl ClassifierConfig {
    /// Reject configurations the classifier cannot work with
    pub fn validate(&self) -> ClassifierResult<()> {
        if self.allowed_schemes.is_empty() {
            return Err(ClassifierError::InvalidConfig(
                "allowed_schemes must not be empty".to_string(),
            ));
        }
        if let Some(bad) = self
            .allowed_schemes
            .iter()
            .chain(&self.script_schemes)
            .find(|s| s.is_empty() || s.chars().any(|c| c.is_ascii_uppercase()))
        {
            return Err(ClassifierError::InvalidConfig(format!(
                "scheme {:?} must be non-empty and lowercase",
                bad
            )));
        }
        if self.max_path_length == 0 || self.max_query_length == 0 {
            return Err(ClassifierError::InvalidConfig(
                "length limits must be greater than zero".to_string(),
            ));
        }
        if self.max_host_labels < 2 {
            return Err(ClassifierError::InvalidConfig(format!(
                "max_host_labels must be at least 2, got {}",
                self.max_host_labels
            )));
        }
        Ok(())
    }

    pub fn from_json_str(content: &str) -> ClassifierResult<Self> {
        serde_json::from_str(content).map_err(|e| ClassifierError::Parse(e.to_string()))
    }

    pub fn from_yaml_str(content: &str) -> ClassifierResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ClassifierError::Parse(e.to_string()))
    }

    /// Load and validate a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> ClassifierResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::Io(path.to_path_buf(), e))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            _ => {
                return Err(ClassifierError::InvalidConfig(format!(
                    "unsupported config format: {}",
                    path.display()
                )))
            }
        };
        config.validate()?;

        debug!(path = %path.display(), "Loaded classifier configuration");
        Ok(config)
    }
}
