// URL Classifier
//
// Runs the grammar automaton and then every check over a tokenized URL.
// Findings are ordered by field in URL order; within a field structural
// findings come before heuristic ones, and check order is kept otherwise.

use crate::checks::{
    BrandCheck, EncodingCheck, GrammarCheck, HostCheck, LengthCheck, PayloadCheck, PortCheck,
    SchemeCheck, UrlCheck,
};
use crate::config::ClassifierConfig;
use crate::finding::{AnomalyFlag, RiskLevel, ValidationResult};
use crate::lexer::{tokenize, UrlComponents};
use crate::ClassifierResult;
use tracing::{debug, trace};

/// Immutable, shareable URL classifier
pub struct UrlClassifier {
    config: ClassifierConfig,
    grammar: GrammarCheck,
    checks: Vec<Box<dyn UrlCheck>>,
}

impl UrlClassifier {
    /// Validate `config` and build every automaton and matcher up front
    pub fn new(config: ClassifierConfig) -> ClassifierResult<Self> {
        config.validate()?;

        let mut checks: Vec<Box<dyn UrlCheck>> = vec![
            Box::new(SchemeCheck::new(&config)?),
            Box::new(HostCheck::new(&config)?),
            Box::new(PortCheck),
            Box::new(EncodingCheck::new()?),
            Box::new(BrandCheck::new(&config)),
            Box::new(LengthCheck::new(&config)),
        ];
        if config.detect_payloads {
            checks.push(Box::new(PayloadCheck::new(&config)?));
        }

        debug!(
            checks = checks.len() + 1,
            payloads = config.detect_payloads,
            "URL classifier ready"
        );

        Ok(Self {
            config,
            grammar: GrammarCheck::new()?,
            checks,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Names of the checks in run order
    pub fn check_names(&self) -> Vec<&'static str> {
        std::iter::once(self.grammar.name())
            .chain(self.checks.iter().map(|c| c.name()))
            .collect()
    }

    /// Tokenize and classify a raw URL
    pub fn validate(&self, raw: &str) -> ValidationResult {
        self.classify(&tokenize(raw))
    }

    /// Classify an already tokenized URL
    pub fn classify(&self, url: &UrlComponents<'_>) -> ValidationResult {
        let mut flags = Vec::new();
        let structure = self.grammar.structure(url, &mut flags);

        for check in &self.checks {
            let before = flags.len();
            check.inspect(url, &mut flags);
            trace!(check = check.name(), found = flags.len() - before, "Check finished");
        }

        flags.sort_by_key(|f| (f.field, f.class));

        let risk_level = flags
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or_default();
        let rejection_reason = rejection_reason(url, &flags);
        let well_formed = rejection_reason.is_none();

        debug!(
            url = url.raw(),
            risk = %risk_level,
            flags = flags.len(),
            well_formed,
            "URL classified"
        );

        ValidationResult {
            well_formed,
            risk_level,
            flags,
            structure,
            rejection_reason,
        }
    }
}

impl std::fmt::Debug for UrlClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlClassifier")
            .field("config", &self.config)
            .field("checks", &self.check_names())
            .finish()
    }
}

/// Why a URL is not well-formed, or None if it is
fn rejection_reason(url: &UrlComponents<'_>, flags: &[AnomalyFlag]) -> Option<String> {
    if url.raw().is_empty() {
        return Some("URL is empty".to_string());
    }
    if url.scheme().is_none() {
        return Some("URL has no scheme".to_string());
    }
    if url.host().is_none() {
        return Some("URL has no host".to_string());
    }
    flags
        .iter()
        .find(|f| f.is_structural() && f.severity == RiskLevel::Malicious)
        .map(|f| format!("{} in {}: {}", f.kind, f.field, f.reason))
}
