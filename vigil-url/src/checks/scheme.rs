// Scheme allow-list check

use super::UrlCheck;
use crate::automata::keyword_set;
use crate::config::ClassifierConfig;
use crate::finding::{AnomalyFlag, AnomalyKind, RiskLevel};
use crate::lexer::{UrlComponents, UrlField};
use crate::ClassifierResult;
use vigil_automaton::{accepts, Automaton};

/// (scheme, port, scheme whose default port it is)
const PORT_CONFLICTS: &[(&str, u16, &str)] = &[
    ("https", 80, "http"),
    ("http", 443, "https"),
    ("wss", 80, "ws"),
    ("ws", 443, "wss"),
];

/// Scheme must be on the allow-list; script schemes are Malicious
#[derive(Debug, Clone)]
pub struct SchemeCheck {
    allowed: Automaton,
    script: Automaton,
}

impl SchemeCheck {
    pub fn new(config: &ClassifierConfig) -> ClassifierResult<Self> {
        Ok(Self {
            allowed: keyword_set(&config.allowed_schemes)?,
            script: keyword_set(&config.script_schemes)?,
        })
    }

    fn port_conflict(scheme: &str, port: u16) -> Option<&'static str> {
        PORT_CONFLICTS
            .iter()
            .find(|(s, p, _)| *s == scheme && *p == port)
            .map(|(_, _, other)| *other)
    }
}

impl UrlCheck for SchemeCheck {
    fn name(&self) -> &'static str {
        "scheme"
    }

    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) {
        let Some(scheme) = url.scheme() else {
            findings.push(AnomalyFlag::structural(
                AnomalyKind::SchemeMismatch,
                UrlField::Scheme,
                RiskLevel::Suspicious,
                "URL has no scheme",
            ));
            return;
        };
        let name = scheme.normalized();

        if accepts(&self.script, name) {
            findings.push(AnomalyFlag::structural(
                AnomalyKind::SchemeMismatch,
                UrlField::Scheme,
                RiskLevel::Malicious,
                format!("scheme '{}' can execute script", name),
            ));
            return;
        }
        if !accepts(&self.allowed, name) {
            findings.push(AnomalyFlag::structural(
                AnomalyKind::SchemeMismatch,
                UrlField::Scheme,
                RiskLevel::Suspicious,
                format!("scheme '{}' is not in the allow-list", name),
            ));
            return;
        }

        let port = url.port().and_then(|p| p.raw().parse::<u16>().ok());
        if let Some(other) = port.and_then(|port| Self::port_conflict(name, port)) {
            findings.push(AnomalyFlag::heuristic(
                AnomalyKind::SchemeMismatch,
                UrlField::Scheme,
                RiskLevel::Suspicious,
                format!("scheme '{}' on the default port of '{}'", name, other),
            ));
        }
    }
}
