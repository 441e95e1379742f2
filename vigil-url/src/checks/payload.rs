// Payload and length checks
//
// Injection markers are literal patterns matched over the decoded path,
// query and fragment. Command injection needs a little context and uses a
// regex instead.

use super::UrlCheck;
use crate::config::ClassifierConfig;
use crate::encoding::percent_decode;
use crate::finding::{AnomalyFlag, AnomalyKind, RiskLevel};
use crate::lexer::{UrlComponents, UrlField};
use crate::pattern::{PatternMatcher, PayloadPattern};
use crate::ClassifierResult;
use ahash::AHashSet;
use regex::Regex;

const XSS_MARKERS: &[&str] = &[
    "<script",
    "</script",
    "javascript:",
    "vbscript:",
    "onerror=",
    "onload=",
    "onmouseover=",
    "onfocus=",
    "alert(",
    "prompt(",
    "eval(",
    "document.cookie",
    "document.location",
    "<iframe",
    "<svg",
    "<img",
    "expression(",
];

const SQL_MARKERS: &[&str] = &[
    "' or '1'='1",
    "' or 1=1",
    "\" or \"1\"=\"1",
    " or 1=1",
    "union select",
    "union all select",
    "'--",
    "';",
    "; drop ",
    "drop table",
    "insert into",
    "xp_cmdshell",
    "sleep(",
    "benchmark(",
    "waitfor delay",
    "/**/",
];

const TRAVERSAL_MARKERS: &[&str] = &["../", "..\\", "..%2f", "..%5c", "%2e%2e", "..;/"];

const NESTED_SCHEMES: &[&str] = &["http://", "https://", "ftp://", "file://", "data:"];

// Absolute or protocol-relative targets; anything else stays on-site
const REDIRECT_TARGETS: &[&str] = &["http:", "https:", "//", "\\\\", "/\\"];

const COMMAND_PATTERN: &str = concat!(
    r"(?:[;|]|&&|\|\|)\s*(?:ls|cat|rm|wget|curl|bash|sh|nc|id|whoami|uname|chmod|python|perl|ping)\b",
    r"|`[^`]+`",
    r"|\$\([^)]+\)",
);

/// Injection, nested scheme and open redirect heuristics
#[derive(Debug)]
pub struct PayloadCheck {
    matcher: PatternMatcher,
    redirect_targets: PatternMatcher,
    command: Regex,
    redirect_params: AHashSet<String>,
}

impl PayloadCheck {
    pub fn new(config: &ClassifierConfig) -> ClassifierResult<Self> {
        let groups: [(&[&str], AnomalyKind); 4] = [
            (XSS_MARKERS, AnomalyKind::CrossSiteScripting),
            (SQL_MARKERS, AnomalyKind::SqlInjection),
            (TRAVERSAL_MARKERS, AnomalyKind::PathTraversal),
            (NESTED_SCHEMES, AnomalyKind::NestedScheme),
        ];

        let mut patterns = Vec::new();
        for (markers, anomaly) in groups {
            for marker in markers {
                patterns.push(PayloadPattern::contains(*marker, anomaly)?);
            }
        }

        let redirect_targets = REDIRECT_TARGETS
            .iter()
            .map(|target| PayloadPattern::starts_with(*target, AnomalyKind::OpenRedirect))
            .collect::<ClassifierResult<Vec<_>>>()?;

        Ok(Self {
            matcher: PatternMatcher::new(patterns)?,
            redirect_targets: PatternMatcher::new(redirect_targets)?,
            command: Regex::new(COMMAND_PATTERN)?,
            redirect_params: config
                .redirect_params
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
        })
    }

    fn severity(kind: AnomalyKind) -> RiskLevel {
        match kind {
            AnomalyKind::CrossSiteScripting => RiskLevel::Malicious,
            _ => RiskLevel::Suspicious,
        }
    }

    fn check_patterns(&self, field: UrlField, text: &str, findings: &mut Vec<AnomalyFlag>) {
        let mut reported: Vec<AnomalyKind> = Vec::new();

        for hit in self.matcher.find(text) {
            let kind = hit.pattern.anomaly;
            // The scheme of an opaque URL shows up at the start of its path
            if kind == AnomalyKind::NestedScheme && field == UrlField::Path && hit.start == 0 {
                continue;
            }
            if reported.contains(&kind) {
                continue;
            }
            reported.push(kind);
            findings.push(AnomalyFlag::heuristic(
                kind,
                field,
                Self::severity(kind),
                format!(
                    "'{}' found in {} at offset {}",
                    &text[hit.start..hit.end],
                    field,
                    hit.start
                ),
            ));
        }

        if let Some(hit) = self.command.find(text) {
            findings.push(AnomalyFlag::heuristic(
                AnomalyKind::CommandInjection,
                field,
                RiskLevel::Suspicious,
                format!("'{}' found in {}", hit.as_str(), field),
            ));
        }
    }

    fn check_redirect(&self, query: &str, findings: &mut Vec<AnomalyFlag>) {
        for pair in query.split(['&', ';']) {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = percent_decode(name).to_ascii_lowercase();
            if !self.redirect_params.contains(&name) {
                continue;
            }

            let value = percent_decode(value);
            if !self.redirect_targets.find(value.trim()).is_empty() {
                findings.push(AnomalyFlag::heuristic(
                    AnomalyKind::OpenRedirect,
                    UrlField::Query,
                    RiskLevel::Suspicious,
                    format!("parameter '{}' redirects to '{}'", name, value.trim()),
                ));
                return;
            }
        }
    }
}

impl UrlCheck for PayloadCheck {
    fn name(&self) -> &'static str {
        "payload"
    }

    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) {
        for field in [UrlField::Path, UrlField::Query, UrlField::Fragment] {
            if let Some(component) = url.field(field) {
                self.check_patterns(field, component.decoded(), findings);
            }
        }
        if let Some(query) = url.query() {
            self.check_redirect(query.raw(), findings);
        }
    }
}

/// Path and query length limits
#[derive(Debug, Clone)]
pub struct LengthCheck {
    max_path: usize,
    max_query: usize,
}

impl LengthCheck {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            max_path: config.max_path_length,
            max_query: config.max_query_length,
        }
    }
}

impl UrlCheck for LengthCheck {
    fn name(&self) -> &'static str {
        "length"
    }

    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) {
        for (field, max) in [
            (UrlField::Path, self.max_path),
            (UrlField::Query, self.max_query),
        ] {
            let Some(component) = url.field(field) else {
                continue;
            };
            let len = component.raw().chars().count();
            if len > max {
                findings.push(AnomalyFlag::heuristic(
                    AnomalyKind::ExcessiveLength,
                    field,
                    RiskLevel::Suspicious,
                    format!("{} is {} characters long (max {})", field, len, max),
                ));
            }
        }
    }
}
