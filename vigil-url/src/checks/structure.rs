// Grammar and port checks

use super::{describe_char, UrlCheck};
use crate::automata::{char_at, url_grammar, ClassAutomaton};
use crate::finding::{AnomalyFlag, AnomalyKind, RiskLevel};
use crate::lexer::{UrlComponents, UrlField};
use crate::ClassifierResult;
use vigil_automaton::{Simulator, Verdict};

/// Runs the URL grammar automaton over the raw text
#[derive(Debug, Clone)]
pub struct GrammarCheck {
    grammar: ClassAutomaton,
    simulator: Simulator,
}

impl GrammarCheck {
    pub fn new() -> ClassifierResult<Self> {
        Ok(Self {
            grammar: url_grammar()?,
            simulator: Simulator::default(),
        })
    }

    /// Run the grammar, append findings and return the visited state names
    pub fn structure(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) -> Vec<String> {
        let raw = url.raw();
        let result = self.grammar.run(&self.simulator, raw);
        let path: Vec<String> = result
            .state_path(self.grammar.automaton())
            .into_iter()
            .map(str::to_string)
            .collect();
        let last_state = path.last().map(String::as_str).unwrap_or("start");

        match (result.verdict, result.halted_on) {
            (Verdict::Accepted, _) => {}
            (Verdict::RejectedFinalState, _) => {
                let reason = if raw.is_empty() {
                    "URL is empty".to_string()
                } else {
                    format!("URL ends in grammar state '{}'", last_state)
                };
                findings.push(AnomalyFlag::structural(
                    AnomalyKind::MalformedStructure,
                    UrlField::Url,
                    RiskLevel::Suspicious,
                    reason,
                ));
            }
            (verdict, Some(halt)) => {
                let Some((offset, c)) = char_at(raw, halt.position) else {
                    return path;
                };
                let field = url.field_at(offset);

                if verdict == Verdict::RejectedInvalidSymbol {
                    // Control characters get their own findings from the
                    // host and encoding checks
                    if !c.is_control() {
                        findings.push(AnomalyFlag::structural(
                            AnomalyKind::InvalidCharacter,
                            field,
                            RiskLevel::Suspicious,
                            format!(
                                "character {} at offset {} is not allowed in a URL",
                                describe_char(c),
                                offset
                            ),
                        ));
                    }
                } else {
                    findings.push(AnomalyFlag::structural(
                        AnomalyKind::MalformedStructure,
                        field,
                        RiskLevel::Suspicious,
                        format!(
                            "unexpected {} at offset {} in grammar state '{}'",
                            describe_char(c),
                            offset,
                            last_state
                        ),
                    ));
                }
            }
            (_, None) => {}
        }

        path
    }
}

impl UrlCheck for GrammarCheck {
    fn name(&self) -> &'static str {
        "grammar"
    }

    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) {
        self.structure(url, findings);
    }
}

/// Port must be a decimal number in 0..=65535
#[derive(Debug, Clone, Copy, Default)]
pub struct PortCheck;

impl UrlCheck for PortCheck {
    fn name(&self) -> &'static str {
        "port"
    }

    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) {
        let Some(port) = url.port() else {
            return;
        };
        let raw = port.raw();

        let reason = if raw.is_empty() {
            Some("port delimiter ':' is not followed by a port".to_string())
        } else if !raw.bytes().all(|b| b.is_ascii_digit()) {
            Some(format!("port '{}' is not a decimal number", raw))
        } else if raw.parse::<u16>().is_err() {
            Some(format!("port {} is out of range (0-65535)", raw))
        } else {
            None
        };

        if let Some(reason) = reason {
            findings.push(AnomalyFlag::structural(
                AnomalyKind::InvalidPort,
                UrlField::Port,
                RiskLevel::Suspicious,
                reason,
            ));
        }
    }
}
