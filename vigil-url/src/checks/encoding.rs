// Encoding checks
//
// Percent-encoding syntax, encoded control characters, double encoding,
// encoded delimiters and backslash escape sequences. At most one finding of
// each kind is reported per field.

use super::{describe_char, UrlCheck};
use crate::automata::{char_at, percent_encoding, ClassAutomaton};
use crate::encoding::{encoded_bytes, has_encoded_byte};
use crate::finding::{AnomalyFlag, AnomalyKind, RiskLevel};
use crate::lexer::{tokenize, Component, UrlComponents, UrlField};
use crate::ClassifierResult;
use regex::Regex;
use vigil_automaton::Simulator;

const HOST_DELIMITERS: &[u8] = b"/\\?#@:";
const USERINFO_DELIMITERS: &[u8] = b"/\\?#";

fn is_control(value: u32) -> bool {
    char::from_u32(value).map(char::is_control).unwrap_or(false)
}

// Encoded bytes above 0x7f are UTF-8 sequence bytes, not C1 controls
fn is_control_byte(byte: u8) -> bool {
    byte.is_ascii_control()
}

#[derive(Debug, Clone)]
pub struct EncodingCheck {
    percent: ClassAutomaton,
    simulator: Simulator,
    escapes: Regex,
}

impl EncodingCheck {
    pub fn new() -> ClassifierResult<Self> {
        Ok(Self {
            percent: percent_encoding()?,
            simulator: Simulator::without_trace(),
            escapes: Regex::new(r"\\(?:x([0-9A-Fa-f]{2})|u([0-9A-Fa-f]{4})|([0-3][0-7]{2}))")?,
        })
    }

    fn check_syntax(&self, field: UrlField, component: &Component<'_>, findings: &mut Vec<AnomalyFlag>) {
        let raw = component.raw();
        let result = self.percent.run(&self.simulator, raw);
        if result.is_accepted() {
            return;
        }

        let stop = result
            .halted_on
            .and_then(|halt| char_at(raw, halt.position))
            .map(|(offset, _)| offset)
            .unwrap_or(raw.len());
        let start = raw[..stop].rfind('%').unwrap_or(stop);
        let escape: String = raw[start..].chars().take(3).collect();

        findings.push(AnomalyFlag::structural(
            AnomalyKind::MalformedEncoding,
            field,
            RiskLevel::Suspicious,
            format!(
                "'{}' at offset {} is not a valid percent-escape",
                escape,
                component.offset() + start
            ),
        ));
    }

    fn control_reason(&self, field: UrlField, component: &Component<'_>) -> Option<String> {
        let raw = component.raw();

        // Raw control characters in the host are a SuspiciousHost finding
        if field != UrlField::Host {
            if let Some(c) = raw.chars().find(|c| c.is_control()) {
                return Some(format!("unescaped control character {}", describe_char(c)));
            }
        }

        if let Some(eb) = encoded_bytes(raw).find(|eb| is_control_byte(eb.byte)) {
            return Some(format!(
                "'{}' at offset {} decodes to control character U+{:04X}",
                &raw[eb.offset..eb.offset + 3],
                component.offset() + eb.offset,
                eb.byte
            ));
        }

        if let Some(eb) = encoded_bytes(component.decoded()).find(|eb| is_control_byte(eb.byte)) {
            return Some(format!("double-encoded control character U+{:04X}", eb.byte));
        }

        None
    }

    // A decoded path that retokenizes to a different host, such as
    // "http:%2F%2Fevil.com". Query and fragment come after the authority,
    // so decoding them can never move the host.
    fn path_reason(&self, url: &UrlComponents<'_>, path: &Component<'_>) -> Option<String> {
        if !path.is_encoded() {
            return None;
        }
        let raw = url.raw();
        let rebuilt = format!("{}{}{}", &raw[..path.offset()], path.decoded(), &raw[path.end()..]);
        let decoded_host = tokenize(&rebuilt).host().map(|h| h.normalized().to_string());
        let host = url.host().map(|h| h.normalized());
        if decoded_host.as_deref() == host {
            return None;
        }
        Some(match decoded_host {
            Some(moved) => format!("decoding the path yields the host '{}'", moved),
            None => "decoding the path removes the host".to_string(),
        })
    }

    fn delimiter_reason(
        &self,
        url: &UrlComponents<'_>,
        field: UrlField,
        component: &Component<'_>,
    ) -> Option<String> {
        let delimiters = match field {
            UrlField::Host => HOST_DELIMITERS,
            UrlField::UserInfo => USERINFO_DELIMITERS,
            UrlField::Path => return self.path_reason(url, component),
            _ => return None,
        };

        encoded_bytes(component.raw())
            .find(|eb| delimiters.contains(&eb.byte))
            .map(|eb| {
                format!(
                    "'{}' decodes to delimiter '{}' inside the {}",
                    &component.raw()[eb.offset..eb.offset + 3],
                    eb.byte as char,
                    field
                )
            })
    }

    /// Escape sequences: control reason and first printable sequence
    fn escapes(&self, text: &str) -> (Option<String>, Option<String>) {
        let mut control = None;
        let mut printable = None;

        for caps in self.escapes.captures_iter(text) {
            let sequence = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let value = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(hex), _, _) | (_, Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, _, Some(octal)) => u32::from_str_radix(octal.as_str(), 8).ok(),
                _ => None,
            };
            let Some(value) = value else {
                continue;
            };

            if is_control(value) {
                control.get_or_insert_with(|| {
                    format!(
                        "escape sequence '{}' denotes control character U+{:04X}",
                        sequence, value
                    )
                });
            } else {
                printable.get_or_insert_with(|| format!("escape sequence '{}'", sequence));
            }
            if control.is_some() && printable.is_some() {
                break;
            }
        }

        (control, printable)
    }
}

impl UrlCheck for EncodingCheck {
    fn name(&self) -> &'static str {
        "encoding"
    }

    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) {
        for (field, component) in url.fields() {
            self.check_syntax(field, component, findings);

            let (escaped_control, escaped) = self.escapes(component.decoded());
            let control = self
                .control_reason(field, component)
                .or(escaped_control)
                .or_else(|| self.delimiter_reason(url, field, component));
            if let Some(reason) = control {
                findings.push(AnomalyFlag::structural(
                    AnomalyKind::EncodedControlChar,
                    field,
                    RiskLevel::Malicious,
                    reason,
                ));
            }

            if has_encoded_byte(component.decoded()) {
                findings.push(AnomalyFlag::structural(
                    AnomalyKind::DoubleEncoding,
                    field,
                    RiskLevel::Suspicious,
                    format!(
                        "'{}' is still percent-encoded after decoding",
                        component.decoded()
                    ),
                ));
            }

            if let Some(reason) = escaped {
                findings.push(AnomalyFlag::heuristic(
                    AnomalyKind::EscapedCharSequence,
                    field,
                    RiskLevel::Suspicious,
                    format!("{} in {}", reason, field),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspect(raw: &str) -> Vec<AnomalyFlag> {
        let check = EncodingCheck::new().unwrap();
        let mut findings = Vec::new();
        check.inspect(&tokenize(raw), &mut findings);
        findings
    }

    fn kinds(raw: &str) -> Vec<(AnomalyKind, UrlField)> {
        inspect(raw).into_iter().map(|f| (f.kind, f.field)).collect()
    }

    #[test]
    fn test_clean_urls() {
        assert!(inspect("https://example.com/a?b=1").is_empty());
        assert!(inspect("https://example.com/caf%C3%A9?q=a%20b").is_empty());
        // U+20AC encodes as E2 82 AC
        assert!(inspect("https://example.com/%E2%82%AC").is_empty());
    }

    #[test]
    fn test_malformed_encoding() {
        let findings = inspect("https://example.com/a%zzb");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, AnomalyKind::MalformedEncoding);
        assert!(findings[0].reason.contains("'%zz'"));

        let findings = inspect("https://example.com/?q=100%");
        assert_eq!(findings[0].field, UrlField::Query);
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(
            kinds("http://example.com/\u{1}"),
            vec![(AnomalyKind::EncodedControlChar, UrlField::Path)]
        );
        assert_eq!(
            kinds("http://example.com/a%0Ab"),
            vec![(AnomalyKind::EncodedControlChar, UrlField::Path)]
        );
        assert_eq!(
            kinds("http://example.com/?x=%00"),
            vec![(AnomalyKind::EncodedControlChar, UrlField::Query)]
        );
        assert_eq!(
            kinds(r"http://example.com/\x01"),
            vec![(AnomalyKind::EncodedControlChar, UrlField::Path)]
        );
    }

    #[test]
    fn test_double_encoding() {
        let found = kinds("http://example.com/%252e%252e/");
        assert_eq!(found, vec![(AnomalyKind::DoubleEncoding, UrlField::Path)]);

        let found = kinds("http://example.com/%250a");
        assert!(found.contains(&(AnomalyKind::EncodedControlChar, UrlField::Path)));
        assert!(found.contains(&(AnomalyKind::DoubleEncoding, UrlField::Path)));
    }

    #[test]
    fn test_encoded_delimiters() {
        assert_eq!(
            kinds("http://evil.com%2f@example.com/"),
            vec![(AnomalyKind::EncodedControlChar, UrlField::UserInfo)]
        );
        assert_eq!(
            kinds("http://example.com%2fevil.com/"),
            vec![(AnomalyKind::EncodedControlChar, UrlField::Host)]
        );
        assert!(inspect("http://me%40mail.com:pw@example.com/").is_empty());
    }

    #[test]
    fn test_escaped_url_in_query_is_not_smuggling() {
        assert!(inspect("http://example.com/go?u=https%3A%2F%2Fevil.com").is_empty());
        assert!(inspect(
            "https://accounts.example.com/login?continue=https%3A%2F%2Fmail.example.com%2F"
        )
        .is_empty());
        assert!(inspect("https://example.com/#return=https%3A%2F%2Fexample.org").is_empty());
        assert!(inspect("https://example.com/proxy/https%3A%2F%2Fexample.org").is_empty());
    }

    #[test]
    fn test_encoded_path_that_moves_the_host() {
        let findings = inspect("http:%2F%2Fevil.com/");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, AnomalyKind::EncodedControlChar);
        assert_eq!(findings[0].field, UrlField::Path);
        assert!(findings[0].reason.contains("'evil.com'"));
    }

    #[test]
    fn test_printable_escape_sequence() {
        let findings = inspect(r"http://example.com/\x41\x42");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, AnomalyKind::EscapedCharSequence);
        assert!(!findings[0].is_structural());
    }
}
