// Host checks
//
// Syntax is checked with the hostname automaton over the decoded,
// lowercased host. Numeric and bracketed hosts are handled separately.

use super::brand::confusable;
use super::{describe_char, UrlCheck};
use crate::automata::{char_at, hostname, ClassAutomaton};
use crate::config::ClassifierConfig;
use crate::finding::{AnomalyFlag, AnomalyKind, RiskLevel};
use crate::lexer::{UrlComponents, UrlField};
use crate::ClassifierResult;
use std::net::{Ipv4Addr, Ipv6Addr};
use vigil_automaton::{Simulator, Verdict};

const MAX_LABEL_LEN: usize = 63;
const MAX_HOST_LEN: usize = 253;

#[derive(Debug, Clone)]
pub struct HostCheck {
    hostname: ClassAutomaton,
    simulator: Simulator,
    max_labels: usize,
}

impl HostCheck {
    pub fn new(config: &ClassifierConfig) -> ClassifierResult<Self> {
        Ok(Self {
            hostname: hostname()?,
            simulator: Simulator::without_trace(),
            max_labels: config.max_host_labels,
        })
    }

    fn check_ipv6(&self, decoded: &str, findings: &mut Vec<AnomalyFlag>) {
        let inner = decoded
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'));
        let address = inner.map(|inner| inner.split('%').next().unwrap_or(inner));

        match address.map(str::parse::<Ipv6Addr>) {
            Some(Ok(addr)) => findings.push(AnomalyFlag::heuristic(
                AnomalyKind::IpAddressHost,
                UrlField::Host,
                RiskLevel::Suspicious,
                format!("host is the IPv6 address {}", addr),
            )),
            _ => findings.push(AnomalyFlag::structural(
                AnomalyKind::MalformedHost,
                UrlField::Host,
                RiskLevel::Suspicious,
                format!("'{}' is not a valid IPv6 literal", decoded),
            )),
        }
    }

    fn check_syntax(&self, host: &str, findings: &mut Vec<AnomalyFlag>) {
        let result = self.hostname.run(&self.simulator, host);
        let reason = match (result.verdict, result.halted_on) {
            (Verdict::Accepted, _) => None,
            (Verdict::RejectedFinalState, _) => Some("hostname ends with a hyphen".to_string()),
            (Verdict::RejectedInvalidSymbol, Some(halt)) => char_at(host, halt.position)
                .map(|(_, c)| format!("character {} is not allowed in a hostname", describe_char(c))),
            (_, Some(halt)) => char_at(host, halt.position).map(|(offset, c)| {
                format!(
                    "unexpected {} at offset {} (empty label or leading hyphen)",
                    describe_char(c),
                    offset
                )
            }),
            (_, None) => None,
        };

        let reason = reason.or_else(|| {
            if host.len() > MAX_HOST_LEN {
                return Some(format!(
                    "hostname is {} bytes long (max {})",
                    host.len(),
                    MAX_HOST_LEN
                ));
            }
            host.split('.')
                .find(|label| label.len() > MAX_LABEL_LEN)
                .map(|label| format!("label '{}' exceeds {} bytes", label, MAX_LABEL_LEN))
        });

        if let Some(reason) = reason {
            findings.push(AnomalyFlag::structural(
                AnomalyKind::MalformedHost,
                UrlField::Host,
                RiskLevel::Suspicious,
                reason,
            ));
        }
    }

    fn check_labels(&self, host: &str, findings: &mut Vec<AnomalyFlag>) {
        let labels: Vec<&str> = host.trim_end_matches('.').split('.').collect();

        if labels.len() > self.max_labels {
            findings.push(AnomalyFlag::heuristic(
                AnomalyKind::ExcessiveSubdomains,
                UrlField::Host,
                RiskLevel::Suspicious,
                format!(
                    "host has {} labels (max {})",
                    labels.len(),
                    self.max_labels
                ),
            ));
        }

        if let Some(label) = labels.iter().find(|l| l.starts_with("xn--")) {
            findings.push(AnomalyFlag::heuristic(
                AnomalyKind::PunycodeHost,
                UrlField::Host,
                RiskLevel::Suspicious,
                format!("punycode label '{}' may hide lookalike characters", label),
            ));
        }

        let mixed = labels.iter().find(|label| {
            label.chars().any(|c| c.is_ascii_alphabetic())
                && label.chars().any(|c| confusable(c).is_some())
        });
        if let Some(label) = mixed {
            findings.push(AnomalyFlag::heuristic(
                AnomalyKind::Homoglyph,
                UrlField::Host,
                RiskLevel::Suspicious,
                format!("label '{}' mixes ASCII with lookalike characters", label),
            ));
        }
    }
}

impl UrlCheck for HostCheck {
    fn name(&self) -> &'static str {
        "host"
    }

    fn inspect(&self, url: &UrlComponents<'_>, findings: &mut Vec<AnomalyFlag>) {
        let Some(host) = url.host() else {
            if url.authority().is_some() {
                findings.push(AnomalyFlag::structural(
                    AnomalyKind::MalformedHost,
                    UrlField::Host,
                    RiskLevel::Suspicious,
                    "authority has no host",
                ));
            }
            return;
        };

        if let Some(c) = host
            .raw()
            .chars()
            .find(|c| c.is_control() || c.is_whitespace())
        {
            findings.push(AnomalyFlag::structural(
                AnomalyKind::SuspiciousHost,
                UrlField::Host,
                RiskLevel::Malicious,
                format!("host contains unescaped {}", describe_char(c)),
            ));
            return;
        }

        if host.is_encoded() {
            findings.push(AnomalyFlag::heuristic(
                AnomalyKind::ObfuscatedHost,
                UrlField::Host,
                RiskLevel::Suspicious,
                format!(
                    "host '{}' is percent-encoded (decodes to '{}')",
                    host.raw(),
                    host.decoded()
                ),
            ));
        }

        let name = host.normalized();
        if name.starts_with('[') {
            self.check_ipv6(name, findings);
            return;
        }

        match numeric_host(name) {
            Some(NumericHost::Canonical(addr)) => {
                findings.push(AnomalyFlag::heuristic(
                    AnomalyKind::IpAddressHost,
                    UrlField::Host,
                    RiskLevel::Suspicious,
                    format!("host is the IPv4 address {}", addr),
                ));
                return;
            }
            Some(NumericHost::Obfuscated(addr)) => {
                let reason = match addr {
                    Some(addr) => format!("'{}' is a non-canonical form of {}", name, addr),
                    None => format!("'{}' is a numeric host outside the IPv4 range", name),
                };
                findings.push(AnomalyFlag::heuristic(
                    AnomalyKind::ObfuscatedHost,
                    UrlField::Host,
                    RiskLevel::Suspicious,
                    reason,
                ));
                return;
            }
            None => {}
        }

        self.check_syntax(name, findings);
        self.check_labels(name, findings);
    }
}

enum NumericHost {
    Canonical(Ipv4Addr),
    Obfuscated(Option<Ipv4Addr>),
}

// Decimal, 0x-hex or 0-prefixed octal, as accepted by inet_aton
fn numeric_part(part: &str) -> Option<u64> {
    // from_str_radix alone would also take a leading sign
    if let Some(hex) = part.strip_prefix("0x") {
        if hex.is_empty() {
            return Some(0);
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return u64::from_str_radix(hex, 16).ok();
    }
    if part.len() > 1 && part.starts_with('0') {
        let octal = &part[1..];
        if !octal.bytes().all(|b| matches!(b, b'0'..=b'7')) {
            return None;
        }
        return u64::from_str_radix(octal, 8).ok();
    }
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn numeric_host(host: &str) -> Option<NumericHost> {
    let host = host.trim_end_matches('.');
    let parts: Vec<u64> = host
        .split('.')
        .map(numeric_part)
        .collect::<Option<_>>()?;
    if parts.is_empty() || parts.len() > 4 {
        return None;
    }

    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        if addr.to_string() == host {
            return Some(NumericHost::Canonical(addr));
        }
    }

    // The last part fills all remaining bytes
    let (head, last) = parts.split_at(parts.len() - 1);
    let tail_bits = 8 * (4 - head.len() as u32);
    let valid = head.iter().all(|p| *p <= 0xff) && last[0] < (1u64 << tail_bits);
    let addr = valid.then(|| {
        let mut value = last[0];
        for (i, part) in head.iter().enumerate() {
            value |= part << (24 - 8 * i as u32);
        }
        Ipv4Addr::from(value as u32)
    });

    Some(NumericHost::Obfuscated(addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn inspect(raw: &str) -> Vec<AnomalyFlag> {
        let check = HostCheck::new(&ClassifierConfig::default()).unwrap();
        let mut findings = Vec::new();
        check.inspect(&tokenize(raw), &mut findings);
        findings
    }

    fn kinds(raw: &str) -> Vec<AnomalyKind> {
        inspect(raw).into_iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_plain_hosts() {
        assert!(inspect("https://example.com/").is_empty());
        assert!(inspect("https://www.Example.CO.uk/").is_empty());
        assert!(inspect("https://bücher.de/").is_empty());
        assert!(inspect("javascript:alert(1)").is_empty());
    }

    #[test]
    fn test_whitespace_in_host() {
        let findings = inspect("http://exa mple.com/");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, AnomalyKind::SuspiciousHost);
        assert_eq!(findings[0].severity, RiskLevel::Malicious);
        assert!(findings[0].is_structural());
    }

    #[test]
    fn test_malformed_hosts() {
        assert_eq!(kinds("http://-bad.com/"), vec![AnomalyKind::MalformedHost]);
        assert_eq!(kinds("http://a..b.com/"), vec![AnomalyKind::MalformedHost]);
        assert_eq!(kinds("http://bad-/"), vec![AnomalyKind::MalformedHost]);
        assert_eq!(kinds("http://under_score.com/"), vec![AnomalyKind::MalformedHost]);
        assert_eq!(kinds("http:///path"), vec![AnomalyKind::MalformedHost]);

        let long = format!("http://{}.com/", "a".repeat(64));
        assert_eq!(kinds(&long), vec![AnomalyKind::MalformedHost]);
    }

    #[test]
    fn test_ip_hosts() {
        assert_eq!(kinds("http://192.168.0.1/"), vec![AnomalyKind::IpAddressHost]);
        assert_eq!(kinds("http://[::1]:8080/"), vec![AnomalyKind::IpAddressHost]);
        assert_eq!(kinds("http://[not-v6]/"), vec![AnomalyKind::MalformedHost]);
    }

    #[test]
    fn test_obfuscated_numeric_hosts() {
        let findings = inspect("http://3232235521/");
        assert_eq!(findings[0].kind, AnomalyKind::ObfuscatedHost);
        assert!(findings[0].reason.contains("192.168.0.1"));

        let findings = inspect("http://0xc0.0xa8.0.1/");
        assert!(findings[0].reason.contains("192.168.0.1"));

        let findings = inspect("http://0300.0250.0.01/");
        assert!(findings[0].reason.contains("192.168.0.1"));
    }

    #[test]
    fn test_percent_encoded_host() {
        let findings = inspect("http://ex%61mple.com/");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, AnomalyKind::ObfuscatedHost);
        assert!(findings[0].reason.contains("example.com"));
    }

    #[test]
    fn test_label_heuristics() {
        assert_eq!(
            kinds("http://a.b.c.d.e.example.com/"),
            vec![AnomalyKind::ExcessiveSubdomains]
        );
        assert_eq!(kinds("http://xn--80ak6aa92e.com/"), vec![AnomalyKind::PunycodeHost]);
        // Cyrillic 'а' in an otherwise ASCII label
        assert_eq!(kinds("http://p\u{430}ypal.com/"), vec![AnomalyKind::Homoglyph]);
    }

    #[test]
    fn test_numeric_part() {
        assert_eq!(numeric_part("10"), Some(10));
        assert_eq!(numeric_part("0x1f"), Some(31));
        assert_eq!(numeric_part("017"), Some(15));
        assert_eq!(numeric_part("0"), Some(0));
        assert_eq!(numeric_part("com"), None);
        assert_eq!(numeric_part("08"), None);
        assert_eq!(numeric_part("0x+1"), None);
        assert_eq!(numeric_part("0+7"), None);
        assert_eq!(numeric_part("0x-f"), None);
    }

    #[test]
    fn test_signed_numeric_parts_are_not_addresses() {
        assert_eq!(kinds("http://0x+1/"), vec![AnomalyKind::MalformedHost]);
        assert_eq!(kinds("http://0+10.0.0.1/"), vec![AnomalyKind::MalformedHost]);
    }
}
