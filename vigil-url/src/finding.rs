// Classifier findings
//
// Anomaly flags, risk levels and the aggregated validation result.

use crate::lexer::UrlField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered risk verdict: Safe < Suspicious < Malicious
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum RiskLevel {
    #[default]
    Safe,
    Suspicious,
    Malicious,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "Safe"),
            RiskLevel::Suspicious => write!(f, "Suspicious"),
            RiskLevel::Malicious => write!(f, "Malicious"),
        }
    }
}

/// Whether a finding comes from a hard structural rule or a heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FindingClass {
    Structural,
    Heuristic,
}

/// The kind of anomaly found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    // Structural
    SchemeMismatch,
    SuspiciousHost,
    EncodedControlChar,
    MalformedEncoding,
    DoubleEncoding,
    MalformedHost,
    InvalidPort,
    InvalidCharacter,
    MalformedStructure,

    // Heuristic
    HostMismatch,
    BrandImpersonation,
    Homoglyph,
    PunycodeHost,
    ObfuscatedHost,
    IpAddressHost,
    ExcessiveSubdomains,
    SqlInjection,
    CrossSiteScripting,
    PathTraversal,
    CommandInjection,
    EscapedCharSequence,
    NestedScheme,
    OpenRedirect,
    ExcessiveLength,
}

impl AnomalyKind {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::SchemeMismatch => "scheme mismatch",
            AnomalyKind::SuspiciousHost => "suspicious host",
            AnomalyKind::EncodedControlChar => "encoded control character",
            AnomalyKind::MalformedEncoding => "malformed percent-encoding",
            AnomalyKind::DoubleEncoding => "double encoding",
            AnomalyKind::MalformedHost => "malformed host",
            AnomalyKind::InvalidPort => "invalid port",
            AnomalyKind::InvalidCharacter => "invalid character",
            AnomalyKind::MalformedStructure => "malformed structure",
            AnomalyKind::HostMismatch => "host mismatch",
            AnomalyKind::BrandImpersonation => "brand impersonation",
            AnomalyKind::Homoglyph => "homoglyph",
            AnomalyKind::PunycodeHost => "punycode host",
            AnomalyKind::ObfuscatedHost => "obfuscated host",
            AnomalyKind::IpAddressHost => "IP address host",
            AnomalyKind::ExcessiveSubdomains => "excessive subdomains",
            AnomalyKind::SqlInjection => "SQL injection",
            AnomalyKind::CrossSiteScripting => "cross-site scripting",
            AnomalyKind::PathTraversal => "path traversal",
            AnomalyKind::CommandInjection => "command injection",
            AnomalyKind::EscapedCharSequence => "escaped character sequence",
            AnomalyKind::NestedScheme => "nested scheme",
            AnomalyKind::OpenRedirect => "open redirect",
            AnomalyKind::ExcessiveLength => "excessive length",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single classifier finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub kind: AnomalyKind,
    pub field: UrlField,
    pub reason: String,
    pub severity: RiskLevel,
    pub class: FindingClass,
}

impl AnomalyFlag {
    pub fn structural(
        kind: AnomalyKind,
        field: UrlField,
        severity: RiskLevel,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field,
            reason: reason.into(),
            severity,
            class: FindingClass::Structural,
        }
    }

    pub fn heuristic(
        kind: AnomalyKind,
        field: UrlField,
        severity: RiskLevel,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field,
            reason: reason.into(),
            severity,
            class: FindingClass::Heuristic,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.class == FindingClass::Structural
    }
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} in {}: {}",
            self.severity, self.kind, self.field, self.reason
        )
    }
}

/// Aggregated outcome of classifying one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub well_formed: bool,
    pub risk_level: RiskLevel,
    pub flags: Vec<AnomalyFlag>,

    /// Grammar automaton state names over the raw URL
    pub structure: Vec<String>,

    /// Why the URL is not well-formed
    pub rejection_reason: Option<String>,
}

impl ValidationResult {
    pub fn has_flag(&self, kind: AnomalyKind) -> bool {
        self.flags.iter().any(|f| f.kind == kind)
    }

    pub fn flags_of(&self, kind: AnomalyKind) -> impl Iterator<Item = &AnomalyFlag> {
        self.flags.iter().filter(move |f| f.kind == kind)
    }

    pub fn structural_flags(&self) -> impl Iterator<Item = &AnomalyFlag> {
        self.flags.iter().filter(|f| f.is_structural())
    }

    /// First finding for a field; structural findings come first
    pub fn primary_flag(&self, field: UrlField) -> Option<&AnomalyFlag> {
        self.flags.iter().find(|f| f.field == field)
    }
}
