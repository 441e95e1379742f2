// Payload pattern matching
//
// Multi-pattern literal matching over decoded URL fields using an
// Aho-Corasick automaton. Each pattern carries the anomaly it indicates and
// the positional constraint a hit must satisfy.

use crate::finding::AnomalyKind;
use crate::{ClassifierError, ClassifierResult};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal marker for one anomaly kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadPattern {
    /// Literal text to find
    pub pattern: String,

    /// Anomaly reported on a hit
    pub anomaly: AnomalyKind,

    /// Positional constraint
    pub kind: PatternKind,
}

impl PayloadPattern {
    pub fn new(
        pattern: impl Into<String>,
        anomaly: AnomalyKind,
        kind: PatternKind,
    ) -> ClassifierResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(ClassifierError::InvalidPattern(
                "Pattern cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            pattern,
            anomaly,
            kind,
        })
    }

    pub fn contains(pattern: impl Into<String>, anomaly: AnomalyKind) -> ClassifierResult<Self> {
        Self::new(pattern, anomaly, PatternKind::Contains)
    }

    pub fn starts_with(pattern: impl Into<String>, anomaly: AnomalyKind) -> ClassifierResult<Self> {
        Self::new(pattern, anomaly, PatternKind::StartsWith)
    }
}

/// Where a pattern hit must sit in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Contains,
    StartsWith,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Contains => write!(f, "contains"),
            PatternKind::StartsWith => write!(f, "startswith"),
        }
    }
}

/// A hit reported by the matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'p> {
    pub pattern: &'p PayloadPattern,
    pub start: usize,
    pub end: usize,
}

/// Case-insensitive multi-pattern matcher
pub struct PatternMatcher {
    automaton: AhoCorasick,
    patterns: Vec<PayloadPattern>,
}

impl PatternMatcher {
    pub fn new(patterns: Vec<PayloadPattern>) -> ClassifierResult<Self> {
        if patterns.is_empty() {
            return Err(ClassifierError::InvalidPattern(
                "No patterns provided".to_string(),
            ));
        }

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .ascii_case_insensitive(true)
            .build(patterns.iter().map(|p| p.pattern.as_str()))
            .map_err(|e| {
                ClassifierError::InvalidPattern(format!("Failed to build automaton: {}", e))
            })?;

        Ok(Self {
            automaton,
            patterns,
        })
    }

    /// All hits in `text`, overlapping hits included
    pub fn find<'p>(&'p self, text: &str) -> Vec<PatternMatch<'p>> {
        let mut matches = Vec::new();

        for hit in self.automaton.find_overlapping_iter(text) {
            let pattern = &self.patterns[hit.pattern().as_usize()];
            let valid = match pattern.kind {
                PatternKind::Contains => true,
                PatternKind::StartsWith => hit.start() == 0,
            };
            if valid {
                matches.push(PatternMatch {
                    pattern,
                    start: hit.start(),
                    end: hit.end(),
                });
            }
        }

        matches
    }

}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("pattern_count", &self.patterns.len())
            .finish()
    }
}
