// Vigil URL - Automaton-driven URL lexer and security classifier
//!
// This crate splits raw URLs into borrowed components and classifies them
// with a pipeline of checks. Structural checks run hand-built automata over
// the URL text; heuristic checks look for phishing and injection markers.
// The classifier never fails on input: every problem becomes a finding.

pub mod automata;
pub mod checks;
mod classifier;
mod config;
pub mod encoding;
mod finding;
mod lexer;
mod pattern;

pub use classifier::UrlClassifier;
pub use config::ClassifierConfig;
pub use finding::{AnomalyFlag, AnomalyKind, FindingClass, RiskLevel, ValidationResult};
pub use lexer::{tokenize, Component, UrlComponents, UrlField};
pub use pattern::{PatternKind, PatternMatch, PatternMatcher, PayloadPattern};

use std::path::PathBuf;
use thiserror::Error;
use vigil_automaton::AutomatonError;

/// Errors that can occur while building a classifier
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Invalid classifier configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Built-in automaton error: {0}")]
    Automaton(#[from] AutomatonError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for classifier construction
pub type ClassifierResult<T> = Result<T, ClassifierError>;
