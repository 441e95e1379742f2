// Vigil Automaton - Deterministic Finite Automaton model and simulator
//!
// This crate provides an immutable DFA model with a flat transition table
// and a deterministic simulator that reports a verdict and step trace.
// Definitions can be loaded from JSON or YAML and compiled into the model.

mod definition;
mod model;
mod simulator;

pub use definition::{AutomatonDefinition, TransitionDef};
pub use model::{Automaton, AutomatonBuilder, StateId};
pub use simulator::{accepts, run, ExecutionResult, Halt, Simulator, SimulatorConfig, TraceStep, Verdict};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or loading an automaton
#[derive(Debug, Error)]
pub enum AutomatonError {
    #[error("Invalid automaton: {reason}")]
    InvalidAutomaton { reason: String },

    #[error("Automaton state limit exceeded: {states} states (max: {max})")]
    StateLimitExceeded { states: usize, max: usize },

    #[error("Automaton alphabet limit exceeded: {symbols} symbols (max: {max})")]
    AlphabetLimitExceeded { symbols: usize, max: usize },

    #[error("IO error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported definition format: {0}")]
    UnsupportedFormat(PathBuf),
}

impl AutomatonError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        AutomatonError::InvalidAutomaton {
            reason: reason.into(),
        }
    }
}

/// Result type for automaton operations
pub type AutomatonResult<T> = Result<T, AutomatonError>;

/// Construction limits for automata
#[derive(Debug, Clone)]
pub struct AutomatonConfig {
    /// Maximum number of states (0 = unlimited)
    pub max_states: usize,

    /// Maximum number of alphabet symbols (0 = unlimited)
    pub max_alphabet: usize,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            max_states: 10_000,
            max_alphabet: 1024,
        }
    }
}

impl AutomatonConfig {
    /// No limits at all
    pub fn unlimited() -> Self {
        Self {
            max_states: 0,
            max_alphabet: 0,
        }
    }
}
