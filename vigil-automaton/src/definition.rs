// Automaton Definition
//
// Serializable description of a DFA as supplied by a caller: state list,
// alphabet, (from, symbol, to) triples, start state and accepting states.
// Compiling a definition goes through AutomatonBuilder, so every structural
// rule is enforced in one place.

use crate::model::{Automaton, AutomatonBuilder};
use crate::{AutomatonConfig, AutomatonError, AutomatonResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A single transition triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: String,
    pub symbol: char,
    pub to: String,
}

impl TransitionDef {
    pub fn new(from: impl Into<String>, symbol: char, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            symbol,
            to: to.into(),
        }
    }
}

/// Structured automaton description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonDefinition {
    pub states: Vec<String>,

    pub alphabet: Vec<char>,

    #[serde(default)]
    pub transitions: Vec<TransitionDef>,

    pub start_state: String,

    #[serde(default)]
    pub accept_states: Vec<String>,
}

impl AutomatonDefinition {
    /// Compile with default limits
    pub fn build(&self) -> AutomatonResult<Automaton> {
        self.build_with_config(AutomatonConfig::default())
    }

    /// Compile with custom limits
    pub fn build_with_config(&self, config: AutomatonConfig) -> AutomatonResult<Automaton> {
        let mut builder = AutomatonBuilder::with_config(config)
            .states(self.states.iter().cloned())
            .symbols(self.alphabet.iter().copied())
            .start(self.start_state.clone())
            .accepting_states(self.accept_states.iter().cloned());

        for t in &self.transitions {
            builder = builder.transition(t.from.clone(), t.symbol, t.to.clone());
        }

        builder.build()
    }

    pub fn from_json_str(content: &str) -> AutomatonResult<Self> {
        serde_json::from_str(content).map_err(|e| AutomatonError::Parse(e.to_string()))
    }

    pub fn from_yaml_str(content: &str) -> AutomatonResult<Self> {
        serde_yaml::from_str(content).map_err(|e| AutomatonError::Parse(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> AutomatonResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AutomatonError::Parse(e.to_string()))
    }

    /// Load a definition file (`.json`, `.yaml` or `.yml`)
    pub fn load(path: &Path) -> AutomatonResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AutomatonError::Io(path.to_path_buf(), e))?;

        let definition = match extension_of(path)? {
            Format::Json => Self::from_json_str(&content)?,
            Format::Yaml => Self::from_yaml_str(&content)?,
        };

        debug!(
            path = %path.display(),
            states = definition.states.len(),
            transitions = definition.transitions.len(),
            "Loaded automaton definition"
        );

        Ok(definition)
    }

    /// Write a definition file, format chosen by extension
    pub fn save(&self, path: &Path) -> AutomatonResult<()> {
        let content = match extension_of(path)? {
            Format::Json => self.to_json_pretty()?,
            Format::Yaml => {
                serde_yaml::to_string(self).map_err(|e| AutomatonError::Parse(e.to_string()))?
            }
        };

        std::fs::write(path, content).map_err(|e| AutomatonError::Io(path.to_path_buf(), e))
    }
}

enum Format {
    Json,
    Yaml,
}

fn extension_of(path: &Path) -> AutomatonResult<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        _ => Err(AutomatonError::UnsupportedFormat(path.to_path_buf())),
    }
}
