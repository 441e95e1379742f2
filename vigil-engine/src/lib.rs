//! Vigil Engine
//!
//! Entry points that tie the automaton simulator and the URL classifier to
//! serializable reports. Nothing here keeps state between calls: callers
//! hold a `CompiledDfa` or `UrlValidator` when they want to reuse one.

pub mod report;

pub use report::{
    AutomatonSummary, ComponentsReport, SimulationReport, StepReport, ValidationReport,
};

use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};
use vigil_automaton::{
    Automaton, AutomatonConfig, AutomatonDefinition, AutomatonError, Simulator, SimulatorConfig,
};
use vigil_url::{tokenize, ClassifierConfig, ClassifierError, RiskLevel, UrlClassifier};

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Automaton error: {0}")]
    Automaton(#[from] AutomatonError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

/// A definition compiled once and run over many inputs
#[derive(Debug, Clone)]
pub struct CompiledDfa {
    automaton: Automaton,
    simulator: Simulator,
}

impl CompiledDfa {
    pub fn new(definition: &AutomatonDefinition) -> Result<Self, EngineError> {
        Self::with_config(definition, AutomatonConfig::default(), SimulatorConfig::default())
    }

    pub fn with_config(
        definition: &AutomatonDefinition,
        limits: AutomatonConfig,
        simulator: SimulatorConfig,
    ) -> Result<Self, EngineError> {
        let automaton = definition.build_with_config(limits)?;
        Ok(Self {
            automaton,
            simulator: Simulator::new(simulator),
        })
    }

    /// Load a `.json`, `.yaml` or `.yml` definition and compile it
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let definition = AutomatonDefinition::load(path)?;
        Self::new(&definition)
    }

    /// Same automaton, different trace recording
    pub fn with_simulator(mut self, config: SimulatorConfig) -> Self {
        self.simulator = Simulator::new(config);
        self
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn run(&self, input: &str) -> SimulationReport {
        let result = self.simulator.run(&self.automaton, input);
        debug!(
            input_len = input.chars().count(),
            verdict = %result.verdict,
            consumed = result.consumed,
            "DFA simulated"
        );
        SimulationReport::new(&self.automaton, input, &result)
    }

    pub fn summary(&self) -> AutomatonSummary {
        AutomatonSummary::new(&self.automaton)
    }
}

/// Build `definition` and run it over `input`
pub fn simulate_dfa(
    definition: &AutomatonDefinition,
    input: &str,
) -> Result<SimulationReport, EngineError> {
    Ok(CompiledDfa::new(definition)?.run(input))
}

/// Long-lived URL validator
#[derive(Debug)]
pub struct UrlValidator {
    classifier: UrlClassifier,
}

impl UrlValidator {
    pub fn new(config: ClassifierConfig) -> Result<Self, EngineError> {
        Ok(Self {
            classifier: UrlClassifier::new(config)?,
        })
    }

    /// Load a classifier configuration file and build a validator from it
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        Self::new(ClassifierConfig::load(path)?)
    }

    pub fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }

    pub fn validate(&self, raw: &str) -> ValidationReport {
        let url = tokenize(raw);
        let result = self.classifier.classify(&url);
        ValidationReport::new(&url, result)
    }
}

/// Validate `raw` with the default classifier configuration
///
/// Builds a fresh validator per call. If the built-in classifier cannot be
/// constructed, the URL is reported as not well-formed and Malicious.
pub fn validate_url(raw: &str) -> ValidationReport {
    match UrlValidator::new(ClassifierConfig::default()) {
        Ok(validator) => validator.validate(raw),
        Err(e) => {
            error!(error = %e, "Default URL classifier failed to build");
            let url = tokenize(raw);
            ValidationReport {
                url: raw.to_string(),
                well_formed: false,
                risk_level: RiskLevel::Malicious,
                flags: Vec::new(),
                components: ComponentsReport::from(&url),
                structure: Vec::new(),
                rejection_reason: Some(format!("classifier unavailable: {}", e)),
            }
        }
    }
}
