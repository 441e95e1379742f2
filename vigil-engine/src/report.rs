// Result reporting
//
// Serializable response shapes for simulation and validation calls. These
// only rename and flatten; no decision is made here.

use serde::{Deserialize, Serialize};
use vigil_automaton::{Automaton, ExecutionResult, Halt, Verdict};
use vigil_url::{AnomalyFlag, RiskLevel, UrlComponents, ValidationResult};

/// One consumed symbol, with state names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub from: String,
    pub symbol: char,
    pub to: String,
}

/// Outcome of running a DFA over one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub input: String,
    pub verdict: Verdict,
    pub accepted: bool,
    pub trace: Vec<StepReport>,
    pub final_state: String,
    pub consumed: usize,
    pub halted_on: Option<Halt>,
    pub state_path: Vec<String>,
}

impl SimulationReport {
    pub fn new(automaton: &Automaton, input: &str, result: &ExecutionResult) -> Self {
        let name = |id| automaton.state_name(id).unwrap_or_default().to_string();

        Self {
            input: input.to_string(),
            verdict: result.verdict,
            accepted: result.is_accepted(),
            trace: result
                .trace
                .iter()
                .map(|step| StepReport {
                    from: name(step.from),
                    symbol: step.symbol,
                    to: name(step.to),
                })
                .collect(),
            final_state: name(result.final_state),
            consumed: result.consumed,
            halted_on: result.halted_on,
            state_path: result
                .state_path(automaton)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Static facts about a compiled automaton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatonSummary {
    pub states: usize,
    pub alphabet: Vec<char>,
    pub transitions: usize,
    pub start_state: String,
    pub accept_states: Vec<String>,
    pub total: bool,
    pub unreachable_states: Vec<String>,
}

impl AutomatonSummary {
    pub fn new(automaton: &Automaton) -> Self {
        let reachable = automaton.reachable_states();
        let names: Vec<&str> = automaton.states().collect();

        Self {
            states: automaton.state_count(),
            alphabet: automaton.alphabet().to_vec(),
            transitions: automaton.transition_count(),
            start_state: names
                .get(automaton.start_state())
                .copied()
                .unwrap_or_default()
                .to_string(),
            accept_states: automaton
                .accepting_states()
                .filter_map(|id| names.get(id).map(|n| n.to_string()))
                .collect(),
            total: automaton.is_total(),
            unreachable_states: names
                .iter()
                .zip(&reachable)
                .filter(|(_, seen)| !**seen)
                .map(|(n, _)| n.to_string())
                .collect(),
        }
    }
}

/// Raw text of each present URL field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentsReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl From<&UrlComponents<'_>> for ComponentsReport {
    fn from(url: &UrlComponents<'_>) -> Self {
        let raw = |c: Option<&vigil_url::Component<'_>>| c.map(|c| c.raw().to_string());
        Self {
            scheme: raw(url.scheme()),
            user_info: raw(url.userinfo()),
            host: raw(url.host()),
            port: raw(url.port()),
            path: raw(url.path()),
            query: raw(url.query()),
            fragment: raw(url.fragment()),
        }
    }
}

/// Outcome of validating one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub url: String,
    pub well_formed: bool,
    pub risk_level: RiskLevel,
    pub flags: Vec<AnomalyFlag>,
    pub components: ComponentsReport,
    pub structure: Vec<String>,
    pub rejection_reason: Option<String>,
}

impl ValidationReport {
    pub fn new(url: &UrlComponents<'_>, result: ValidationResult) -> Self {
        Self {
            url: url.raw().to_string(),
            well_formed: result.well_formed,
            risk_level: result.risk_level,
            flags: result.flags,
            components: ComponentsReport::from(url),
            structure: result.structure,
            rejection_reason: result.rejection_reason,
        }
    }
}
