//! End-to-end engine scenarios
//!
//! Definitions from files and strings through to serialized reports.

use vigil_automaton::{AutomatonDefinition, Verdict};
use vigil_engine::{simulate_dfa, validate_url, CompiledDfa, EngineError, UrlValidator};
use vigil_url::{AnomalyKind, RiskLevel};

const ENDS_IN_ONE: &str = r#"{
    "states": ["q0", "q1"],
    "alphabet": ["0", "1"],
    "transitions": [
        {"from": "q0", "symbol": "0", "to": "q0"},
        {"from": "q0", "symbol": "1", "to": "q1"},
        {"from": "q1", "symbol": "0", "to": "q0"},
        {"from": "q1", "symbol": "1", "to": "q1"}
    ],
    "start_state": "q0",
    "accept_states": ["q1"]
}"#;

fn ends_in_one() -> AutomatonDefinition {
    AutomatonDefinition::from_json_str(ENDS_IN_ONE).unwrap()
}

#[test]
fn test_binary_suffix_verdicts() {
    let def = ends_in_one();
    assert_eq!(simulate_dfa(&def, "101").unwrap().verdict, Verdict::Accepted);
    assert_eq!(
        simulate_dfa(&def, "100").unwrap().verdict,
        Verdict::RejectedFinalState
    );

    let report = simulate_dfa(&def, "102").unwrap();
    assert_eq!(report.verdict, Verdict::RejectedInvalidSymbol);
    assert_eq!(report.trace.len(), 2);
    assert_eq!(report.halted_on.map(|h| h.symbol), Some('2'));
}

#[test]
fn test_empty_input() {
    let report = simulate_dfa(&ends_in_one(), "").unwrap();
    assert_eq!(report.verdict, Verdict::RejectedFinalState);
    assert!(report.trace.is_empty());
    assert_eq!(report.final_state, "q0");
    assert_eq!(report.state_path, vec!["q0"]);
}

#[test]
fn test_partial_table_halts_early() {
    let yaml = "states: [s, a, b]\nalphabet: [x, y]\ntransitions:\n  - {from: s, symbol: x, to: a}\n  - {from: a, symbol: x, to: b}\nstart_state: s\naccept_states: [b]\n";
    let def = AutomatonDefinition::from_yaml_str(yaml).unwrap();

    let report = simulate_dfa(&def, "xyxx").unwrap();
    assert_eq!(report.verdict, Verdict::RejectedNoTransition);
    assert_eq!(report.trace.len(), 1);
    assert!(report.trace.len() < 4);
    assert_eq!(report.consumed, 1);
}

#[test]
fn test_simulation_is_deterministic() {
    let def = ends_in_one();
    let first = simulate_dfa(&def, "0110101").unwrap();
    for _ in 0..10 {
        assert_eq!(simulate_dfa(&def, "0110101").unwrap(), first);
    }
}

#[test]
fn test_malformed_definition_fails() {
    let json = ENDS_IN_ONE.replace(r#""to": "q1"}"#, r#""to": "q9"}"#);
    let def = AutomatonDefinition::from_json_str(&json).unwrap();
    let err = simulate_dfa(&def, "1").unwrap_err();
    assert!(matches!(err, EngineError::Automaton(_)));
    assert!(err.to_string().contains("q9"));
}

#[test]
fn test_compiled_dfa_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ends_in_one.json");
    std::fs::write(&path, ENDS_IN_ONE).unwrap();

    let dfa = CompiledDfa::load(&path).unwrap();
    let summary = dfa.summary();
    assert_eq!(summary.states, 2);
    assert!(summary.total);
    assert!(summary.unreachable_states.is_empty());

    assert!(dfa.run("0001").accepted);
    assert!(!dfa.run("0010").accepted);
}

#[test]
fn test_simulation_report_serializes_camel_case() {
    let report = simulate_dfa(&ends_in_one(), "11").unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"finalState\":\"q1\""));
    assert!(json.contains("\"statePath\""));
    assert!(json.contains("\"haltedOn\":null"));
}

#[test]
fn test_validate_url_properties() {
    let report = validate_url("https://example.com/a?b=1");
    assert!(report.well_formed);
    assert_eq!(report.risk_level, RiskLevel::Safe);
    assert!(report.flags.is_empty());

    let report = validate_url("http://user:pass@ex%61mple.com/\x01");
    assert!(!report.well_formed || report.risk_level == RiskLevel::Malicious);
    assert!(report
        .flags
        .iter()
        .any(|f| f.kind == AnomalyKind::EncodedControlChar));

    let report = validate_url("javascript:alert(1)");
    assert!(report.flags.iter().any(|f| f.kind == AnomalyKind::SchemeMismatch));
    assert!(report.risk_level >= RiskLevel::Suspicious);
}

#[test]
fn test_url_validator_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vigil.json");
    std::fs::write(&path, r#"{"allowed_schemes": ["https"], "detect_payloads": false}"#).unwrap();

    let validator = UrlValidator::load(&path).unwrap();
    let report = validator.validate("http://example.com/../x");
    assert!(report.flags.iter().any(|f| f.kind == AnomalyKind::SchemeMismatch));
    assert!(!report.flags.iter().any(|f| f.kind == AnomalyKind::PathTraversal));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["riskLevel"], "Suspicious");
    assert_eq!(json["components"]["scheme"], "http");
}
