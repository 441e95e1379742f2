//! URL classification scenarios
//!
//! Runs the default classifier over benign and hostile URLs and checks the
//! aggregated result.

use std::sync::Arc;
use std::thread;
use vigil_url::{
    tokenize, AnomalyKind, ClassifierConfig, RiskLevel, UrlClassifier, UrlField,
};

fn classifier() -> UrlClassifier {
    UrlClassifier::new(ClassifierConfig::default()).unwrap()
}

#[test]
fn test_benign_urls_are_safe() {
    let c = classifier();
    for url in [
        "https://example.com/a?b=1",
        "https://www.example.org/",
        "http://example.com:8080/docs/index.html#intro",
        "https://example.com/caf%C3%A9",
        "ftp://files.example.com/pub/readme.txt",
        "https://www.paypal.com/signin",
    ] {
        let result = c.validate(url);
        assert!(result.well_formed, "{}: {:?}", url, result.rejection_reason);
        assert_eq!(result.risk_level, RiskLevel::Safe, "{}: {:?}", url, result.flags);
        assert!(result.flags.is_empty(), "{}", url);
    }
}

#[test]
fn test_credentials_encoded_host_and_raw_control() {
    let result = classifier().validate("http://user:pass@ex%61mple.com/\x01");
    assert!(result.has_flag(AnomalyKind::EncodedControlChar));
    assert!(result.has_flag(AnomalyKind::ObfuscatedHost));
    assert_eq!(result.risk_level, RiskLevel::Malicious);
    assert!(!result.well_formed);

    let control = result
        .flags_of(AnomalyKind::EncodedControlChar)
        .next()
        .unwrap();
    assert_eq!(control.field, UrlField::Path);
    assert!(control.is_structural());
}

#[test]
fn test_credentials_encoded_host_and_escaped_control() {
    let result = classifier().validate(r"http://user:pass@ex%61mple.com/\x01");
    assert!(result.has_flag(AnomalyKind::EncodedControlChar));
    assert_eq!(result.risk_level, RiskLevel::Malicious);
    assert!(!result.well_formed);
}

#[test]
fn test_script_scheme() {
    let result = classifier().validate("javascript:alert(1)");
    assert!(result.has_flag(AnomalyKind::SchemeMismatch));
    assert!(result.risk_level >= RiskLevel::Suspicious);
    assert!(!result.well_formed);

    let scheme = result.primary_flag(UrlField::Scheme).unwrap();
    assert_eq!(scheme.kind, AnomalyKind::SchemeMismatch);
    assert_eq!(scheme.severity, RiskLevel::Malicious);
}

#[test]
fn test_phishing_urls() {
    let c = classifier();

    let result = c.validate("https://paypal.com@evil.example/login");
    assert!(result.has_flag(AnomalyKind::HostMismatch));
    assert_eq!(result.risk_level, RiskLevel::Suspicious);
    assert!(result.well_formed);

    let result = c.validate("https://paypal.com.account-verify.example/");
    assert!(result.has_flag(AnomalyKind::BrandImpersonation));

    let result = c.validate("https://g00gle.com/");
    assert!(result.has_flag(AnomalyKind::Homoglyph));

    let result = c.validate("http://3232235521/admin");
    assert!(result.has_flag(AnomalyKind::ObfuscatedHost));
}

#[test]
fn test_injection_urls() {
    let c = classifier();

    let result = c.validate("https://example.com/search?q=%3Cscript%3Edocument.cookie%3C/script%3E");
    assert!(result.has_flag(AnomalyKind::CrossSiteScripting));
    assert_eq!(result.risk_level, RiskLevel::Malicious);

    let result = c.validate("https://example.com/item?id=1%27%20UNION%20SELECT%20*%20FROM%20users");
    assert!(result.has_flag(AnomalyKind::SqlInjection));

    let result = c.validate("https://example.com/static/..%2f..%2fetc/passwd");
    assert!(result.has_flag(AnomalyKind::PathTraversal));

    let result = c.validate("https://example.com/login?redirect=https://evil.example/");
    assert!(result.has_flag(AnomalyKind::OpenRedirect));
    assert_eq!(result.risk_level, RiskLevel::Suspicious);
}

#[test]
fn test_escaped_redirect_target_rates_like_plain_one() {
    let c = classifier();

    let escaped = c.validate(
        "https://accounts.example.com/login?continue=https%3A%2F%2Fmail.example.com%2F",
    );
    assert!(escaped.well_formed, "{:?}", escaped.rejection_reason);
    assert!(!escaped.has_flag(AnomalyKind::EncodedControlChar));
    assert!(escaped.has_flag(AnomalyKind::OpenRedirect));
    assert_eq!(escaped.risk_level, RiskLevel::Suspicious);

    let plain = c.validate("https://accounts.example.com/login?continue=https://mail.example.com/");
    assert_eq!(plain.risk_level, escaped.risk_level);

    // Decoding this path turns it into an authority
    let result = c.validate("http:%2F%2Fevil.example/");
    assert!(result.has_flag(AnomalyKind::EncodedControlChar));
    assert_eq!(result.risk_level, RiskLevel::Malicious);
}

#[test]
fn test_structural_failures() {
    let c = classifier();

    let result = c.validate("");
    assert!(!result.well_formed);
    assert_eq!(result.rejection_reason.as_deref(), Some("URL is empty"));

    let result = c.validate("https://example.com:99999/");
    assert!(result.has_flag(AnomalyKind::InvalidPort));

    let result = c.validate("https://example.com/%zz");
    assert!(result.has_flag(AnomalyKind::MalformedEncoding));
    assert!(result.well_formed);

    let result = c.validate("https://example.com/a b");
    assert!(result.has_flag(AnomalyKind::InvalidCharacter));
}

#[test]
fn test_payload_detection_can_be_disabled() {
    let config = ClassifierConfig {
        detect_payloads: false,
        ..Default::default()
    };
    let c = UrlClassifier::new(config).unwrap();
    let result = c.validate("https://example.com/files/../../etc/passwd");
    assert!(!result.has_flag(AnomalyKind::PathTraversal));
    assert_eq!(result.risk_level, RiskLevel::Safe);
}

#[test]
fn test_risk_is_maximum_severity() {
    let c = classifier();
    for url in [
        "https://user@paypa1.com/a%zz?q=<script>",
        "gopher://example.com/",
        "http://exa mple.com/",
        "https://example.com/?next=//evil.example",
    ] {
        let result = c.validate(url);
        let max = result
            .flags
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or_default();
        assert_eq!(result.risk_level, max, "{}", url);
    }
}

#[test]
fn test_tokenize_is_deterministic() {
    for url in [
        "https://user:pw@example.com:8443/p/a?q=1#f",
        "javascript:alert(1)",
        "http://[::1]/",
        "not a url",
        "",
    ] {
        assert_eq!(tokenize(url), tokenize(url));
    }
}

#[test]
fn test_classification_is_deterministic() {
    let c = classifier();
    let url = "https://user@paypa1.com/../x?next=https://evil.example";
    assert_eq!(c.validate(url), c.validate(url));
}

#[test]
fn test_classifier_shared_across_threads() {
    let c = Arc::new(classifier());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = Arc::clone(&c);
            thread::spawn(move || c.validate("javascript:alert(1)").risk_level)
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), RiskLevel::Malicious);
    }
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classifier.yaml");
    std::fs::write(&path, "allowed_schemes: [https]\nmax_host_labels: 3\n").unwrap();

    let config = ClassifierConfig::load(&path).unwrap();
    let c = UrlClassifier::new(config).unwrap();

    let result = c.validate("http://example.com/");
    assert!(result.has_flag(AnomalyKind::SchemeMismatch));

    let result = c.validate("https://a.b.example.com/");
    assert!(result.has_flag(AnomalyKind::ExcessiveSubdomains));
}
