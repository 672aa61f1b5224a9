//! End-to-end scoring scenarios through the pure analysis layers.
//!
//! Each scenario builds component outputs the way the pipeline would (no
//! network) and asserts the verdict the scoring engine produces.

use std::collections::{BTreeSet, HashMap};

use url::Url;

use url_verdict::content::{inspect_html, DomCounts, PageContent};
use url_verdict::forms::analyze_forms_html;
use url_verdict::intel::IntelSignal;
use url_verdict::netaudit::{analyze_security_headers, SecurityHeaders, TlsAudit};
use url_verdict::redirects::{analyze_chain, RedirectAnalysis, RedirectHop, RedirectKind};
use url_verdict::{
    score_risk, AnalysisBundle, ComponentOutcome, FlagCode, ScanConfig, Severity, WeightTable,
};

fn hop(url: &str, status: u16, kind: RedirectKind) -> RedirectHop {
    RedirectHop {
        url: url.to_string(),
        status_code: status,
        response_headers: HashMap::new(),
        kind,
    }
}

fn clean_page() -> PageContent {
    PageContent {
        html: String::new(),
        dom_counts: DomCounts::default(),
        impersonated_brands: Vec::new(),
        flags: BTreeSet::new(),
        risk_score: 0,
    }
}

fn clean_redirects(url: &str) -> RedirectAnalysis {
    analyze_chain(
        &[hop(url, 200, RedirectKind::None)],
        url,
        false,
        &WeightTable::default(),
    )
}

fn bundle(url: &str) -> AnalysisBundle {
    AnalysisBundle {
        url: url.to_string(),
        final_url: url.to_string(),
        redirects: ComponentOutcome::Complete(clean_redirects(url)),
        content: ComponentOutcome::Complete(clean_page()),
        forms: ComponentOutcome::Complete(Vec::new()),
        tls: ComponentOutcome::Complete(TlsAudit::default()),
        intel: Vec::new(),
    }
}

// Scenario A: an HTTPS entry point redirecting to plain HTTP.
#[test]
fn https_downgrade_scores_at_least_medium() {
    let chain = vec![
        hop("https://promo.example/click", 302, RedirectKind::Http),
        hop("http://landing.example/offer", 200, RedirectKind::None),
    ];
    let analysis = analyze_chain(
        &chain,
        "http://landing.example/offer",
        false,
        &WeightTable::default(),
    );
    assert!(analysis.flags.contains(&FlagCode::HttpsDowngrade));
    assert!(analysis.risk_score >= 40);

    let mut b = bundle("https://promo.example/click");
    b.final_url = "http://landing.example/offer".to_string();
    b.redirects = ComponentOutcome::Complete(analysis);
    let verdict = score_risk(&b, &WeightTable::default());
    assert!(verdict.overall_risk_score >= 40);
    assert!(verdict.severity >= Severity::Medium);
    assert!(verdict.explanation.contains("https_downgrade"));
}

// Scenario B: page body names a brand the resolved domain does not carry.
#[test]
fn brand_impersonation_scores_at_least_thirty() {
    let config = ScanConfig::default();
    let html = r#"
        <html><body>
        <h1>PayPal account verification</h1>
        <p>Your PayPal access has been limited.</p>
        </body></html>
    "#;
    // A lookalike host embedding the brand name still counts as impersonation
    let page_url = Url::parse("https://totally-not-paypal.example/").unwrap();
    let content = inspect_html(html.to_string(), &page_url, &config);
    assert!(content.flags.contains(&FlagCode::BrandImpersonation));
    assert_eq!(content.impersonated_brands, vec!["paypal".to_string()]);

    let mut b = bundle("https://totally-not-paypal.example/");
    b.content = ComponentOutcome::Complete(content);
    let verdict = score_risk(&b, &config.weights);
    assert!(verdict.overall_risk_score >= 30);
}

// Scenario C: a form collecting a wallet seed phrase.
#[test]
fn seed_phrase_form_scores_at_least_fifty() {
    let html = r#"
        <form action="https://wallet-restore.example/submit" method="post">
            <input name="seed_phrase" type="text">
            <input name="wallet_password" type="password">
        </form>
    "#;
    let page_url = Url::parse("https://wallet-helper.example/restore").unwrap();
    let forms = analyze_forms_html(html, &page_url, &WeightTable::default());
    assert_eq!(forms.len(), 1);
    assert!(forms[0].flags.contains(&FlagCode::SeedPhraseField));
    assert!(forms[0].flags.contains(&FlagCode::CrossDomainFormAction));
    assert!(forms[0].risk_score >= 50);

    let mut b = bundle("https://wallet-helper.example/restore");
    b.forms = ComponentOutcome::Complete(forms);
    let verdict = score_risk(&b, &WeightTable::default());
    assert!(verdict.overall_risk_score >= 50);
    assert!(verdict.severity >= Severity::Medium);
}

// Scenario D: security header posture, HTTPS and plain HTTP variants.
#[test]
fn header_posture_flags_score_as_specified() {
    let weights = WeightTable::default();

    let https_flags = analyze_security_headers(&SecurityHeaders::default(), true);
    assert!(https_flags.contains(&FlagCode::MissingHsts));
    assert!(weights.weight(FlagCode::MissingHsts) >= 20);

    let http_flags = analyze_security_headers(&SecurityHeaders::default(), false);
    assert!(http_flags.contains(&FlagCode::NoTlsEncryption));
    assert_eq!(weights.weight(FlagCode::NoTlsEncryption), 50);

    let mut b = bundle("http://plain.example/");
    b.tls = ComponentOutcome::Complete(TlsAudit {
        flags: http_flags.clone(),
        risk_score: weights.saturating_total(http_flags.iter()),
        ..Default::default()
    });
    let verdict = score_risk(&b, &weights);
    assert!(verdict.overall_risk_score >= 50);
}

// Scenario E: nothing suspicious anywhere.
#[test]
fn all_clear_scan_is_low_severity() {
    let mut b = bundle("https://docs.example/");
    b.intel = vec![IntelSignal {
        source: "feed_a".to_string(),
        flags: Vec::new(),
        risk_score: 0,
        conclusive: true,
        details: None,
    }];
    let verdict = score_risk(&b, &WeightTable::default());
    assert_eq!(verdict.overall_risk_score, 0);
    assert_eq!(verdict.severity, Severity::Low);
    assert!(verdict.explanation.contains("no risk signals detected"));
}

// Scenario F: one authoritative feed report with everything else clean.
#[test]
fn single_strong_intel_signal_is_at_least_high() {
    let mut b = bundle("https://flagged.example/");
    b.intel = vec![IntelSignal {
        source: "urlhaus".to_string(),
        flags: vec!["known_phishing_host".to_string()],
        risk_score: 95,
        conclusive: true,
        details: None,
    }];
    let verdict = score_risk(&b, &WeightTable::default());
    assert!(verdict.overall_risk_score >= 85);
    assert!(verdict.severity >= Severity::High);
    assert!(verdict.explanation.contains("known_phishing_host"));
}

// Inconclusive components are named in the explanation, not scored as zero.
#[test]
fn degraded_components_are_reported_not_scored() {
    let mut b = bundle("https://half-reachable.example/");
    b.tls = ComponentOutcome::Inconclusive {
        reason: "timed out".to_string(),
    };
    b.intel = vec![IntelSignal::no_signal("offline_feed")];
    let verdict = score_risk(&b, &WeightTable::default());
    assert_eq!(verdict.overall_risk_score, 0);
    assert!(verdict.explanation.contains("network_audit"));
    assert!(verdict.explanation.contains("threat_intel(offline_feed)"));
}
