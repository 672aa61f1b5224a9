//! Form risk analysis.
//!
//! Parses `<form>` elements from the final page and flags cross-domain
//! submission targets and sensitive-field collection. The page is fetched
//! independently of the content inspector so the two components stay
//! decoupled.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

use crate::config::ScanConfig;
use crate::error_handling::ScanError;
use crate::flags::{FlagCode, WeightTable};
use crate::utils::fetch_body_limited;

/// One classified input field.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Derived from name/type pattern matches (password, seed phrase,
    /// card number)
    pub suspicious: bool,
}

/// Risk assessment for one `<form>` element.
#[derive(Debug, Clone, Serialize)]
pub struct FormRisk {
    pub form_index: usize,
    /// Resolved action URL (the page URL when the action is empty)
    pub action: String,
    pub method: String,
    pub fields: Vec<FormField>,
    pub flags: BTreeSet<FlagCode>,
    pub risk_score: u8,
}

fn seed_phrase_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)seed|recovery|mnemonic|passphrase").expect("seed phrase regex is valid")
    })
}

fn card_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)card[\s_-]?(number|num)|\bccnum\b|\bcc[\s_-]?number\b|\bcvv\b|\bcvc\b")
            .expect("card number regex is valid")
    })
}

/// Fetches the final URL and analyzes every form found in its HTML.
///
/// # Errors
///
/// Returns `ScanError::FetchFailed` on network failure; the pipeline
/// degrades this to an inconclusive component.
pub async fn analyze_forms(
    final_url: &str,
    client: &reqwest::Client,
    config: &ScanConfig,
) -> Result<Vec<FormRisk>, ScanError> {
    let page_url = Url::parse(final_url)
        .map_err(|e| ScanError::ParseFailed(format!("final URL {final_url}: {e}")))?;
    let html = fetch_body_limited(final_url, client).await?;
    Ok(analyze_forms_html(&html, &page_url, &config.weights))
}

/// Analyzes every `<form>` in an HTML document. Pure.
pub fn analyze_forms_html(html: &str, page_url: &Url, weights: &WeightTable) -> Vec<FormRisk> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").expect("form selector is valid");
    let input_selector = Selector::parse("input").expect("input selector is valid");

    let page_host = page_url.host_str().unwrap_or_default().to_lowercase();
    let mut forms = Vec::new();

    for (form_index, form) in document.select(&form_selector).enumerate() {
        let raw_action = form.value().attr("action").unwrap_or_default();
        let method = form
            .value()
            .attr("method")
            .unwrap_or("get")
            .to_lowercase();

        let action = match page_url.join(raw_action) {
            Ok(resolved) => resolved.to_string(),
            Err(e) => {
                debug!("Unresolvable form action '{raw_action}': {e}");
                raw_action.to_string()
            }
        };

        let mut flags: BTreeSet<FlagCode> = BTreeSet::new();

        let action_host = Url::parse(&action)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()));
        if let Some(action_host) = action_host {
            if !page_host.is_empty() && action_host != page_host {
                flags.insert(FlagCode::CrossDomainFormAction);
            }
        }

        let mut fields = Vec::new();
        for input in form.select(&input_selector) {
            let name = input.value().attr("name").unwrap_or_default().to_string();
            let field_type = input
                .value()
                .attr("type")
                .unwrap_or("text")
                .to_lowercase();

            let is_password =
                field_type == "password" || name.to_lowercase().contains("password");
            let is_seed = seed_phrase_regex().is_match(&name);
            let is_card = card_number_regex().is_match(&name);

            if is_password {
                flags.insert(FlagCode::PasswordField);
            }
            if is_seed {
                flags.insert(FlagCode::SeedPhraseField);
            }
            if is_card {
                flags.insert(FlagCode::CardNumberField);
            }

            fields.push(FormField {
                name,
                field_type,
                suspicious: is_password || is_seed || is_card,
            });
        }

        let risk_score = weights.saturating_total(flags.iter());

        forms.push(FormRisk {
            form_index,
            action,
            method,
            fields,
            flags,
            risk_score,
        });
    }

    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(html: &str, url: &str) -> Vec<FormRisk> {
        analyze_forms_html(html, &Url::parse(url).unwrap(), &WeightTable::default())
    }

    #[test]
    fn test_no_forms() {
        let forms = analyze("<html><body>no forms here</body></html>", "https://a.example/");
        assert!(forms.is_empty());
    }

    #[test]
    fn test_cross_domain_action_flagged() {
        let html = r#"<form action="https://collector.example/steal" method="post">
            <input name="user" type="text"></form>"#;
        let forms = analyze(html, "https://victim.example/login");
        assert_eq!(forms.len(), 1);
        assert!(forms[0].flags.contains(&FlagCode::CrossDomainFormAction));
        assert!(forms[0].risk_score >= 40);
        assert_eq!(forms[0].method, "post");
    }

    #[test]
    fn test_same_host_action_not_flagged() {
        let html = r#"<form action="/login"><input name="user"></form>"#;
        let forms = analyze(html, "https://a.example/page");
        assert!(!forms[0].flags.contains(&FlagCode::CrossDomainFormAction));
        assert_eq!(forms[0].action, "https://a.example/login");
    }

    #[test]
    fn test_password_field_flagged() {
        let html = r#"<form><input name="pw" type="password"></form>"#;
        let forms = analyze(html, "https://a.example/");
        assert!(forms[0].flags.contains(&FlagCode::PasswordField));
        assert!(forms[0].fields[0].suspicious);
        assert!(forms[0].risk_score >= 15);
    }

    #[test]
    fn test_seed_phrase_field_flagged() {
        let html = r#"<form><input name="seed phrase" type="text"></form>"#;
        let forms = analyze(html, "https://a.example/");
        assert!(forms[0].flags.contains(&FlagCode::SeedPhraseField));
        let field = &forms[0].fields[0];
        assert!(field.suspicious);
        assert!(forms[0].risk_score >= 50);
    }

    #[test]
    fn test_recovery_and_mnemonic_names_flagged() {
        for name in ["recovery_key", "walletMnemonic", "my-passphrase"] {
            let html = format!(r#"<form><input name="{name}"></form>"#);
            let forms = analyze(&html, "https://a.example/");
            assert!(
                forms[0].flags.contains(&FlagCode::SeedPhraseField),
                "{name} should match the seed phrase pattern"
            );
        }
    }

    #[test]
    fn test_card_fields_flagged() {
        for name in ["card_number", "cardnum", "cvv", "cvc"] {
            let html = format!(r#"<form><input name="{name}"></form>"#);
            let forms = analyze(&html, "https://a.example/");
            assert!(
                forms[0].flags.contains(&FlagCode::CardNumberField),
                "{name} should match the card pattern"
            );
        }
    }

    #[test]
    fn test_benign_fields_not_suspicious() {
        let html = r#"<form><input name="search" type="text"><input name="q"></form>"#;
        let forms = analyze(html, "https://a.example/");
        assert!(forms[0].fields.iter().all(|f| !f.suspicious));
        assert_eq!(forms[0].risk_score, 0);
    }

    #[test]
    fn test_per_form_score_capped() {
        let html = r#"<form action="https://collector.example/">
            <input name="password" type="password">
            <input name="seed_phrase">
            <input name="card_number">
        </form>"#;
        // 40 + 15 + 50 + 40 = 145, capped
        let forms = analyze(html, "https://victim.example/");
        assert_eq!(forms[0].risk_score, 100);
    }

    #[test]
    fn test_multiple_forms_ordered() {
        let html = r#"
            <form action="/one"><input name="a"></form>
            <form action="/two"><input name="seedphrase"></form>
        "#;
        let forms = analyze(html, "https://a.example/");
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].form_index, 0);
        assert_eq!(forms[1].form_index, 1);
        assert!(forms[1].flags.contains(&FlagCode::SeedPhraseField));
    }
}
