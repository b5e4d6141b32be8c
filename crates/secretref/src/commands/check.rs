//! Offline reference validation

use anyhow::{bail, Result};
use secretref_bws::BwsRef;
use secretref_core::{Error, Registry, SecretRef};
use serde::Serialize;

use crate::cli::CheckArgs;
use crate::output;

/// Outcome of parsing one reference
#[derive(Debug, Serialize, PartialEq, Eq)]
struct CheckReport {
    input: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheme: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckReport {
    fn invalid(input: &str, provider: Option<String>, error: impl ToString) -> Self {
        Self {
            input: input.to_string(),
            valid: false,
            provider,
            scheme: None,
            project: None,
            key: None,
            error: Some(error.to_string()),
        }
    }

    fn valid(input: &str, provider: &str, scheme: &'static str) -> Self {
        Self {
            input: input.to_string(),
            valid: true,
            provider: Some(provider.to_string()),
            scheme: Some(scheme),
            project: None,
            key: None,
            error: None,
        }
    }
}

pub fn run(args: CheckArgs) -> Result<()> {
    let registry = super::registry()?;
    let reports: Vec<CheckReport> = args.refs.iter().map(|r| inspect(r, &registry)).collect();
    let invalid = reports.iter().filter(|r| !r.valid).count();

    if args.json {
        output::json(&reports)?;
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if invalid > 0 {
        bail!("{} of {} references are invalid", invalid, reports.len());
    }
    Ok(())
}

fn print_report(report: &CheckReport) {
    match &report.error {
        Some(error) => output::error(&format!("{}: {}", report.input, error)),
        None => output::success(&report.input),
    }

    if let Some(provider) = &report.provider {
        output::kv("provider", provider);
    }
    if let Some(scheme) = report.scheme {
        output::kv("scheme", scheme);
    }
    if let (Some(project), Some(key)) = (&report.project, &report.key) {
        output::kv("project", project);
        output::kv("key", key);
    }
}

/// Classify a reference without contacting any backend
fn inspect(input: &str, registry: &Registry) -> CheckReport {
    let secret_ref = match SecretRef::parse(input) {
        Ok(r) => r,
        Err(e) => return CheckReport::invalid(input, None, e),
    };

    let provider = secret_ref.provider.as_str();
    if !registry.contains(provider) {
        let err = Error::unknown_provider(provider, &registry.names());
        return CheckReport::invalid(input, Some(provider.to_string()), err);
    }

    if provider != secretref_bws::PROVIDER_NAME {
        return CheckReport::valid(input, provider, "opaque");
    }

    let reference = secret_ref.reference.trim();
    if reference.is_empty() {
        return CheckReport::invalid(
            input,
            Some(provider.to_string()),
            secretref_bws::Error::EmptyReference,
        );
    }

    match BwsRef::parse(reference) {
        BwsRef::Direct(_) => CheckReport::valid(input, provider, "secret-id"),
        BwsRef::ProjectKey { project, key } => {
            let mut report = CheckReport::valid(input, provider, "project-key");
            report.project = Some(project.to_string());
            report.key = Some(key.to_string());
            report
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        super::super::registry().unwrap()
    }

    #[test]
    fn test_inspect_project_key() {
        let report = inspect("secretref:bws:project/dotenv/key/TOKEN", &registry());
        assert!(report.valid);
        assert_eq!(report.scheme, Some("project-key"));
        assert_eq!(report.project.as_deref(), Some("dotenv"));
        assert_eq!(report.key.as_deref(), Some("TOKEN"));
    }

    #[test]
    fn test_inspect_secret_id() {
        let report = inspect(
            "  secretref:bws:be8e0ad8-d545-4017-a55a-b02f014d4158 ",
            &registry(),
        );
        assert!(report.valid);
        assert_eq!(report.scheme, Some("secret-id"));
        assert!(report.project.is_none());
    }

    #[test]
    fn test_inspect_malformed_project_form_is_secret_id() {
        let report = inspect("secretref:bws:project/dotenv/TOKEN", &registry());
        assert!(report.valid);
        assert_eq!(report.scheme, Some("secret-id"));
    }

    #[test]
    fn test_inspect_empty_bws_reference() {
        let report = inspect("secretref:bws:   ", &registry());
        assert!(!report.valid);
        assert_eq!(report.error.as_deref(), Some("bws ref is empty"));
    }

    #[test]
    fn test_inspect_unknown_provider() {
        let report = inspect("secretref:vault:kv/app", &registry());
        assert!(!report.valid);
        assert_eq!(report.provider.as_deref(), Some("vault"));
        assert!(report.error.unwrap().contains("bws"));
    }

    #[test]
    fn test_inspect_missing_prefix() {
        let report = inspect("project/dotenv/key/TOKEN", &registry());
        assert!(!report.valid);
        assert!(report.provider.is_none());
    }

    #[test]
    fn test_report_json_omits_empty_fields() {
        let report = inspect("secretref:bws:abc", &registry());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scheme"], "secret-id");
        assert!(json.get("project").is_none());
        assert!(json.get("error").is_none());
    }
}
