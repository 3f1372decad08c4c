//! Provider credential selection.
//!
//! Credentials reach the provisioning tool through an explicit
//! [`CredentialSource`] handed to the runner; the process environment is read
//! once and never modified. Only the variables belonging to the project's
//! cloud provider are forwarded.

use std::{collections::BTreeMap, fmt};

/// Variables forwarded for AWS projects.
pub const AWS_VARIABLES: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_DEFAULT_REGION",
];
/// Variables forwarded for GCP projects.
pub const GCP_VARIABLES: &[&str] = &["GOOGLE_APPLICATION_CREDENTIALS"];
/// Variables forwarded for Azure projects.
pub const AZURE_VARIABLES: &[&str] = &[
    "ARM_CLIENT_ID",
    "ARM_CLIENT_SECRET",
    "ARM_SUBSCRIPTION_ID",
    "ARM_TENANT_ID",
];

/// Variables whose value is a path to a key file on the host rather than the
/// secret itself.
pub const FILE_VARIABLES: &[&str] = &["GOOGLE_APPLICATION_CREDENTIALS"];

pub fn is_file_variable(name: &str) -> bool {
    FILE_VARIABLES.contains(&name)
}

/// Names of the variables relevant to a provider tag. Unknown providers get
/// none.
pub fn provider_variables(provider: &str) -> &'static [&'static str] {
    match provider.trim().to_lowercase().as_str() {
        "aws" => AWS_VARIABLES,
        "gcp" | "google" => GCP_VARIABLES,
        "azure" => AZURE_VARIABLES,
        _ => &[],
    }
}

/// Immutable snapshot of the variables credentials may be drawn from.
#[derive(Clone, Default)]
pub struct CredentialSource {
    vars: BTreeMap<String, String>,
}

impl CredentialSource {
    /// Captures the credential variables present in the process environment.
    pub fn from_process_env() -> Self {
        let known = AWS_VARIABLES
            .iter()
            .chain(GCP_VARIABLES)
            .chain(AZURE_VARIABLES);
        let vars = known
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();
        Self { vars }
    }

    /// Builds a source from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Selects the variables relevant to `provider`.
    pub fn overlay_for(&self, provider: &str) -> CredentialOverlay {
        let vars = provider_variables(provider)
            .iter()
            .filter_map(|name| {
                self.vars
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        CredentialOverlay { vars }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSource")
            .field("names", &self.vars.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Environment variables injected into one tool run.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialOverlay {
    vars: Vec<(String, String)>,
}

impl CredentialOverlay {
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variable names, safe to log.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(name, _)| name.as_str())
    }

    /// Name/value pairs for the child environment. Never log these.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Pairs whose value is the secret itself.
    pub fn value_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs().filter(|(name, _)| !is_file_variable(name))
    }

    /// Pairs whose value is a host path to a key file.
    pub fn file_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs().filter(|(name, _)| is_file_variable(name))
    }
}

impl fmt::Debug for CredentialOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> CredentialSource {
        CredentialSource::from_pairs([
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "s3cr3t"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/keys/gcp.json"),
            ("ARM_CLIENT_ID", "client"),
            ("ARM_TENANT_ID", "tenant"),
            ("UNRELATED", "x"),
        ])
    }

    #[test]
    fn test_aws_overlay_selects_only_aws_variables() {
        let overlay = source().overlay_for("AWS");
        let names: Vec<&str> = overlay.names().collect();
        assert_eq!(names, vec!["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"]);
    }

    #[test]
    fn test_gcp_and_azure_overlays() {
        let gcp: Vec<(String, String)> = source()
            .overlay_for("gcp")
            .pairs()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            gcp,
            vec![("GOOGLE_APPLICATION_CREDENTIALS".to_string(), "/keys/gcp.json".to_string())]
        );

        let azure = source().overlay_for("azure");
        assert_eq!(
            azure.names().collect::<Vec<_>>(),
            vec!["ARM_CLIENT_ID", "ARM_TENANT_ID"]
        );
    }

    #[test]
    fn test_key_file_variables_are_split_from_values() {
        let source = CredentialSource::from_pairs([
            ("GOOGLE_APPLICATION_CREDENTIALS", "/keys/gcp.json"),
            ("AWS_SECRET_ACCESS_KEY", "s3cr3t"),
        ]);

        let gcp = source.overlay_for("gcp");
        assert_eq!(
            gcp.file_pairs().collect::<Vec<_>>(),
            vec![("GOOGLE_APPLICATION_CREDENTIALS", "/keys/gcp.json")]
        );
        assert_eq!(gcp.value_pairs().count(), 0);

        let aws = source.overlay_for("aws");
        assert_eq!(aws.file_pairs().count(), 0);
        assert_eq!(aws.value_pairs().count(), 1);
    }

    #[test]
    fn test_unknown_provider_gets_nothing() {
        assert!(source().overlay_for("digitalocean").is_empty());
        assert!(provider_variables("").is_empty());
    }

    #[test]
    fn test_debug_output_never_contains_values() {
        let overlay = source().overlay_for("aws");
        let rendered = format!("{overlay:?} {:?}", source());
        assert!(rendered.contains("AWS_SECRET_ACCESS_KEY"));
        assert!(!rendered.contains("s3cr3t"));
        assert!(!rendered.contains("AKIAEXAMPLE"));
    }
}
