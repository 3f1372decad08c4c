//! Remote state backend declarations.
//!
//! The workspace manager asks a [`BackendResolver`] for the `terraform {
//! backend ... }` stanza of a project. [`UrlSchemeBackendResolver`] derives it
//! from the project's state URL scheme:
//!
//! | URL                 | Backend | Settings                                         |
//! |---------------------|---------|--------------------------------------------------|
//! | `s3://bucket/...`   | `s3`    | bucket, `<project>/terraform.tfstate` key, region, encrypt, optional lock table |
//! | `gs://bucket/...`   | `gcs`   | bucket, `<project>` prefix                       |
//!
//! Anything else yields no backend, and the tool falls back to local state.

use log::warn;

use crate::models::Project;

const DEFAULT_S3_REGION: &str = "us-east-1";

/// Produces the backend stanza for a project, if it has one.
pub trait BackendResolver: Send + Sync {
    fn resolve(&self, project: &Project) -> Option<String>;
}

/// Resolver keyed on the scheme of `Project::state_bucket_url`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlSchemeBackendResolver;

impl BackendResolver for UrlSchemeBackendResolver {
    fn resolve(&self, project: &Project) -> Option<String> {
        let url = project.state_bucket_url.as_deref()?.trim();

        if let Some(rest) = url.strip_prefix("s3://") {
            let bucket = bucket_name(rest)?;
            let credentials = match project.state_credentials() {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        "Ignoring unreadable state credentials for project {}: {e}",
                        project.name
                    );
                    serde_json::Value::Null
                }
            };
            let region = credentials
                .get("region")
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_S3_REGION);

            let mut stanza = String::from("terraform {\n  backend \"s3\" {\n");
            stanza.push_str(&format!("    bucket  = {}\n", hcl_string(bucket)));
            stanza.push_str(&format!(
                "    key     = {}\n",
                hcl_string(&format!("{}/terraform.tfstate", project.name))
            ));
            stanza.push_str(&format!("    region  = {}\n", hcl_string(region)));
            stanza.push_str("    encrypt = true\n");
            if let Some(table) = credentials.get("dynamodb_table").and_then(|v| v.as_str()) {
                stanza.push_str(&format!("    dynamodb_table = {}\n", hcl_string(table)));
            }
            stanza.push_str("  }\n}\n");
            return Some(stanza);
        }

        if let Some(rest) = url.strip_prefix("gs://") {
            let bucket = bucket_name(rest)?;
            return Some(format!(
                "terraform {{\n  backend \"gcs\" {{\n    bucket = {}\n    prefix = {}\n  }}\n}}\n",
                hcl_string(bucket),
                hcl_string(&project.name)
            ));
        }

        None
    }
}

fn bucket_name(rest: &str) -> Option<&str> {
    rest.split('/').next().filter(|bucket| !bucket.is_empty())
}

/// Renders `value` as a quoted HCL string literal with template sequences
/// escaped.
pub(crate) fn hcl_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
