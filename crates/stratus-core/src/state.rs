//! Parsing of the provisioning tool's structured state.
//!
//! Reads the JSON document printed by `show -json` (state or plan) and turns
//! the managed resources of the root module and every nested child module
//! into [`ResourceRecord`]s:
//!
//! ```json
//! { "values": { "root_module": {
//!     "resources": [ { "address": "aws_vpc.main", "mode": "managed",
//!                      "type": "aws_vpc", "name": "main",
//!                      "values": { ... }, "depends_on": [ ... ] } ],
//!     "child_modules": [ { "address": "module.net", "resources": [ ... ],
//!                          "child_modules": [ ... ] } ] } } }
//! ```
//!
//! Data sources are skipped. An empty state (no `values`) parses to an empty
//! inventory.
//!
//! [`planned_changes`] reads the `resource_changes` of a saved plan instead;
//! apply uses it to compare a fresh plan with the approved one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Result, models::ResourceRecord};

/// Parsed `show -json` output: the raw document plus its managed resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub raw: Value,
    pub resources: Vec<ResourceRecord>,
}

impl StateSnapshot {
    /// Parses the text printed by `show -json`.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        let resources = parse_state(&raw)?;
        Ok(Self { raw, resources })
    }
}

#[derive(Debug, Deserialize)]
struct StateDocument {
    #[serde(default)]
    values: Option<StateValues>,
}

#[derive(Debug, Deserialize)]
struct StateValues {
    #[serde(default)]
    root_module: Option<Module>,
}

#[derive(Debug, Deserialize)]
struct Module {
    #[serde(default)]
    resources: Vec<StateResource>,
    #[serde(default)]
    child_modules: Vec<Module>,
}

#[derive(Debug, Deserialize)]
struct StateResource {
    address: String,
    #[serde(default = "managed")]
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    values: Value,
    #[serde(default)]
    depends_on: Vec<String>,
}

fn managed() -> String {
    "managed".to_string()
}

/// Extracts every managed resource from a `show -json` document.
pub fn parse_state(document: &Value) -> Result<Vec<ResourceRecord>> {
    let document = StateDocument::deserialize(document)?;

    let mut records = Vec::new();
    if let Some(root) = document.values.and_then(|values| values.root_module) {
        collect(root, &mut records);
    }
    Ok(records)
}

/// One resource a saved plan would touch, with the actions planned for it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlannedChange {
    pub address: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlanDocument {
    #[serde(default)]
    resource_changes: Vec<ResourceChange>,
}

#[derive(Debug, Deserialize)]
struct ResourceChange {
    address: String,
    change: ChangeActions,
}

#[derive(Debug, Deserialize)]
struct ChangeActions {
    #[serde(default)]
    actions: Vec<String>,
}

/// Extracts the effective changes of a plan document (`show -json` of a
/// saved plan), sorted by address. `no-op` and `read` entries are dropped.
pub fn planned_changes(document: &Value) -> Result<Vec<PlannedChange>> {
    let document = PlanDocument::deserialize(document)?;

    let mut changes: Vec<PlannedChange> = document
        .resource_changes
        .into_iter()
        .filter(|rc| {
            !rc.change
                .actions
                .iter()
                .all(|action| action == "no-op" || action == "read")
        })
        .map(|rc| PlannedChange {
            address: rc.address,
            actions: rc.change.actions,
        })
        .collect();
    changes.sort();
    Ok(changes)
}

fn collect(module: Module, records: &mut Vec<ResourceRecord>) {
    for resource in module.resources {
        if resource.mode != "managed" {
            continue;
        }
        let attributes = match resource.values {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        records.push(ResourceRecord {
            address: resource.address,
            resource_type: resource.resource_type,
            name: resource.name,
            attributes,
            dependencies: resource.depends_on,
        });
    }
    for child in module.child_modules {
        collect(child, records);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parses_root_and_nested_module_resources() {
        let document = json!({
            "format_version": "1.0",
            "values": {
                "root_module": {
                    "resources": [
                        {
                            "address": "aws_vpc.main",
                            "mode": "managed",
                            "type": "aws_vpc",
                            "name": "main",
                            "values": { "cidr_block": "10.0.0.0/16" }
                        },
                        {
                            "address": "data.aws_region.current",
                            "mode": "data",
                            "type": "aws_region",
                            "name": "current",
                            "values": { "name": "us-east-1" }
                        }
                    ],
                    "child_modules": [
                        {
                            "address": "module.subnets",
                            "resources": [
                                {
                                    "address": "module.subnets.aws_subnet.a",
                                    "mode": "managed",
                                    "type": "aws_subnet",
                                    "name": "a",
                                    "values": { "cidr_block": "10.0.1.0/24" },
                                    "depends_on": ["aws_vpc.main", "aws_internet_gateway.gw"]
                                }
                            ]
                        }
                    ]
                }
            }
        });

        let records = parse_state(&document).expect("parsable state");
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].address, "aws_vpc.main");
        assert_eq!(records[0].resource_type, "aws_vpc");
        assert_eq!(records[0].attributes["cidr_block"], "10.0.0.0/16");
        assert!(records[0].dependencies.is_empty());

        assert_eq!(records[1].name, "a");
        assert_eq!(
            records[1].dependencies,
            vec!["aws_vpc.main".to_string(), "aws_internet_gateway.gw".to_string()]
        );
    }

    #[test]
    fn test_planned_changes_skip_no_ops() {
        let document = json!({
            "format_version": "1.2",
            "resource_changes": [
                { "address": "aws_vpc.main", "change": { "actions": ["create"] } },
                { "address": "aws_iam_role.ci", "change": { "actions": ["no-op"] } },
                { "address": "data.aws_ami.base", "change": { "actions": ["read"] } },
                { "address": "aws_instance.web", "change": { "actions": ["delete", "create"] } }
            ]
        });

        let changes = planned_changes(&document).unwrap();
        assert_eq!(
            changes,
            vec![
                PlannedChange {
                    address: "aws_instance.web".to_string(),
                    actions: vec!["delete".to_string(), "create".to_string()],
                },
                PlannedChange {
                    address: "aws_vpc.main".to_string(),
                    actions: vec!["create".to_string()],
                },
            ]
        );
        assert!(planned_changes(&json!({"format_version": "1.2"})).unwrap().is_empty());
    }

    #[test]
    fn test_empty_state_has_no_resources() {
        assert!(parse_state(&json!({"format_version": "1.0"})).unwrap().is_empty());
        assert!(parse_state(&json!({"values": {}})).unwrap().is_empty());
    }

    #[test]
    fn test_resource_without_values_gets_empty_attributes() {
        let document = json!({
            "values": { "root_module": { "resources": [
                { "address": "null_resource.a", "type": "null_resource", "name": "a" }
            ]}}
        });
        let records = parse_state(&document).unwrap();
        assert_eq!(records[0].attributes, json!({}));
    }

    #[test]
    fn test_malformed_documents_are_errors() {
        assert!(StateSnapshot::from_json("not json").is_err());
        assert!(parse_state(&json!({"values": {"root_module": {"resources": [{"address": 1}]}}})).is_err());
    }

    #[test]
    fn test_snapshot_keeps_raw_document() {
        let snapshot = StateSnapshot::from_json(r#"{"format_version":"1.0","terraform_version":"1.9.0"}"#)
            .expect("valid JSON");
        assert_eq!(snapshot.raw["terraform_version"], "1.9.0");
        assert!(snapshot.resources.is_empty());
    }
}
