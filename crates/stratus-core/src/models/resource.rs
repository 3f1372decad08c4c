//! Resource inventory records.

use serde::{Deserialize, Serialize};

/// A provisioned resource as read from the provisioning tool's state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    /// Full resource address, e.g. `module.net.aws_vpc.main`
    pub address: String,
    /// Resource type, e.g. `aws_vpc`
    pub resource_type: String,
    /// Local name, e.g. `main`
    pub name: String,
    /// Attribute values as reported in state
    pub attributes: serde_json::Value,
    /// Addresses this resource depends on, in state order
    pub dependencies: Vec<String>,
}

/// A persisted inventory row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: u64,
    pub project_id: u64,
    #[serde(flatten)]
    pub record: ResourceRecord,
}
