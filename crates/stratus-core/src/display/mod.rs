//! Markdown formatting for records, collections and pipeline reports.
//!
//! Domain records implement `Display` directly (see [`models`]); collections
//! are wrapped in newtypes ([`collections`]) and operation results in
//! wrapper types ([`results`]). Everything renders to markdown, which the CLI
//! passes to its terminal renderer.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │ Records/Reports │    │ Newtypes and    │    │    Markdown     │
//! │ (Plan, Project) │───▶│ result wrappers │───▶│     output      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ```rust
//! use stratus_core::{display::Resources, models::{Resource, ResourceRecord}};
//!
//! let inventory = Resources(vec![Resource {
//!     id: 1,
//!     project_id: 1,
//!     record: ResourceRecord {
//!         address: "aws_vpc.main".to_string(),
//!         resource_type: "aws_vpc".to_string(),
//!         name: "main".to_string(),
//!         attributes: serde_json::json!({"cidr_block": "10.0.0.0/16"}),
//!         dependencies: vec![],
//!     },
//! }]);
//! assert!(inventory.to_string().contains("`aws_vpc.main` (aws_vpc)"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;

pub use collections::{Plans, Projects, Prompts, Resources};
pub use datetime::LocalDateTime;
pub use results::{CreateResult, DeleteResult, UpdateResult};
