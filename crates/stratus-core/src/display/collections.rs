//! Collection wrapper types for displaying groups of ledger records.
//!
//! Each wrapper renders its items one after another, blank-line separated
//! unless they form a single list, and prints a short notice when empty.

use std::{fmt, ops::Deref};

use crate::models::{Plan, Project, Prompt, Resource};

macro_rules! collection {
    ($(#[$meta:meta])* $name:ident, $item:ty, $empty:literal, $spaced:literal) => {
        $(#[$meta])*
        pub struct $name(pub Vec<$item>);

        impl Deref for $name {
            type Target = [$item];

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<Vec<$item>> for $name {
            fn from(items: Vec<$item>) -> Self {
                Self(items)
            }
        }

        impl IntoIterator for $name {
            type Item = $item;
            type IntoIter = std::vec::IntoIter<Self::Item>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.0.is_empty() {
                    return writeln!(f, $empty);
                }
                for item in &self.0 {
                    write!(f, "{item}")?;
                    if $spaced {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
        }
    };
}

collection!(
    /// Projects, one markdown section each.
    Projects,
    Project,
    "No projects found.",
    true
);
collection!(
    /// Plans of a project, newest first.
    Plans,
    Plan,
    "No plans found.",
    true
);
collection!(
    /// Prompts of a project.
    Prompts,
    Prompt,
    "No prompts found.",
    true
);
collection!(
    /// A resource inventory as a bullet list.
    Resources,
    Resource,
    "No resources recorded.",
    false
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::ResourceRecord;

    fn resource(address: &str) -> Resource {
        Resource {
            id: 1,
            project_id: 1,
            record: ResourceRecord {
                address: address.to_string(),
                resource_type: "aws_s3_bucket".to_string(),
                name: "logs".to_string(),
                attributes: json!({}),
                dependencies: vec![],
            },
        }
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(Plans(vec![]).to_string(), "No plans found.\n");
        assert_eq!(Resources(vec![]).to_string(), "No resources recorded.\n");
    }

    #[test]
    fn test_resources_form_one_list() {
        let list = Resources::from(vec![resource("aws_s3_bucket.a"), resource("aws_s3_bucket.b")]);
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.to_string(),
            "- `aws_s3_bucket.a` (aws_s3_bucket)\n- `aws_s3_bucket.b` (aws_s3_bucket)\n"
        );
    }
}
