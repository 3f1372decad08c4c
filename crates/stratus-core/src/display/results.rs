//! Result wrapper types and report formatting for pipeline operations.

use std::fmt;

use crate::{
    models::{Plan, Project},
    pipeline::{ApplyReport, DestroyReport, GenerationReport, PlanReport, Validation},
    state::StateSnapshot,
};

/// Wrapper type for displaying the result of create operations.
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Project> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created project with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying a status change, e.g. an approval.
pub struct UpdateResult<T> {
    pub resource: T,
    pub action: &'static str,
}

impl<T> UpdateResult<T> {
    pub fn new(resource: T, action: &'static str) -> Self {
        Self { resource, action }
    }
}

impl fmt::Display for UpdateResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} plan with ID: {}", self.action, self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for UpdateResult<Project> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} project with ID: {}", self.action, self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying the result of delete operations.
pub struct DeleteResult<T> {
    pub resource: T,
}

impl<T> DeleteResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for DeleteResult<Project> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted project '{}' (ID: {})",
            self.resource.name, self.resource.id
        )
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = if self.has_changes {
            "changes pending approval"
        } else {
            "no changes"
        };
        writeln!(f, "Recorded plan with ID: {} ({summary})", self.plan.id)?;
        writeln!(f)?;
        write!(f, "{}", self.plan)
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Applied plan with ID: {}", self.plan.id)?;
        writeln!(f)?;
        match self.inventory {
            Some(count) => writeln!(f, "- Resources: {count}")?,
            None => writeln!(f, "- Resources: not refreshed")?,
        }
        write_output(f, &self.output)
    }
}

impl fmt::Display for DestroyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Destroyed infrastructure of project {}", self.project_id)?;
        writeln!(f)?;
        writeln!(f, "- Inventory entries removed: {}", self.removed_resources)?;
        write_output(f, &self.output)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            writeln!(f, "Configuration is valid.")?;
        } else {
            writeln!(f, "Configuration is invalid.")?;
            writeln!(f)?;
            for diagnostic in &self.diagnostics {
                writeln!(f, "- {diagnostic}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prompt)?;
        writeln!(f)?;
        write!(f, "{}", self.plan)
    }
}

impl fmt::Display for StateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resources.is_empty() {
            return writeln!(f, "State holds no managed resources.");
        }
        writeln!(f, "State holds {} managed resources:", self.resources.len())?;
        writeln!(f)?;
        for resource in &self.resources {
            writeln!(f, "- `{}` ({})", resource.address, resource.resource_type)?;
        }
        Ok(())
    }
}

fn write_output(f: &mut fmt::Formatter<'_>, output: &str) -> fmt::Result {
    if output.trim().is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "```")?;
    writeln!(f, "{}", output.trim_end())?;
    writeln!(f, "```")
}
