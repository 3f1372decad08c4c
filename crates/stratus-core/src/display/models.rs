//! Markdown `Display` implementations for the ledger records.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{Plan, PlanStatus, Project, Prompt, PromptStatus, Resource};

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {}", self.id, self.name)?;
        writeln!(f)?;

        writeln!(f, "- Provider: {}", self.cloud_provider)?;
        if let Some(url) = &self.state_bucket_url {
            writeln!(f, "- State: {url}")?;
        }
        if let Some(llm) = &self.llm_provider {
            writeln!(f, "- Generator: {llm}")?;
        }
        let applied = if self.applied_config.is_some() { "yes" } else { "no" };
        writeln!(f, "- Applied: {applied}")?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## Plan {} ({})",
            self.id,
            self.status.with_icon()
        )?;
        writeln!(f)?;

        writeln!(f, "- Project: {}", self.project_id)?;
        if let Some(prompt_id) = self.prompt_id {
            writeln!(f, "- Prompt: {prompt_id}")?;
        }
        let changes = if self.has_changes { "yes" } else { "no" };
        writeln!(f, "- Changes: {changes}")?;
        if let Some(message) = &self.commit_message {
            writeln!(f, "- Message: {message}")?;
        }
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        if let Some(applied_at) = &self.applied_at {
            writeln!(f, "- Applied: {}", LocalDateTime(applied_at))?;
        }

        if !self.plan_output.trim().is_empty() {
            writeln!(f)?;
            writeln!(f, "```")?;
            writeln!(f, "{}", self.plan_output.trim_end())?;
            writeln!(f, "```")?;
        }
        Ok(())
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### Prompt {} ({})", self.id, self.status)?;
        writeln!(f)?;
        writeln!(f, "> {}", self.user_prompt)?;
        writeln!(f)?;
        if let Some(message) = &self.commit_message {
            writeln!(f, "- Message: {message}")?;
        }
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;

        if let Some(analysis) = &self.analysis {
            writeln!(f)?;
            writeln!(f, "{analysis}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- `{}` ({})", self.record.address, self.record.resource_type)?;
        if !self.record.dependencies.is_empty() {
            write!(f, " depends on {}", self.record.dependencies.join(", "))?;
        }
        writeln!(f)
    }
}
