//! Tri-state result reported at the pipeline boundary.

use std::fmt;

use crate::error::Result;

/// What a caller sees from a pipeline operation: data, data with warnings,
/// or a failure message. Never a raw error chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    SuccessWithWarnings { value: T, warnings: Vec<String> },
    Failure { message: String },
}

impl<T> Outcome<T> {
    /// Builds an outcome from a result, attaching the warnings `warnings`
    /// extracts from a successful value.
    pub fn from_result<F>(result: Result<T>, warnings: F) -> Self
    where
        F: FnOnce(&T) -> Vec<String>,
    {
        match result {
            Ok(value) => {
                let warnings = warnings(&value);
                if warnings.is_empty() {
                    Outcome::Success(value)
                } else {
                    Outcome::SuccessWithWarnings { value, warnings }
                }
            }
            Err(e) => Outcome::Failure {
                message: e.to_string(),
            },
        }
    }

    /// Transforms the carried value, keeping warnings and failures.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::SuccessWithWarnings { value, warnings } => Outcome::SuccessWithWarnings {
                value: f(value),
                warnings,
            },
            Outcome::Failure { message } => Outcome::Failure { message },
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failure { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) | Outcome::SuccessWithWarnings { value, .. } => Some(value),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            Outcome::SuccessWithWarnings { warnings, .. } => warnings,
            _ => &[],
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        Outcome::from_result(result, |_| Vec::new())
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(value) => write!(f, "{value}"),
            Outcome::SuccessWithWarnings { value, warnings } => {
                write!(f, "{value}")?;
                writeln!(f)?;
                writeln!(f, "## Warnings")?;
                writeln!(f)?;
                for warning in warnings {
                    writeln!(f, "- {warning}")?;
                }
                Ok(())
            }
            Outcome::Failure { message } => writeln!(f, "Error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PreconditionViolation, StratusError};

    #[test]
    fn test_outcome_states() {
        let ok: Outcome<u32> = Ok(3).into();
        assert_eq!(ok, Outcome::Success(3));
        assert!(ok.is_success());
        assert!(ok.warnings().is_empty());

        let warned = Outcome::from_result(Ok(4u32), |_| vec!["no structured plan".to_string()]);
        assert_eq!(warned.value(), Some(&4));
        assert_eq!(warned.warnings(), ["no structured plan".to_string()]);
        assert!(format!("{warned}").contains("- no structured plan"));
        let doubled = warned.map(|value| value * 2);
        assert_eq!(doubled.value(), Some(&8));
        assert_eq!(doubled.warnings().len(), 1);

        let failed: Outcome<u32> =
            Err(StratusError::from(PreconditionViolation::NothingApplied { project_id: 2 })).into();
        assert!(!failed.is_success());
        assert!(failed.value().is_none());
        assert!(format!("{failed}").starts_with("Error: Precondition failed"));
    }
}
