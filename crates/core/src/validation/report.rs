use thiserror::Error;

/// Raised only when a caller chooses to treat a failed report as fatal.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("document failed validation with {} error(s): {}", .errors.len(), .errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// Outcome of running a validator. Errors keep rule order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_parts(self) -> (bool, Vec<String>) {
        (self.errors.is_empty(), self.errors)
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}
