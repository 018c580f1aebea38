use std::fmt;

/// Errors raised while composing, submitting and exporting sample batches
#[derive(Debug, Clone, PartialEq)]
pub enum PortalError {
    /// No company selected on the draft batch
    MissingCompany,
    /// No grower selected on the draft batch
    MissingGrower,
    /// Draft batch has no samples
    EmptySampleSet,
    /// A numeric text input is present but does not parse (or is out of range)
    InvalidNumericField {
        sample_index: usize,
        field: String,
        value: String,
    },
    /// Lime entry rejected before it reached a sample
    InvalidLimeEntry { field: String, message: String },
    /// Blank plot id, only raised when strict plot-id validation is enabled
    MissingPlotId { sample_index: usize },
    /// CSV download requested before the artifact was generated
    ArtifactNotReady { batch_id: String },
    /// Any failed round-trip to the external store
    RemoteUnavailable { operation: String, message: String },
    /// The external store does not know the requested resource
    NotFound { resource: String, id: String },
    /// Status change outside the batch transition table
    InvalidStatusTransition { from: String, to: String },
    /// Sample or lime index does not address an existing entry
    IndexOutOfRange { index: usize, len: usize },
    /// The lab CSV could not be written
    ExportFailed { message: String },
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalError::MissingCompany => write!(f, "A company must be selected"),
            PortalError::MissingGrower => write!(f, "A grower must be selected"),
            PortalError::EmptySampleSet => write!(f, "A batch needs at least one sample"),
            PortalError::InvalidNumericField {
                sample_index,
                field,
                value,
            } => write!(
                f,
                "Sample {} has an invalid value for '{}': '{}'",
                sample_index + 1,
                field,
                value
            ),
            PortalError::InvalidLimeEntry { field, message } => {
                write!(f, "Invalid lime entry field '{field}': {message}")
            }
            PortalError::MissingPlotId { sample_index } => {
                write!(f, "Sample {} has no plot id", sample_index + 1)
            }
            PortalError::ArtifactNotReady { batch_id } => {
                write!(f, "CSV for batch '{batch_id}' has not been generated yet")
            }
            PortalError::RemoteUnavailable { operation, message } => {
                write!(f, "Store call '{operation}' failed: {message}")
            }
            PortalError::NotFound { resource, id } => {
                write!(f, "{resource} with id '{id}' not found")
            }
            PortalError::InvalidStatusTransition { from, to } => {
                write!(f, "Batch status cannot move from '{from}' to '{to}'")
            }
            PortalError::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} is out of range for {len} entries")
            }
            PortalError::ExportFailed { message } => write!(f, "CSV export failed: {message}"),
        }
    }
}

impl std::error::Error for PortalError {}

impl PortalError {
    /// Validation errors are detected locally and never reach the store
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PortalError::MissingCompany
                | PortalError::MissingGrower
                | PortalError::EmptySampleSet
                | PortalError::InvalidNumericField { .. }
                | PortalError::InvalidLimeEntry { .. }
                | PortalError::MissingPlotId { .. }
        )
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, PortalError::RemoteUnavailable { .. })
    }
}

impl From<csv::Error> for PortalError {
    fn from(err: csv::Error) -> Self {
        PortalError::ExportFailed {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        let operation = err
            .url()
            .map_or_else(|| "request".to_string(), |url| url.path().to_string());
        PortalError::RemoteUnavailable {
            operation,
            message: err.to_string(),
        }
    }
}

#[macro_export]
macro_rules! invalid_numeric {
    ($index:expr, $field:expr, $value:expr) => {
        $crate::common::errors::PortalError::InvalidNumericField {
            sample_index: $index,
            field: $field.to_string(),
            value: $value.to_string(),
        }
    };
}

#[macro_export]
macro_rules! remote_unavailable {
    ($operation:expr, $message:expr) => {
        $crate::common::errors::PortalError::RemoteUnavailable {
            operation: $operation.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::PortalError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

/// Result type alias for portal operations
pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_numeric_macro() {
        let err = invalid_numeric!(0, "yield_goal", "abc");
        match err {
            PortalError::InvalidNumericField {
                sample_index,
                ref field,
                ref value,
            } => {
                assert_eq!(sample_index, 0);
                assert_eq!(field, "yield_goal");
                assert_eq!(value, "abc");
            }
            _ => panic!("Expected invalid numeric field error"),
        }
        assert!(err.is_validation());
        assert!(!err.is_remote());
    }

    #[test]
    fn test_display_uses_one_based_sample_numbers() {
        let err = invalid_numeric!(2, "acres", "-4");
        assert_eq!(
            err.to_string(),
            "Sample 3 has an invalid value for 'acres': '-4'"
        );
    }

    #[test]
    fn test_remote_unavailable_is_not_validation() {
        let err = remote_unavailable!("create_batch", "connection refused");
        assert!(err.is_remote());
        assert!(!err.is_validation());
        assert!(err.to_string().contains("create_batch"));
    }
}
