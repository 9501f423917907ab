use thiserror::Error;

/// A merge-write payload that cannot be applied at all.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("No preferences supplied")]
    Empty,

    #[error("Preferences payload must be a JSON object")]
    NotAnObject,

    #[error("Malformed preferences payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Payload contains no known preference field")]
    NoKnownFields,
}

/// A single closed-value field that failed its check during a merge.
///
/// Never fails the merge: the field's default is substituted and the
/// violation is reported alongside the merged document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} rejected ({reason}), default substituted")]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: String,
}

/// A string that does not name any variant of a closed-value field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
