use crate::links::LinksError;

/// Why a raw notice could not be normalized. `index` is the record's
/// zero-based position in the input sequence.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("record {index}: expected a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index}: field `{field}` must be {expected}")]
    InvalidField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("record {index} ({entity_id}): malformed links: {source}")]
    MalformedLinks {
        index: usize,
        entity_id: String,
        #[source]
        source: LinksError,
    },
}

impl NormalizeError {
    pub fn index(&self) -> usize {
        match self {
            NormalizeError::NotAnObject { index }
            | NormalizeError::MissingField { index, .. }
            | NormalizeError::InvalidField { index, .. }
            | NormalizeError::MalformedLinks { index, .. } => *index,
        }
    }
}
