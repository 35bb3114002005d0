use std::path::PathBuf;
use thiserror::Error;

/// Every failure raised while loading or running maps.
///
/// Each variant names the operation that detected the problem, the subject it was working on
/// and the offending value, so a log line is enough to find the faulty statement.
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("{operation}: missing parameter `{field}` in {context}")]
    MissingField {
        operation: &'static str,
        field: String,
        context: String,
    },
    #[error("{operation}: `{field}` is unexpected in {context}")]
    UnexpectedField {
        operation: &'static str,
        field: String,
        context: String,
    },
    #[error("{operation}: cannot find {kind} named `{name}`")]
    UnresolvedReference {
        operation: &'static str,
        kind: &'static str,
        name: String,
    },
    #[error("{operation}: wrong value `{value}` for parameter {field}")]
    InvalidValue {
        operation: &'static str,
        field: String,
        value: String,
    },
    #[error("{operation}: svg element `{id}` not found in {document}")]
    MissingGraphic {
        operation: &'static str,
        id: String,
        document: String,
    },
    #[error("{operation}: config error in {file}: {detail}")]
    Config {
        operation: &'static str,
        file: PathBuf,
        detail: String,
    },
    #[error("{operation}: this should not happen: {detail}")]
    Internal {
        operation: &'static str,
        detail: String,
    },
    #[error(transparent)]
    Document(#[from] svgproj_doc::DocumentError),
}

impl MapperError {
    pub(crate) fn missing(operation: &'static str, field: &str, context: &str) -> Self {
        MapperError::MissingField {
            operation,
            field: field.to_string(),
            context: context.to_string(),
        }
    }

    pub(crate) fn invalid(operation: &'static str, field: &str, value: impl ToString) -> Self {
        MapperError::InvalidValue {
            operation,
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn unresolved(operation: &'static str, kind: &'static str, name: &str) -> Self {
        MapperError::UnresolvedReference {
            operation,
            kind,
            name: name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
