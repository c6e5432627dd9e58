// ==============================================================================
// error.rs - Annotation Pipeline Errors
// ==============================================================================
// Description: Error taxonomy for the request-to-annotation pipeline
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use thiserror::Error;

use crate::parsers::QueryParseError;

/// Failures of a single annotation request.
///
/// No variant carries partial results: any failure discards all work for the
/// request.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("param q must be given")]
    MissingQueryParameter,

    #[error(transparent)]
    MalformedQuery(#[from] QueryParseError),

    #[error("annotator exited with {}: {output}", exit_label(*code))]
    AnnotatorExecution { code: Option<i32>, output: String },

    #[error("annotator timed out after {seconds} seconds")]
    AnnotatorTimeout { seconds: u64 },

    #[error("failed to start annotator {program}: {source}")]
    AnnotatorSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON on annotator output line {line}: {source}")]
    OutputDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnnotationError {
    /// True for failures of the external annotator process itself
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            AnnotationError::AnnotatorExecution { .. }
                | AnnotationError::AnnotatorTimeout { .. }
                | AnnotationError::AnnotatorSpawn { .. }
        )
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (killed by signal)".to_string(),
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}
