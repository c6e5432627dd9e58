// ==============================================================================
// invocation.rs - Annotator Command Line Builder
// ==============================================================================
// Description: Serializes a merged option set into the annotator's argv
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::path::{Path, PathBuf};

use crate::options::{OptionSet, OptionValue};

/// Program plus ordered argument list for one annotator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatorInvocation {
    program: PathBuf,
    args: Vec<String>,
}

impl AnnotatorInvocation {
    /// Serialize `options` in iteration order.
    ///
    /// Truthy values emit `--key`; values other than a bare flag add their
    /// text as the next token. Suppressed flags and empty text emit nothing.
    pub fn build(program: impl Into<PathBuf>, options: &OptionSet) -> Self {
        let mut args = Vec::with_capacity(options.len() * 2);

        for (key, value) in options.iter() {
            if !value.is_truthy() {
                continue;
            }
            args.push(format!("--{}", key));
            if let OptionValue::Text(text) = value {
                args.push(text.clone());
            }
        }

        Self {
            program: program.into(),
            args,
        }
    }

    /// Wrap an already-built argument list
    pub fn from_parts(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Space-joined command line, for logging
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}
