// ==============================================================================
// processor.rs - Annotation Request Pipeline
// ==============================================================================
// Description: Runs variant queries through parse, merge, invoke and decode
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::fmt;
use tracing::{debug, info, warn};

use crate::config::AnnotatorConfig;
use crate::error::AnnotationError;
use crate::invocation::AnnotatorInvocation;
use crate::options::{CallerOptions, OptionMerger, RequestFiles, QUERY_PARAM};
use crate::parsers::{parse_tokens, read_records, AnnotationRecord};
use crate::runner::{self, ScratchSpace};

/// Pipeline stages of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParsingQuery,
    BuildingOptions,
    Invoking,
    Decoding,
    Responding,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ParsingQuery => "parsing_query",
            Stage::BuildingOptions => "building_options",
            Stage::Invoking => "invoking",
            Stage::Decoding => "decoding",
            Stage::Responding => "responding",
            Stage::Failed => "failed",
        }
    }

    /// Responding and Failed end a request
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Responding | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotates variant queries with the external annotator.
///
/// Holds no per-request state; one instance serves concurrent requests.
#[derive(Debug, Clone)]
pub struct Annotator {
    config: AnnotatorConfig,
    merger: OptionMerger,
}

impl Annotator {
    pub fn new(config: AnnotatorConfig) -> Self {
        let merger = OptionMerger::new(config.clone());
        Self { config, merger }
    }

    /// Annotate using raw query parameter pairs: every `q` is a variant
    /// token, everything else an annotator option override
    pub async fn annotate_query<K, V>(
        &self,
        params: &[(K, V)],
    ) -> Result<Vec<AnnotationRecord>, AnnotationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let tokens: Vec<&str> = params
            .iter()
            .filter(|(key, _)| key.as_ref() == QUERY_PARAM)
            .map(|(_, value)| value.as_ref())
            .filter(|value| !value.is_empty())
            .collect();

        let caller = CallerOptions::from_pairs(params.iter().map(|(k, v)| (k, v)));
        self.annotate(&tokens, &caller).await
    }

    /// Annotate `tokens` in order. Any failure discards the whole batch.
    pub async fn annotate<S: AsRef<str>>(
        &self,
        tokens: &[S],
        caller: &CallerOptions,
    ) -> Result<Vec<AnnotationRecord>, AnnotationError> {
        if tokens.is_empty() {
            return Err(AnnotationError::MissingQueryParameter);
        }

        enter(Stage::ParsingQuery);
        let lines = parse_tokens(tokens).map_err(|e| failed(Stage::ParsingQuery, e.into()))?;

        enter(Stage::BuildingOptions);
        // Dropping the scratch space removes the request's files on every path
        let scratch = ScratchSpace::create(&self.config.tmp_dir)
            .map_err(|e| failed(Stage::BuildingOptions, e))?;
        let options = self.merger.merge(
            caller,
            RequestFiles {
                input: scratch.input_path(),
                output: scratch.output_path(),
            },
        );
        let invocation = AnnotatorInvocation::build(&self.config.program, &options);

        enter(Stage::Invoking);
        scratch
            .write_input(&lines)
            .await
            .map_err(|e| failed(Stage::Invoking, e))?;
        runner::execute(&invocation, self.config.timeout)
            .await
            .map_err(|e| failed(Stage::Invoking, e))?;

        enter(Stage::Decoding);
        let records = read_records(scratch.output_path())
            .await
            .map_err(|e| failed(Stage::Decoding, e))?;

        enter(Stage::Responding);
        info!(
            "Annotated {} variant lines into {} records",
            lines.len(),
            records.len()
        );
        Ok(records)
    }
}

fn enter(stage: Stage) {
    debug!(stage = %stage, terminal = stage.is_terminal(), "Entering stage");
}

fn failed(stage: Stage, error: AnnotationError) -> AnnotationError {
    warn!(stage = %stage, next = %Stage::Failed, "Annotation failed: {}", error);
    error
}
