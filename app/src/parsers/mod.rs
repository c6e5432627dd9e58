// ==============================================================================
// parsers/mod.rs - Parser modules
// ==============================================================================
// Description: Parsers for variant queries and annotator output
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod query;
pub mod vep_json;

pub use query::{parse_token, parse_tokens, QueryParseError, VariantLine};
pub use vep_json::{decode_records, read_records, AnnotationRecord};
