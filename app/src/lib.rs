// ==============================================================================
// lib.rs - VEP Annotator Library
// ==============================================================================
// Description: Library interface for the variant annotation pipeline
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod parsers;
pub mod config;
pub mod error;
pub mod options;
pub mod invocation;
pub mod runner;
pub mod processor;
pub mod logging;

pub use config::{AnnotatorConfig, Assembly};
pub use error::{AnnotationError, ConfigError};
pub use parsers::AnnotationRecord;
pub use processor::Annotator;
