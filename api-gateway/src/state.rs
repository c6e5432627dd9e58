// ==============================================================================
// state.rs - Application State Management
// ==============================================================================
// Description: Shared application state for the annotation gateway
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use vep_annotator::{Annotator, AnnotatorConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Stateless annotation pipeline shared by every request
    annotator: Annotator,
}

impl AppState {
    /// Create new application state from environment
    pub fn new() -> Result<Self> {
        let config = AnnotatorConfig::from_env().context("Invalid annotator configuration")?;

        info!("Annotator: {:?}", config.program);
        info!("Data directory: {:?}", config.data_dir);
        info!("Scratch directory: {:?}", config.tmp_dir);
        info!("Annotator timeout: {:?}", config.timeout);

        if !config.program.exists() {
            warn!("Annotator executable not found at {:?}", config.program);
        }
        if !config.data_dir.exists() {
            warn!(
                "Data directory {:?} does not exist; run vep-populate-cache first",
                config.data_dir
            );
        }

        std::fs::create_dir_all(&config.tmp_dir)
            .context("Failed to create scratch directory")?;

        Ok(Self::with_config(config))
    }

    /// Create state from an explicit configuration
    pub fn with_config(config: AnnotatorConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                annotator: Annotator::new(config),
            }),
        }
    }

    /// Get the annotation pipeline
    pub fn annotator(&self) -> &Annotator {
        &self.inner.annotator
    }
}
