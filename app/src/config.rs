// ==============================================================================
// config.rs - Annotator Configuration
// ==============================================================================
// Description: Paths and limits for running the external annotator
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_PROGRAM: &str = "/opt/vep/src/ensembl-vep/vep";
pub const DEFAULT_DATA_DIR: &str = "/opt/vep/.vep";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Reference genome assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembly {
    GRCh37,
    GRCh38,
}

impl Assembly {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assembly::GRCh37 => "GRCh37",
            Assembly::GRCh38 => "GRCh38",
        }
    }

    /// Resolve an `assembly` option value. Only an exact `GRCh38` selects
    /// GRCh38; anything else falls back to the GRCh37 legacy reference.
    pub fn resolve(value: Option<&str>) -> Self {
        match value {
            Some("GRCh38") => Assembly::GRCh38,
            _ => Assembly::GRCh37,
        }
    }

    /// Uncompressed primary assembly FASTA file name inside the data directory
    pub fn fasta_file_name(&self) -> &'static str {
        match self {
            // Release 75 carries the last GRCh37 FASTA
            Assembly::GRCh37 => "Homo_sapiens.GRCh37.75.dna.primary_assembly.fa",
            Assembly::GRCh38 => "Homo_sapiens.GRCh38.dna.primary_assembly.fa",
        }
    }
}

/// Where the annotator lives and how long it may run
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// Annotator executable
    pub program: PathBuf,

    /// Cache and reference data directory (read-only here)
    pub data_dir: PathBuf,

    /// Parent of the per-request scratch directories
    pub tmp_dir: PathBuf,

    /// Upper bound on a single annotator run
    pub timeout: Duration,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            tmp_dir: std::env::temp_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AnnotatorConfig {
    /// Load from `VEP_PROGRAM`, `VEP_DATA_DIR`, `VEP_TMP_DIR` and
    /// `VEP_TIMEOUT_SECS`, falling back to defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout = match lookup("VEP_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        name: "VEP_TIMEOUT_SECS",
                        value: value.clone(),
                        reason: e.to_string(),
                    })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "VEP_TIMEOUT_SECS",
                        value,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            program: lookup("VEP_PROGRAM").map(PathBuf::from).unwrap_or(defaults.program),
            data_dir: lookup("VEP_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            tmp_dir: lookup("VEP_TMP_DIR").map(PathBuf::from).unwrap_or(defaults.tmp_dir),
            timeout,
        })
    }

    /// Annotator plugin directory
    pub fn plugins_dir(&self) -> PathBuf {
        self.data_dir.join("Plugins")
    }

    /// Reference FASTA path for an assembly
    pub fn fasta_path(&self, assembly: Assembly) -> PathBuf {
        self.data_dir.join(assembly.fasta_file_name())
    }
}
