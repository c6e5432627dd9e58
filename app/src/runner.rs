// ==============================================================================
// runner.rs - Annotator Subprocess Runner
// ==============================================================================
// Description: Per-request scratch files and bounded annotator execution
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::AnnotationError;
use crate::invocation::AnnotatorInvocation;
use crate::parsers::VariantLine;

const INPUT_FILE_NAME: &str = "input.vcf";
const OUTPUT_FILE_NAME: &str = "output.json";

/// Request-unique scratch directory holding the annotator's input and output.
///
/// The directory and everything in it are removed when this is dropped.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl ScratchSpace {
    /// Create a fresh scratch directory under `parent`
    pub fn create(parent: &Path) -> Result<Self, AnnotationError> {
        let dir = tempfile::Builder::new().prefix("vep-").tempdir_in(parent)?;
        let input = dir.path().join(INPUT_FILE_NAME);
        let output = dir.path().join(OUTPUT_FILE_NAME);
        debug!("Created scratch directory {:?}", dir.path());
        Ok(Self { dir, input, output })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// Output path; not created until the annotator writes it
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Write one tab-delimited row per variant line
    pub async fn write_input(&self, lines: &[VariantLine]) -> Result<(), AnnotationError> {
        let mut content = String::new();
        for line in lines {
            content.push_str(&line.to_tab_delimited());
            content.push('\n');
        }

        let mut file = tokio::fs::File::create(&self.input).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!("Wrote {} variant lines to {:?}", lines.len(), self.input);
        Ok(())
    }
}

/// Run the annotator to completion, or until `timeout` expires.
///
/// The child is killed if this future is dropped before it exits, which
/// covers both the timeout and an abandoned request.
pub async fn execute(
    invocation: &AnnotatorInvocation,
    timeout: Duration,
) -> Result<(), AnnotationError> {
    info!("Running annotator: {}", invocation.command_line());

    let child = Command::new(invocation.program())
        .args(invocation.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| AnnotationError::AnnotatorSpawn {
            program: invocation.program().display().to_string(),
            source,
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Annotator timed out after {:?}, killing it", timeout);
            return Err(AnnotationError::AnnotatorTimeout {
                seconds: timeout.as_secs(),
            });
        }
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        debug!("Annotator finished: {}", combined.trim_end());
        Ok(())
    } else {
        warn!("Annotator failed with status {}", output.status);
        Err(AnnotationError::AnnotatorExecution {
            code: output.status.code(),
            output: combined,
        })
    }
}
