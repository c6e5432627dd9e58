// ==============================================================================
// provisioner.rs - Annotator Cache Provisioning
// ==============================================================================
// Description: Fetches cache archives and reference FASTAs into the data
//              directory and unpacks them
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Transfers use the external rsync utility, tar archives the external tar
// utility; gzip is decompressed in-process.
// ==============================================================================

use flate2::read::GzDecoder;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader as AsyncBufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::sources::{file_name, sources, to_rsync_url};

/// Name prefix of scratch files inside the data directory
const TEMP_PREFIX: &str = "tmp";

/// Cache provisioning errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Error rsyncing file '{url}': {}", exit_label(*code))]
    Transfer { url: String, code: Option<i32> },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot unzip file {}: {reason}", file.display())]
    Extract { file: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "killed by signal".to_string(),
    }
}

/// Result of a populate run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// Sentinel marker present and not forced; nothing was done
    AlreadyPopulated,
    /// Every source was fetched and unpacked
    Populated { fetched: usize },
}

/// Populates the shared annotator data directory
#[derive(Debug, Clone)]
pub struct CacheProvisioner {
    data_dir: PathBuf,
    marker: PathBuf,
    rsync: PathBuf,
    tar: PathBuf,
}

impl CacheProvisioner {
    pub fn new(data_dir: impl Into<PathBuf>, marker: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            marker: marker.into(),
            rsync: PathBuf::from("rsync"),
            tar: PathBuf::from("tar"),
        }
    }

    /// Use specific rsync and tar executables
    pub fn with_programs(mut self, rsync: impl Into<PathBuf>, tar: impl Into<PathBuf>) -> Self {
        self.rsync = rsync.into();
        self.tar = tar.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// True once a populate run has completed
    pub fn is_installed(&self) -> bool {
        self.marker.is_file()
    }

    /// Fetch and unpack every source for `release` unless already installed
    pub async fn populate(
        &self,
        release: &str,
        skip_grch37: bool,
        force: bool,
    ) -> Result<PopulateOutcome, ProvisionError> {
        self.cleanup_temporary_files();

        if self.is_installed() && !force {
            info!("VEP cache is already populated, doing nothing.");
            return Ok(PopulateOutcome::AlreadyPopulated);
        }

        info!("Populating VEP cache for release {}...", release);
        warn!("...this can take a VERY LONG time...");
        warn!("...please be patient.");

        std::fs::create_dir_all(&self.data_dir)?;

        let urls = sources(release, skip_grch37);
        for url in &urls {
            self.fetch_and_extract(url, true).await?;
        }

        self.touch_marker()?;
        info!("VEP cache populated ({} sources)", urls.len());

        Ok(PopulateOutcome::Populated { fetched: urls.len() })
    }

    /// Transfer `url` into the data directory and unpack it.
    ///
    /// Returns false when the local file exists and `force` is not set.
    pub async fn fetch_and_extract(&self, url: &str, force: bool) -> Result<bool, ProvisionError> {
        let rsync_url = to_rsync_url(url);
        let local_file = self.data_dir.join(file_name(&rsync_url));

        if !force && local_file.is_file() {
            warn!("File {:?} already exists, skipping.", local_file);
            return Ok(false);
        }

        self.transfer(&rsync_url).await?;
        self.unpack(&local_file).await?;
        Ok(true)
    }

    async fn transfer(&self, url: &str) -> Result<(), ProvisionError> {
        let name = file_name(url).to_string();
        info!(
            "Executing '{} -ahP {} {}'...",
            self.rsync.display(),
            url,
            self.data_dir.display()
        );

        let mut child = Command::new(&self.rsync)
            .arg("-ahP")
            .arg(url)
            .arg(&self.data_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProvisionError::Spawn {
                program: self.rsync.display().to_string(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = AsyncBufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if !line.is_empty() {
                    debug!("{}: {}", name, line);
                }
            }
        }

        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Transfer {
                url: url.to_string(),
                code: status.code(),
            })
        }
    }

    /// Gunzip `file` next to itself, then untar the result if it is a tar
    pub async fn unpack(&self, file: &Path) -> Result<(), ProvisionError> {
        let mut file = file.to_path_buf();

        if has_extension(&file, "gz") {
            let target = match file.file_stem() {
                Some(stem) => self.data_dir.join(stem),
                None => {
                    return Err(ProvisionError::Extract {
                        file,
                        reason: "no file name".to_string(),
                    })
                }
            };

            if target.is_file() {
                debug!("{:?} already decompressed", target);
            } else {
                info!("Gunzip {:?}...", file);
                let source = file.clone();
                let destination = target.clone();
                let partial = self.temporary_path(&target);
                tokio::task::spawn_blocking(move || gunzip(&source, &partial, &destination))
                    .await
                    .map_err(|e| ProvisionError::Extract {
                        file: file.clone(),
                        reason: e.to_string(),
                    })?
                    .map_err(|e| ProvisionError::Extract {
                        file: file.clone(),
                        reason: e.to_string(),
                    })?;
            }
            file = target;
        }

        if has_extension(&file, "tar") {
            info!("Untar {:?} to {:?}...", file, self.data_dir);
            let status = Command::new(&self.tar)
                .arg("-xf")
                .arg(&file)
                .arg("-C")
                .arg(&self.data_dir)
                .status()
                .await
                .map_err(|source| ProvisionError::Spawn {
                    program: self.tar.display().to_string(),
                    source,
                })?;
            if !status.success() {
                return Err(ProvisionError::Extract {
                    file,
                    reason: format!("tar failed with {}", exit_label(status.code())),
                });
            }
        }

        Ok(())
    }

    /// Remove leftover scratch files from the data directory.
    ///
    /// Returns the number of files removed; failures are logged only.
    pub fn cleanup_temporary_files(&self) -> usize {
        info!("Removing temporary files from the cache ({:?})...", self.data_dir);

        let mut removed = 0;
        for entry in WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let is_temp = entry.file_type().is_file()
                && entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX);
            if !is_temp {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => error!("Failed to remove {:?}: {}", entry.path(), e),
            }
        }

        removed
    }

    /// Scratch path for `target`, swept by the next cleanup if abandoned
    fn temporary_path(&self, target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.data_dir.join(format!("{}.{}", TEMP_PREFIX, name))
    }

    fn touch_marker(&self) -> Result<(), ProvisionError> {
        if let Some(parent) = self.marker.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.marker)?;
        Ok(())
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().map(|e| e == ext).unwrap_or(false)
}

/// Decompress `source` via `partial`, renamed onto `destination` when done
fn gunzip(source: &Path, partial: &Path, destination: &Path) -> std::io::Result<()> {
    let result = (|| {
        let mut decoder = GzDecoder::new(BufReader::new(File::open(source)?));
        let mut writer = BufWriter::new(File::create(partial)?);
        std::io::copy(&mut decoder, &mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        std::fs::rename(partial, destination)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(partial);
    }
    result
}
