//! Persisted gateway state
//!
//! Records the identifiers of everything a previous run provisioned, so the
//! next run can find and reuse it. Stored as pretty-printed JSON in
//! `gateway_config.json` by default.
//!
//! The file is a cache, not a log: every successful run rewrites it whole.

use crate::cloud::ClientInfo;
use crate::error::{Result, SetupError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default file name for the persisted snapshot
pub const DEFAULT_STATE_FILE: &str = "gateway_config.json";

/// Whether a stored identifier can be used.
///
/// Rejects empty values and template placeholders such as `<GATEWAY_ID>`
/// left behind in a hand-edited file.
pub fn is_usable_id(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.contains('<') && !value.contains('>')
}

fn usable(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| is_usable_id(v))
}

/// Identifiers recorded by the last successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub gateway_url: Option<String>,
    pub gateway_id: Option<String>,
    pub gateway_arn: Option<String>,
    pub region: Option<String>,
    pub client_info: Option<ClientInfo>,
    #[serde(rename = "lambda_arn")]
    pub compute_arn: Option<String>,
}

impl Snapshot {
    /// Gateway id, if it is a real value.
    ///
    /// Without one the whole snapshot is untrusted.
    pub fn gateway_id(&self) -> Option<&str> {
        usable(&self.gateway_id)
    }

    pub fn compute_arn(&self) -> Option<&str> {
        usable(&self.compute_arn)
    }

    /// Client credentials, if complete
    pub fn client_info(&self) -> Option<&ClientInfo> {
        self.client_info.as_ref().filter(|c| c.is_usable())
    }

    pub fn is_trusted(&self) -> bool {
        self.gateway_id().is_some()
    }
}

/// Reads and writes the snapshot file
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file as-is, without the trust check.
    ///
    /// Missing, unreadable and malformed files all read as `None`.
    pub fn read(&self) -> Option<Snapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No state file at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read state file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Ignoring malformed state file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Load the snapshot if it can be trusted.
    ///
    /// A snapshot whose gateway id is missing or a placeholder is treated
    /// as absent, which sends the run down the discovery path.
    pub fn load(&self) -> Option<Snapshot> {
        let snapshot = self.read()?;
        if !snapshot.is_trusted() {
            info!(
                "State file {} has no usable gateway id, ignoring it",
                self.path.display()
            );
            return None;
        }
        Some(snapshot)
    }

    /// Replace the file with `snapshot`.
    ///
    /// Writes to a temporary file beside the target and renames it over.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.write_error(e))?;

        let json = serde_json::to_string_pretty(snapshot)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .map_err(|e| self.write_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        debug!("Wrote state file {}", self.path.display());
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> SetupError {
        SetupError::StateWrite {
            path: self.path.clone(),
            source,
        }
    }
}
