use super::state::LearnerState;
use crate::app_dirs::AppDirs;
use crate::curriculum::Curriculum;
use crate::error::StoreError;
use crate::progression::OutcomeSummary;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable home of one learner's state.
pub trait LearnerStore: Send {
    /// Saved state fitted onto `curriculum`, or a fresh state when nothing is
    /// stored or the stored document is corrupt.
    ///
    /// Fails only when the store itself cannot be read. The caller must not
    /// save over a document it could not read.
    fn load(&self, curriculum: &Curriculum) -> Result<LearnerState, StoreError>;

    fn save(&mut self, state: &LearnerState) -> Result<(), StoreError>;

    /// Persist the result of a recorded quiz. Stores that keep history
    /// override this; the default only saves the new state.
    fn save_outcome(&mut self, summary: &OutcomeSummary) -> Result<(), StoreError> {
        self.save(&summary.state)
    }
}

/// Parse a stored document, falling back to a fresh state on any problem.
pub(crate) fn decode_state(bytes: &[u8], curriculum: &Curriculum, origin: &str) -> LearnerState {
    match serde_json::from_slice::<LearnerState>(bytes) {
        Ok(mut state) => {
            state.reconcile(curriculum);
            state
        }
        Err(e) => {
            tracing::warn!("learner state in {origin} is corrupt, starting fresh: {e}");
            LearnerState::initial(curriculum)
        }
    }
}

/// Learner state as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileLearnerStore {
    path: PathBuf,
}

impl FileLearnerStore {
    pub fn new() -> Self {
        let path = AppDirs::learner_state_path()
            .unwrap_or_else(|| PathBuf::from("joyo_ladder_learner.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileLearnerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LearnerStore for FileLearnerStore {
    fn load(&self, curriculum: &Curriculum) -> Result<LearnerState, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(decode_state(
                &bytes,
                curriculum,
                &self.path.display().to_string(),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(LearnerState::initial(curriculum))
            }
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", self.path.display());
                Err(e.into())
            }
        }
    }

    /// Write to a sibling temp file, then rename it over the target.
    fn save(&mut self, state: &LearnerState) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        tracing::info!("saved learner state to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the state in memory, serialized as it would be on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryLearnerStore {
    document: Option<Vec<u8>>,
}

impl MemoryLearnerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw bytes, e.g. a document from an older version.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            document: Some(bytes.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_none()
    }
}

impl LearnerStore for MemoryLearnerStore {
    fn load(&self, curriculum: &Curriculum) -> Result<LearnerState, StoreError> {
        Ok(match &self.document {
            Some(bytes) => decode_state(bytes, curriculum, "memory"),
            None => LearnerState::initial(curriculum),
        })
    }

    fn save(&mut self, state: &LearnerState) -> Result<(), StoreError> {
        self.document = Some(serde_json::to_vec(state)?);
        Ok(())
    }
}
