use crate::curriculum::TierId;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// What a tier must reach before the next tier opens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnlockThreshold {
    pub min_mastered_items: usize,
    pub min_sessions_played: u32,
}

impl Default for UnlockThreshold {
    fn default() -> Self {
        Self {
            min_mastered_items: 20,
            min_sessions_played: 3,
        }
    }
}

impl UnlockThreshold {
    pub fn new(min_mastered_items: usize, min_sessions_played: u32) -> Self {
        Self {
            min_mastered_items,
            min_sessions_played,
        }
    }

    /// A tier with fewer items than the mastery requirement only needs all of them.
    pub fn clamped_to(self, tier_size: usize) -> Self {
        Self {
            min_mastered_items: self.min_mastered_items.min(tier_size),
            ..self
        }
    }

    pub fn is_met(&self, mastered: usize, sessions: u32) -> bool {
        mastered >= self.min_mastered_items && sessions >= self.min_sessions_played
    }
}

/// Tunable policy of the progression engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Correct answers needed before an item counts as mastered.
    pub mastery_threshold: u32,
    pub xp_per_correct: u32,
    /// Extra XP per correct answer for each rank above the first tier.
    pub xp_tier_bonus: u32,
    pub perfect_quiz_bonus: u32,
    pub default_question_count: usize,
    pub default_unlock: UnlockThreshold,
    pub unlock_thresholds: BTreeMap<TierId, UnlockThreshold>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: 3,
            xp_per_correct: 10,
            xp_tier_bonus: 2,
            perfect_quiz_bonus: 20,
            default_question_count: 10,
            default_unlock: UnlockThreshold::default(),
            unlock_thresholds: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Unclamped threshold for `tier`, falling back to the default.
    pub fn unlock_threshold_for(&self, tier: &TierId) -> UnlockThreshold {
        self.unlock_thresholds
            .get(tier)
            .copied()
            .unwrap_or(self.default_unlock)
    }
}

pub trait ConfigStore {
    fn load(&self) -> EngineConfig;
    fn save(&self, cfg: &EngineConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", crate::app_dirs::APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("joyo_ladder_config.json")
        };
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
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> EngineConfig {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<EngineConfig>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("ignoring unreadable config {}: {e}", self.path.display());
                }
            }
        }
        EngineConfig::default()
    }

    fn save(&self, cfg: &EngineConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = EngineConfig::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_thresholds() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let mut cfg = EngineConfig {
            mastery_threshold: 5,
            default_question_count: 20,
            ..EngineConfig::default()
        };
        cfg.unlock_thresholds
            .insert(TierId::from("1"), UnlockThreshold::new(5, 2));
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
        assert_eq!(
            loaded.unlock_threshold_for(&TierId::from("1")),
            UnlockThreshold::new(5, 2)
        );
        assert_eq!(
            loaded.unlock_threshold_for(&TierId::from("2")),
            UnlockThreshold::default()
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "mastery_threshold": 4 }"#).unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.mastery_threshold, 4);
        assert_eq!(loaded.xp_per_correct, EngineConfig::default().xp_per_correct);
    }

    #[test]
    fn missing_or_garbage_config_yields_default() {
        let dir = tempdir().unwrap();
        let missing = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(missing.load(), EngineConfig::default());

        let path = dir.path().join("config.json");
        fs::write(&path, b"{not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), EngineConfig::default());
    }

    #[test]
    fn threshold_clamps_and_checks() {
        let threshold = UnlockThreshold::new(20, 3).clamped_to(8);
        assert_eq!(threshold.min_mastered_items, 8);
        assert!(!threshold.is_met(8, 2));
        assert!(!threshold.is_met(7, 3));
        assert!(threshold.is_met(8, 3));
    }
}
