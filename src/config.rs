use crate::app_dirs::AppDirs;
use crate::scoring::{ScoringPolicy, StreakMultiplier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    #[strum(serialize = "phrase typing")]
    PhraseTyping,
    #[strum(serialize = "sentence builder")]
    SentenceBuilder,
    #[strum(serialize = "verb lab")]
    VerbLab,
    #[strum(serialize = "grammar memory")]
    GrammarMemory,
    #[strum(serialize = "word drop")]
    WordDrop,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::PhraseTyping,
        GameKind::SentenceBuilder,
        GameKind::VerbLab,
        GameKind::GrammarMemory,
        GameKind::WordDrop,
    ];
}

/// Tuning for one minigame. `round_duration_ms: None` means rounds have no
/// countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub round_duration_ms: Option<u64>,
    pub base_score: u32,
    pub streak_bonus_unit: u32,
    pub time_bonus_divisor_ms: Option<u64>,
    #[serde(default)]
    pub streak_multiplier: Option<StreakMultiplier>,
    /// Score with the streak as it stood before this success.
    #[serde(default)]
    pub streak_bonus_before_increment: bool,
    pub has_lives: bool,
    pub lives_count: u32,
    pub success_delay_ms: u64,
    pub failure_delay_ms: u64,
    #[serde(default)]
    pub warning_threshold_ms: Option<u64>,
}

impl GameConfig {
    pub fn phrase_typing() -> Self {
        Self {
            round_duration_ms: Some(30_000),
            base_score: 100,
            streak_bonus_unit: 10,
            time_bonus_divisor_ms: Some(100),
            streak_multiplier: None,
            streak_bonus_before_increment: true,
            has_lives: true,
            lives_count: 3,
            success_delay_ms: 500,
            failure_delay_ms: 1000,
            warning_threshold_ms: Some(5000),
        }
    }

    pub fn sentence_builder() -> Self {
        Self {
            round_duration_ms: Some(20_000),
            base_score: 100,
            streak_bonus_unit: 10,
            time_bonus_divisor_ms: Some(200),
            streak_multiplier: None,
            streak_bonus_before_increment: false,
            has_lives: false,
            lives_count: 0,
            success_delay_ms: 600,
            failure_delay_ms: 600,
            warning_threshold_ms: None,
        }
    }

    pub fn verb_lab() -> Self {
        Self {
            round_duration_ms: Some(12_000),
            base_score: 80,
            streak_bonus_unit: 10,
            time_bonus_divisor_ms: Some(250),
            streak_multiplier: None,
            streak_bonus_before_increment: false,
            has_lives: false,
            lives_count: 0,
            success_delay_ms: 600,
            failure_delay_ms: 600,
            warning_threshold_ms: None,
        }
    }

    pub fn grammar_memory() -> Self {
        Self {
            round_duration_ms: Some(60_000),
            base_score: 100,
            streak_bonus_unit: 15,
            time_bonus_divisor_ms: Some(500),
            streak_multiplier: None,
            streak_bonus_before_increment: false,
            has_lives: false,
            lives_count: 0,
            success_delay_ms: 1200,
            failure_delay_ms: 2000,
            warning_threshold_ms: None,
        }
    }

    pub fn word_drop() -> Self {
        Self {
            round_duration_ms: None,
            base_score: 20,
            streak_bonus_unit: 0,
            time_bonus_divisor_ms: None,
            streak_multiplier: Some(StreakMultiplier { step: 5, max: 5 }),
            streak_bonus_before_increment: true,
            has_lives: true,
            lives_count: 3,
            success_delay_ms: 0,
            failure_delay_ms: 0,
            warning_threshold_ms: None,
        }
    }

    pub fn for_kind(kind: GameKind) -> Self {
        match kind {
            GameKind::PhraseTyping => Self::phrase_typing(),
            GameKind::SentenceBuilder => Self::sentence_builder(),
            GameKind::VerbLab => Self::verb_lab(),
            GameKind::GrammarMemory => Self::grammar_memory(),
            GameKind::WordDrop => Self::word_drop(),
        }
    }

    pub fn scoring(&self) -> ScoringPolicy {
        ScoringPolicy {
            base_score: self.base_score,
            streak_bonus_unit: self.streak_bonus_unit,
            time_bonus_divisor_ms: self.time_bonus_divisor_ms,
            streak_multiplier: self.streak_multiplier,
            streak_bonus_before_increment: self.streak_bonus_before_increment,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::phrase_typing()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub tick_interval_ms: u64,
    pub phrase_typing: GameConfig,
    pub sentence_builder: GameConfig,
    pub verb_lab: GameConfig,
    pub grammar_memory: GameConfig,
    pub word_drop: GameConfig,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: crate::clock::DEFAULT_TICK_MS,
            phrase_typing: GameConfig::phrase_typing(),
            sentence_builder: GameConfig::sentence_builder(),
            verb_lab: GameConfig::verb_lab(),
            grammar_memory: GameConfig::grammar_memory(),
            word_drop: GameConfig::word_drop(),
        }
    }
}

impl ArcadeConfig {
    pub fn game(&self, kind: GameKind) -> &GameConfig {
        match kind {
            GameKind::PhraseTyping => &self.phrase_typing,
            GameKind::SentenceBuilder => &self.sentence_builder,
            GameKind::VerbLab => &self.verb_lab,
            GameKind::GrammarMemory => &self.grammar_memory,
            GameKind::WordDrop => &self.word_drop,
        }
    }

    /// Parse a possibly partial config. Every absent key, including fields
    /// inside a game section, keeps its default for that game.
    pub fn from_json(data: &[u8]) -> Result<Self, StoreError> {
        let overrides: Value = serde_json::from_slice(data)?;
        let mut merged = serde_json::to_value(Self::default())?;
        merge_json(&mut merged, overrides);
        Ok(serde_json::from_value(merged)?)
    }
}

/// Overlay `overrides` onto `base`, recursing through objects.
fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

pub trait ConfigStore {
    fn load(&self) -> ArcadeConfig;
    fn save(&self, cfg: &ArcadeConfig) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> ArcadeConfig {
        let Ok(bytes) = fs::read(&self.path) else {
            return ArcadeConfig::default();
        };
        match ArcadeConfig::from_json(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!(
                    "falling back to default config, {} is invalid: {err}",
                    self.path.display()
                );
                ArcadeConfig::default()
            }
        }
    }

    fn save(&self, cfg: &ArcadeConfig) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
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
        let cfg = ArcadeConfig::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = ArcadeConfig {
            tick_interval_ms: 50,
            verb_lab: GameConfig {
                round_duration_ms: Some(8000),
                ..GameConfig::verb_lab()
            },
            ..ArcadeConfig::default()
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
        assert_eq!(loaded.game(GameKind::VerbLab).round_duration_ms, Some(8000));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), ArcadeConfig::default());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"[1, 2").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), ArcadeConfig::default());
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"tick_interval_ms": 40}"#).unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.tick_interval_ms, 40);
        assert_eq!(loaded.word_drop, GameConfig::word_drop());
    }

    #[test]
    fn partial_game_section_keeps_other_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            br#"{"tick_interval_ms": 40, "verb_lab": {"round_duration_ms": 8000}, "word_drop": {"streak_multiplier": null}}"#,
        )
        .unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.tick_interval_ms, 40);
        assert_eq!(
            loaded.verb_lab,
            GameConfig {
                round_duration_ms: Some(8000),
                ..GameConfig::verb_lab()
            }
        );
        assert_eq!(loaded.word_drop.streak_multiplier, None);
        assert_eq!(loaded.word_drop.lives_count, 3);
        assert_eq!(loaded.phrase_typing, GameConfig::phrase_typing());
    }

    #[test]
    fn wrongly_typed_field_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"verb_lab": {"base_score": "lots"}}"#).unwrap();
        assert_eq!(
            FileConfigStore::with_path(&path).load(),
            ArcadeConfig::default()
        );
    }

    #[test]
    fn per_game_tuning() {
        for kind in GameKind::ALL {
            let cfg = GameConfig::for_kind(kind);
            assert!(cfg.base_score > 0, "{kind}");
            assert_eq!(cfg.has_lives, cfg.lives_count > 0, "{kind}");
        }
        assert_eq!(GameConfig::word_drop().round_duration_ms, None);
        assert_eq!(GameKind::GrammarMemory.to_string(), "grammar memory");
    }
}
