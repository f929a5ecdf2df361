use crate::config::StoreError;
use crate::util::mean;
use chrono::Utc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Completion-time samples kept per pattern.
pub const MAX_COMPLETION_SAMPLES: usize = 5;
/// Error events kept in the recent history.
pub const MAX_RECENT_ERRORS: usize = 10;

/// One recorded mistake, timestamped in Unix milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub pattern_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternErrorCount {
    pub pattern_id: String,
    pub errors: u32,
}

/// Read-only copy of the error counts, handed to the phrase engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSnapshot {
    counts: HashMap<String, u32>,
}

impl ErrorSnapshot {
    pub fn get(&self, pattern_id: &str) -> u32 {
        self.counts.get(pattern_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ErrorSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Aggregate view used for end-of-game summaries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_errors: u32,
    pub patterns_with_errors: usize,
    pub recent_error_rate: f64,
    pub overall_difficulty: u8,
    pub top_problem_patterns: Vec<PatternErrorCount>,
}

/// Persistence shape. Every field is optional so partial records import
/// cleanly; absent fields leave the tracker's current values untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_counts: Option<Vec<(String, u32)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_times: Option<Vec<(String, Vec<u64>)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_errors: Option<Vec<ErrorEvent>>,
}

impl StatsSnapshot {
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(data)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PatternErrors {
    count: u32,
    first_seen: usize,
}

/// Per-session record of where the player struggles.
#[derive(Debug, Clone, Default)]
pub struct ErrorStatsTracker {
    error_counts: HashMap<String, PatternErrors>,
    next_seen: usize,
    completion_times: HashMap<String, VecDeque<u64>>,
    recent_errors: VecDeque<ErrorEvent>,
}

impl ErrorStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_error(&mut self, pattern_id: &str) {
        self.record_error_at(pattern_id, Utc::now().timestamp_millis());
    }

    pub fn record_error_at(&mut self, pattern_id: &str, timestamp: i64) {
        self.bump(pattern_id, 1);
        self.recent_errors.push_back(ErrorEvent {
            pattern_id: pattern_id.to_string(),
            timestamp,
        });
        while self.recent_errors.len() > MAX_RECENT_ERRORS {
            self.recent_errors.pop_front();
        }
    }

    pub fn record_completion_time(&mut self, pattern_id: &str, ms: u64) {
        let samples = self
            .completion_times
            .entry(pattern_id.to_string())
            .or_default();
        samples.push_back(ms);
        while samples.len() > MAX_COMPLETION_SAMPLES {
            samples.pop_front();
        }
    }

    pub fn error_count(&self, pattern_id: &str) -> u32 {
        self.error_counts.get(pattern_id).map_or(0, |e| e.count)
    }

    pub fn completion_times(&self, pattern_id: &str) -> Vec<u64> {
        self.completion_times
            .get(pattern_id)
            .map(|samples| samples.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn average_completion_time(&self, pattern_id: &str) -> Option<f64> {
        let samples: Vec<f64> = self
            .completion_times
            .get(pattern_id)?
            .iter()
            .map(|&ms| ms as f64)
            .collect();
        mean(&samples)
    }

    pub fn recent_errors(&self) -> impl Iterator<Item = &ErrorEvent> {
        self.recent_errors.iter()
    }

    pub fn snapshot(&self) -> ErrorSnapshot {
        self.error_counts
            .iter()
            .map(|(id, e)| (id.clone(), e.count))
            .collect()
    }

    pub fn total_errors(&self) -> u32 {
        self.error_counts.values().map(|e| e.count).sum()
    }

    /// 1 with no errors, otherwise half the mean errors per erroring pattern
    /// plus one, capped at 10.
    pub fn overall_difficulty(&self) -> u8 {
        let patterns = self.error_counts.values().filter(|e| e.count > 0).count();
        if patterns == 0 {
            return 1;
        }
        let mean_errors = self.total_errors() as f64 / patterns as f64;
        ((mean_errors / 2.0).floor() as u64 + 1).clamp(1, 10) as u8
    }

    pub fn top_problem_patterns(&self, n: usize) -> Vec<PatternErrorCount> {
        self.error_counts
            .iter()
            .sorted_by(|a, b| {
                b.1.count
                    .cmp(&a.1.count)
                    .then(a.1.first_seen.cmp(&b.1.first_seen))
            })
            .take(n)
            .map(|(id, e)| PatternErrorCount {
                pattern_id: id.clone(),
                errors: e.count,
            })
            .collect()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            total_errors: self.total_errors(),
            patterns_with_errors: self.error_counts.values().filter(|e| e.count > 0).count(),
            recent_error_rate: self.recent_errors.len() as f64 / MAX_RECENT_ERRORS as f64,
            overall_difficulty: self.overall_difficulty(),
            top_problem_patterns: self.top_problem_patterns(3),
        }
    }

    pub fn reset(&mut self) {
        self.error_counts.clear();
        self.next_seen = 0;
        self.completion_times.clear();
        self.recent_errors.clear();
    }

    pub fn export_snapshot(&self) -> StatsSnapshot {
        let error_counts = self
            .error_counts
            .iter()
            .sorted_by_key(|(_, e)| e.first_seen)
            .map(|(id, e)| (id.clone(), e.count))
            .collect();
        let completion_times = self
            .completion_times
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .map(|(id, samples)| (id.clone(), samples.iter().copied().collect()))
            .collect();

        StatsSnapshot {
            error_counts: Some(error_counts),
            completion_times: Some(completion_times),
            recent_errors: Some(self.recent_errors.iter().cloned().collect()),
        }
    }

    pub fn import_snapshot(&mut self, snapshot: StatsSnapshot) {
        if let Some(counts) = snapshot.error_counts {
            self.error_counts.clear();
            self.next_seen = 0;
            for (id, count) in counts {
                self.error_counts.remove(&id);
                self.bump(&id, count);
            }
        }
        if let Some(times) = snapshot.completion_times {
            self.completion_times = times
                .into_iter()
                .map(|(id, samples)| {
                    let skip = samples.len().saturating_sub(MAX_COMPLETION_SAMPLES);
                    (id, samples.into_iter().skip(skip).collect())
                })
                .collect();
        }
        if let Some(recent) = snapshot.recent_errors {
            let skip = recent.len().saturating_sub(MAX_RECENT_ERRORS);
            self.recent_errors = recent.into_iter().skip(skip).collect();
        }
    }

    fn bump(&mut self, pattern_id: &str, by: u32) {
        let next_seen = &mut self.next_seen;
        let entry = self
            .error_counts
            .entry(pattern_id.to_string())
            .or_insert_with(|| {
                let first_seen = *next_seen;
                *next_seen += 1;
                PatternErrors {
                    count: 0,
                    first_seen,
                }
            });
        entry.count = entry.count.saturating_add(by);
    }
}

pub trait SnapshotStore {
    fn load(&self) -> Option<StatsSnapshot>;
    fn save(&self, snapshot: &StatsSnapshot) -> Result<(), StoreError>;
}

/// JSON file holding the last exported stats snapshot
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new() -> Self {
        Self {
            path: crate::app_dirs::AppDirs::snapshot_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileSnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Option<StatsSnapshot> {
        let data = fs::read_to_string(&self.path).ok()?;
        match StatsSnapshot::from_json(&data) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                log::warn!(
                    "ignoring unreadable stats snapshot {}: {err}",
                    self.path.display()
                );
                None
            }
        }
    }

    fn save(&self, snapshot: &StatsSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, snapshot.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_error_counts_and_defaults() {
        let mut tracker = ErrorStatsTracker::new();
        assert_eq!(tracker.error_count("Present Perfect"), 0);

        tracker.record_error("Present Perfect");
        tracker.record_error("Present Perfect");
        tracker.record_error("Past Continuous");

        assert_eq!(tracker.error_count("Present Perfect"), 2);
        assert_eq!(tracker.error_count("Past Continuous"), 1);
        assert_eq!(tracker.total_errors(), 3);
        assert_eq!(tracker.recent_errors().count(), 3);
    }

    #[test]
    fn test_recent_errors_keep_last_ten() {
        let mut tracker = ErrorStatsTracker::new();
        for i in 0..14 {
            tracker.record_error_at(&format!("p{i}"), i);
        }

        let recent: Vec<i64> = tracker.recent_errors().map(|e| e.timestamp).collect();
        assert_eq!(recent, (4..14).collect::<Vec<i64>>());
    }

    #[test]
    fn test_completion_times_keep_last_five() {
        let mut tracker = ErrorStatsTracker::new();
        for ms in [100, 200, 300, 400, 500, 600, 700] {
            tracker.record_completion_time("Third Conditional", ms);
        }

        assert_eq!(
            tracker.completion_times("Third Conditional"),
            vec![300, 400, 500, 600, 700]
        );
        assert_eq!(tracker.average_completion_time("Third Conditional"), Some(500.0));
        assert_eq!(tracker.average_completion_time("unknown"), None);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error("a");
        let snapshot = tracker.snapshot();

        tracker.record_error("a");
        tracker.record_error("b");

        assert_eq!(snapshot.get("a"), 1);
        assert_eq!(snapshot.get("b"), 0);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_overall_difficulty() {
        let mut tracker = ErrorStatsTracker::new();
        assert_eq!(tracker.overall_difficulty(), 1);

        // 5 errors over 2 patterns: mean 2.5 -> floor(1.25) + 1
        for _ in 0..4 {
            tracker.record_error("a");
        }
        tracker.record_error("b");
        assert_eq!(tracker.overall_difficulty(), 2);

        for _ in 0..60 {
            tracker.record_error("b");
        }
        assert_eq!(tracker.overall_difficulty(), 10);
    }

    #[test]
    fn test_top_problem_patterns_ties_by_first_seen() {
        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error("first");
        tracker.record_error("second");
        tracker.record_error("third");
        tracker.record_error("third");
        tracker.record_error("second");

        let top: Vec<(String, u32)> = tracker
            .top_problem_patterns(3)
            .into_iter()
            .map(|p| (p.pattern_id, p.errors))
            .collect();
        assert_eq!(
            top,
            vec![
                ("second".to_string(), 2),
                ("third".to_string(), 2),
                ("first".to_string(), 1),
            ]
        );
        assert_eq!(tracker.top_problem_patterns(1).len(), 1);
    }

    #[test]
    fn test_summary() {
        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error("a");
        tracker.record_error("b");

        let summary = tracker.summary();
        assert_eq!(summary.total_errors, 2);
        assert_eq!(summary.patterns_with_errors, 2);
        assert!((summary.recent_error_rate - 0.2).abs() < f64::EPSILON);
        assert_eq!(summary.overall_difficulty, 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error("a");
        tracker.record_completion_time("a", 1200);

        tracker.reset();

        assert!(tracker.snapshot().is_empty());
        assert!(tracker.completion_times("a").is_empty());
        assert_eq!(tracker.recent_errors().count(), 0);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error_at("Past Simple Regular", 10);
        tracker.record_error_at("Third Conditional", 20);
        tracker.record_error_at("Third Conditional", 30);
        tracker.record_completion_time("Past Simple Regular", 2400);
        tracker.record_completion_time("Past Simple Regular", 1800);

        let exported = tracker.export_snapshot();
        let mut restored = ErrorStatsTracker::new();
        restored.import_snapshot(exported.clone());

        assert_eq!(restored.export_snapshot(), exported);
        assert_eq!(restored.snapshot(), tracker.snapshot());
        assert_eq!(
            restored.top_problem_patterns(2),
            tracker.top_problem_patterns(2)
        );
    }

    #[test]
    fn test_import_partial_keeps_missing_fields() {
        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error_at("a", 1);
        tracker.record_completion_time("a", 900);

        let partial = StatsSnapshot::from_json(r#"{"errorCounts": [["b", 4]]}"#).unwrap();
        tracker.import_snapshot(partial);

        assert_eq!(tracker.error_count("a"), 0);
        assert_eq!(tracker.error_count("b"), 4);
        assert_eq!(tracker.completion_times("a"), vec![900]);
        assert_eq!(tracker.recent_errors().count(), 1);
    }

    #[test]
    fn test_import_caps_oversized_lists() {
        let snapshot = StatsSnapshot {
            error_counts: None,
            completion_times: Some(vec![("a".to_string(), (1..=8).collect())]),
            recent_errors: Some(
                (0..12)
                    .map(|i| ErrorEvent {
                        pattern_id: "a".to_string(),
                        timestamp: i,
                    })
                    .collect(),
            ),
        };

        let mut tracker = ErrorStatsTracker::new();
        tracker.import_snapshot(snapshot);

        assert_eq!(tracker.completion_times("a"), vec![4, 5, 6, 7, 8]);
        assert_eq!(tracker.recent_errors().count(), MAX_RECENT_ERRORS);
        assert_eq!(tracker.recent_errors().next().unwrap().timestamp, 2);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error_at("a", 42);

        let json = tracker.export_snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["errorCounts"][0][0], "a");
        assert_eq!(value["errorCounts"][0][1], 1);
        assert_eq!(value["recentErrors"][0]["patternId"], "a");
        assert_eq!(value["recentErrors"][0]["timestamp"], 42);
    }

    #[test]
    fn test_snapshot_ignores_unknown_fields() {
        let snapshot = StatsSnapshot::from_json(r#"{"score": 12, "recentErrors": []}"#).unwrap();
        assert_eq!(snapshot.recent_errors, Some(vec![]));
        assert_eq!(snapshot.error_counts, None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::with_path(dir.path().join("nested").join("stats.json"));
        assert_eq!(store.load(), None);

        let mut tracker = ErrorStatsTracker::new();
        tracker.record_error_at("a", 5);
        let snapshot = tracker.export_snapshot();

        store.save(&snapshot).unwrap();
        assert_eq!(store.load(), Some(snapshot));
    }

    #[test]
    fn test_file_store_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileSnapshotStore::with_path(&path);
        assert_eq!(store.load(), None);
    }
}
