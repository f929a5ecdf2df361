use crate::language::{CatalogError, PhraseEngine, PhraseResult};
use crate::stats::{ErrorStatsTracker, StatsSnapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Everything a play session owns: error history, phrase engine and the
/// random source. One session is moved into a round machine at a time and
/// handed back with `RoundMachine::into_session`.
pub struct Session {
    stats: ErrorStatsTracker,
    engine: PhraseEngine,
    rng: StdRng,
}

impl Session {
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self::with_engine(PhraseEngine::builtin()?, StdRng::from_entropy()))
    }

    /// Deterministic session for replays and tests
    pub fn seeded(seed: u64) -> Result<Self, CatalogError> {
        Ok(Self::with_engine(
            PhraseEngine::builtin()?,
            StdRng::seed_from_u64(seed),
        ))
    }

    pub fn with_engine(engine: PhraseEngine, rng: StdRng) -> Self {
        Self {
            stats: ErrorStatsTracker::new(),
            engine,
            rng,
        }
    }

    /// Next phrase, weighted by the errors recorded so far.
    pub fn generate_phrase(&mut self) -> PhraseResult {
        let snapshot = self.stats.snapshot();
        self.engine.generate(&snapshot, &mut self.rng)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn stats(&self) -> &ErrorStatsTracker {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut ErrorStatsTracker {
        &mut self.stats
    }

    pub fn engine(&self) -> &PhraseEngine {
        &self.engine
    }

    pub fn export_snapshot(&self) -> StatsSnapshot {
        self.stats.export_snapshot()
    }

    pub fn import_snapshot(&mut self, snapshot: StatsSnapshot) {
        self.stats.import_snapshot(snapshot);
    }

    /// Forget everything recorded; used when a new player session begins.
    pub fn reset(&mut self) {
        log::debug!("resetting session stats");
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sessions_agree() {
        let mut a = Session::seeded(3).unwrap();
        let mut b = Session::seeded(3).unwrap();
        for _ in 0..10 {
            assert_eq!(a.generate_phrase(), b.generate_phrase());
        }
    }

    #[test]
    fn test_errors_steer_generation() {
        let mut session = Session::seeded(9).unwrap();
        for _ in 0..60 {
            session.stats_mut().record_error("Third Conditional");
        }

        let hits = (0..200)
            .filter(|_| session.generate_phrase().pattern_id == "Third Conditional")
            .count();
        // weight 61 against four patterns of weight 1
        assert!(hits > 150, "only {hits} third conditional phrases");
    }

    #[test]
    fn test_difficulty_reflects_recorded_errors() {
        let mut session = Session::seeded(1).unwrap();
        for _ in 0..200 {
            session.stats_mut().record_error("Past Simple Regular");
        }
        let phrase = loop {
            let phrase = session.generate_phrase();
            if phrase.pattern_id == "Past Simple Regular" {
                break phrase;
            }
        };
        assert_eq!(phrase.difficulty, 10);
    }

    #[test]
    fn test_snapshot_and_reset() {
        let mut session = Session::seeded(2).unwrap();
        session.stats_mut().record_error("Present Perfect");
        session.stats_mut().record_completion_time("Present Perfect", 3100);
        let snapshot = session.export_snapshot();

        session.reset();
        assert_eq!(session.stats().total_errors(), 0);

        session.import_snapshot(snapshot.clone());
        assert_eq!(session.stats().error_count("Present Perfect"), 1);
        assert_eq!(session.export_snapshot(), snapshot);
    }
}
