use crate::clock::{ClockSignal, RoundClock, DEFAULT_TICK_MS};
use crate::config::GameConfig;
use crate::language::PhraseResult;
use crate::runtime::{ArcadeEvent, MonotonicTime, TimeSource};
use crate::scoring::ScoringPolicy;
use crate::session::Session;
use crate::stats::StatsSummary;

/// Boundary, in ms of remaining time, at which low-time warnings repeat.
const WARNING_STEP_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RoundState {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "playing")]
    Playing,
    #[strum(serialize = "evaluating")]
    Evaluating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
    Char(char),
    Backspace,
    /// A whole typed word or answer
    Text(String),
    /// Index of a clicked option, pool word or card
    Pick(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Retracted,
    Selected,
}

/// What the shell should show for the current round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundContent {
    pub prompt: String,
    /// Options, pool words, cards or grid cells, depending on the game
    pub items: Vec<String>,
    pub pattern_id: Option<String>,
    pub difficulty: Option<u8>,
}

impl RoundContent {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }

    pub fn with_pattern(mut self, pattern_id: impl Into<String>) -> Self {
        self.pattern_id = Some(pattern_id.into());
        self
    }
}

impl From<PhraseResult> for RoundContent {
    fn from(phrase: PhraseResult) -> Self {
        Self {
            prompt: phrase.text,
            items: Vec::new(),
            pattern_id: Some(phrase.pattern_id),
            difficulty: Some(phrase.difficulty),
        }
    }
}

/// A content source's judgement of one input or one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ignored,
    Mark { index: usize, outcome: Outcome },
    Retreat { index: usize },
    /// The visible content changed without ending the round
    Updated(RoundContent),
    Match { weight: u32 },
    Mismatch,
    Solved { award: bool },
    Failed,
    LifeLost,
}

/// Per-minigame content: what to show and how to judge input against it.
pub trait ContentSource {
    /// Fresh content for a new round.
    fn prepare(&mut self, session: &mut Session) -> RoundContent;

    fn evaluate(&mut self, input: &PlayerInput) -> Vec<Verdict>;

    /// Called on every tick while playing.
    fn advance(&mut self, _session: &mut Session, _now_ms: u64) -> Vec<Verdict> {
        Vec::new()
    }

    /// Content to show after the round timed out, if it differs.
    fn reveal(&mut self) -> Option<RoundContent> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Correct,
    Incorrect,
    Complete,
    Warning,
}

/// Receiver for audio/haptic cues. Nothing flows back.
pub trait FeedbackSink {
    fn cue(&mut self, cue: Cue);
}

impl<F: FnMut(Cue)> FeedbackSink for F {
    fn cue(&mut self, cue: Cue) {
        self(cue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBoard {
    pub score: u32,
    pub streak: u32,
    pub lives: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub success: bool,
    pub timed_out: bool,
    pub points: u32,
    pub elapsed_ms: u64,
    pub pattern_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub score: u32,
    pub rounds_played: u32,
    pub rounds_won: u32,
    pub best_streak: u32,
    pub stats: StatsSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    ContentChanged(RoundContent),
    ItemEvaluated { index: usize, outcome: Outcome },
    TimerTicked { remaining_ms: u64, fraction: f64 },
    ScoreChanged(ScoreBoard),
    RoundEnded(RoundResult),
    GameOver(GameSummary),
}

/// The round controller shared by every minigame.
pub struct RoundMachine<C: ContentSource, T: TimeSource = MonotonicTime> {
    config: GameConfig,
    scoring: ScoringPolicy,
    content: C,
    session: Session,
    time: T,
    clock: RoundClock,
    feedback: Option<Box<dyn FeedbackSink>>,
    state: RoundState,
    score: u32,
    streak: u32,
    best_streak: u32,
    lives: u32,
    rounds_played: u32,
    rounds_won: u32,
    active: Option<RoundContent>,
    round_started_at: u64,
    next_round_at: Option<u64>,
    last_remaining: Option<u64>,
    events: Vec<RoundEvent>,
}

impl<C: ContentSource> RoundMachine<C, MonotonicTime> {
    pub fn new(config: GameConfig, content: C, session: Session) -> Self {
        Self::with_time(config, content, session, MonotonicTime::new())
    }
}

impl<C: ContentSource, T: TimeSource> RoundMachine<C, T> {
    pub fn with_time(config: GameConfig, content: C, session: Session, time: T) -> Self {
        Self {
            scoring: config.scoring(),
            config,
            content,
            session,
            time,
            clock: RoundClock::new(DEFAULT_TICK_MS),
            feedback: None,
            state: RoundState::Idle,
            score: 0,
            streak: 0,
            best_streak: 0,
            lives: 0,
            rounds_played: 0,
            rounds_won: 0,
            active: None,
            round_started_at: 0,
            next_round_at: None,
            last_remaining: None,
            events: Vec::new(),
        }
    }

    pub fn with_tick_interval(mut self, period_ms: u64) -> Self {
        self.clock = RoundClock::new(period_ms);
        self
    }

    pub fn with_feedback(mut self, sink: Box<dyn FeedbackSink>) -> Self {
        self.feedback = Some(sink);
        self
    }

    pub fn set_feedback(&mut self, sink: Option<Box<dyn FeedbackSink>>) {
        self.feedback = sink;
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn lives(&self) -> Option<u32> {
        self.config.has_lives.then_some(self.lives)
    }

    pub fn scoreboard(&self) -> ScoreBoard {
        ScoreBoard {
            score: self.score,
            streak: self.streak,
            lives: self.lives(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn active_content(&self) -> Option<&RoundContent> {
        self.active.as_ref()
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn remaining_ms(&self) -> Option<u64> {
        self.clock
            .is_running()
            .then(|| self.clock.remaining_ms(self.time.now_ms()))
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn handle(&mut self, event: ArcadeEvent) {
        match event {
            ArcadeEvent::Input(input) => self.submit(input),
            ArcadeEvent::Start => self.start(),
            ArcadeEvent::Next => self.next(),
            ArcadeEvent::Stop => self.stop(),
            ArcadeEvent::Tick => self.tick(),
        }
    }

    /// Begin a new game. Ignored while a round is being played.
    pub fn start(&mut self) {
        if self.state == RoundState::Playing {
            log::debug!("start ignored while playing");
            return;
        }
        self.score = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.lives = if self.config.has_lives {
            self.config.lives_count
        } else {
            0
        };
        self.rounds_played = 0;
        self.rounds_won = 0;
        log::info!("game started");

        self.emit_score();
        self.begin_round(self.time.now_ms());
    }

    /// Skip the remaining evaluation delay.
    pub fn next(&mut self) {
        if self.state != RoundState::Evaluating {
            return;
        }
        self.begin_round(self.time.now_ms());
    }

    /// Return to idle from any state, dropping the clock and any pending
    /// advance.
    pub fn stop(&mut self) {
        self.clock.stop();
        self.next_round_at = None;
        if self.state != RoundState::Idle {
            log::debug!("stopped from {}", self.state);
        }
        self.state = RoundState::Idle;
    }

    pub fn submit(&mut self, input: PlayerInput) {
        if self.state != RoundState::Playing {
            return;
        }
        let verdicts = self.content.evaluate(&input);
        self.apply(verdicts, self.time.now_ms());
    }

    /// Drive time: clock ticks, expiry, content motion and scheduled
    /// advances.
    pub fn tick(&mut self) {
        let now = self.time.now_ms();
        match self.state {
            RoundState::Idle => {}
            RoundState::Evaluating => {
                if self.next_round_at.is_some_and(|due| now >= due) {
                    self.begin_round(now);
                }
            }
            RoundState::Playing => {
                let verdicts = self.content.advance(&mut self.session, now);
                self.apply(verdicts, now);
                if self.state != RoundState::Playing {
                    return;
                }
                match self.clock.poll(now) {
                    Some(ClockSignal::Tick {
                        remaining_ms,
                        fraction,
                    }) => self.on_clock_tick(remaining_ms, fraction),
                    Some(ClockSignal::Expired) => {
                        log::debug!("round expired");
                        self.finish_round(false, false, true, now);
                    }
                    None => {}
                }
            }
        }
    }

    fn begin_round(&mut self, now: u64) {
        self.next_round_at = None;
        let content = self.content.prepare(&mut self.session);
        self.active = Some(content.clone());
        self.state = RoundState::Playing;
        self.round_started_at = now;
        self.last_remaining = None;
        match self.config.round_duration_ms {
            Some(duration) => self.clock.start(duration, now),
            None => self.clock.stop(),
        }
        log::debug!("round {} started", self.rounds_played + 1);
        self.events.push(RoundEvent::ContentChanged(content));
    }

    fn on_clock_tick(&mut self, remaining_ms: u64, fraction: f64) {
        self.events.push(RoundEvent::TimerTicked {
            remaining_ms,
            fraction,
        });

        let previous = self
            .last_remaining
            .or(self.config.round_duration_ms)
            .unwrap_or(remaining_ms);
        self.last_remaining = Some(remaining_ms);

        if let Some(threshold) = self.config.warning_threshold_ms {
            let crossed = remaining_ms / WARNING_STEP_MS != previous / WARNING_STEP_MS;
            if remaining_ms > 0 && remaining_ms < threshold && crossed {
                self.cue(Cue::Warning);
            }
        }
    }

    fn apply(&mut self, verdicts: Vec<Verdict>, now: u64) {
        for verdict in verdicts {
            if self.state != RoundState::Playing {
                break;
            }
            match verdict {
                Verdict::Ignored => {}
                Verdict::Mark { index, outcome } => {
                    match outcome {
                        Outcome::Correct => self.cue(Cue::Correct),
                        Outcome::Incorrect => {
                            self.cue(Cue::Incorrect);
                            self.record_error();
                        }
                        Outcome::Retracted | Outcome::Selected => {}
                    }
                    self.events.push(RoundEvent::ItemEvaluated { index, outcome });
                }
                Verdict::Retreat { index } => {
                    self.events.push(RoundEvent::ItemEvaluated {
                        index,
                        outcome: Outcome::Retracted,
                    });
                }
                Verdict::Updated(content) => {
                    self.active = Some(content.clone());
                    self.events.push(RoundEvent::ContentChanged(content));
                }
                Verdict::Match { weight } => {
                    let streak = self.scoring.scored_streak(self.streak);
                    let points = self.scoring.award(weight, self.remaining_at(now), streak);
                    self.bump_streak();
                    self.score = self.score.saturating_add(points);
                    self.cue(Cue::Correct);
                    self.emit_score();
                }
                Verdict::Mismatch => {
                    self.streak = 0;
                    self.cue(Cue::Incorrect);
                    self.record_error();
                    self.emit_score();
                }
                Verdict::Solved { award } => self.finish_round(true, award, false, now),
                Verdict::Failed => self.finish_round(false, false, false, now),
                Verdict::LifeLost => self.lose_life(),
            }
        }
    }

    fn finish_round(&mut self, success: bool, award: bool, timed_out: bool, now: u64) {
        let remaining = self.remaining_at(now);
        let elapsed_ms = now.saturating_sub(self.round_started_at);
        self.clock.stop();
        self.rounds_played += 1;

        let pattern_id = self.active.as_ref().and_then(|c| c.pattern_id.clone());
        let mut points = 0;

        if success {
            self.rounds_won += 1;
            if award {
                let streak = self.scoring.scored_streak(self.streak);
                points = self.scoring.award(1, remaining, streak);
                self.bump_streak();
                self.score = self.score.saturating_add(points);
            }
            if let Some(id) = &pattern_id {
                self.session.stats_mut().record_completion_time(id, elapsed_ms);
            }
            self.cue(Cue::Complete);
        } else {
            self.streak = 0;
            self.record_error();
            if timed_out && self.config.has_lives {
                self.lives = self.lives.saturating_sub(1);
            }
            self.cue(Cue::Incorrect);
        }

        log::debug!("round ended: success={success} timed_out={timed_out} points={points}");
        self.emit_score();
        self.events.push(RoundEvent::RoundEnded(RoundResult {
            success,
            timed_out,
            points,
            elapsed_ms,
            pattern_id,
        }));

        if self.config.has_lives && self.lives == 0 {
            self.game_over();
            return;
        }

        if timed_out {
            if let Some(revealed) = self.content.reveal() {
                self.active = Some(revealed.clone());
                self.events.push(RoundEvent::ContentChanged(revealed));
            }
        }

        let delay = if success {
            self.config.success_delay_ms
        } else {
            self.config.failure_delay_ms
        };
        self.state = RoundState::Evaluating;
        self.next_round_at = Some(now.saturating_add(delay));
    }

    fn lose_life(&mut self) {
        if !self.config.has_lives {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        self.cue(Cue::Warning);
        self.emit_score();
        if self.lives == 0 {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        self.clock.stop();
        self.next_round_at = None;
        self.state = RoundState::Idle;
        let summary = GameSummary {
            score: self.score,
            rounds_played: self.rounds_played,
            rounds_won: self.rounds_won,
            best_streak: self.best_streak,
            stats: self.session.stats().summary(),
        };
        log::info!(
            "game over: score {} after {} rounds",
            summary.score,
            summary.rounds_played
        );
        self.events.push(RoundEvent::GameOver(summary));
    }

    fn remaining_at(&self, now: u64) -> Option<u64> {
        self.clock
            .is_running()
            .then(|| self.clock.remaining_ms(now))
    }

    fn bump_streak(&mut self) {
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
    }

    fn record_error(&mut self) {
        if let Some(id) = self.active.as_ref().and_then(|c| c.pattern_id.as_ref()) {
            self.session.stats_mut().record_error(id);
        }
    }

    fn emit_score(&mut self) {
        let board = self.scoreboard();
        self.events.push(RoundEvent::ScoreChanged(board));
    }

    fn cue(&mut self, cue: Cue) {
        if let Some(sink) = self.feedback.as_mut() {
            sink.cue(cue);
        }
    }
}
