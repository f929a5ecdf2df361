// Library surface for shells and integration tests.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod games;
pub mod language;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod util;
pub mod word_bag;

pub use config::{ArcadeConfig, GameConfig, GameKind};
pub use round::{Cue, FeedbackSink, PlayerInput, RoundEvent, RoundMachine, RoundState};
pub use session::Session;
