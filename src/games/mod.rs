pub mod memory;
pub mod sentence_builder;
pub mod typing;
pub mod verb_lab;
pub mod word_drop;

pub use memory::GrammarMemory;
pub use sentence_builder::SentenceBuilder;
pub use typing::PhraseTyping;
pub use verb_lab::VerbLab;
pub use word_drop::WordDrop;

use crate::config::{ArcadeConfig, GameKind};
use crate::round::{ContentSource, RoundMachine};
use crate::runtime::TimeSource;
use crate::session::Session;

/// Round machine for one minigame, tuned from `config`.
pub fn build_machine<C: ContentSource, T: TimeSource>(
    kind: GameKind,
    content: C,
    config: &ArcadeConfig,
    session: Session,
    time: T,
) -> RoundMachine<C, T> {
    log::debug!("building {kind} machine");
    RoundMachine::with_time(config.game(kind).clone(), content, session, time)
        .with_tick_interval(config.tick_interval_ms)
}
