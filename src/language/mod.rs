pub mod core;
pub mod difficulty;
pub mod engine;
pub mod grammar;
pub mod selector;

// Re-export the main types for convenience
pub use self::core::{CatalogError, GrammarPattern, Lexicon, PatternCatalog, Tense, VerbKind};
pub use difficulty::phrase_difficulty;
pub use engine::{PhraseEngine, PhraseResult};
pub use selector::{PatternSelector, RandomSelector, WeightedSelector};
