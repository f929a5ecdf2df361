use super::core::{CatalogError, GrammarPattern, Lexicon, PatternCatalog, PATTERNS_FILE};
use super::difficulty::phrase_difficulty;
use super::grammar::synthesize;
use super::selector::{PatternSelector, WeightedSelector};
use crate::stats::ErrorSnapshot;
use rand::seq::SliceRandom;
use rand::RngCore;

/// A phrase ready to be shown for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseResult {
    pub text: String,
    pub pattern_id: String,
    pub difficulty: u8,
}

/// Selects a pattern, produces a phrase for it and scores its difficulty.
pub struct PhraseEngine {
    // never empty
    patterns: Vec<GrammarPattern>,
    lexicon: Lexicon,
    selector: Box<dyn PatternSelector>,
}

impl PhraseEngine {
    pub fn builtin() -> Result<Self, CatalogError> {
        let catalog = PatternCatalog::builtin()?;
        Self::new(catalog.patterns, Lexicon::builtin()?)
    }

    pub fn new(patterns: Vec<GrammarPattern>, lexicon: Lexicon) -> Result<Self, CatalogError> {
        if patterns.is_empty() {
            return Err(CatalogError::Empty {
                file: PATTERNS_FILE.to_string(),
                field: "patterns".to_string(),
            });
        }
        Ok(Self {
            patterns,
            lexicon,
            selector: Box::new(WeightedSelector),
        })
    }

    pub fn with_selector(mut self, selector: Box<dyn PatternSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn generate(&self, snapshot: &ErrorSnapshot, rng: &mut dyn RngCore) -> PhraseResult {
        let index = self
            .selector
            .select(&self.patterns, snapshot, rng)
            .min(self.patterns.len() - 1);
        let pattern = &self.patterns[index];

        let text = match pattern.curated.choose(rng) {
            Some(phrase) => phrase.clone(),
            None => synthesize(pattern, &self.lexicon, rng),
        };

        let result = PhraseResult {
            text,
            pattern_id: pattern.id.clone(),
            difficulty: phrase_difficulty(pattern.base_difficulty, snapshot.get(&pattern.id)),
        };
        log::debug!(
            "generated {:?} for {} at difficulty {}",
            result.text,
            result.pattern_id,
            result.difficulty
        );
        result
    }

    pub fn patterns(&self) -> &[GrammarPattern] {
        &self.patterns
    }

    pub fn pattern(&self, id: &str) -> Option<&GrammarPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn difficulty(&self, id: &str, snapshot: &ErrorSnapshot) -> Option<u8> {
        self.pattern(id)
            .map(|p| phrase_difficulty(p.base_difficulty, snapshot.get(id)))
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}
