use crate::language::core::{load_embedded, CatalogError};
use crate::round::{ContentSource, Outcome, PlayerInput, RoundContent, Verdict};
use crate::session::Session;
use rand::seq::SliceRandom;
use serde::Deserialize;

pub const PAIRS_FILE: &str = "pairs.json";
pub const PAIRS_PER_ROUND: usize = 8;
const FACE_DOWN: &str = "?";

#[derive(Debug, Clone, Deserialize)]
pub struct PairCategory {
    pub name: String,
    pub pairs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairCatalog {
    pub name: String,
    pub categories: Vec<PairCategory>,
}

impl PairCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        let catalog: PairCatalog = load_embedded(PAIRS_FILE)?;
        if catalog.pairs().count() < PAIRS_PER_ROUND {
            return Err(CatalogError::Empty {
                file: PAIRS_FILE.to_string(),
                field: "pairs".to_string(),
            });
        }
        Ok(catalog)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &(String, String)> {
        self.categories.iter().flat_map(|c| c.pairs.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub text: String,
    pub side: CardSide,
    pub face_up: bool,
    pub matched: bool,
}

/// Concentration over grammar pairs ("I" / "am", "go" / "went").
#[derive(Debug, Clone)]
pub struct GrammarMemory {
    pairs: Vec<(String, String)>,
    pairs_per_round: usize,
    round_pairs: Vec<(String, String)>,
    cards: Vec<Card>,
    selected: Option<usize>,
}

impl GrammarMemory {
    pub fn new(catalog: &PairCatalog) -> Self {
        Self {
            pairs: catalog.pairs().cloned().collect(),
            pairs_per_round: PAIRS_PER_ROUND,
            round_pairs: Vec::new(),
            cards: Vec::new(),
            selected: None,
        }
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self::new(&PairCatalog::builtin()?))
    }

    pub fn with_pairs_per_round(mut self, n: usize) -> Self {
        self.pairs_per_round = n.max(1);
        self
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count() / 2
    }

    fn view(&self) -> RoundContent {
        let items = self
            .cards
            .iter()
            .map(|c| {
                if c.face_up || c.matched {
                    c.text.clone()
                } else {
                    FACE_DOWN.to_string()
                }
            })
            .collect();
        RoundContent::new("Match the pairs").with_items(items)
    }

    /// Opposite sides whose texts form one of this round's pairs.
    fn is_match(&self, a: usize, b: usize) -> bool {
        let (Some(first), Some(second)) = (self.cards.get(a), self.cards.get(b)) else {
            return false;
        };
        let (left, right) = match (first.side, second.side) {
            (CardSide::Left, CardSide::Right) => (first, second),
            (CardSide::Right, CardSide::Left) => (second, first),
            _ => return false,
        };
        self.round_pairs
            .iter()
            .any(|(l, r)| *l == left.text && *r == right.text)
    }

    fn flip(&mut self, index: usize) -> Vec<Verdict> {
        match self.cards.get_mut(index) {
            Some(card) if !card.face_up && !card.matched => card.face_up = true,
            _ => return vec![Verdict::Ignored],
        }
        let mut verdicts = vec![Verdict::Mark {
            index,
            outcome: Outcome::Selected,
        }];

        let Some(first) = self.selected.take() else {
            self.selected = Some(index);
            verdicts.push(Verdict::Updated(self.view()));
            return verdicts;
        };

        let matched = self.is_match(first, index);
        for i in [first, index] {
            if let Some(card) = self.cards.get_mut(i) {
                card.matched = matched;
                card.face_up = matched;
            }
        }
        verdicts.push(Verdict::Updated(self.view()));

        if matched {
            verdicts.push(Verdict::Match { weight: 1 });
            if self.cards.iter().all(|c| c.matched) {
                verdicts.push(Verdict::Solved { award: false });
            }
        } else {
            verdicts.push(Verdict::Mismatch);
        }
        verdicts
    }
}

impl ContentSource for GrammarMemory {
    fn prepare(&mut self, session: &mut Session) -> RoundContent {
        let rng = session.rng();
        self.round_pairs = self
            .pairs
            .choose_multiple(rng, self.pairs_per_round)
            .cloned()
            .collect();

        self.cards = self
            .round_pairs
            .iter()
            .flat_map(|(left, right)| {
                [(left, CardSide::Left), (right, CardSide::Right)].map(|(text, side)| Card {
                    text: text.clone(),
                    side,
                    face_up: false,
                    matched: false,
                })
            })
            .collect();
        self.cards.shuffle(rng);
        self.selected = None;

        self.view()
    }

    fn evaluate(&mut self, input: &PlayerInput) -> Vec<Verdict> {
        match input {
            PlayerInput::Pick(index) => self.flip(*index),
            _ => vec![Verdict::Ignored],
        }
    }

    fn reveal(&mut self) -> Option<RoundContent> {
        self.selected = None;
        for card in &mut self.cards {
            card.face_up = true;
        }
        Some(self.view())
    }
}
