use crate::language::core::{load_embedded, CatalogError};
use crate::round::{ContentSource, PlayerInput, RoundContent, Verdict};
use crate::session::Session;
use crate::word_bag::WordBag;
use rand::{Rng, RngCore};
use serde::Deserialize;

pub const WORDS_FILE: &str = "words.json";

pub const COLUMNS: usize = 6;
pub const ROWS: usize = 10;
pub const BASE_FALL_MS: u64 = 900;
pub const FALL_STEP_MS: u64 = 80;
pub const MIN_FALL_MS: u64 = 300;
const SPAWN_CHANCE: f64 = 0.8;
const BONUS_CHANCE: f64 = 0.25;
/// Every this many cleared words allows one more word on the board.
const CLEARS_PER_EXTRA_WORD: u32 = 8;
const CLEARS_PER_LEVEL: u32 = 10;
const BONUS_WEIGHT: u32 = 2;

#[derive(Debug, Clone, Deserialize)]
pub struct WordLists {
    pub name: String,
    pub common: Vec<String>,
    pub bonus: Vec<String>,
}

impl WordLists {
    pub fn builtin() -> Result<Self, CatalogError> {
        let lists: WordLists = load_embedded(WORDS_FILE)?;
        if lists.common.is_empty() {
            return Err(CatalogError::Empty {
                file: WORDS_FILE.to_string(),
                field: "common".to_string(),
            });
        }
        Ok(lists)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallingWord {
    pub text: String,
    pub bonus: bool,
}

type Grid = Vec<Vec<Option<FallingWord>>>;

/// Words fall down a grid; typing one clears it. One long round that only
/// ends when the lives run out.
#[derive(Debug, Clone)]
pub struct WordDrop {
    common: WordBag<String>,
    bonus: WordBag<String>,
    grid: Grid,
    cleared: u32,
    level: u32,
    fall_interval_ms: u64,
    next_fall_at: Option<u64>,
}

impl WordDrop {
    pub fn new(lists: WordLists) -> Self {
        Self {
            common: WordBag::new(lists.common),
            bonus: WordBag::new(lists.bonus),
            grid: empty_grid(),
            cleared: 0,
            level: 1,
            fall_interval_ms: BASE_FALL_MS,
            next_fall_at: None,
        }
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self::new(WordLists::builtin()?))
    }

    pub fn grid(&self) -> &[Vec<Option<FallingWord>>] {
        &self.grid
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn cleared(&self) -> u32 {
        self.cleared
    }

    pub fn fall_interval_ms(&self) -> u64 {
        self.fall_interval_ms
    }

    pub fn active_count(&self) -> usize {
        self.grid.iter().flatten().filter(|c| c.is_some()).count()
    }

    fn view(&self) -> RoundContent {
        let items = self
            .grid
            .iter()
            .flatten()
            .map(|cell| cell.as_ref().map(|w| w.text.clone()).unwrap_or_default())
            .collect();
        RoundContent::new(format!("level {}", self.level)).with_items(items)
    }

    /// Move every word down one row where the cell below is free.
    fn fall(&mut self) {
        for row in (0..ROWS - 1).rev() {
            for col in 0..COLUMNS {
                if self.grid[row][col].is_some() && self.grid[row + 1][col].is_none() {
                    self.grid[row + 1][col] = self.grid[row][col].take();
                }
            }
        }
    }

    /// Maybe drop a new word in the top row. `false` when it landed on an
    /// occupied cell.
    fn spawn(&mut self, rng: &mut dyn RngCore) -> bool {
        let target = 1 + self.cleared / CLEARS_PER_EXTRA_WORD;
        if self.active_count() >= target as usize || !rng.gen_bool(SPAWN_CHANCE) {
            return true;
        }

        let use_bonus = rng.gen_bool(BONUS_CHANCE);
        let drawn = if use_bonus {
            self.bonus.draw(rng)
        } else {
            None
        };
        let word = match drawn {
            Some(text) => FallingWord { text, bonus: true },
            None => match self.common.draw(rng) {
                Some(text) => FallingWord { text, bonus: false },
                None => return true,
            },
        };

        let col = rng.gen_range(0..COLUMNS);
        if self.grid[0][col].is_some() {
            log::debug!("column {col} is full");
            return false;
        }
        self.grid[0][col] = Some(word);
        true
    }

    fn clear(&mut self, typed: &str) -> Vec<Verdict> {
        let typed = typed.trim().to_lowercase();
        if typed.is_empty() {
            return vec![Verdict::Ignored];
        }

        let mut weight = 0;
        let mut count = 0;
        for cell in self.grid.iter_mut().flatten() {
            if cell.as_ref().is_some_and(|w| w.text.to_lowercase() == typed) {
                if let Some(word) = cell.take() {
                    weight += if word.bonus { BONUS_WEIGHT } else { 1 };
                    count += 1;
                }
            }
        }

        if count == 0 {
            return vec![Verdict::Mismatch];
        }
        self.cleared += count;
        self.level_up();
        vec![Verdict::Updated(self.view()), Verdict::Match { weight }]
    }

    fn level_up(&mut self) {
        let next = self.cleared / CLEARS_PER_LEVEL + 1;
        if next > self.level {
            self.level = next;
            self.fall_interval_ms = self
                .fall_interval_ms
                .saturating_sub(FALL_STEP_MS)
                .max(MIN_FALL_MS);
            log::debug!("word drop level {next}, falling every {} ms", self.fall_interval_ms);
        }
    }
}

fn empty_grid() -> Grid {
    vec![vec![None; COLUMNS]; ROWS]
}

impl ContentSource for WordDrop {
    fn prepare(&mut self, _session: &mut Session) -> RoundContent {
        self.grid = empty_grid();
        self.cleared = 0;
        self.level = 1;
        self.fall_interval_ms = BASE_FALL_MS;
        self.next_fall_at = None;
        self.view()
    }

    fn evaluate(&mut self, input: &PlayerInput) -> Vec<Verdict> {
        match input {
            PlayerInput::Text(text) => self.clear(text),
            _ => vec![Verdict::Ignored],
        }
    }

    fn advance(&mut self, session: &mut Session, now_ms: u64) -> Vec<Verdict> {
        let Some(due) = self.next_fall_at else {
            self.next_fall_at = Some(now_ms + self.fall_interval_ms);
            return Vec::new();
        };
        if now_ms < due {
            return Vec::new();
        }
        self.next_fall_at = Some(now_ms + self.fall_interval_ms);

        self.fall();
        let landed = self.spawn(session.rng());
        let mut verdicts = vec![Verdict::Updated(self.view())];
        if !landed {
            verdicts.push(Verdict::LifeLost);
        }
        verdicts
    }
}
