use crate::round::{ContentSource, Outcome, PlayerInput, RoundContent, Verdict};
use crate::session::Session;
use crate::util::words_of;
use rand::seq::SliceRandom;

/// Rebuild a shuffled sentence by picking its words in order.
#[derive(Debug, Clone, Default)]
pub struct SentenceBuilder {
    target: Vec<String>,
    shuffled: Vec<String>,
    // pool slots in the order they were picked
    picks: Vec<usize>,
}

impl SentenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> &[String] {
        &self.target
    }

    /// The shuffled pool; `None` marks words already placed.
    pub fn pool(&self) -> Vec<Option<&str>> {
        self.shuffled
            .iter()
            .enumerate()
            .map(|(slot, word)| (!self.picks.contains(&slot)).then_some(word.as_str()))
            .collect()
    }

    pub fn assembled(&self) -> Vec<&str> {
        self.picks
            .iter()
            .filter_map(|slot| self.shuffled.get(*slot))
            .map(String::as_str)
            .collect()
    }

    fn pick(&mut self, slot: usize) -> Vec<Verdict> {
        if slot >= self.shuffled.len() || self.picks.contains(&slot) {
            return vec![Verdict::Ignored];
        }
        self.picks.push(slot);

        let mut verdicts = vec![Verdict::Mark {
            index: slot,
            outcome: Outcome::Selected,
        }];
        if self.picks.len() == self.target.len() {
            let correct = self.assembled().iter().eq(self.target.iter());
            verdicts.push(if correct {
                Verdict::Solved { award: true }
            } else {
                Verdict::Failed
            });
        }
        verdicts
    }

    /// Put the last placed word back into the pool.
    fn unpick(&mut self) -> Vec<Verdict> {
        match self.picks.pop() {
            Some(slot) => vec![Verdict::Retreat { index: slot }],
            None => vec![Verdict::Ignored],
        }
    }
}

impl ContentSource for SentenceBuilder {
    fn prepare(&mut self, session: &mut Session) -> RoundContent {
        let phrase = session.generate_phrase();
        self.target = words_of(&phrase.text);
        self.shuffled = self.target.clone();
        self.shuffled.shuffle(session.rng());
        self.picks.clear();

        let items = self.shuffled.clone();
        RoundContent::from(phrase).with_items(items)
    }

    fn evaluate(&mut self, input: &PlayerInput) -> Vec<Verdict> {
        match input {
            PlayerInput::Pick(slot) => self.pick(*slot),
            PlayerInput::Backspace => self.unpick(),
            PlayerInput::Char(_) | PlayerInput::Text(_) => vec![Verdict::Ignored],
        }
    }
}
