use crate::round::{ContentSource, Outcome, PlayerInput, RoundContent, Verdict};
use crate::session::Session;

/// Character-by-character phrase typing. A wrong character is marked but the
/// cursor stays put, so the player retries the same position.
#[derive(Debug, Clone, Default)]
pub struct PhraseTyping {
    expected: Vec<char>,
    cursor_pos: usize,
}

impl PhraseTyping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    pub fn expected_char(&self) -> Option<char> {
        self.expected.get(self.cursor_pos).copied()
    }

    pub fn has_finished(&self) -> bool {
        !self.expected.is_empty() && self.cursor_pos >= self.expected.len()
    }

    /// The correctly typed prefix of the phrase
    pub fn typed(&self) -> String {
        self.expected[..self.cursor_pos].iter().collect()
    }

    fn write(&mut self, c: char) -> Vec<Verdict> {
        let Some(expected) = self.expected_char() else {
            return vec![Verdict::Ignored];
        };
        let index = self.cursor_pos;

        if c != expected {
            return vec![Verdict::Mark {
                index,
                outcome: Outcome::Incorrect,
            }];
        }

        self.cursor_pos += 1;
        let mut verdicts = vec![Verdict::Mark {
            index,
            outcome: Outcome::Correct,
        }];
        if self.has_finished() {
            verdicts.push(Verdict::Solved { award: true });
        }
        verdicts
    }

    fn backspace(&mut self) -> Vec<Verdict> {
        if self.cursor_pos == 0 {
            return vec![Verdict::Ignored];
        }
        self.cursor_pos -= 1;
        vec![Verdict::Retreat {
            index: self.cursor_pos,
        }]
    }
}

impl ContentSource for PhraseTyping {
    fn prepare(&mut self, session: &mut Session) -> RoundContent {
        let phrase = session.generate_phrase();
        self.expected = phrase.text.chars().collect();
        self.cursor_pos = 0;
        phrase.into()
    }

    fn evaluate(&mut self, input: &PlayerInput) -> Vec<Verdict> {
        match input {
            PlayerInput::Char(c) => self.write(*c),
            PlayerInput::Backspace => self.backspace(),
            // Pasted text is typed one character at a time
            PlayerInput::Text(text) => {
                let mut verdicts = Vec::new();
                for c in text.chars() {
                    verdicts.extend(self.write(c));
                    if self.has_finished() {
                        break;
                    }
                }
                verdicts
            }
            PlayerInput::Pick(_) => vec![Verdict::Ignored],
        }
    }
}
