use crate::language::core::{load_embedded, CatalogError};
use crate::round::{ContentSource, Outcome, PlayerInput, RoundContent, Verdict};
use crate::session::Session;
use itertools::Itertools;
use rand::seq::SliceRandom;
use serde::Deserialize;

pub const VERBS_FILE: &str = "verbs.json";
pub const OPTION_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum VerbForm {
    #[strum(serialize = "Past Simple")]
    Past,
    #[strum(serialize = "Past Participle")]
    Participle,
    #[strum(serialize = "Gerund")]
    Gerund,
}

impl VerbForm {
    pub const ALL: [VerbForm; 3] = [VerbForm::Past, VerbForm::Participle, VerbForm::Gerund];
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerbEntry {
    pub base: String,
    pub past: String,
    pub participle: String,
    pub gerund: String,
}

impl VerbEntry {
    pub fn form(&self, form: VerbForm) -> &str {
        match form {
            VerbForm::Past => &self.past,
            VerbForm::Participle => &self.participle,
            VerbForm::Gerund => &self.gerund,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerbTable {
    pub name: String,
    pub verbs: Vec<VerbEntry>,
}

impl VerbTable {
    pub fn builtin() -> Result<Self, CatalogError> {
        let table: VerbTable = load_embedded(VERBS_FILE)?;
        if table.verbs.len() < OPTION_COUNT {
            return Err(CatalogError::Empty {
                file: VERBS_FILE.to_string(),
                field: "verbs".to_string(),
            });
        }
        Ok(table)
    }
}

/// The question currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbQuestion {
    pub verb: VerbEntry,
    pub form: VerbForm,
    pub options: Vec<String>,
    pub answer: usize,
}

/// Pick the right form of a verb among three options.
#[derive(Debug, Clone)]
pub struct VerbLab {
    table: VerbTable,
    question: Option<VerbQuestion>,
}

impl VerbLab {
    pub fn new(table: VerbTable) -> Self {
        Self {
            table,
            question: None,
        }
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self::new(VerbTable::builtin()?))
    }

    pub fn question(&self) -> Option<&VerbQuestion> {
        self.question.as_ref()
    }

    fn ask(&self, session: &mut Session) -> Option<VerbQuestion> {
        let rng = session.rng();
        let verb = self.table.verbs.choose(rng)?.clone();
        let form = *VerbForm::ALL.choose(rng)?;
        let correct = verb.form(form).to_string();

        let mut distractors: Vec<String> = self
            .table
            .verbs
            .iter()
            .filter(|v| v.base != verb.base)
            .map(|v| v.form(form).to_string())
            .filter(|f| *f != correct)
            .unique()
            .collect();
        distractors.shuffle(rng);
        distractors.truncate(OPTION_COUNT - 1);

        let mut options = distractors;
        options.push(correct.clone());
        options.shuffle(rng);
        let answer = options.iter().position(|o| *o == correct)?;

        Some(VerbQuestion {
            verb,
            form,
            options,
            answer,
        })
    }

    fn choose(&self, index: usize) -> Vec<Verdict> {
        let Some(question) = &self.question else {
            return vec![Verdict::Ignored];
        };
        if index >= question.options.len() {
            return vec![Verdict::Ignored];
        }
        let verdict = if index == question.answer {
            Verdict::Solved { award: true }
        } else {
            Verdict::Failed
        };
        vec![
            Verdict::Mark {
                index,
                outcome: Outcome::Selected,
            },
            verdict,
        ]
    }
}

impl ContentSource for VerbLab {
    fn prepare(&mut self, session: &mut Session) -> RoundContent {
        self.question = self.ask(session);
        match &self.question {
            Some(q) => RoundContent::new(format!("Choose the {} of \"{}\"", q.form, q.verb.base))
                .with_items(q.options.clone())
                .with_pattern(q.form.to_string()),
            None => RoundContent::default(),
        }
    }

    fn evaluate(&mut self, input: &PlayerInput) -> Vec<Verdict> {
        match input {
            PlayerInput::Pick(index) => self.choose(*index),
            PlayerInput::Text(text) => {
                let typed = text.trim().to_lowercase();
                let index = self
                    .question
                    .as_ref()
                    .and_then(|q| q.options.iter().position(|o| o.to_lowercase() == typed));
                match index {
                    Some(index) => self.choose(index),
                    None => vec![Verdict::Ignored],
                }
            }
            PlayerInput::Char(_) | PlayerInput::Backspace => vec![Verdict::Ignored],
        }
    }
}
