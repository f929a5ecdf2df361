use include_dir::{include_dir, Dir};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::from_str;
use thiserror::Error;

static LANG_DIR: Dir = include_dir!("src/lang");

pub const PATTERNS_FILE: &str = "patterns.json";
pub const LEXICON_FILE: &str = "lexicon.json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {0}")]
    NotFound(String),
    #[error("catalog file {0} is not valid UTF-8")]
    Encoding(String),
    #[error("unable to parse catalog {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {file} has an empty {field} list")]
    Empty { file: String, field: String },
}

/// Tense a pattern drills; also selects the auxiliary and word order used
/// when a phrase has to be synthesized.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Tense {
    #[strum(serialize = "past simple")]
    PastSimple,
    #[strum(serialize = "present perfect")]
    PresentPerfect,
    #[strum(serialize = "past continuous")]
    PastContinuous,
    #[strum(serialize = "third conditional")]
    ThirdConditional,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum VerbKind {
    #[strum(serialize = "regular")]
    Regular,
    #[strum(serialize = "irregular")]
    Irregular,
}

/// A named grammatical structure. The id is the key used for error counts
/// and selection weights everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarPattern {
    pub id: String,
    #[serde(default = "default_base_difficulty")]
    pub base_difficulty: u8,
    pub tense: Tense,
    pub verb_kind: VerbKind,
    #[serde(default)]
    pub curated: Vec<String>,
}

fn default_base_difficulty() -> u8 {
    crate::language::difficulty::DEFAULT_BASE_DIFFICULTY
}

impl GrammarPattern {
    pub fn new(id: impl Into<String>, base_difficulty: u8, tense: Tense, verb_kind: VerbKind) -> Self {
        Self {
            id: id.into(),
            base_difficulty: base_difficulty.clamp(1, 10),
            tense,
            verb_kind,
            curated: Vec::new(),
        }
    }

    pub fn with_curated<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.curated = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_curated_pool(&self) -> bool {
        !self.curated.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternCatalog {
    pub name: String,
    pub patterns: Vec<GrammarPattern>,
}

impl PatternCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        let catalog: PatternCatalog = load_embedded(PATTERNS_FILE)?;
        if catalog.patterns.is_empty() {
            return Err(CatalogError::Empty {
                file: PATTERNS_FILE.to_string(),
                field: "patterns".to_string(),
            });
        }
        Ok(catalog)
    }
}

/// Verb forms available for one tense, split by regularity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerbPool {
    #[serde(default)]
    pub regular: Vec<String>,
    #[serde(default)]
    pub irregular: Vec<String>,
}

impl VerbPool {
    /// The forms for `kind`, or the other kind when that list is empty.
    pub fn forms(&self, kind: VerbKind) -> &[String] {
        let (preferred, other) = match kind {
            VerbKind::Regular => (&self.regular, &self.irregular),
            VerbKind::Irregular => (&self.irregular, &self.regular),
        };
        if preferred.is_empty() {
            other
        } else {
            preferred
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.irregular.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenseVerbs {
    #[serde(default)]
    pub past_simple: VerbPool,
    #[serde(default)]
    pub present_perfect: VerbPool,
    #[serde(default)]
    pub past_continuous: VerbPool,
    #[serde(default)]
    pub third_conditional: VerbPool,
}

impl TenseVerbs {
    pub fn get(&self, tense: Tense) -> &VerbPool {
        match tense {
            Tense::PastSimple => &self.past_simple,
            Tense::PresentPerfect => &self.present_perfect,
            Tense::PastContinuous => &self.past_continuous,
            Tense::ThirdConditional => &self.third_conditional,
        }
    }
}

/// Word lists used to assemble phrases when a pattern has no curated pool.
#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    pub name: String,
    pub subjects: Vec<String>,
    pub third_person_singular: Vec<String>,
    pub verbs: TenseVerbs,
    pub objects: Vec<String>,
    pub complements: Vec<String>,
}

impl Lexicon {
    pub fn builtin() -> Result<Self, CatalogError> {
        let lexicon: Lexicon = load_embedded(LEXICON_FILE)?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    pub fn verbs_for(&self, tense: Tense) -> &VerbPool {
        self.verbs.get(tense)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let required = [
            ("subjects", self.subjects.is_empty()),
            ("objects", self.objects.is_empty()),
            ("complements", self.complements.is_empty()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, empty)| *empty) {
            return Err(CatalogError::Empty {
                file: LEXICON_FILE.to_string(),
                field: field.to_string(),
            });
        }

        for tense in [
            Tense::PastSimple,
            Tense::PresentPerfect,
            Tense::PastContinuous,
            Tense::ThirdConditional,
        ] {
            if self.verbs.get(tense).is_empty() {
                return Err(CatalogError::Empty {
                    file: LEXICON_FILE.to_string(),
                    field: format!("{tense} verbs"),
                });
            }
        }
        Ok(())
    }
}

/// Deserialize one of the JSON catalogs compiled into the crate.
pub fn load_embedded<T: DeserializeOwned>(file_name: &str) -> Result<T, CatalogError> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| CatalogError::NotFound(file_name.to_string()))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| CatalogError::Encoding(file_name.to_string()))?;

    from_str(contents).map_err(|source| CatalogError::Parse {
        file: file_name.to_string(),
        source,
    })
}
