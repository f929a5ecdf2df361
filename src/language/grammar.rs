//! Compositional phrase synthesis for patterns without a curated pool.

use super::core::{GrammarPattern, Lexicon, Tense};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Whether `subject` takes `has`/`was`. Matches a listed subject exactly or
/// as the leading words of a longer subject ("the dog next door").
pub fn is_third_person_singular(subject: &str, singular: &[String]) -> bool {
    let subject = subject.to_lowercase();
    singular.iter().any(|s| {
        let s = s.to_lowercase();
        subject == s
            || subject
                .strip_prefix(s.as_str())
                .is_some_and(|rest| rest.starts_with(' '))
    })
}

pub fn auxiliary(tense: Tense, third_person_singular: bool) -> Option<&'static str> {
    match (tense, third_person_singular) {
        (Tense::PresentPerfect, true) => Some("has"),
        (Tense::PresentPerfect, false) => Some("have"),
        (Tense::PastContinuous, true) => Some("was"),
        (Tense::PastContinuous, false) => Some("were"),
        (Tense::PastSimple | Tense::ThirdConditional, _) => None,
    }
}

/// Pronoun that refers back to `subject` in the main clause of a third
/// conditional.
pub fn second_subject_pronoun(subject: &str, singular: &[String]) -> &'static str {
    match subject.to_lowercase().as_str() {
        "i" => "I",
        "you" => "you",
        "she" => "she",
        "it" => "it",
        "we" | "our team" => "we",
        "they" | "their family" => "they",
        _ if is_third_person_singular(subject, singular) => "he",
        _ => "they",
    }
}

/// Verb phrase for `tense`, including any auxiliary.
pub fn verb_phrase(tense: Tense, verb: &str, third_person_singular: bool) -> String {
    match (tense, auxiliary(tense, third_person_singular)) {
        (Tense::ThirdConditional, _) => format!("would have {verb}"),
        (_, Some(aux)) => format!("{aux} {verb}"),
        (_, None) => verb.to_string(),
    }
}

fn lowercase_first(subject: &str) -> String {
    if subject == "I" {
        return subject.to_string();
    }
    let mut chars = subject.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Assemble one phrase from the lexicon for `pattern`.
pub fn synthesize(pattern: &GrammarPattern, lexicon: &Lexicon, rng: &mut dyn RngCore) -> String {
    let subject = pick(&lexicon.subjects, rng);
    let verb = pick(lexicon.verbs_for(pattern.tense).forms(pattern.verb_kind), rng);
    let object = pick(&lexicon.objects, rng);
    let complement = if rng.gen_bool(0.5) {
        Some(pick(&lexicon.complements, rng))
    } else {
        None
    };

    let singular = is_third_person_singular(subject, &lexicon.third_person_singular);
    let verb = verb_phrase(pattern.tense, verb, singular);
    let tail = match complement {
        Some(c) => format!("{object} {c}"),
        None => object.to_string(),
    };

    match pattern.tense {
        Tense::ThirdConditional => {
            let pronoun = second_subject_pronoun(subject, &lexicon.third_person_singular);
            format!(
                "If {} had known, {pronoun} {verb} {tail}.",
                lowercase_first(subject)
            )
        }
        _ => format!("{subject} {verb} {tail}."),
    }
}

fn pick<'a>(items: &'a [String], rng: &mut dyn RngCore) -> &'a str {
    items.choose(rng).map(String::as_str).unwrap_or_default()
}
