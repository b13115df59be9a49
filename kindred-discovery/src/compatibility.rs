//! Compatibility vector derived from onboarding quiz answers.
//!
//! The vector has a fixed set of nine named slots. Each slot reads one key
//! from either the `traits` or the `values` answer map and falls back to a
//! neutral midpoint when the answer is missing or not a number.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Traits,
    Values,
}

#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub name: &'static str,
    pub source: AnswerSource,
    pub default: f64,
}

const fn slot(name: &'static str, source: AnswerSource) -> Slot {
    Slot { name, source, default: NEUTRAL_SCORE }
}

pub const SLOTS: [Slot; 9] = [
    slot("extroversion", AnswerSource::Traits),
    slot("openness", AnswerSource::Traits),
    slot("conscientiousness", AnswerSource::Traits),
    slot("agreeableness", AnswerSource::Traits),
    slot("emotionalStability", AnswerSource::Traits),
    slot("familyOriented", AnswerSource::Values),
    slot("careerFocused", AnswerSource::Values),
    slot("adventurous", AnswerSource::Values),
    slot("spiritual", AnswerSource::Values),
];

/// Slot name to score, every score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreVector(BTreeMap<&'static str, f64>);

impl ScoreVector {
    pub fn from_answers(traits: &Map<String, Value>, values: &Map<String, Value>) -> Self {
        let scores = SLOTS
            .iter()
            .map(|slot| {
                let answers = match slot.source {
                    AnswerSource::Traits => traits,
                    AnswerSource::Values => values,
                };
                let score = answers
                    .get(slot.name)
                    .and_then(Value::as_f64)
                    .map(|raw| {
                        let clamped = raw.clamp(0.0, 1.0);
                        if clamped != raw {
                            tracing::debug!(slot = slot.name, raw, "score clamped into [0, 1]");
                        }
                        clamped
                    })
                    .unwrap_or(slot.default);
                (slot.name, score)
            })
            .collect();
        Self(scores)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_answers_yield_neutral_vector() {
        let vector = ScoreVector::from_answers(&Map::new(), &Map::new());
        assert_eq!(vector.len(), 9);
        for slot in SLOTS {
            assert_eq!(vector.get(slot.name), Some(0.5), "slot {}", slot.name);
        }
    }

    #[test]
    fn answers_come_from_their_own_map() {
        let traits = map(json!({ "extroversion": 0.9, "spiritual": 0.1 }));
        let values = map(json!({ "adventurous": 0.75, "openness": 0.2 }));
        let vector = ScoreVector::from_answers(&traits, &values);

        assert_eq!(vector.get("extroversion"), Some(0.9));
        assert_eq!(vector.get("adventurous"), Some(0.75));
        // spiritual is a values slot and openness a traits slot
        assert_eq!(vector.get("spiritual"), Some(0.5));
        assert_eq!(vector.get("openness"), Some(0.5));
    }

    #[test]
    fn zero_is_an_answer_not_a_gap() {
        let traits = map(json!({ "agreeableness": 0 }));
        let vector = ScoreVector::from_answers(&traits, &Map::new());
        assert_eq!(vector.get("agreeableness"), Some(0.0));
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let traits = map(json!({ "openness": 4.2, "extroversion": -1 }));
        let vector = ScoreVector::from_answers(&traits, &Map::new());
        assert_eq!(vector.get("openness"), Some(1.0));
        assert_eq!(vector.get("extroversion"), Some(0.0));
    }

    #[test]
    fn non_numeric_answers_fall_back_to_default() {
        let traits = map(json!({ "openness": "very", "conscientiousness": null }));
        let values = map(json!({ "careerFocused": [1, 2], "unknownSlot": 0.3 }));
        let vector = ScoreVector::from_answers(&traits, &values);
        assert_eq!(vector.get("openness"), Some(0.5));
        assert_eq!(vector.get("conscientiousness"), Some(0.5));
        assert_eq!(vector.get("careerFocused"), Some(0.5));
        assert_eq!(vector.get("unknownSlot"), None);
    }

    #[test]
    fn json_form_has_every_slot() {
        let json = serde_json::to_value(ScoreVector::from_answers(&Map::new(), &Map::new())).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 9);
        assert_eq!(obj["emotionalStability"], json!(0.5));
    }
}
