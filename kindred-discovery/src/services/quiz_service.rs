use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use kindred_shared::errors::{AppError, AppResult, ErrorCode};

use crate::compatibility::ScoreVector;
use crate::models::{NewQuizResult, QuizResult};
use crate::store::DiscoveryStore;

use super::{non_blank, null_as_empty, validation_error};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "non_blank", message = "uid is required"))]
    pub uid: String,
    #[serde(default)]
    pub traits: Option<Map<String, Value>>,
    #[serde(default)]
    pub values: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "non_blank", message = "datingGoals is required"))]
    pub dating_goals: String,
    #[serde(default)]
    pub conversation_style: Option<String>,
    #[serde(default)]
    pub deal_breakers: Option<Vec<String>>,
}

/// Validates a quiz submission, derives its score vector and upserts it by uid.
pub fn submit_quiz<S: DiscoveryStore>(store: &S, req: SubmitQuizRequest) -> AppResult<QuizResult> {
    req.validate().map_err(validation_error)?;

    let traits = req.traits.unwrap_or_default();
    let values = req.values.unwrap_or_default();
    let score_vectors = ScoreVector::from_answers(&traits, &values);

    let row = NewQuizResult {
        uid: req.uid.trim().to_string(),
        traits: Value::Object(traits),
        values: Value::Object(values),
        score_vectors: serde_json::to_value(&score_vectors).map_err(AppError::internal)?,
        dating_goals: req.dating_goals.trim().to_string(),
        conversation_style: req
            .conversation_style
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        deal_breakers: Value::from(req.deal_breakers.unwrap_or_default()),
    };

    let quiz = store.transaction(|tx| tx.upsert_quiz(&row))?;

    metrics::counter!("kindred_quiz_submissions_total").increment(1);
    tracing::info!(
        uid = %quiz.uid,
        dating_goals = %quiz.dating_goals,
        updated_at = %quiz.updated_at,
        "quiz results saved"
    );

    Ok(quiz)
}

pub fn get_quiz<S: DiscoveryStore>(store: &S, uid: &str) -> AppResult<QuizResult> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(AppError::validation("uid is required"));
    }

    store
        .transaction(|tx| tx.find_quiz(uid))?
        .ok_or_else(|| AppError::new(ErrorCode::QuizNotFound, "quiz results not found"))
}
