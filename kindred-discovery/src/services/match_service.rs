use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use kindred_shared::errors::{AppError, AppResult};
use kindred_shared::types::{Paginated, PaginationParams};

use crate::models::{Like, LikeType, Match, NewChat, NewLike, NewMatch, ProfileCard, MATCH_STATUS_ACTIVE};
use crate::store::{DiscoveryStore, DiscoveryTx, PairKey};

use super::{non_blank, null_as_empty, validation_error};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordLikeRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "non_blank", message = "fromUid is required"))]
    pub from_uid: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "non_blank", message = "toUid is required"))]
    pub to_uid: String,
    #[serde(default)]
    pub like_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchWithProfiles {
    #[serde(flatten)]
    pub record: Match,
    pub profiles: Vec<ProfileCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeOutcome {
    pub like: Like,
    #[serde(rename = "match")]
    pub matched: Option<MatchWithProfiles>,
    #[serde(rename = "isMatch")]
    pub is_match: bool,
}

impl LikeOutcome {
    fn one_sided(like: Like) -> Self {
        Self {
            like,
            matched: None,
            is_match: false,
        }
    }

    fn matched(like: Like, record: Match, profiles: Vec<ProfileCard>) -> Self {
        Self {
            like,
            matched: Some(MatchWithProfiles { record, profiles }),
            is_match: true,
        }
    }
}

fn parse_like_type(raw: Option<&str>) -> AppResult<LikeType> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(LikeType::Like),
        Some(raw) => raw
            .parse::<LikeType>()
            .map_err(|e| AppError::validation(e.to_string())),
    }
}

/// Cards for both participants, ordered `uid1` then `uid2`.
fn participant_cards(tx: &mut dyn DiscoveryTx, record: &Match) -> AppResult<Vec<ProfileCard>> {
    let mut cards = tx.profile_cards(&[record.uid1.as_str(), record.uid2.as_str()])?;
    cards.sort_by_key(|card| card.uid != record.uid1);
    Ok(cards)
}

/// Records a like from `from_uid` to `to_uid` and forms a match when the
/// reverse like already exists.
///
/// The whole read-decide-write sequence runs in one pair transaction, so two
/// users liking each other at the same moment produce exactly one match.
pub fn record_like<S: DiscoveryStore>(store: &S, req: RecordLikeRequest) -> AppResult<LikeOutcome> {
    req.validate().map_err(validation_error)?;

    let from_uid = req.from_uid.trim();
    let to_uid = req.to_uid.trim();
    if from_uid == to_uid {
        return Err(AppError::validation("cannot like your own profile"));
    }
    let like_type = parse_like_type(req.like_type.as_deref())?;
    let pair = PairKey::new(from_uid, to_uid);

    let outcome = store.pair_transaction(&pair, |tx| {
        if tx.find_like(from_uid, to_uid)?.is_some() {
            return Err(AppError::already_liked());
        }

        let like = tx.insert_like(&NewLike {
            from_uid: from_uid.to_string(),
            to_uid: to_uid.to_string(),
            like_type: like_type.as_str().to_string(),
        })?;

        let Some(reciprocal) = tx.find_like_of_type(to_uid, from_uid, &LikeType::POSITIVE)? else {
            return Ok(LikeOutcome::one_sided(like));
        };

        if let Some(existing) = tx.find_match(&pair)? {
            tracing::warn!(
                match_id = %existing.match_id,
                from_uid,
                to_uid,
                "pair already matched; not creating another match"
            );
            let profiles = participant_cards(tx, &existing)?;
            return Ok(LikeOutcome::matched(like, existing, profiles));
        }

        let record = tx.insert_match(&NewMatch {
            match_id: Uuid::now_v7(),
            uid1: pair.low().to_string(),
            uid2: pair.high().to_string(),
            status: MATCH_STATUS_ACTIVE.to_string(),
        })?;
        tx.insert_chat(&NewChat {
            match_id: record.match_id,
            unread_counts: serde_json::json!({}),
        })?;

        tracing::info!(
            match_id = %record.match_id,
            uid1 = %record.uid1,
            uid2 = %record.uid2,
            reciprocal_type = %reciprocal.like_type,
            "match created"
        );

        let profiles = participant_cards(tx, &record)?;
        Ok(LikeOutcome::matched(like, record, profiles))
    })?;

    metrics::counter!("kindred_likes_total", "like_type" => like_type.as_str()).increment(1);
    if outcome.is_match {
        metrics::counter!("kindred_matches_created_total").increment(1);
    }
    tracing::info!(
        from_uid,
        to_uid,
        like_type = %like_type,
        is_match = outcome.is_match,
        "like recorded"
    );

    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Super,
    Regular,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub match_type: MatchType,
    pub unread_count: i64,
    pub counterpart_uid: String,
    pub profile: Option<ProfileCard>,
}

/// Pages through `uid`'s matches, newest first.
pub fn list_matches<S: DiscoveryStore>(
    store: &S,
    uid: &str,
    params: &PaginationParams,
) -> AppResult<Paginated<MatchSummary>> {
    let uid = uid.trim();
    if uid.is_empty() {
        return Err(AppError::validation("uid is required"));
    }

    store.transaction(|tx| {
        let total = tx.count_matches(uid)?;
        let rows: Vec<Match> = tx.list_matches(uid, params.limit(), params.offset())?;

        let counterpart_uids: Vec<&str> = rows.iter().filter_map(|m| m.counterpart(uid)).collect();
        let mut cards: HashMap<String, ProfileCard> = tx
            .profile_cards(&counterpart_uids)?
            .into_iter()
            .map(|card| (card.uid.clone(), card))
            .collect();

        let mut items = Vec::with_capacity(rows.len());
        for record in rows {
            let Some(other) = record.counterpart(uid).map(str::to_string) else {
                continue;
            };

            let sent = tx.find_like(uid, &other)?;
            let received = tx.find_like(&other, uid)?;
            let match_type = if sent.iter().chain(received.iter()).any(Like::is_super) {
                MatchType::Super
            } else {
                MatchType::Regular
            };
            let unread_count = tx
                .find_chat(record.match_id)?
                .map(|chat| chat.unread_for(uid))
                .unwrap_or(0);

            items.push(MatchSummary {
                match_id: record.match_id,
                status: record.status,
                created_at: record.created_at,
                match_type,
                unread_count,
                profile: cards.remove(&other),
                counterpart_uid: other,
            });
        }

        Ok(Paginated::new(items, total, params))
    })
}
