use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::{chats, likes, matches, profiles, quiz_results};

// --- QuizResult ---

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = quiz_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuizResult {
    pub uid: String,
    pub traits: serde_json::Value,
    pub values: serde_json::Value,
    pub score_vectors: serde_json::Value,
    pub dating_goals: String,
    pub conversation_style: Option<String>,
    pub deal_breakers: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything a submission replaces; timestamps are owned by the store.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = quiz_results, primary_key(uid))]
#[diesel(treat_none_as_null = true)]
pub struct NewQuizResult {
    pub uid: String,
    pub traits: serde_json::Value,
    pub values: serde_json::Value,
    pub score_vectors: serde_json::Value,
    pub dating_goals: String,
    pub conversation_style: Option<String>,
    pub deal_breakers: serde_json::Value,
}

// --- Like ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeType {
    Like,
    Super,
}

impl LikeType {
    pub const POSITIVE: [LikeType; 2] = [LikeType::Like, LikeType::Super];

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeType::Like => "like",
            LikeType::Super => "super",
        }
    }
}

impl fmt::Display for LikeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("likeType must be 'like' or 'super', got '{0}'")]
pub struct UnknownLikeType(pub String);

impl FromStr for LikeType {
    type Err = UnknownLikeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" => Ok(LikeType::Like),
            "super" => Ok(LikeType::Super),
            _ => Err(UnknownLikeType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub from_uid: String,
    pub to_uid: String,
    pub like_type: String,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn is_super(&self) -> bool {
        self.like_type == LikeType::Super.as_str()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub from_uid: String,
    pub to_uid: String,
    pub like_type: String,
}

// --- Match ---

pub const MATCH_STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = matches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Match {
    pub match_id: Uuid,
    pub uid1: String,
    pub uid2: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

impl Match {
    /// The other participant, if `uid` is one of the two.
    pub fn counterpart(&self, uid: &str) -> Option<&str> {
        if self.uid1 == uid {
            Some(&self.uid2)
        } else if self.uid2 == uid {
            Some(&self.uid1)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub match_id: Uuid,
    pub uid1: String,
    pub uid2: String,
    pub status: String,
}

// --- Chat ---

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = chats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Chat {
    pub match_id: Uuid,
    pub unread_counts: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn unread_for(&self, uid: &str) -> i64 {
        self.unread_counts
            .get(uid)
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chats)]
pub struct NewChat {
    pub match_id: Uuid,
    pub unread_counts: serde_json::Value,
}

// --- Profile (read-only, owned by the profile service) ---

#[derive(Debug, Clone, Queryable, Selectable, Serialize, PartialEq)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileCard {
    pub uid: String,
    pub display_name: Option<String>,
    pub photos: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_type_parses_case_insensitively() {
        assert_eq!("like".parse::<LikeType>().unwrap(), LikeType::Like);
        assert_eq!(" Super ".parse::<LikeType>().unwrap(), LikeType::Super);
    }

    #[test]
    fn pass_is_not_a_like_type() {
        let err = "pass".parse::<LikeType>().unwrap_err();
        assert!(err.to_string().contains("'pass'"));
    }

    #[test]
    fn counterpart_resolves_either_side() {
        let m = Match {
            match_id: Uuid::now_v7(),
            uid1: "alice".into(),
            uid2: "bob".into(),
            created_at: Utc::now(),
            status: MATCH_STATUS_ACTIVE.into(),
        };
        assert_eq!(m.counterpart("alice"), Some("bob"));
        assert_eq!(m.counterpart("bob"), Some("alice"));
        assert_eq!(m.counterpart("carol"), None);
    }

    #[test]
    fn unread_defaults_to_zero() {
        let chat = Chat {
            match_id: Uuid::now_v7(),
            unread_counts: serde_json::json!({ "alice": 3 }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(chat.unread_for("alice"), 3);
        assert_eq!(chat.unread_for("bob"), 0);
    }
}
