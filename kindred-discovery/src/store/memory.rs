//! In-process store.
//!
//! Backs the `memory` backend and the test suite. Every transaction works on
//! a staged copy of the tables under one mutex and publishes it only on
//! success, so transactions are serializable and roll back on error.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use kindred_shared::errors::{AppError, AppResult};

use crate::models::{Chat, Like, LikeType, Match, NewChat, NewLike, NewMatch, NewQuizResult, ProfileCard, QuizResult};

use super::{DiscoveryStore, DiscoveryTx, PairKey};

#[derive(Debug, Clone, Default)]
struct Tables {
    quiz_results: BTreeMap<String, QuizResult>,
    likes: BTreeMap<(String, String), Like>,
    matches: BTreeMap<Uuid, Match>,
    chats: BTreeMap<Uuid, Chat>,
    profiles: HashMap<String, ProfileCard>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Published tables are only ever replaced wholesale on commit, so a
    /// panic inside a transaction cannot leave them half-written and a
    /// poisoned lock is safe to reuse.
    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        Ok(self.tables.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("memory store lock was poisoned by a panicking transaction; recovering");
            poisoned.into_inner()
        }))
    }

    /// Seeds a profile card, standing in for the profile service.
    pub fn put_profile(&self, card: ProfileCard) -> AppResult<()> {
        self.lock()?.profiles.insert(card.uid.clone(), card);
        Ok(())
    }

    pub fn like_count(&self) -> AppResult<usize> {
        Ok(self.lock()?.likes.len())
    }

    pub fn match_count(&self) -> AppResult<usize> {
        Ok(self.lock()?.matches.len())
    }

    pub fn chat_count(&self) -> AppResult<usize> {
        Ok(self.lock()?.chats.len())
    }

    pub fn quiz_count(&self) -> AppResult<usize> {
        Ok(self.lock()?.quiz_results.len())
    }

    /// Overwrites a chat's unread map, standing in for the messaging service.
    pub fn set_unread_counts(&self, match_id: Uuid, counts: serde_json::Value) -> AppResult<()> {
        let mut tables = self.lock()?;
        let chat = tables
            .chats
            .get_mut(&match_id)
            .ok_or_else(|| AppError::not_found("chat not found"))?;
        chat.unread_counts = counts;
        chat.updated_at = Utc::now();
        Ok(())
    }
}

impl DiscoveryStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn DiscoveryTx) -> AppResult<T>,
    {
        let mut tables = self.lock()?;
        let mut tx = MemoryTx {
            staged: tables.clone(),
        };
        let out = f(&mut tx)?;
        *tables = tx.staged;
        Ok(out)
    }

    fn pair_transaction<T, F>(&self, _pair: &PairKey, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn DiscoveryTx) -> AppResult<T>,
    {
        // the table mutex already serializes every transaction
        self.transaction(f)
    }

    fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }
}

struct MemoryTx {
    staged: Tables,
}

/// A timestamp strictly after `prev`, even if the wall clock has not moved.
fn tick_after(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > prev {
        now
    } else {
        prev + Duration::microseconds(1)
    }
}

impl DiscoveryTx for MemoryTx {
    fn find_quiz(&mut self, uid: &str) -> AppResult<Option<QuizResult>> {
        Ok(self.staged.quiz_results.get(uid).cloned())
    }

    fn upsert_quiz(&mut self, row: &NewQuizResult) -> AppResult<QuizResult> {
        let (created_at, updated_at) = match self.staged.quiz_results.get(&row.uid) {
            Some(existing) => (existing.created_at, tick_after(existing.updated_at)),
            None => {
                let now = Utc::now();
                (now, now)
            }
        };
        let quiz = QuizResult {
            uid: row.uid.clone(),
            traits: row.traits.clone(),
            values: row.values.clone(),
            score_vectors: row.score_vectors.clone(),
            dating_goals: row.dating_goals.clone(),
            conversation_style: row.conversation_style.clone(),
            deal_breakers: row.deal_breakers.clone(),
            created_at,
            updated_at,
        };
        self.staged.quiz_results.insert(row.uid.clone(), quiz.clone());
        Ok(quiz)
    }

    fn find_like(&mut self, from_uid: &str, to_uid: &str) -> AppResult<Option<Like>> {
        let key = (from_uid.to_string(), to_uid.to_string());
        Ok(self.staged.likes.get(&key).cloned())
    }

    fn insert_like(&mut self, like: &NewLike) -> AppResult<Like> {
        let key = (like.from_uid.clone(), like.to_uid.clone());
        if self.staged.likes.contains_key(&key) {
            return Err(AppError::already_liked());
        }
        let row = Like {
            from_uid: like.from_uid.clone(),
            to_uid: like.to_uid.clone(),
            like_type: like.like_type.clone(),
            created_at: Utc::now(),
        };
        self.staged.likes.insert(key, row.clone());
        Ok(row)
    }

    fn find_like_of_type(
        &mut self,
        from_uid: &str,
        to_uid: &str,
        types: &[LikeType],
    ) -> AppResult<Option<Like>> {
        let found = self
            .find_like(from_uid, to_uid)?
            .filter(|like| types.iter().any(|t| t.as_str() == like.like_type));
        Ok(found)
    }

    fn find_match(&mut self, pair: &PairKey) -> AppResult<Option<Match>> {
        Ok(self
            .staged
            .matches
            .values()
            .find(|m| m.uid1 == pair.low() && m.uid2 == pair.high())
            .cloned())
    }

    fn insert_match(&mut self, new_match: &NewMatch) -> AppResult<Match> {
        let pair = PairKey::new(&new_match.uid1, &new_match.uid2);
        if self.staged.matches.contains_key(&new_match.match_id) || self.find_match(&pair)?.is_some() {
            return Err(AppError::internal(anyhow::anyhow!(
                "match already exists for pair {}",
                pair.lock_name()
            )));
        }
        // keeps newest-first listing stable when matches land in the same tick
        let latest = self.staged.matches.values().map(|m| m.created_at).max();
        let row = Match {
            match_id: new_match.match_id,
            uid1: new_match.uid1.clone(),
            uid2: new_match.uid2.clone(),
            created_at: latest.map_or_else(Utc::now, tick_after),
            status: new_match.status.clone(),
        };
        self.staged.matches.insert(row.match_id, row.clone());
        Ok(row)
    }

    fn insert_chat(&mut self, chat: &NewChat) -> AppResult<Chat> {
        if !self.staged.matches.contains_key(&chat.match_id) {
            return Err(AppError::internal(anyhow::anyhow!(
                "chat references unknown match {}",
                chat.match_id
            )));
        }
        if self.staged.chats.contains_key(&chat.match_id) {
            return Err(AppError::internal(anyhow::anyhow!(
                "chat already exists for match {}",
                chat.match_id
            )));
        }
        let now = Utc::now();
        let row = Chat {
            match_id: chat.match_id,
            unread_counts: chat.unread_counts.clone(),
            created_at: now,
            updated_at: now,
        };
        self.staged.chats.insert(row.match_id, row.clone());
        Ok(row)
    }

    fn find_chat(&mut self, match_id: Uuid) -> AppResult<Option<Chat>> {
        Ok(self.staged.chats.get(&match_id).cloned())
    }

    fn list_matches(&mut self, uid: &str, limit: u64, offset: u64) -> AppResult<Vec<Match>> {
        let mut rows: Vec<Match> = self
            .staged
            .matches
            .values()
            .filter(|m| m.uid1 == uid || m.uid2 == uid)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.match_id.cmp(&a.match_id))
        });
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    fn count_matches(&mut self, uid: &str) -> AppResult<u64> {
        let total = self
            .staged
            .matches
            .values()
            .filter(|m| m.uid1 == uid || m.uid2 == uid)
            .count();
        Ok(total as u64)
    }

    fn profile_cards(&mut self, uids: &[&str]) -> AppResult<Vec<ProfileCard>> {
        Ok(uids
            .iter()
            .filter_map(|uid| self.staged.profiles.get(*uid).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_like(from: &str, to: &str) -> NewLike {
        NewLike {
            from_uid: from.into(),
            to_uid: to.into(),
            like_type: LikeType::Like.as_str().into(),
        }
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let store = MemoryStore::new();
        let result: AppResult<()> = store.transaction(|tx| {
            tx.insert_like(&new_like("alice", "bob"))?;
            Err(AppError::validation("abort"))
        });
        assert!(result.is_err());
        assert_eq!(store.like_count().unwrap(), 0);
    }

    #[test]
    fn duplicate_like_is_rejected() {
        let store = MemoryStore::new();
        store
            .transaction(|tx| tx.insert_like(&new_like("alice", "bob")))
            .unwrap();
        let err = store
            .transaction(|tx| tx.insert_like(&new_like("alice", "bob")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Already liked this profile");
        assert_eq!(store.like_count().unwrap(), 1);
    }

    #[test]
    fn panicking_transaction_leaves_store_usable() {
        let store = MemoryStore::new();
        store
            .transaction(|tx| tx.insert_like(&new_like("alice", "bob")))
            .unwrap();

        let crashed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: AppResult<()> = store.transaction(|tx| {
                tx.insert_like(&new_like("bob", "alice"))?;
                panic!("boom");
            });
        }));
        assert!(crashed.is_err());

        assert!(store.ping().is_ok());
        assert_eq!(store.like_count().unwrap(), 1);
        store
            .transaction(|tx| tx.insert_like(&new_like("carol", "alice")))
            .unwrap();
        assert_eq!(store.like_count().unwrap(), 2);
    }

    #[test]
    fn offset_past_the_end_is_empty() {
        let store = MemoryStore::new();
        let rows = store
            .transaction(|tx| tx.list_matches("alice", 100, u64::MAX))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn chat_requires_existing_match() {
        let store = MemoryStore::new();
        let result = store.transaction(|tx| {
            tx.insert_chat(&NewChat {
                match_id: Uuid::now_v7(),
                unread_counts: json!({}),
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn upsert_keeps_created_at_and_advances_updated_at() {
        let store = MemoryStore::new();
        let row = NewQuizResult {
            uid: "alice".into(),
            traits: json!({}),
            values: json!({}),
            score_vectors: json!({}),
            dating_goals: "long-term".into(),
            conversation_style: None,
            deal_breakers: json!([]),
        };
        let first = store.transaction(|tx| tx.upsert_quiz(&row)).unwrap();
        let second = store.transaction(|tx| tx.upsert_quiz(&row)).unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(store.quiz_count().unwrap(), 1);
    }
}
