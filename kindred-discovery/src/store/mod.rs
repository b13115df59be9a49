//! Persistence seam for the discovery service.
//!
//! Engine logic runs against [`DiscoveryTx`], one open transaction. A store
//! hands out transactions through [`DiscoveryStore::transaction`] or, when a
//! read-decide-write sequence must be linearizable for one user pair,
//! [`DiscoveryStore::pair_transaction`].

use uuid::Uuid;

use kindred_shared::errors::AppResult;

use crate::models::{Chat, Like, LikeType, Match, NewChat, NewLike, NewMatch, NewQuizResult, ProfileCard, QuizResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Canonical key for an unordered pair of users: `{a, b}` and `{b, a}`
/// produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    low: String,
    high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }

    /// Stable lock name. The length prefix keeps uids containing `:` from
    /// colliding with other pairs.
    pub fn lock_name(&self) -> String {
        format!("discovery:pair:{}:{}:{}", self.low.len(), self.low, self.high)
    }
}

/// Operations available inside one store transaction.
pub trait DiscoveryTx {
    fn find_quiz(&mut self, uid: &str) -> AppResult<Option<QuizResult>>;

    /// Inserts or fully replaces the quiz row for `row.uid`, refreshing
    /// `updated_at`.
    fn upsert_quiz(&mut self, row: &NewQuizResult) -> AppResult<QuizResult>;

    fn find_like(&mut self, from_uid: &str, to_uid: &str) -> AppResult<Option<Like>>;

    /// Fails with `AlreadyLiked` if the ordered pair already has a like.
    fn insert_like(&mut self, like: &NewLike) -> AppResult<Like>;

    /// A like from `from_uid` to `to_uid` whose type is one of `types`.
    fn find_like_of_type(
        &mut self,
        from_uid: &str,
        to_uid: &str,
        types: &[LikeType],
    ) -> AppResult<Option<Like>>;

    fn find_match(&mut self, pair: &PairKey) -> AppResult<Option<Match>>;

    fn insert_match(&mut self, new_match: &NewMatch) -> AppResult<Match>;

    fn insert_chat(&mut self, chat: &NewChat) -> AppResult<Chat>;

    fn find_chat(&mut self, match_id: Uuid) -> AppResult<Option<Chat>>;

    /// Matches involving `uid`, newest first.
    fn list_matches(&mut self, uid: &str, limit: u64, offset: u64) -> AppResult<Vec<Match>>;

    fn count_matches(&mut self, uid: &str) -> AppResult<u64>;

    /// Public cards for the given uids; unknown uids are skipped.
    fn profile_cards(&mut self, uids: &[&str]) -> AppResult<Vec<ProfileCard>>;
}

pub trait DiscoveryStore: Clone + Send + Sync + 'static {
    /// Short backend name for logs and health checks.
    fn backend(&self) -> &'static str;

    /// Runs `f` in one transaction; an `Err` rolls everything back.
    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn DiscoveryTx) -> AppResult<T>;

    /// Like [`transaction`](Self::transaction), additionally serialized
    /// against every other pair transaction on the same [`PairKey`].
    fn pair_transaction<T, F>(&self, pair: &PairKey, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn DiscoveryTx) -> AppResult<T>;

    /// Cheap connectivity probe.
    fn ping(&self) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_ignores_direction() {
        assert_eq!(PairKey::new("bob", "alice"), PairKey::new("alice", "bob"));
        let key = PairKey::new("bob", "alice");
        assert_eq!(key.low(), "alice");
        assert_eq!(key.high(), "bob");
    }

    #[test]
    fn lock_names_do_not_collide_on_separators() {
        let a = PairKey::new("a:b", "c");
        let b = PairKey::new("a", "b:c");
        assert_ne!(a.lock_name(), b.lock_name());
    }
}
