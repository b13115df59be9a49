use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use uuid::Uuid;

use kindred_shared::clients::db::DbPool;
use kindred_shared::errors::{AppError, AppResult};

use crate::models::{Chat, Like, LikeType, Match, NewChat, NewLike, NewMatch, NewQuizResult, ProfileCard, QuizResult};
use crate::schema::{chats, likes, matches, profiles, quiz_results};

use super::{DiscoveryStore, DiscoveryTx, PairKey};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn run<T, F>(&self, pair: Option<&PairKey>, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn DiscoveryTx) -> AppResult<T>,
    {
        let mut pooled = self.pool.get().map_err(AppError::internal)?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<T, AppError, _>(|conn| {
            if let Some(pair) = pair {
                // Held until commit/rollback; concurrent likes on the same
                // pair queue here instead of racing the reciprocity check.
                diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                    .bind::<Text, _>(pair.lock_name())
                    .execute(conn)?;
            }
            let mut tx = PgTx { conn };
            f(&mut tx)
        })
    }
}

impl DiscoveryStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn DiscoveryTx) -> AppResult<T>,
    {
        self.run(None, f)
    }

    fn pair_transaction<T, F>(&self, pair: &PairKey, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn DiscoveryTx) -> AppResult<T>,
    {
        self.run(Some(pair), f)
    }

    fn ping(&self) -> AppResult<()> {
        let mut pooled = self.pool.get().map_err(AppError::internal)?;
        let conn: &mut PgConnection = &mut pooled;
        diesel::sql_query("SELECT 1").execute(conn)?;
        Ok(())
    }
}

struct PgTx<'c> {
    conn: &'c mut PgConnection,
}

fn map_unique_violation(err: DieselError, on_conflict: fn() -> AppError) -> AppError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => on_conflict(),
        other => AppError::Database(other),
    }
}

impl DiscoveryTx for PgTx<'_> {
    fn find_quiz(&mut self, uid: &str) -> AppResult<Option<QuizResult>> {
        let quiz = quiz_results::table
            .filter(quiz_results::uid.eq(uid))
            .select(QuizResult::as_select())
            .first(self.conn)
            .optional()?;
        Ok(quiz)
    }

    fn upsert_quiz(&mut self, row: &NewQuizResult) -> AppResult<QuizResult> {
        let quiz = diesel::insert_into(quiz_results::table)
            .values(row)
            .on_conflict(quiz_results::uid)
            .do_update()
            .set((row, quiz_results::updated_at.eq(diesel::dsl::now)))
            .returning(QuizResult::as_returning())
            .get_result(self.conn)?;
        Ok(quiz)
    }

    fn find_like(&mut self, from_uid: &str, to_uid: &str) -> AppResult<Option<Like>> {
        let like = likes::table
            .filter(likes::from_uid.eq(from_uid))
            .filter(likes::to_uid.eq(to_uid))
            .select(Like::as_select())
            .first(self.conn)
            .optional()?;
        Ok(like)
    }

    fn insert_like(&mut self, like: &NewLike) -> AppResult<Like> {
        diesel::insert_into(likes::table)
            .values(like)
            .returning(Like::as_returning())
            .get_result(self.conn)
            .map_err(|e| map_unique_violation(e, AppError::already_liked))
    }

    fn find_like_of_type(
        &mut self,
        from_uid: &str,
        to_uid: &str,
        types: &[LikeType],
    ) -> AppResult<Option<Like>> {
        let type_names: Vec<&str> = types.iter().map(LikeType::as_str).collect();
        let like = likes::table
            .filter(likes::from_uid.eq(from_uid))
            .filter(likes::to_uid.eq(to_uid))
            .filter(likes::like_type.eq_any(type_names))
            .select(Like::as_select())
            .first(self.conn)
            .optional()?;
        Ok(like)
    }

    fn find_match(&mut self, pair: &PairKey) -> AppResult<Option<Match>> {
        let found = matches::table
            .filter(matches::uid1.eq(pair.low()))
            .filter(matches::uid2.eq(pair.high()))
            .select(Match::as_select())
            .first(self.conn)
            .optional()?;
        Ok(found)
    }

    fn insert_match(&mut self, new_match: &NewMatch) -> AppResult<Match> {
        let created = diesel::insert_into(matches::table)
            .values(new_match)
            .returning(Match::as_returning())
            .get_result(self.conn)?;
        Ok(created)
    }

    fn insert_chat(&mut self, chat: &NewChat) -> AppResult<Chat> {
        let created = diesel::insert_into(chats::table)
            .values(chat)
            .returning(Chat::as_returning())
            .get_result(self.conn)?;
        Ok(created)
    }

    fn find_chat(&mut self, match_id: Uuid) -> AppResult<Option<Chat>> {
        let chat = chats::table
            .find(match_id)
            .select(Chat::as_select())
            .first(self.conn)
            .optional()?;
        Ok(chat)
    }

    fn list_matches(&mut self, uid: &str, limit: u64, offset: u64) -> AppResult<Vec<Match>> {
        let rows = matches::table
            .filter(matches::uid1.eq(uid).or(matches::uid2.eq(uid)))
            .order((matches::created_at.desc(), matches::match_id.desc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .offset(i64::try_from(offset).unwrap_or(i64::MAX))
            .select(Match::as_select())
            .load(self.conn)?;
        Ok(rows)
    }

    fn count_matches(&mut self, uid: &str) -> AppResult<u64> {
        let total: i64 = matches::table
            .filter(matches::uid1.eq(uid).or(matches::uid2.eq(uid)))
            .count()
            .get_result(self.conn)?;
        Ok(total.max(0) as u64)
    }

    fn profile_cards(&mut self, uids: &[&str]) -> AppResult<Vec<ProfileCard>> {
        if uids.is_empty() {
            return Ok(vec![]);
        }
        let cards = profiles::table
            .filter(profiles::uid.eq_any(uids.to_vec()))
            .select(ProfileCard::as_select())
            .load(self.conn)?;
        Ok(cards)
    }
}
