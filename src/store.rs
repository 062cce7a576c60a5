//! Store abstraction injected into the HTTP layer.
//!
//! `TriviaStore` is the seam between handlers and persistence; `SqliteStore`
//! forwards to the SQL repositories in [`crate::db`].

use crate::db::{self, Category, NewQuestion, Pool, Question};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TriviaStore: Send + Sync {
    /// All questions in ascending id order.
    async fn list_questions(&self) -> StoreResult<Vec<Question>>;

    async fn count_questions(&self) -> StoreResult<i64>;

    async fn questions_in_category(&self, category_id: i64) -> StoreResult<Vec<Question>>;

    /// Candidate ids for a quiz round; `None` spans every category.
    async fn question_ids(&self, category_id: Option<i64>) -> StoreResult<Vec<i64>>;

    async fn find_question(&self, id: i64) -> StoreResult<Option<Question>>;

    async fn insert_question(&self, new: &NewQuestion) -> StoreResult<i64>;

    /// Fails with [`StoreError::NotFound`] when the id does not exist.
    async fn delete_question(&self, id: i64) -> StoreResult<()>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn find_category(&self, id: i64) -> StoreResult<Option<Category>>;

    async fn insert_category(&self, kind: &str) -> StoreResult<Category>;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TriviaStore for SqliteStore {
    async fn list_questions(&self) -> StoreResult<Vec<Question>> {
        db::list_questions(&self.pool).await
    }

    async fn count_questions(&self) -> StoreResult<i64> {
        db::count_questions(&self.pool).await
    }

    async fn questions_in_category(&self, category_id: i64) -> StoreResult<Vec<Question>> {
        db::questions_in_category(&self.pool, category_id).await
    }

    async fn question_ids(&self, category_id: Option<i64>) -> StoreResult<Vec<i64>> {
        db::question_ids(&self.pool, category_id).await
    }

    async fn find_question(&self, id: i64) -> StoreResult<Option<Question>> {
        db::find_question(&self.pool, id).await
    }

    async fn insert_question(&self, new: &NewQuestion) -> StoreResult<i64> {
        db::insert_question(&self.pool, new).await
    }

    async fn delete_question(&self, id: i64) -> StoreResult<()> {
        if db::delete_question(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        db::list_categories(&self.pool).await
    }

    async fn find_category(&self, id: i64) -> StoreResult<Option<Category>> {
        db::find_category(&self.pool, id).await
    }

    async fn insert_category(&self, kind: &str) -> StoreResult<Category> {
        db::insert_category(&self.pool, kind).await
    }
}
