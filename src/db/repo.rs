use super::model::{Category, NewQuestion, Question};
use crate::store::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{instrument, warn};

pub type Pool = SqlitePool;
type Result<T> = std::result::Result<T, StoreError>;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let options = connect_options(database_url)?
        .create_if_missing(true)
        // Enable WAL and stricter durability.
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Parse a SQLite URL, expanding a leading `~` in the file path and creating the
/// file's parent directory when it has one.
fn connect_options(database_url: &str) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(database_url)?;
    let file = options.clone().get_filename().to_path_buf();
    let file = match (file.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => file,
    };
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            warn!(?err, dir = %parent.display(), "could not create database directory");
        }
    }
    Ok(options.filename(file))
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn list_questions(pool: &Pool) -> Result<Vec<Question>> {
    let rows = sqlx::query_as::<_, Question>(
        "SELECT id, question, answer, category, difficulty FROM questions ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[instrument(skip_all)]
pub async fn count_questions(pool: &Pool) -> Result<i64> {
    let cnt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await?;
    Ok(cnt)
}

#[instrument(skip_all)]
pub async fn questions_in_category(pool: &Pool, category_id: i64) -> Result<Vec<Question>> {
    let rows = sqlx::query_as::<_, Question>(
        "SELECT id, question, answer, category, difficulty FROM questions WHERE category = ? ORDER BY id",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Ids of every question, or only those in `category_id` when given.
#[instrument(skip_all)]
pub async fn question_ids(pool: &Pool, category_id: Option<i64>) -> Result<Vec<i64>> {
    let ids: Vec<i64> = match category_id {
        Some(category_id) => {
            sqlx::query_scalar("SELECT id FROM questions WHERE category = ? ORDER BY id")
                .bind(category_id)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT id FROM questions ORDER BY id")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(ids)
}

#[instrument(skip_all)]
pub async fn find_question(pool: &Pool, id: i64) -> Result<Option<Question>> {
    let row = sqlx::query_as::<_, Question>(
        "SELECT id, question, answer, category, difficulty FROM questions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[instrument(skip_all)]
pub async fn insert_question(pool: &Pool, new: &NewQuestion) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO questions (question, answer, category, difficulty) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&new.question)
    .bind(&new.answer)
    .bind(new.category)
    .bind(&new.difficulty)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Returns `false` when no row had that id.
#[instrument(skip_all)]
pub async fn delete_question(pool: &Pool, id: i64) -> Result<bool> {
    let res = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

#[instrument(skip_all)]
pub async fn list_categories(pool: &Pool) -> Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>("SELECT id, type FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[instrument(skip_all)]
pub async fn find_category(pool: &Pool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>("SELECT id, type FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

#[instrument(skip_all)]
pub async fn insert_category(pool: &Pool, kind: &str) -> Result<Category> {
    let row = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (type) VALUES (?) RETURNING id, type",
    )
    .bind(kind)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
