//! Database module: entity models and SQL repositories.
//!
//! - `model`: typed entities returned by repositories.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! The repository API is re-exported at `trivia_api::db::*`.

pub mod model;
pub mod repo;

pub use model::{Category, NewQuestion, Question};
pub use repo::*;
