//! YAML fixtures for seeding a fresh store with categories and questions.
//!
//! Fixture questions name their category by 1-based position in the fixture's
//! `categories` list; ids are remapped to whatever the store assigns.

use crate::db::NewQuestion;
use crate::store::{StoreError, TriviaStore};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("question {index} references unknown category position {position}")]
    UnknownCategory { index: usize, position: usize },
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Fixture {
    pub categories: Vec<String>,
    #[serde(default)]
    pub questions: Vec<FixtureQuestion>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FixtureQuestion {
    pub question: String,
    pub answer: String,
    pub category: usize,
    #[serde(default)]
    pub difficulty: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub questions: usize,
}

pub fn load(path: &Path) -> Result<Fixture, SeedError> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<Fixture, SeedError> {
    let fixture: Fixture = serde_yaml::from_str(content)?;
    validate(&fixture)?;
    Ok(fixture)
}

fn validate(fixture: &Fixture) -> Result<(), SeedError> {
    for (index, q) in fixture.questions.iter().enumerate() {
        if q.category == 0 || q.category > fixture.categories.len() {
            return Err(SeedError::UnknownCategory {
                index,
                position: q.category,
            });
        }
    }
    Ok(())
}

/// Insert every category, then every question, in fixture order.
#[instrument(skip_all)]
pub async fn apply(store: &dyn TriviaStore, fixture: &Fixture) -> Result<SeedReport, SeedError> {
    validate(fixture)?;

    let mut category_ids = Vec::with_capacity(fixture.categories.len());
    for kind in &fixture.categories {
        let category = store.insert_category(kind).await?;
        category_ids.push(category.id);
    }

    for q in &fixture.questions {
        let new = NewQuestion {
            question: q.question.clone(),
            answer: q.answer.clone(),
            category: category_ids[q.category - 1],
            difficulty: q.difficulty.clone(),
        };
        store.insert_question(&new).await?;
    }

    let report = SeedReport {
        categories: category_ids.len(),
        questions: fixture.questions.len(),
    };
    info!(categories = report.categories, questions = report.questions, "seeded store");
    Ok(report)
}
