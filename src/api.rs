//! Request schemas and HTTP handlers.
//!
//! Each handler is a straight-line composition of a store call and one of the
//! pagination / search / quiz transforms, with store failures mapped onto an
//! [`ApiError`] per route.

use crate::db::{Category, NewQuestion, Question};
use crate::error::ApiError;
use crate::paginate::{paginate, parse_page};
use crate::quiz;
use crate::search;
use crate::server::AppState;
use crate::store::StoreError;
use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Read a JSON body. An empty (or whitespace-only) body is `Ok(None)`.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        parse_page(self.page.as_deref())
    }

    /// A query string that does not deserialize reads as page 1.
    pub fn page_or_first(query: Result<Query<PageQuery>, QueryRejection>) -> i64 {
        match query {
            Ok(Query(query)) => query.page(),
            Err(err) => {
                debug!(%err, "unreadable query string");
                1
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
}

impl CreateCategoryRequest {
    fn valid_type(&self) -> Option<&str> {
        match &self.kind {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// POST /questions carries either a search or a new question.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionsPostRequest {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<Value>,
    pub difficulty: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),
}

impl QuestionsPostRequest {
    pub fn search_term(&self) -> Option<&str> {
        search::normalize_term(self.search_term.as_deref())
    }

    pub fn to_new_question(&self) -> Result<NewQuestion, ValidationError> {
        let question = non_blank(self.question.as_deref()).ok_or(ValidationError::Missing("question"))?;
        let answer = non_blank(self.answer.as_deref()).ok_or(ValidationError::Missing("answer"))?;
        let category = match &self.category {
            None | Some(Value::Null) => return Err(ValidationError::Missing("category")),
            Some(v) => id_value(v).ok_or(ValidationError::WrongType("category"))?,
        };
        let difficulty = match &self.difficulty {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(ValidationError::WrongType("difficulty")),
        };
        Ok(NewQuestion {
            question: question.to_string(),
            answer: answer.to_string(),
            category,
            difficulty,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub quiz_category: Option<Value>,
    #[serde(default)]
    pub previous_questions: Vec<i64>,
}

impl QuizRequest {
    /// Accepts an id, a numeric string, or a `{"id": ..}` object; `null` and
    /// absent mean every category.
    pub fn category(&self) -> Result<Option<i64>, ValidationError> {
        match &self.quiz_category {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(obj)) => match obj.get("id") {
                None | Some(Value::Null) => Ok(None),
                Some(v) => id_value(v).map(Some).ok_or(ValidationError::WrongType("quiz_category")),
            },
            Some(v) => id_value(v).map(Some).ok_or(ValidationError::WrongType("quiz_category")),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn id_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| whole_float(n.as_f64()?)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `4.0` is id 4; `4.5` is not an id.
fn whole_float(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: BTreeMap<i64, String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionPageResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: i64,
    pub categories: BTreeMap<i64, String>,
    pub current_category: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatedQuestionResponse {
    pub success: bool,
    pub created: i64,
    pub questions: Vec<Question>,
    pub total_questions: i64,
}

/// POST /questions answers with either shape.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuestionsPostResponse {
    Search(SearchResponse),
    Created(CreatedQuestionResponse),
}

#[derive(Debug, Serialize)]
pub struct CreatedCategoryResponse {
    pub success: bool,
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct CategoryQuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: i64,
    pub current_category: String,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub question: Option<Question>,
}

fn category_map(categories: Vec<Category>) -> BTreeMap<i64, String> {
    categories.into_iter().map(|c| (c.id, c.kind)).collect()
}

fn total(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[instrument(skip_all)]
pub async fn get_categories(State(state): State<AppState>) -> ApiResult<CategoriesResponse> {
    let categories = state.store.list_categories().await.map_err(|err| {
        warn!(?err, "failed to list categories");
        ApiError::Internal
    })?;
    Ok(Json(CategoriesResponse {
        success: true,
        categories: category_map(categories),
    }))
}

#[instrument(skip_all)]
pub async fn get_questions(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<QuestionPageResponse> {
    let internal = |err: StoreError| {
        warn!(?err, "failed to load questions page");
        ApiError::Internal
    };
    let selection = state.store.list_questions().await.map_err(internal)?;
    let categories = state.store.list_categories().await.map_err(internal)?;
    let current = paginate(&selection, PageQuery::page_or_first(query));
    if current.is_empty() {
        return Err(ApiError::NotFound);
    }
    let total_questions = state.store.count_questions().await.map_err(internal)?;
    Ok(Json(QuestionPageResponse {
        success: true,
        questions: current,
        total_questions,
        categories: category_map(categories),
        current_category: String::new(),
    }))
}

#[instrument(skip_all)]
pub async fn delete_question(
    State(state): State<AppState>,
    question_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeletedResponse> {
    let Ok(Path(question_id)) = question_id else {
        return Err(ApiError::NotFound);
    };
    // A missing id surfaces as 422, same as any other delete failure.
    if let Err(err) = state.store.delete_question(question_id).await {
        warn!(?err, question_id, "failed to delete question");
        return Err(ApiError::Unprocessable);
    }
    info!(question_id, "deleted question");
    Ok(Json(DeletedResponse {
        success: true,
        deleted: question_id,
    }))
}

#[instrument(skip_all)]
pub async fn post_questions(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<QuestionsPostResponse> {
    let page = PageQuery::page_or_first(query);
    let req: QuestionsPostRequest = match parse_body(&body) {
        Ok(Some(req)) => req,
        Ok(None) => return Err(ApiError::Unprocessable),
        Err(err) => {
            warn!(?err, "invalid questions body");
            return Err(ApiError::Unprocessable);
        }
    };
    let unprocessable = |err: StoreError| {
        warn!(?err, "questions store call failed");
        ApiError::Unprocessable
    };

    if let Some(term) = req.search_term() {
        let selection = state.store.list_questions().await.map_err(unprocessable)?;
        let hits = search::filter_questions(selection, term);
        return Ok(Json(QuestionsPostResponse::Search(SearchResponse {
            success: true,
            questions: paginate(&hits, page),
            total_questions: total(hits.len()),
        })));
    }

    let new = req.to_new_question().map_err(|err| {
        warn!(%err, "rejected question");
        ApiError::Unprocessable
    })?;
    let created = state.store.insert_question(&new).await.map_err(unprocessable)?;
    info!(created, category = new.category, "created question");

    let selection = state.store.list_questions().await.map_err(unprocessable)?;
    let total_questions = state.store.count_questions().await.map_err(unprocessable)?;
    Ok(Json(QuestionsPostResponse::Created(CreatedQuestionResponse {
        success: true,
        created,
        questions: paginate(&selection, page),
        total_questions,
    })))
}

#[instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<CreatedCategoryResponse> {
    let req: CreateCategoryRequest = parse_body(&body)
        .ok()
        .flatten()
        .ok_or(ApiError::BadRequest)?;
    let kind = req.valid_type().ok_or(ApiError::BadRequest)?;
    let category = state.store.insert_category(kind).await.map_err(|err| {
        warn!(?err, "failed to create category");
        ApiError::BadRequest
    })?;
    info!(id = category.id, kind = %category.kind, "created category");
    Ok(Json(CreatedCategoryResponse {
        success: true,
        category,
    }))
}

#[instrument(skip_all)]
pub async fn category_questions(
    State(state): State<AppState>,
    category_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<CategoryQuestionsResponse> {
    let Ok(Path(category_id)) = category_id else {
        return Err(ApiError::NotFound);
    };
    if category_id == 0 {
        return Err(ApiError::NotFound);
    }
    let not_found = |err: StoreError| {
        warn!(?err, category_id, "failed to load category questions");
        ApiError::NotFound
    };
    let questions = state
        .store
        .questions_in_category(category_id)
        .await
        .map_err(not_found)?;
    let category = state
        .store
        .find_category(category_id)
        .await
        .map_err(not_found)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(CategoryQuestionsResponse {
        success: true,
        total_questions: total(questions.len()),
        questions: paginate(&questions, PageQuery::page_or_first(query)),
        current_category: category.kind,
    }))
}

#[instrument(skip_all)]
pub async fn play_quiz(State(state): State<AppState>, body: Bytes) -> ApiResult<QuizResponse> {
    let req: QuizRequest = match parse_body(&body) {
        Ok(Some(req)) => req,
        Ok(None) => return Err(ApiError::BadRequest),
        Err(err) => {
            warn!(?err, "invalid quiz body");
            return Err(ApiError::BadRequest);
        }
    };
    let category = req.category().map_err(|err| {
        warn!(%err, "rejected quiz request");
        ApiError::BadRequest
    })?;
    let question = quiz::next_question(
        state.store.as_ref(),
        category,
        &req.previous_questions,
        &state.rng,
    )
    .await
    .map_err(|err| {
        warn!(?err, "failed to draw quiz question");
        ApiError::Internal
    })?;
    Ok(Json(QuizResponse {
        success: true,
        question,
    }))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
