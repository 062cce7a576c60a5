use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use trivia_api::config::Cors;
use trivia_api::db::{Category, NewQuestion, Question};
use trivia_api::server::{self, AppState};
use trivia_api::store::{StoreError, StoreResult, TriviaStore};

/// Every call fails as if the pool had gone away.
#[derive(Default)]
struct BrokenStore {
    calls: AtomicUsize,
}

impl BrokenStore {
    fn fail<T>(&self) -> StoreResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

#[async_trait]
impl TriviaStore for BrokenStore {
    async fn list_questions(&self) -> StoreResult<Vec<Question>> {
        self.fail()
    }
    async fn count_questions(&self) -> StoreResult<i64> {
        self.fail()
    }
    async fn questions_in_category(&self, _category_id: i64) -> StoreResult<Vec<Question>> {
        self.fail()
    }
    async fn question_ids(&self, _category_id: Option<i64>) -> StoreResult<Vec<i64>> {
        self.fail()
    }
    async fn find_question(&self, _id: i64) -> StoreResult<Option<Question>> {
        self.fail()
    }
    async fn insert_question(&self, _new: &NewQuestion) -> StoreResult<i64> {
        self.fail()
    }
    async fn delete_question(&self, _id: i64) -> StoreResult<()> {
        self.fail()
    }
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.fail()
    }
    async fn find_category(&self, _id: i64) -> StoreResult<Option<Category>> {
        self.fail()
    }
    async fn insert_category(&self, _kind: &str) -> StoreResult<Category> {
        self.fail()
    }
}

fn broken_app() -> (Router, Arc<BrokenStore>) {
    let store = Arc::new(BrokenStore::default());
    let state = AppState::new(store.clone(), StdRng::seed_from_u64(1));
    (server::router(state, &Cors::default()), store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn write_failures_map_per_route() {
    let (app, store) = broken_app();

    let new_question = json!({"question": "q", "answer": "a", "category": 1, "difficulty": "1"});
    let (status, body) = send(&app, Method::POST, "/questions", Some(new_question)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "unprocessable");

    let (status, _) = send(&app, Method::DELETE, "/questions/1", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) =
        send(&app, Method::POST, "/categories", Some(json!({"type": "Music"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "bad request");

    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn read_failures_map_per_route() {
    let (app, _) = broken_app();

    let (status, _) = send(&app, Method::POST, "/questions", Some(json!({"searchTerm": "x"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, Method::GET, "/categories/1/questions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "resource not found");

    let (status, body) = send(&app, Method::GET, "/categories", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": 500, "message": "internal server error"}));

    let (status, _) = send(&app, Method::GET, "/questions", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(
        &app,
        Method::POST,
        "/quizzes",
        Some(json!({"quiz_category": 1, "previous_questions": []})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn validation_runs_before_the_store() {
    let (app, store) = broken_app();

    let (status, _) = send(&app, Method::POST, "/categories", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::POST, "/quizzes", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::POST, "/questions", Some(json!({"answer": "a"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}
