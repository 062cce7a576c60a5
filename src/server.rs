//! Router assembly, shared state and the serve loop.

use crate::api;
use crate::config::{Config, Cors};
use crate::error::ApiError;
use crate::quiz;
use crate::store::TriviaStore;
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use rand::rngs::StdRng;
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Request-independent state; the only shared pieces are the store and the
/// quiz random source.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TriviaStore>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    pub fn new(store: Arc<dyn TriviaStore>, rng: StdRng) -> Self {
        Self {
            store,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn from_config(store: Arc<dyn TriviaStore>, cfg: &Config) -> Self {
        Self::new(store, quiz::rng_from_seed(cfg.quiz.seed))
    }
}

pub fn cors_layer(cors: &Cors) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    if cors.allows_any() {
        return layer.allow_origin(AnyOrigin);
    }
    // Origins are checked by config validation.
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

fn panic_response(_err: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    error!("handler panicked");
    ApiError::Internal.into_response()
}

pub fn router(state: AppState, cors: &Cors) -> Router {
    Router::new()
        .route(
            "/categories",
            get(api::get_categories)
                .post(api::create_category)
                .fallback(api::method_not_allowed),
        )
        .route(
            "/categories/:category_id/questions",
            get(api::category_questions).fallback(api::method_not_allowed),
        )
        .route(
            "/questions",
            get(api::get_questions)
                .post(api::post_questions)
                .fallback(api::method_not_allowed),
        )
        .route(
            "/questions/:question_id",
            delete(api::delete_question).fallback(api::method_not_allowed),
        )
        .route(
            "/quizzes",
            post(api::play_quiz).fallback(api::method_not_allowed),
        )
        .fallback(api::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
}

pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
