//! HTTP surface
//!
//! `POST /run` decodes a submission, writes it once, runs it against every
//! case and reports one log per case. Any method other than POST is 405
//! whatever the path; a POST to an unknown path is 404.

pub mod submission;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::engine::{CodeEngine, EngineError, ExecutionContext};
use crate::languages::{Language, LanguageRegistry};
use submission::{ResponseBody, RunLog, Submission};

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn CodeEngine>,
    pub languages: &'static LanguageRegistry,
    pub run_timeout: Option<Duration>,
    /// Cancelled on shutdown; every run gets a child token
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::HEAD])
        .allow_headers([
            ORIGIN,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        .route("/run", post(handle_run))
        .fallback(fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback(method: Method, uri: Uri) -> StatusCode {
    debug!("No route for {} {}", method, uri);
    if method == Method::POST {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::METHOD_NOT_ALLOWED
    }
}

async fn handle_run(State(state): State<AppState>, body: Bytes) -> Response {
    let submission: Submission = match serde_json::from_slice(&body) {
        Ok(submission) => submission,
        Err(e) => return bad_request(e),
    };

    let Some(language) = state.languages.resolve(&submission.language) else {
        return bad_request(format!("unsupported language {:?}", submission.language));
    };

    info!(
        "Received submission: language={}, bytes={}",
        language,
        submission.source_code.len()
    );

    // Runs in its own task so the artifact is deleted even if the client goes away
    match tokio::spawn(process_submission(state, language, submission)).await {
        Ok(Ok(body)) => Json(body).into_response(),
        Ok(Err(e)) => {
            error!("Failed to prepare submission: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!("Submission task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn process_submission(
    state: AppState,
    language: Language,
    submission: Submission,
) -> Result<ResponseBody, EngineError> {
    let code = state
        .engine
        .write_code(language, &submission.source_code)
        .await?;

    let cases = submission.cases();
    let mut logs = Vec::with_capacity(cases.len());

    for case in cases {
        let ctx = ExecutionContext::new()
            .with_cancellation(state.shutdown.child_token())
            .with_timeout(state.run_timeout);

        let outcome = state.engine.run(&ctx, &code, case.input.as_bytes()).await;
        if let Err(e) = &outcome {
            warn!("Case {} failed: {}", case.id, e);
        }

        logs.push(RunLog::record(case, outcome));
    }

    state.engine.delete_code(code).await;

    Ok(ResponseBody {
        language: submission.language,
        logs,
    })
}

fn bad_request(reason: impl std::fmt::Display) -> Response {
    (StatusCode::BAD_REQUEST, format!("Bad Request: {}", reason)).into_response()
}
