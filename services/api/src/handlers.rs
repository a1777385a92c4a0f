//! Axum Handlers for the REST API
//!
//! The `/flight` handler drives one agent run per request: it takes a session
//! from the warm pool, runs the agent, types the answer, and leaves deletion
//! of the consumed session and the rewarm to a detached task.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use flight_core::agent::{Content, final_text};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, instrument};

use crate::{
    models::{ErrorResponse, Query},
    state::AppState,
};

pub enum ApiError {
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Types the agent's answer: JSON when it parses as JSON, plain text otherwise.
pub fn render_answer(text: String) -> Response {
    let content_type = if serde_json::from_str::<serde_json::Value>(&text).is_ok() {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    };
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], text).into_response()
}

/// Look up a flight by number and date.
///
/// The request runs in its own task, so a caller that disconnects mid-run
/// does not cancel the agent run or the session cleanup.
#[utoipa::path(
    post,
    path = "/flight",
    request_body = Query,
    responses(
        (status = 200, description = "The agent's answer, JSON when well-formed, otherwise plain text",
            content((String = "application/json"), (String = "text/plain"))),
        (status = 204, description = "The agent produced no answer"),
        (status = 422, description = "Malformed request body"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(name = "flight_request", skip_all, fields(session_id))]
pub async fn get_flight_info(
    State(state): State<Arc<AppState>>,
    Json(query): Json<Query>,
) -> Result<Response, ApiError> {
    info!(q = %query.q, "Incoming request");
    let request = tokio::spawn(answer_query(state, query.q).in_current_span());
    request.await?
}

async fn answer_query(state: Arc<AppState>, q: String) -> Result<Response, ApiError> {
    let session = state.warmer.acquire().await?;
    tracing::Span::current().record("session_id", session.id.as_str());

    let run = async {
        let events = state
            .runner
            .run(&session.user_id, &session.id, Content::user_text(q))
            .await?;
        final_text(events).await
    };
    let answer = match run.await {
        Ok(answer) => answer,
        Err(e) => {
            error!(error = ?e, "Error while running agent");
            state.warmer.discard(&session, "run error").await;
            return Err(e.into());
        }
    };

    let response = match answer {
        Some(text) => {
            info!(answer = %text, "Agent final response");
            render_answer(text)
        }
        None => {
            info!("No final response produced by agent.");
            StatusCode::NO_CONTENT.into_response()
        }
    };

    let warmer = state.warmer.clone();
    let cleanup_span = info_span!("session_cleanup", session_id = %session.id);
    tokio::spawn(async move { warmer.retire(session).await }.instrument(cleanup_span));

    Ok(response)
}
