//! HTTP surface: routes, session cookies, and the serve loop.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::core::actions::SessionAction;
use crate::core::controller::SessionController;
use crate::core::session::SessionPhase;
use crate::core::store::{SessionHandle, SessionId, SessionStore};
use crate::ui::page::{render_gate, render_main};
use crate::ui::transcript::render_transcript;

pub const SESSION_COOKIE: &str = "chatpane_session";

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub controller: SessionController,
}

impl AppState {
    pub fn new(store: SessionStore, controller: SessionController) -> Self {
        Self { store, controller }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenForm {
    #[serde(default)]
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ModelForm {
    #[serde(default)]
    model: String,
}

#[derive(Debug, Default, Deserialize)]
struct MessageForm {
    #[serde(default)]
    text: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/token", post(submit_token))
        .route("/model", post(apply_model))
        .route("/message", post(submit_message))
        .route("/reset-token", post(reset_token))
        .route("/reset", post(reset_application))
        .route("/transcript", get(transcript))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn session_id_from(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: SessionId) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={id}; HttpOnly; SameSite=Lax; Path=/"
    ))
    .ok()
}

/// Attach the session cookie when the session was created by this request.
fn with_cookie(response: impl IntoResponse, id: SessionId, created: bool) -> Response {
    let mut response = response.into_response();
    if created {
        if let Some(cookie) = session_cookie(id) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

async fn session_for(state: &AppState, headers: &HeaderMap) -> (SessionId, SessionHandle, bool) {
    state.store.get_or_create(session_id_from(headers)).await
}

async fn dispatch(state: &AppState, headers: &HeaderMap, action: SessionAction) -> Response {
    let (id, handle, created) = session_for(state, headers).await;
    {
        let mut session = handle.lock().await;
        state.controller.dispatch(&mut session, action).await;
    }
    with_cookie(Redirect::to("/"), id, created)
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, handle, created) = session_for(&state, &headers).await;
    let page = {
        let mut session = handle.lock().await;
        let notices = session.take_notices();
        if session.phase() == SessionPhase::Unauthenticated {
            render_gate(&notices)
        } else {
            let client = state.controller.check_client(&session);
            if let Err(err) = &client {
                debug!(session = %id, error = %err, "no client for session");
            }
            render_main(
                &session,
                state.controller.registry(),
                client.as_ref().map(|_| ()),
                &notices,
            )
        }
    };
    with_cookie(Html(page), id, created)
}

async fn submit_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Response {
    dispatch(&state, &headers, SessionAction::SubmitToken { token: form.token }).await
}

async fn apply_model(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ModelForm>,
) -> Response {
    dispatch(&state, &headers, SessionAction::ApplyModel { model: form.model }).await
}

async fn submit_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<MessageForm>,
) -> Response {
    dispatch(&state, &headers, SessionAction::SubmitMessage { text: form.text }).await
}

async fn reset_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    dispatch(&state, &headers, SessionAction::ResetToken).await
}

async fn reset_application(State(state): State<AppState>, headers: HeaderMap) -> Response {
    dispatch(&state, &headers, SessionAction::ResetApplication).await
}

async fn transcript(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(id) = session_id_from(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(handle) = state.store.get(&id).await else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let session = handle.lock().await;
    if session.phase() == SessionPhase::Unauthenticated {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Html(render_transcript(session.conversation())).into_response()
}
