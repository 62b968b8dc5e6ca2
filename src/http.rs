use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::character::{Character, CharacterDraft, CharacterId, CharacterPatch};
use crate::roster::{Roster, RosterError};

pub type AppState = Arc<Roster>;

const NOT_FOUND: &str = "Not found";
const DELETE_NOT_FOUND: &str = "This characters doesn't exist";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn deleted(id: CharacterId) -> Self {
        Self {
            message: format!("The character with id {} is deleted succesfully", id),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }

    /// Maps a roster failure, using `not_found` as the body of a 404.
    fn from_roster(e: RosterError, not_found: &str) -> Self {
        match e {
            RosterError::NotFound(_) => Self::not_found(not_found),
            RosterError::Storage(e) => {
                log::error!("Storage failure: {}", e);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: e.to_string(),
                }
            }
        }
    }
}

impl From<RosterError> for ApiError {
    fn from(e: RosterError) -> Self {
        Self::from_roster(e, NOT_FOUND)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Reads the leading integer of a path segment, so `1abc` and `1.5` both
/// address id 1. `None` when the segment does not start with digits.
fn parse_id(raw: &str) -> Option<CharacterId> {
    let raw = raw.trim_start();
    let unsigned = raw.strip_prefix(&['+', '-'][..]).unwrap_or(raw);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    let sign_len = raw.len() - unsigned.len();
    raw[..sign_len + digits].parse().ok()
}

fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// A JSON request body. Requests that do not declare a JSON content type carry
/// an empty payload instead of being rejected.
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(request: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        if !declares_json(request.headers()) {
            log::debug!("Body without JSON content type, using an empty payload");
            return Ok(Payload(T::default()));
        }
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Payload(value))
    }
}

pub fn router(roster: AppState) -> Router {
    Router::new()
        .route("/characters", get(list_characters).post(create_character))
        .route(
            "/characters/:id",
            get(get_character)
                .put(update_character)
                .delete(delete_character),
        )
        .layer(middleware::from_fn(cors))
        .layer(middleware::from_fn(log_requests))
        .with_state(roster)
}

async fn list_characters(
    State(roster): State<AppState>,
) -> Result<Json<Vec<Character>>, ApiError> {
    Ok(Json(roster.list().await?))
}

async fn get_character(
    State(roster): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Character>, ApiError> {
    let id = parse_id(&raw_id).ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(roster.get(id).await?))
}

async fn create_character(
    State(roster): State<AppState>,
    Payload(draft): Payload<CharacterDraft>,
) -> Result<(StatusCode, Json<Character>), ApiError> {
    let character = roster.create(draft).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

async fn update_character(
    State(roster): State<AppState>,
    Path(raw_id): Path<String>,
    Payload(patch): Payload<CharacterPatch>,
) -> Result<Json<Character>, ApiError> {
    let id = parse_id(&raw_id).ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(roster.update(id, patch).await?))
}

async fn delete_character(
    State(roster): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_id(&raw_id).ok_or_else(|| ApiError::not_found(DELETE_NOT_FOUND))?;
    roster
        .delete(id)
        .await
        .map_err(|e| ApiError::from_roster(e, DELETE_NOT_FOUND))?;
    Ok(Json(MessageBody::deleted(id)))
}

/// Allows any origin. Preflight requests are answered here and never reach
/// the routes.
async fn cors(request: Request<Body>, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,HEAD,PUT,PATCH,POST,DELETE"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}
