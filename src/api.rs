use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::cors::CorsLayer;

use crate::errors::ImportError;
use crate::filter::{DateRange, FilteredView};
use crate::loader::ImportFile;
use crate::map::{BoundingBox, SceneSurface};
use crate::record::{parse_timestamp, RecordKey};
use crate::selection::Selection;
use crate::session::{DataStatus, Session};

/// Header carrying the original file name of an import.
pub const FILE_NAME_HEADER: &str = "x-file-name";

pub type SharedSession = Arc<Mutex<Session<SceneSurface>>>;

#[derive(Clone)]
pub struct AppState {
    session: SharedSession,
}

impl AppState {
    pub fn new(session: Session<SceneSurface>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/view", get(view))
        .route("/range", put(set_range).delete(clear_range))
        .route("/import", post(import))
        .route("/scene", get(scene))
        .route("/markers/toggle", post(toggle_markers))
        .route("/recenter", post(recenter))
        .route("/selection", get(selection).delete(dismiss))
        .route("/selection/{key}", post(select))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

macro_rules! lock {
    ($state:expr) => {
        $state.session.lock().expect("session mutex poisoned")
    };
}

async fn status(State(state): State<AppState>) -> Json<DataStatus> {
    Json(lock!(state).status().clone())
}

#[derive(Serialize)]
struct ViewOut {
    range: Option<DateRange>,
    #[serde(flatten)]
    view: FilteredView,
}

fn view_out(range: Option<DateRange>, view: &FilteredView) -> Json<ViewOut> {
    Json(ViewOut {
        range,
        view: view.clone(),
    })
}

async fn view(State(state): State<AppState>) -> Json<ViewOut> {
    let s = lock!(state);
    view_out(s.range(), &s.view())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RangeReq {
    Instants {
        #[serde(deserialize_with = "instant")]
        from: NaiveDateTime,
        #[serde(deserialize_with = "instant")]
        to: NaiveDateTime,
    },
    Days {
        from_day: NaiveDate,
        to_day: NaiveDate,
    },
}

/// Accepts the document format (`2023-01-10 10:00:00`) or ISO 8601 (`2023-01-10T10:00:00`).
fn instant<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw)
        .or_else(|| raw.trim().parse::<NaiveDateTime>().ok())
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date-time `{raw}`")))
}

async fn set_range(State(state): State<AppState>, Json(body): Json<RangeReq>) -> Json<ViewOut> {
    let range = match body {
        RangeReq::Instants { from, to } => DateRange::new(from, to),
        RangeReq::Days { from_day, to_day } => DateRange::from_days(from_day, to_day),
    };
    let mut s = lock!(state);
    let v = s.set_range(Some(range));
    view_out(s.range(), &v)
}

async fn clear_range(State(state): State<AppState>) -> Json<ViewOut> {
    let mut s = lock!(state);
    let v = s.set_range(None);
    view_out(None, &v)
}

#[derive(Serialize)]
struct ImportOut {
    records: usize,
}

#[derive(Serialize)]
struct ErrorOut {
    error: String,
}

async fn import(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let file = ImportFile {
        name: header_str(FILE_NAME_HEADER),
        content_type: header_str(header::CONTENT_TYPE.as_str()),
        bytes: body.to_vec(),
    };

    let result = lock!(state).import(&file);
    match result {
        Ok(records) => (StatusCode::OK, Json(ImportOut { records })).into_response(),
        Err(e) => {
            let code = match e {
                ImportError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ImportError::Encoding(_) | ImportError::Decode(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            (
                code,
                Json(ErrorOut {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn scene(State(state): State<AppState>) -> Json<SceneSurface> {
    Json(lock!(state).surface().clone())
}

#[derive(Serialize)]
struct MarkersOut {
    shown: bool,
}

async fn toggle_markers(State(state): State<AppState>) -> Json<MarkersOut> {
    let shown = lock!(state).toggle_markers();
    Json(MarkersOut { shown })
}

async fn recenter(State(state): State<AppState>) -> Json<Option<BoundingBox>> {
    Json(lock!(state).recenter())
}

async fn select(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let key = RecordKey::from(key.as_str());
    match lock!(state).select_marker(&key) {
        Some(sel) => Json(sel).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorOut {
                error: format!("no marker with key {key}"),
            }),
        )
            .into_response(),
    }
}

async fn selection(State(state): State<AppState>) -> Json<Option<Selection>> {
    Json(lock!(state).selection())
}

async fn dismiss(State(state): State<AppState>) -> StatusCode {
    lock!(state).dismiss_selection();
    StatusCode::NO_CONTENT
}
