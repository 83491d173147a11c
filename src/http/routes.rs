use std::path::Path;

use axum::{
    body::Body,
    extract::{Path as UrlPath, Request, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use super::{error::AppError, state::AppState};
use crate::index::PICTURES_FORMAT;

/// `GET /api/pictures`: the list published by the last completed scan.
pub async fn pictures_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let pictures = state.snapshot.current();
    let body = serde_json::to_vec(&*pictures)?;

    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

/// `GET /picture/{filename}`: stream a canonical picture straight from disk.
///
/// The snapshot is not consulted, so a picture may be served slightly before
/// it is listed.
pub async fn picture_handler(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    request: Request,
) -> Result<Response, AppError> {
    let Some(filename) = sanitize_filename(&filename) else {
        debug!("Refusing to serve {filename:?}");
        return Err(AppError::PictureNotFound);
    };

    let response = ServeFile::new(state.pictures_dir.join(filename))
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});

    Ok(response.map(Body::new))
}

/// Last path component of `requested`, if it names a canonical picture.
pub fn sanitize_filename(requested: &str) -> Option<&str> {
    let name = Path::new(requested).file_name()?.to_str()?;
    let is_canonical = name
        .strip_suffix(PICTURES_FORMAT)
        .is_some_and(|stem| stem.ends_with('.'));

    is_canonical.then_some(name)
}
