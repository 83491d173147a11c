//! The HTTP face of the picture index

use axum::{routing::get, Router};

mod error;
mod routes;
mod state;

pub use error::AppError;
pub use routes::{picture_handler, pictures_handler, sanitize_filename};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/pictures", get(pictures_handler))
        .route("/picture/{filename}", get(picture_handler))
        .with_state(state)
}
