use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub mod callback;
pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/thumbnails", post(handler::create_thumbnails_job))
        .route("/{job_id}", get(handler::get_job))
}
