use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use tally_shared::{Error, ErrorCode};
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::tally::TallyError;
use crate::views::ViewError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unknown choice: {0}")]
    UnknownChoice(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ViewError> for ApiError {
    fn from(e: ViewError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let (status, body) = match &self {
            ApiError::UnknownChoice(choice) => (
                Status::UnprocessableEntity,
                Error::with_details(ErrorCode::UnknownChoice, "Vote was not counted", choice.clone()),
            ),
            ApiError::Internal(_) => (
                Status::InternalServerError,
                Error::new(ErrorCode::SystemError, self.to_string()),
            ),
        };

        rocket::Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}

/// Anything that stops the process before it serves traffic.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Counter store unreachable: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Tally(#[from] TallyError),
    #[error("Server failed: {0}")]
    Server(#[from] Box<rocket::Error>),
}
