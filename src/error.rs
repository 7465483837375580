use std::{io, sync::PoisonError};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::{auth::{LoginError, PasswordError, SignupError}, db::{participation::JoinError, EventError}};

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(e: impl ToString) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(cause) = self {
            error!("{}", cause);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.to_string() })
    }
}

impl From<io::Error> for ApiError {
    fn from(e: io::Error) -> Self {
        ApiError::Internal(format!("store: {}", e))
    }
}

impl<T> From<PoisonError<T>> for ApiError {
    fn from(_: PoisonError<T>) -> Self {
        ApiError::Internal("poisoned lock".to_string())
    }
}

impl From<SignupError> for ApiError {
    fn from(e: SignupError) -> Self {
        match e {
            SignupError::Storage(e) => e.into(),
            e => ApiError::bad_request(e),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::MissingCredentials => ApiError::bad_request(e),
            LoginError::WrongCredentials => ApiError::Unauthorized,
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Storage(e) => e.into(),
            e => ApiError::bad_request(e),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::NotFound => ApiError::NotFound("Event"),
            EventError::NotHost => ApiError::Forbidden("Not authorized to edit this event"),
            EventError::Storage(e) => e.into(),
            e => ApiError::bad_request(e),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        match e {
            JoinError::NotFound => ApiError::NotFound("Event"),
            JoinError::Storage(e) => e.into(),
            e => ApiError::bad_request(e),
        }
    }
}
