use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use thiserror::Error;

use crate::features::FeatureError;
use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    InvalidFeatures(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model produced a non-finite prediction ({0})")]
    NonFinitePrediction(f64),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::InvalidFeatures(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Model(_) | ApiError::NonFinitePrediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Prediction failed: {}", self);
        } else {
            warn!("Rejected prediction request: {}", self);
        }

        (
            status,
            Json(serde_json::json!({"error": self.to_string(), "success": false})),
        )
            .into_response()
    }
}
