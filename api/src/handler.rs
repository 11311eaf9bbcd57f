use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use log::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::features::{inverse_log_target, FeatureVector};
use crate::model::EnergyModel;
use crate::schema::{PredictionRequest, PredictionResponse};

pub async fn predict_energy(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload?;
    let response = predict(state.model.as_ref(), &request)?;
    Ok(Json(response))
}

/// Derive features, run the model and undo the log1p target transform.
pub fn predict(
    model: &dyn EnergyModel,
    request: &PredictionRequest,
) -> Result<PredictionResponse, ApiError> {
    let features = FeatureVector::from_request(request)?;
    let log_pred = model.predict_log(&features)?;
    let predicted_energy_kwh = inverse_log_target(log_pred);

    if !predicted_energy_kwh.is_finite() {
        return Err(ApiError::NonFinitePrediction(predicted_energy_kwh));
    }

    debug!(
        "Predicted {:.3} kWh for features {:?}",
        predicted_energy_kwh,
        features.to_array()
    );
    Ok(PredictionResponse {
        predicted_energy_kwh,
    })
}
