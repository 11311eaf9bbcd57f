use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::cors::CorsLayer;

use crate::config::Deployment;
use crate::handler::predict_energy;
use crate::model::EnergyModel;

#[derive(Clone)]
pub struct AppState {
    // loaded once before the listener binds, never mutated afterwards
    pub model: Arc<dyn EnergyModel>,
}

impl AppState {
    pub fn new(model: impl EnergyModel + 'static) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}

pub fn create_router(app_state: AppState, deployment: Deployment, cors: CorsLayer) -> Router {
    Router::new()
        .route(deployment.predict_path(), post(predict_energy))
        .layer(cors)
        .with_state(app_state)
}
