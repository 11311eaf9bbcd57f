//! Server configuration, read from flags or the environment (`.env` included).

use std::path::PathBuf;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::{Parser, ValueEnum};
use log::info;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Where the service is deployed; decides mount path and CORS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Deployment {
    /// Local backend next to the web front end: `/predict`, one allowed origin.
    Standalone,
    /// Behind a hosting platform's `/api` prefix: `/api/predict`, any origin.
    Hosted,
}

impl Deployment {
    pub fn predict_path(&self) -> &'static str {
        match self {
            Deployment::Standalone => "/predict",
            Deployment::Hosted => "/api/predict",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "energy-api", about = "Serve building energy predictions over HTTP")]
pub struct ServerConfig {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "ENERGY_API_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8000", env = "ENERGY_API_PORT")]
    pub port: u16,

    /// Serialized random forest artifact
    #[arg(long, default_value = "rf_model_energy.json", env = "ENERGY_MODEL_PATH")]
    pub model_path: PathBuf,

    #[arg(long, value_enum, default_value = "standalone", env = "ENERGY_DEPLOYMENT")]
    pub deployment: Deployment,

    /// Origin allowed by CORS in the standalone deployment
    #[arg(long, default_value = "http://localhost:3000", env = "ENERGY_ALLOWED_ORIGIN")]
    pub allowed_origin: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        // Credentials rule out wildcards, so "any origin" is served by mirroring.
        let origin = match self.deployment {
            Deployment::Hosted => AllowOrigin::mirror_request(),
            Deployment::Standalone => {
                let origin = HeaderValue::from_str(&self.allowed_origin)
                    .with_context(|| format!("invalid allowed origin {:?}", self.allowed_origin))?;
                AllowOrigin::exact(origin)
            }
        };
        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true))
    }

    pub fn log_config(&self) {
        info!("Deployment: {:?} (POST {})", self.deployment, self.deployment.predict_path());
        info!("Model path: {:?}", self.model_path);
        info!("Listening on {}", self.bind_address());
        match self.deployment {
            Deployment::Standalone => info!("CORS: allowing origin {}", self.allowed_origin),
            Deployment::Hosted => info!("CORS: allowing any origin (mirrored, with credentials)"),
        }
    }
}
