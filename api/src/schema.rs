use ::serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub square_meters: f64,
    pub year_built: i32,
    pub primary_use: i32, // category code from the training label encoding
    pub date: String,     // parsed by features::parse_date, not by serde
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct PredictionResponse {
    pub predicted_energy_kwh: f64,
}
