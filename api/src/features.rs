//! Feature derivation for the energy model.
//!
//! Turns a [`PredictionRequest`] into the seven-column [`FeatureVector`] the
//! forest was trained on, and inverts the log1p target transform on the way out.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::schema::PredictionRequest;

/// Year the training data was collected in. Building age is measured against
/// it, not against the current date.
// Re-calibrate together with the model if it is ever retrained on newer data.
pub const REFERENCE_YEAR: i32 = 2017;

pub const FEATURE_COUNT: usize = 7;

/// Column order of the training frame. Must never be reordered.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "square_meters",
    "building_age",
    "primary_use",
    "month_sin",
    "month_cos",
    "day_of_week_sin",
    "day_of_week_cos",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("invalid date '{0}': expected YYYY-MM-DD or an ISO 8601 timestamp")]
    InvalidDate(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub square_meters: f64,
    pub building_age: f64,
    pub primary_use: f64,
    pub month_sin: f64,
    pub month_cos: f64,
    pub day_of_week_sin: f64,
    pub day_of_week_cos: f64,
}

impl FeatureVector {
    pub fn from_request(request: &PredictionRequest) -> Result<Self, FeatureError> {
        let date = parse_date(&request.date)?;
        Ok(Self::derive(
            request.square_meters,
            request.year_built,
            request.primary_use,
            date,
        ))
    }

    pub fn derive(square_meters: f64, year_built: i32, primary_use: i32, date: NaiveDate) -> Self {
        let (month_sin, month_cos) = cyclic(date.month() as f64, 12.0);
        let (day_of_week_sin, day_of_week_cos) =
            cyclic(date.weekday().num_days_from_monday() as f64, 7.0);

        Self {
            square_meters,
            building_age: building_age(year_built) as f64,
            primary_use: primary_use as f64,
            month_sin,
            month_cos,
            day_of_week_sin,
            day_of_week_cos,
        }
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.square_meters,
            self.building_age,
            self.primary_use,
            self.month_sin,
            self.month_cos,
            self.day_of_week_sin,
            self.day_of_week_cos,
        ]
    }
}

/// Unclamped: buildings newer than the reference year get a negative age.
/// Widened so that every `i32` year has an exact age.
pub fn building_age(year_built: i32) -> i64 {
    i64::from(REFERENCE_YEAR) - i64::from(year_built)
}

/// Sine/cosine encoding of `value` on a cycle of length `period`.
pub fn cyclic(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Inverse of the log1p transform applied to the training targets.
pub fn inverse_log_target(log_pred: f64) -> f64 {
    log_pred.exp_m1()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, FeatureError> {
    let s = raw.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    // The calendar date is the one local to the timestamp's own offset.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(FeatureError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(date: &str) -> PredictionRequest {
        PredictionRequest {
            square_meters: 500.0,
            year_built: 2000,
            primary_use: 1,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_reference_example() {
        let fv = FeatureVector::from_request(&request("2017-06-15")).unwrap();

        let month_angle = 2.0 * PI * 6.0 / 12.0;
        let day_angle = 2.0 * PI * 3.0 / 7.0;
        assert_eq!(
            fv.to_array(),
            [
                500.0,
                17.0,
                1.0,
                month_angle.sin(),
                month_angle.cos(),
                day_angle.sin(),
                day_angle.cos(),
            ]
        );

        assert!(fv.month_sin.abs() < 1e-15);
        assert!((fv.month_cos + 1.0).abs() < 1e-15);
        // Thursday, index 3: sin(6π/7), cos(6π/7)
        assert!((fv.day_of_week_sin - 0.4339).abs() < 1e-4);
        assert!((fv.day_of_week_cos + 0.9010).abs() < 1e-4);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = FeatureVector::from_request(&request("2016-12-31")).unwrap();
        let b = FeatureVector::from_request(&request("2016-12-31")).unwrap();
        assert_eq!(a.to_array().map(f64::to_bits), b.to_array().map(f64::to_bits));
    }

    #[test]
    fn test_array_follows_feature_names() {
        let fv = FeatureVector {
            square_meters: 0.0,
            building_age: 1.0,
            primary_use: 2.0,
            month_sin: 3.0,
            month_cos: 4.0,
            day_of_week_sin: 5.0,
            day_of_week_cos: 6.0,
        };
        assert_eq!(fv.to_array(), [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(FEATURE_NAMES[1], "building_age");
        assert_eq!(FEATURE_NAMES[6], "day_of_week_cos");
    }

    #[test]
    fn test_cyclic_pairs_lie_on_unit_circle() {
        for month in 1..=12 {
            let (s, c) = cyclic(month as f64, 12.0);
            assert!((s * s + c * c - 1.0).abs() < 1e-12, "month {month}");
        }
        for day in 0..7 {
            let (s, c) = cyclic(day as f64, 7.0);
            assert!((s * s + c * c - 1.0).abs() < 1e-12, "weekday {day}");
        }
    }

    #[test]
    fn test_december_wraps_to_january() {
        let (dec_sin, dec_cos) = cyclic(12.0, 12.0);
        let (jan_sin, jan_cos) = cyclic(1.0, 12.0);
        let dist = ((dec_sin - jan_sin).powi(2) + (dec_cos - jan_cos).powi(2)).sqrt();
        assert!(dist < 0.52);
        assert!(dec_sin.abs() < 1e-15);
        assert!((dec_cos - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_building_age_is_unclamped() {
        assert_eq!(building_age(2000), 17);
        assert_eq!(building_age(2017), 0);
        assert_eq!(building_age(2030), -13);
        assert_eq!(building_age(1850), 167);

        let mut req = request("2017-06-15");
        req.year_built = 2025;
        let fv = FeatureVector::from_request(&req).unwrap();
        assert_eq!(fv.building_age, -8.0);
    }

    #[test]
    fn test_building_age_at_i32_extremes() {
        assert_eq!(building_age(i32::MIN), 2017 + 2_147_483_648);
        assert_eq!(building_age(i32::MAX), 2017 - 2_147_483_647);

        let mut req = request("2017-06-15");
        req.year_built = i32::MIN;
        let fv = FeatureVector::from_request(&req).unwrap();
        assert_eq!(fv.building_age, 2_147_485_665.0);
    }

    #[test]
    fn test_monday_and_sunday_indices() {
        // 2017-06-12 was a Monday, 2017-06-18 a Sunday
        let monday = FeatureVector::from_request(&request("2017-06-12")).unwrap();
        assert_eq!(monday.day_of_week_sin, 0.0);
        assert_eq!(monday.day_of_week_cos, 1.0);

        let sunday = FeatureVector::from_request(&request("2017-06-18")).unwrap();
        let (s, c) = cyclic(6.0, 7.0);
        assert_eq!(sunday.day_of_week_sin, s);
        assert_eq!(sunday.day_of_week_cos, c);
    }

    #[test]
    fn test_inverse_log_target() {
        for x in [0.0, 1e-9, 0.5, 1.0, 123.456, 1e6] {
            let back = inverse_log_target(f64::ln_1p(x));
            assert!((back - x).abs() <= 1e-9 * x.max(1.0), "x = {x}");
        }
        assert_eq!(inverse_log_target(0.0), 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2017, 6, 15).unwrap();
        for raw in [
            "2017-06-15",
            " 2017-06-15 ",
            "2017/06/15",
            "2017-06-15T10:30:00",
            "2017-06-15 10:30:00.250",
            "2017-06-15T23:30:00Z",
            "2017-06-15T01:00:00+02:00",
        ] {
            assert_eq!(parse_date(raw), Ok(expected), "{raw}");
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        for raw in ["not-a-date", "", "2017-13-40", "2017-02-30", "15/06/2017"] {
            assert_eq!(
                parse_date(raw),
                Err(FeatureError::InvalidDate(raw.to_string())),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_invalid_date_fails_derivation() {
        let err = FeatureVector::from_request(&request("not-a-date")).unwrap_err();
        assert!(err.to_string().contains("not-a-date"));
    }
}
