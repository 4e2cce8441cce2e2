//! Price estimator for rooftop-farming installations
//!
//! Pure and deterministic: the same input always yields the same quote. The
//! final price of a quote is frozen onto the booking at creation time and is
//! never recomputed afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rate per square foot in INR for soil-based systems.
pub const SOIL_RATE_PER_SQ_FT: i64 = 100;
/// Rate per square foot in INR for hydroponic systems.
pub const HYDRO_RATE_PER_SQ_FT: i64 = 250;

/// Minimum rooftop size accepted for a quote, in sq ft.
pub const MIN_SIZE_SQ_FT: i64 = 50;
/// Maximum rooftop size accepted for a quote, in sq ft.
pub const MAX_SIZE_SQ_FT: i64 = 10_000;

// Discount tiers are mutually exclusive; the single highest applicable tier
// wins. Thresholds are strictly-greater: exactly 5000 sq ft gets 3%.
const TIER_LARGE_SQ_FT: i64 = 5_000;
const TIER_LARGE_RATE: f64 = 0.05;
const TIER_MEDIUM_SQ_FT: i64 = 2_000;
const TIER_MEDIUM_RATE: f64 = 0.03;

/// Growing-system type of an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemType {
    Soil,
    Hydro,
}

impl SystemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemType::Soil => "soil",
            SystemType::Hydro => "hydro",
        }
    }

    pub fn rate_per_sq_ft(&self) -> i64 {
        match self {
            SystemType::Soil => SOIL_RATE_PER_SQ_FT,
            SystemType::Hydro => HYDRO_RATE_PER_SQ_FT,
        }
    }

    /// Case-insensitive parse.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "soil" => Some(SystemType::Soil),
            "hydro" => Some(SystemType::Hydro),
            _ => None,
        }
    }
}

impl std::str::FromStr for SystemType {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemType::parse(s).ok_or(EstimateError::InvalidSystemType)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateError {
    #[error("Invalid rooftop size. Please provide a positive number.")]
    InvalidSize,

    #[error("Invalid system type. Must be 'soil' or 'hydro'.")]
    InvalidSystemType,

    #[error("Minimum rooftop size is {MIN_SIZE_SQ_FT} sq ft.")]
    BelowMinimum,

    #[error("Maximum rooftop size is {MAX_SIZE_SQ_FT} sq ft. Please contact us for custom quotes.")]
    AboveMaximum,
}

impl EstimateError {
    pub fn kind(&self) -> &'static str {
        match self {
            EstimateError::InvalidSize => "invalid_size",
            EstimateError::InvalidSystemType => "invalid_system_type",
            EstimateError::BelowMinimum => "below_minimum",
            EstimateError::AboveMaximum => "above_maximum",
        }
    }
}

/// Immutable price computation result. All amounts are whole INR; consumers
/// never need to recompute anything from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub rooftop_size_sq_ft: i64,
    pub system_type: SystemType,
    pub base_rate_per_sq_ft: i64,
    pub base_price: i64,
    pub discount: i64,
    pub final_price: i64,
}

/// Flat wire envelope for the estimate endpoint. Field names are a
/// compatibility contract with the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub success: bool,
    #[serde(rename = "estimatedPriceINR", skip_serializing_if = "Option::is_none")]
    pub estimated_price_inr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Quote, EstimateError>> for EstimateResponse {
    fn from(result: Result<Quote, EstimateError>) -> Self {
        match result {
            Ok(quote) => EstimateResponse {
                success: true,
                estimated_price_inr: Some(quote.final_price),
                breakdown: Some(quote),
                error: None,
            },
            Err(err) => EstimateResponse {
                success: false,
                estimated_price_inr: None,
                breakdown: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Estimate the installation price for a rooftop.
///
/// Validation order: positive size, known system type, then the size bounds
/// against the rounded size. Rounding is half-away-from-zero throughout;
/// discount and final price are each rounded from the unrounded products, so
/// the two may differ from the base by one rupee in opposite directions.
pub fn estimate(rooftop_size_sq_ft: f64, system_type: &str) -> Result<Quote, EstimateError> {
    if !rooftop_size_sq_ft.is_finite() || rooftop_size_sq_ft <= 0.0 {
        return Err(EstimateError::InvalidSize);
    }

    let system_type: SystemType = system_type.parse()?;

    let size = rooftop_size_sq_ft.round() as i64;
    if size < MIN_SIZE_SQ_FT {
        return Err(EstimateError::BelowMinimum);
    }
    if size > MAX_SIZE_SQ_FT {
        return Err(EstimateError::AboveMaximum);
    }

    let rate = system_type.rate_per_sq_ft();
    let base_price = size * rate;

    let tier = if size > TIER_LARGE_SQ_FT {
        TIER_LARGE_RATE
    } else if size > TIER_MEDIUM_SQ_FT {
        TIER_MEDIUM_RATE
    } else {
        0.0
    };

    let discount_raw = base_price as f64 * tier;
    let final_price = (base_price as f64 - discount_raw).round() as i64;

    Ok(Quote {
        rooftop_size_sq_ft: size,
        system_type,
        base_rate_per_sq_ft: rate,
        base_price,
        discount: discount_raw.round() as i64,
        final_price,
    })
}
