//! Write-boundary validation for Dining Gateway inputs
//!
//! Malformed interactions are rejected here, never silently coerced.

use crate::error::DiningGatewayError;
use crate::models::NewInteraction;
use crate::types::InteractionKind;

/// Maximum number of recommendations a single request may ask for
pub const MAX_RECOMMENDATION_COUNT: usize = 100;

/// Validate a new interaction before it is appended to the store.
///
/// Rules:
/// - a `rating` interaction must carry a rating in 1..=5
/// - any other kind must not carry a rating
/// - an explicit order quantity must be at least 1
pub fn validate_new_interaction(input: &NewInteraction) -> Result<(), DiningGatewayError> {
    match (input.kind, input.rating) {
        (InteractionKind::Rating, None) => {
            return Err(DiningGatewayError::validation_field(
                "rating is required for rating interactions",
                "rating",
            ));
        }
        (InteractionKind::Rating, Some(rating)) if !(1..=5).contains(&rating) => {
            return Err(DiningGatewayError::validation_field(
                "rating must be between 1 and 5",
                "rating",
            ));
        }
        (kind, Some(_)) if kind != InteractionKind::Rating => {
            return Err(DiningGatewayError::validation_field(
                "rating is only allowed on rating interactions",
                "rating",
            ));
        }
        _ => {}
    }

    if input.order_quantity == Some(0) {
        return Err(DiningGatewayError::validation_field(
            "order quantity must be at least 1",
            "order_quantity",
        ));
    }

    Ok(())
}

/// Validate a requested recommendation count
pub fn validate_recommendation_count(count: usize) -> Result<(), DiningGatewayError> {
    if count == 0 {
        return Err(DiningGatewayError::validation_field(
            "count must be at least 1",
            "count",
        ));
    }
    if count > MAX_RECOMMENDATION_COUNT {
        return Err(DiningGatewayError::validation_field(
            "count exceeds the maximum of 100",
            "count",
        ));
    }
    Ok(())
}
