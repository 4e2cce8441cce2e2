//! Input validation module
//!
//! Centralized validation for user input, addresses, and booking media.
//! Every failure is an `AppError::Validation` with a user-facing message.

use crate::errors::AppError;
use crate::models::booking::{Location, Media};

pub type ValidationResult = Result<(), AppError>;

/// Maximum number of images attached to a booking.
pub const MAX_BOOKING_IMAGES: usize = 3;

/// Validate a person's name: 2-100 characters after trimming.
pub fn validate_name(name: &str) -> ValidationResult {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Name must not be empty".into()));
    }
    if trimmed.len() < 2 || trimmed.len() > 100 {
        return Err(AppError::Validation("Name must be 2-100 characters".into()));
    }

    Ok(())
}

/// Minimal email shape check: one '@' with a dotted domain.
pub fn validate_email(email: &str) -> ValidationResult {
    let trimmed = email.trim();

    let valid = trimmed.len() >= 5
        && trimmed.len() <= 254
        && !trimmed.contains(char::is_whitespace)
        && trimmed
            .split_once('@')
            .map(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            })
            .unwrap_or(false);

    if !valid {
        return Err(AppError::Validation("Invalid email address".into()));
    }

    Ok(())
}

/// Passwords must be at least 8 characters.
pub fn validate_password(password: &str) -> ValidationResult {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    Ok(())
}

/// A location needs all four fields non-empty.
pub fn validate_location(location: &Location) -> ValidationResult {
    let fields = [
        ("address", &location.address),
        ("city", &location.city),
        ("state", &location.state),
        ("pincode", &location.pincode),
    ];

    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Full location is required: missing {}",
                field
            )));
        }
    }

    Ok(())
}

/// Booking media: at most 3 images; no empty URLs. Video and images may both
/// be present, or neither.
pub fn validate_media(media: &Media) -> ValidationResult {
    if media.images.len() > MAX_BOOKING_IMAGES {
        return Err(AppError::Validation(format!(
            "Maximum {} images allowed.",
            MAX_BOOKING_IMAGES
        )));
    }

    if media.images.iter().any(|url| url.trim().is_empty()) {
        return Err(AppError::Validation("Image URLs must not be empty".into()));
    }

    Ok(())
}

/// Order line quantity must be at least 1.
pub fn validate_quantity(quantity: i64) -> ValidationResult {
    if quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location {
            address: "14 Rose St".into(),
            city: "Pune".into(),
            state: "MH".into(),
            pincode: "411001".into(),
        }
    }

    #[test]
    fn location_requires_all_fields() {
        assert!(validate_location(&location()).is_ok());

        let mut missing_city = location();
        missing_city.city = "  ".into();
        let err = validate_location(&missing_city).unwrap_err();
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn media_image_limit() {
        let ok = Media {
            video: None,
            images: vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into()],
        };
        assert!(validate_media(&ok).is_ok());

        let too_many = Media {
            video: None,
            images: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        };
        assert!(validate_media(&too_many).is_err());

        // Both video and images is tolerated
        let both = Media {
            video: Some("v.mp4".into()),
            images: vec!["a.jpg".into()],
        };
        assert!(validate_media(&both).is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("asha@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn quantity_floor() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
    }
}
