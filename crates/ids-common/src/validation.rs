//! Input validation utilities shared by every REST handler.

use validator::Validate;

use crate::error::IdsError;

/// Validate a request body, returning `IdsError::BadRequest` on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), IdsError> {
    body.validate().map_err(|e| IdsError::bad_request(format_validation_errors(e)))
}

fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A decimal-string bitfield as accepted on ingress (§6, §9: "validate on ingress").
pub fn validate_decimal_bitfield(s: &str) -> Result<i64, IdsError> {
    let raw: u64 = s
        .parse()
        .map_err(|_| IdsError::bad_request("permission bitfield must be a decimal string"))?;
    Ok(raw as i64)
}

pub fn validate_name(name: &str) -> Result<(), IdsError> {
    if name.trim().is_empty() {
        return Err(IdsError::bad_request("name cannot be empty or whitespace only"));
    }
    let valid = name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ' ');
    if !valid {
        return Err(IdsError::bad_request(
            "name can only contain letters, numbers, hyphens, underscores, and spaces",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn accepts_plain_name() {
        assert!(validate_name("general-chat").is_ok());
    }

    #[test]
    fn bitfield_parses_decimal() {
        assert_eq!(validate_decimal_bitfield("5").unwrap(), 5);
        assert!(validate_decimal_bitfield("abc").is_err());
    }
}
