use garde::Validate;
use std::collections::BTreeMap;

use crate::error::{AppError, Result};

/// Validates a request payload, converting a garde report into the uniform
/// field -> message map carried by 422 responses.
pub fn check<T>(payload: &T) -> Result<()>
where
    T: Validate<Context = ()>,
{
    if let Err(report) = payload.validate() {
        let mut errors = BTreeMap::new();
        for (path, error) in report.iter() {
            errors
                .entry(path.to_string())
                .or_insert_with(|| error.to_string());
        }
        return Err(AppError::Validation(errors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct SignupShape {
        #[garde(length(min = 3))]
        full_name: String,
        #[garde(email)]
        email: String,
        #[garde(length(min = 6))]
        password: String,
    }

    #[test]
    fn valid_payload_passes() {
        let payload = SignupShape {
            full_name: "Alice Example".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(check(&payload).is_ok());
    }

    #[test]
    fn invalid_fields_are_reported_per_field() {
        let payload = SignupShape {
            full_name: "Al".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        match check(&payload) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.contains_key("full_name"));
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("password"));
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}
