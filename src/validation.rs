//! Request validation ahead of the handlers
//!
//! Validators are registered per request type on the engine and run before the
//! request reaches its handler. Any failure short-circuits the request into a
//! response carrying one [`ErrorKind::ValidationFailed`] error per failure.

use crate::errors::ErrorKind;
use crate::response::ResponseError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub property: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

pub trait Validator<R: ?Sized>: Send + Sync {
    /// `None` or an empty list when `request` is valid
    fn validate(&self, request: &R) -> Option<Vec<ValidationFailure>>;
}

impl<R, F> Validator<R> for F
where
    R: ?Sized,
    F: Fn(&R) -> Option<Vec<ValidationFailure>> + Send + Sync,
{
    fn validate(&self, request: &R) -> Option<Vec<ValidationFailure>> {
        self(request)
    }
}

pub(crate) fn validate_all<R: ?Sized>(
    validators: &[Arc<dyn Validator<R>>],
    request: &R,
) -> Vec<ResponseError> {
    validators
        .iter()
        .filter_map(|validator| validator.validate(request))
        .flatten()
        .map(|failure| {
            ResponseError::for_property(ErrorKind::ValidationFailed, failure.property, failure.message)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Signup {
        email: String,
        age: u32,
    }

    fn email_present(request: &Signup) -> Option<Vec<ValidationFailure>> {
        request
            .email
            .is_empty()
            .then(|| vec![ValidationFailure::new("email", "must not be empty")])
    }

    struct MinimumAge(u32);

    impl Validator<Signup> for MinimumAge {
        fn validate(&self, request: &Signup) -> Option<Vec<ValidationFailure>> {
            (request.age < self.0).then(|| vec![ValidationFailure::new("age", "too young")])
        }
    }

    #[test]
    fn test_failures_from_every_validator() {
        let validators: Vec<Arc<dyn Validator<Signup>>> =
            vec![Arc::new(email_present), Arc::new(MinimumAge(18))];

        let errors = validate_all(
            &validators,
            &Signup {
                email: String::new(),
                age: 12,
            },
        );
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].property.as_deref(), Some("email"));
        assert_eq!(errors[1].kind, ErrorKind::ValidationFailed);

        let valid = Signup {
            email: "ann@example.com".into(),
            age: 30,
        };
        assert!(validate_all(&validators, &valid).is_empty());
    }
}
