//! Conversion of pipeline failures into response errors

use crate::errors::{CrudError, ErrorKind};
use crate::response::ResponseError;

/// Turns a classified failure into response errors, or rethrows it
///
/// Returning `Err` propagates the error out of the handler instead of producing
/// a failure response.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: CrudError) -> Result<Vec<ResponseError>, CrudError>;
}

/// Rethrows unclassified failures and configuration problems, reports the rest
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, error: CrudError) -> Result<Vec<ResponseError>, CrudError> {
        match error.kind() {
            ErrorKind::RequestFailed | ErrorKind::BadConfiguration => Err(error),
            _ => Ok(vec![ResponseError::from(&error)]),
        }
    }
}

/// Error handler from a function over the error kind and message
pub struct MessageErrorHandler<F> {
    message: F,
}

impl<F> MessageErrorHandler<F>
where
    F: Fn(ErrorKind, &CrudError) -> Option<String> + Send + Sync,
{
    /// `message` returns the text to report, or `None` to defer to the default
    pub fn new(message: F) -> Self {
        Self { message }
    }
}

impl<F> ErrorHandler for MessageErrorHandler<F>
where
    F: Fn(ErrorKind, &CrudError) -> Option<String> + Send + Sync,
{
    fn handle(&self, error: CrudError) -> Result<Vec<ResponseError>, CrudError> {
        let kind = error.kind();
        match (self.message)(kind, &error) {
            Some(message) => Ok(vec![ResponseError::new(kind, message)]),
            None => DefaultErrorHandler.handle(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_default_handler() {
        let reported = DefaultErrorHandler
            .handle(CrudError::FailedToFind {
                entity: "User",
                request: Value::Null,
            })
            .unwrap();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].kind, ErrorKind::FailedToFind);

        let rethrown = DefaultErrorHandler.handle(CrudError::request_failed(Value::Null, "boom"));
        assert!(matches!(rethrown, Err(CrudError::RequestFailed { .. })));
    }

    #[test]
    fn test_message_handler() {
        let handler = MessageErrorHandler::new(|kind, _error: &CrudError| match kind {
            ErrorKind::FailedToFind => Some("no such user".to_string()),
            _ => None,
        });

        let reported = handler
            .handle(CrudError::FailedToFind {
                entity: "User",
                request: Value::Null,
            })
            .unwrap();
        assert_eq!(reported[0].message, "no such user");
        assert!(handler.handle(CrudError::bad_configuration("x")).is_err());
    }
}
