//! Response envelope returned by every handler

use crate::errors::{CrudError, ErrorKind};
use serde::{Deserialize, Serialize};

/// One structured error in a [`Response`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub kind: ErrorKind,
    /// Request property the error refers to, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub message: String,
}

impl ResponseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            property: None,
            message: message.into(),
        }
    }

    pub fn for_property(
        kind: ErrorKind,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            property: Some(property.into()),
            message: message.into(),
        }
    }
}

impl From<&CrudError> for ResponseError {
    fn from(error: &CrudError) -> Self {
        ResponseError::new(error.kind(), error.to_string())
    }
}

/// Data or a non-empty list of errors
///
/// A successful response may carry no data when a lookup found nothing and
/// missing entities are not treated as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

impl<T> Response<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            data: None,
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<ResponseError>) -> Self {
        Self { data: None, errors }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: self.data.map(f),
            errors: self.errors,
        }
    }
}

/// One page of a paged query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub total_count: u64,
}

impl<T> PagedResult<T> {
    /// `page_size == 0` puts every row on a single page
    pub fn new(items: Vec<T>, page_number: u64, page_size: u64, total_count: u64) -> Self {
        let page_count = match (page_size, total_count) {
            (_, 0) => 0,
            (0, _) => 1,
            (size, total) => total.div_ceil(size),
        };
        Self {
            items,
            page_number,
            page_size,
            page_count,
            total_count,
        }
    }
}
