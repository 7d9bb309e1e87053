//! Response envelope
//!
//! Every response body has the shape
//! `{ success, data?, message, error?, errors? }`. Successful responses carry
//! `data`; failures carry the stable `error` code and, for field-level
//! validation failures, an `errors` map such as `{"slug": "slugAlreadyExists"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::services::Page;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl<T> Envelope<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            errors: None,
        }
    }
}

impl<T> Envelope<Page<T>> {
    /// `data` becomes `{ data: items, hasNextPage }`
    pub fn success_paginated(items: Vec<T>, has_next_page: bool, message: impl Into<String>) -> Self {
        Self::success(
            Page {
                data: items,
                has_next_page,
            },
            message,
        )
    }
}

impl Envelope<()> {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            error: Some(code.into()),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        if !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }
}

/// A successful envelope together with its HTTP status
pub struct ApiResponse<T> {
    status: StatusCode,
    body: Envelope<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope::success(data, message),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: Envelope::success(data, message),
        }
    }
}

impl<T> ApiResponse<Page<T>> {
    pub fn paginated(page: Page<T>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope::success_paginated(page.data, page.has_next_page, message),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
