//! Standardized API response formats
//!
//! Every endpoint answers with the same envelope: a success flag plus a
//! data payload (errors carry an error description instead, see
//! `crate::error`).

use axum::response::{IntoResponse, Response};
use axum::Json;
use common::pagination::Page;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utoipa::ToSchema;

/// Envelope for single-resource responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always true
    pub success: bool,
    /// The response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new successful response
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Envelope for paginated list responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Always true
    pub success: bool,
    /// The items on this page
    pub data: Vec<T>,
    /// Total number of matching items
    pub total: usize,
    /// Current page (one-indexed)
    pub page: usize,
    /// Page size
    pub limit: usize,
    /// Total number of pages
    pub total_pages: usize,
}

impl<T> PaginatedResponse<T> {
    /// Build the envelope from a service-layer page
    pub fn from_page(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            success: true,
            data: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}

/// Envelope for acknowledgement-only responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Always true
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl<T> IntoResponse for PaginatedResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
