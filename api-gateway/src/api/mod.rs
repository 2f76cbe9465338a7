//! API handlers

pub mod account;
pub mod audit;
pub mod dashboard;
pub mod response;
pub mod transaction;

use chrono::NaiveDate;
use common::pagination::{DateRange, PageQuery};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters shared by all list endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// First day included (UTC, inclusive)
    pub start_date: Option<NaiveDate>,
    /// Last day included (UTC, inclusive)
    pub end_date: Option<NaiveDate>,
    /// Page size, defaults to 50
    pub limit: Option<usize>,
    /// One-indexed page number, defaults to 1
    pub page: Option<usize>,
}

impl From<ListQuery> for PageQuery {
    fn from(q: ListQuery) -> Self {
        PageQuery {
            range: DateRange {
                start_date: q.start_date,
                end_date: q.end_date,
            },
            limit: q.limit,
            page: q.page,
        }
    }
}
