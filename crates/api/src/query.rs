//! Shared query parameter types for API handlers.

use chrono::{NaiveDate, Utc};
use routinely_core::calendar::{local_date, parse_date_key};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Optional `?date=YYYY-MM-DD`; defaults to today in the configured offset.
#[derive(Debug, Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

impl DateParams {
    pub fn resolve(&self, state: &AppState) -> AppResult<NaiveDate> {
        match &self.date {
            Some(date) => Ok(parse_date_key(date)?),
            None => Ok(today(state)),
        }
    }
}

/// Inclusive `?start=&end=` range. Both bounds are required.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeParams {
    pub fn resolve(&self) -> AppResult<(NaiveDate, NaiveDate)> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok((parse_date_key(start)?, parse_date_key(end)?)),
            _ => Err(AppError::BadRequest(
                "Both 'start' and 'end' query parameters are required".into(),
            )),
        }
    }
}

/// The current local date under the configured UTC offset.
pub fn today(state: &AppState) -> NaiveDate {
    local_date(Utc::now(), state.config.utc_offset)
}
