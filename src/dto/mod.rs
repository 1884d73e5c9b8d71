//! Request, response, and SSE payload types.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod answer;
pub mod flow;
pub mod health;
pub mod identity;
pub mod quiz;
pub mod sse;
pub mod team;
pub mod validation;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
