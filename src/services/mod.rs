//! Service layer: business logic between the route handlers and the store.

pub mod documentation;
pub mod flow_service;
pub mod health_service;
pub mod identity_service;
pub mod ledger_service;
pub mod round_service;
pub mod signal_service;
pub mod sse_events;
pub mod sse_service;
pub mod storage_supervisor;
pub mod team_service;
