//! HTTP / WebSocket 핸들러 모듈.

pub mod api;
pub mod socket;
