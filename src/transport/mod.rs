//! 传输层模块：封装到补全端点的 HTTP 连接。
//!
//! # Transport Module
//!
//! Thin wrapper over a pooled `reqwest::Client`. Connection settings come from
//! environment variables so they can be tuned without touching job configs.

mod http;

pub use http::{HttpSettings, HttpTransport, TransportError};
