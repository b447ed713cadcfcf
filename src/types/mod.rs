//! 类型系统模块：定义批处理所需的核心数据类型。
//!
//! # Types Module
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Record`] | One input row: ordered column name → JSON value |
//! | [`Message`] | Chat message with role and text content |
//! | [`MessageRole`] | Message role (system, user) |

pub mod message;
pub mod record;

pub use message::{Message, MessageRole};
pub use record::Record;
