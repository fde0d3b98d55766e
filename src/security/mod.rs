//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (login attempts per client IP)
//!     → limits.rs (upload body size)
//!     → admin::auth (bearer session check on admin routes)
//!     → handler
//!     → headers.rs (security response headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod limits;
pub mod rate_limit;
