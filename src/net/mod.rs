//! Network transport subsystem.
//!
//! Plain TCP listeners come straight from Tokio; this module only holds the
//! TLS setup used when `listener.tls` is configured.

pub mod tls;
