//! Image asset subsystem.
//!
//! # Data Flow
//! ```text
//! upload (role, bytes, untrusted name)
//!     → filename.rs (extension check, sanitize)
//!     → manager.rs (size limit, role prefix, write into upload dir)
//!     → ContentStore (repoint hero/logo/favicon field)
//!
//! delete (name)
//!     → manager.rs (reject unsafe names, containment check)
//!     → remove file
//!     → ContentStore (reset referencing fields to shipped defaults)
//! ```
//!
//! # Design Decisions
//! - The raw client filename never reaches the filesystem
//! - Unsafe delete targets are rejected, not silently corrected
//! - Same-name uploads overwrite; last writer wins

pub mod filename;
pub mod manager;

pub use manager::{AssetInfo, AssetManager, AssetRole};
