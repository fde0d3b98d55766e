//! Site content subsystem.
//!
//! # Data Flow
//! ```text
//! update payload (untrusted JSON)
//!     → validation.rs (section-by-section rules, first failure aborts)
//!     → ValidatedUpdate::apply_to (wholesale section replacement)
//!     → store.rs (pretty JSON, full rewrite)
//!
//! read path:
//!     store.rs (re-read from disk every time)
//!     → model.rs ContentDocument
//! ```
//!
//! # Design Decisions
//! - Sections are replaced, never deep-merged
//! - The map API key is the one field that survives an update that omits it
//! - No in-process cache; the file is the source of truth

pub mod model;
pub mod store;
pub mod validation;

pub use model::ContentDocument;
pub use store::ContentStore;
pub use validation::{validate_update, ValidatedUpdate};
