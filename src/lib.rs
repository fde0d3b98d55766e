//! Content management backend for a single-page coffeehouse site.

pub mod admin;
pub mod assets;
pub mod config;
pub mod contact;
pub mod content;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod service;

pub use config::CmsConfig;
pub use error::{CmsError, CmsResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use service::CmsService;
