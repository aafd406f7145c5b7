//! Service Layer
//!
//! Business operations shared by both transport mounts. Services speak in
//! domain types and `DuplexResult`; mapping to wire messages and protocol
//! statuses happens in the mounts.

mod blog_service;
mod greeter_service;

pub use blog_service::{BlogService, LikedArticle};
pub use greeter_service::GreeterService;
