//! Request middleware shared by the HTTP and gRPC mounts.

mod chain;

pub use chain::{ChainError, MiddlewareChain, Stage, Transport};
