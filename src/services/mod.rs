//! Service lifecycle: the [`Service`] contract and the two-phase
//! [`ServiceRegistry`].

mod registry;
mod service;

pub use registry::ServiceRegistry;
pub use service::Service;
