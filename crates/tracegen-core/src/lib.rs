//! Tracegen Core
//!
//! Shared vocabulary for the tracegen workspace: the error type, the
//! endpoint descriptors driven by the self-traffic generator, and the
//! random source port used by handlers and the generator alike.

pub mod endpoint;
pub mod error;
pub mod ports;

pub use endpoint::{EndpointDescriptor, HttpMethod, default_endpoints};
pub use error::{Error, Result};
pub use ports::{RandomSource, SeededRandom, ThreadRandom};
