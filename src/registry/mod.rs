//! Finding the digest a tag currently points to on its registry

mod auth;
mod builder;
mod client;
mod default;
mod fallback;
mod resolver;

pub use builder::{RegistryClientBuilder, Timeouts};
pub use client::{media_types, RegistryClient, CONTENT_DIGEST};
pub use default::DefaultRegistry;
pub use fallback::OciLookup;
pub use resolver::{DigestLookup, DigestSource, Resolver};
