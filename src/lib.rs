//! Find running containers whose images have a newer version upstream
//!
//! A [UpdateChecker] reads the container inventory from a
//! [runtime::ContainerRuntime], resolves the digest currently published for
//! each container's tag, and compares it with the digests the local image was
//! pulled from. Results come back as [ContainerInfo] records in inventory
//! order, ready to serialize as JSON or to serve over HTTP with [server].

#[macro_use] extern crate lazy_static;
#[macro_use] extern crate serde;

pub mod errors;
pub mod image;
pub mod registry;
pub mod runtime;
pub mod server;
pub mod update;

pub use crate::{
    image::{ContainerInfo, ContainerSnapshot, ImageDescriptor, RegistryReference},
    registry::{DefaultRegistry, RegistryClient, RegistryClientBuilder, Resolver},
    runtime::{ContainerRuntime, DockerRuntime},
    update::{DigestComparison, FailurePolicy, UpdateChecker, UpdateCheckerBuilder},
};
