use crate::{
    errors::ImageError,
    image::{RegistryReference, Repository},
    registry::{OciLookup, RegistryClient},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Direct registry API lookups, keyed by a canonical reference
#[async_trait]
pub trait DigestSource: Send + Sync {
    /// The published manifest digest, or `None` if the registry didn't say
    async fn manifest_digest(
        &self,
        reference: &RegistryReference,
    ) -> Result<Option<String>, ImageError>;
}

/// General-purpose digest lookup for a full `repository:tag` string
#[async_trait]
pub trait DigestLookup: Send + Sync {
    async fn lookup_digest(&self, repo_tag: &str) -> Result<String, ImageError>;
}

/// Two-path digest resolution shared by every concurrent check
///
/// The primary [DigestSource] is tried first whenever the reference fits its
/// naming rules. The [DigestLookup] is consulted when it finds no digest, or
/// when the reference can't be expressed to it at all. Errors from either path
/// are returned as-is, without trying the other.
#[derive(Clone)]
pub struct Resolver {
    library_prefix: Option<Repository>,
    primary: Arc<dyn DigestSource>,
    fallback: Arc<dyn DigestLookup>,
}

impl Resolver {
    /// Combine two lookup paths, with the default `library` prefix
    pub fn new(primary: Arc<dyn DigestSource>, fallback: Arc<dyn DigestLookup>) -> Self {
        Resolver {
            library_prefix: RegistryReference::LIBRARY.parse().ok(),
            primary,
            fallback,
        }
    }

    /// The usual setup: a registry client first, then the OCI client
    ///
    /// The fallback gets the same timeouts as the registry client.
    pub fn from_client(client: RegistryClient) -> Self {
        let library_prefix = client.registry().library_prefix.clone();
        let fallback = OciLookup::with_timeouts(client.timeouts());
        Resolver::new(Arc::new(client), Arc::new(fallback)).library_prefix(library_prefix)
    }

    /// Change the namespace given to single-segment repositories
    pub fn library_prefix(mut self, prefix: Option<Repository>) -> Self {
        self.library_prefix = prefix;
        self
    }

    /// Resolve the latest published digest for `repository:tag`
    ///
    /// A string without any `:` is rejected. One that has a tag separator but
    /// doesn't fit the registry API's naming, such as a host with a port, goes
    /// straight to the fallback lookup.
    pub async fn resolve(&self, repo_tag: &str) -> Result<String, ImageError> {
        let reference = match RegistryReference::parse(repo_tag, self.library_prefix.as_ref()) {
            Ok(reference) => reference,
            Err(err) if repo_tag.contains(':') => {
                log::warn!(
                    "{} not usable with the registry api, {}, using fallback lookup",
                    repo_tag,
                    err
                );
                return self.fallback.lookup_digest(repo_tag).await;
            }
            Err(err) => return Err(err),
        };
        match self.primary.manifest_digest(&reference).await? {
            Some(digest) if !digest.is_empty() => Ok(digest),
            _ => {
                log::warn!("{} registry api had no digest, using fallback lookup", repo_tag);
                self.fallback.lookup_digest(repo_tag).await
            }
        }
    }
}
