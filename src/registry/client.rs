//! Minimal registry API client for reading published manifest digests

use crate::{
    errors::ImageError,
    image::RegistryReference,
    registry::{auth::Auth, DefaultRegistry, DigestSource, RegistryClientBuilder, Timeouts},
};
use async_trait::async_trait;
use reqwest::header::{self, HeaderValue};

pub mod media_types {
    pub const MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";
    pub const MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
}

/// Response header carrying the digest of the manifest a tag points at
pub const CONTENT_DIGEST: &str = "docker-content-digest";

/// Registry clients look up the digest a tag currently points to
///
/// Each lookup requests a fresh pull-scoped token and then issues a `HEAD`
/// for the tag's manifest, so no manifest body is ever transferred. The
/// underlying connection pool is shared by clones, and one client can serve
/// any number of concurrent lookups.
#[derive(Clone)]
pub struct RegistryClient {
    auth: Auth,
    req: reqwest::Client,
    timeouts: Timeouts,
    default_registry: DefaultRegistry,
}

impl RegistryClient {
    /// Construct a new registry client with default options
    pub fn new() -> Result<RegistryClient, ImageError> {
        RegistryClient::builder().build()
    }

    /// Construct a registry client with custom options, via
    /// [RegistryClientBuilder]
    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::new()
    }

    /// Return the default `User-Agent` that we use if no other is set
    pub fn default_user_agent() -> HeaderValue {
        static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        HeaderValue::from_static(USER_AGENT)
    }

    /// Return the default registry server
    pub fn default_registry() -> DefaultRegistry {
        DefaultRegistry::new()
    }

    pub(crate) fn from_parts(
        auth: Auth,
        req: reqwest::Client,
        timeouts: Timeouts,
        default_registry: DefaultRegistry,
    ) -> Self {
        RegistryClient {
            auth,
            req,
            timeouts,
            default_registry,
        }
    }

    /// Time limits this client was built with
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Registry settings this client talks to
    pub fn registry(&self) -> &DefaultRegistry {
        &self.default_registry
    }

    /// Find the digest of the manifest currently published for a reference
    ///
    /// Token failures are errors. A manifest response without a usable
    /// digest header is not: it returns `None`, whatever the response status,
    /// so the caller can try another way.
    pub async fn manifest_digest(
        &self,
        reference: &RegistryReference,
    ) -> Result<Option<String>, ImageError> {
        let token = self
            .auth
            .pull_token(&self.req, &self.default_registry, reference.repository())
            .await?;

        let manifest_url = self.default_registry.manifest_url(reference)?;
        log::debug!("{:?} <{}> checking manifest digest", reference, manifest_url);
        let response = self
            .req
            .head(manifest_url)
            .header(header::ACCEPT, media_types::MANIFEST)
            .header(header::ACCEPT, media_types::MANIFEST_LIST)
            .bearer_auth(token)
            .send()
            .await?;

        let digest = response
            .headers()
            .get(CONTENT_DIGEST)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|digest| !digest.is_empty())
            .map(str::to_owned);
        if digest.is_none() {
            log::debug!(
                "{:?} no {} header in response, {}",
                reference,
                CONTENT_DIGEST,
                response.status()
            );
        }
        Ok(digest)
    }
}

#[async_trait]
impl DigestSource for RegistryClient {
    async fn manifest_digest(
        &self,
        reference: &RegistryReference,
    ) -> Result<Option<String>, ImageError> {
        RegistryClient::manifest_digest(self, reference).await
    }
}
