use crate::{
    errors::ImageError,
    image::{RegistryReference, Repository},
};
use reqwest::Url;

/// Endpoints and naming quirks of the registry queried through its HTTP API
///
/// The built-in defaults describe Docker Hub. Tests and private mirrors that
/// speak the same token-and-manifest protocol can swap in other endpoints.
#[derive(Clone, Debug)]
pub struct DefaultRegistry {
    /// Base URL for the `/v2/` distribution API
    pub network_url: Url,
    /// Token endpoint handing out pull-scoped bearer tokens
    pub auth_realm: Url,
    /// Value of the `service` parameter sent to the token endpoint
    pub service: String,
    /// Use this prefix when accessing an image repository with only a single
    /// path component
    pub library_prefix: Option<Repository>,
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        DefaultRegistry::new()
    }
}

impl DefaultRegistry {
    /// Return the built-in defaults
    pub fn new() -> Self {
        lazy_static! {
            static ref DOCKER_HUB: DefaultRegistry = DefaultRegistry {
                network_url: "https://registry-1.docker.io".parse().unwrap(),
                auth_realm: "https://auth.docker.io/token".parse().unwrap(),
                service: "registry.docker.io".to_owned(),
                library_prefix: Some(RegistryReference::LIBRARY.parse().unwrap()),
            };
        }
        DOCKER_HUB.clone()
    }

    /// Other endpoints speaking the same protocol, keeping the library prefix
    pub fn at(network_url: Url, auth_realm: Url, service: &str) -> Self {
        DefaultRegistry {
            network_url,
            auth_realm,
            service: service.to_owned(),
            ..DefaultRegistry::new()
        }
    }

    /// Parse a `repository:tag` string under these settings
    pub fn reference_for(&self, repo_tag: &str) -> Result<RegistryReference, ImageError> {
        RegistryReference::parse(repo_tag, self.library_prefix.as_ref())
    }

    /// Location of the manifest currently published under a reference's tag
    pub fn manifest_url(&self, reference: &RegistryReference) -> Result<Url, ImageError> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.network_url.as_str().trim_end_matches('/'),
            reference.repository(),
            reference.tag()
        );
        Ok(url.parse()?)
    }
}
