use crate::{
    errors::ImageError,
    registry::{DigestLookup, Timeouts},
};
use async_trait::async_trait;
use oci_client::{client::ClientConfig, secrets::RegistryAuth, Reference};

/// Digest lookup through a complete OCI distribution client
///
/// This handles registries the direct API path can't: other hosts, other
/// authentication challenges, registries that only return digests on `GET`.
/// It is slower, so it is only used when the direct path comes up empty or
/// can't express the reference at all.
#[derive(Clone)]
pub struct OciLookup {
    client: oci_client::Client,
    auth: RegistryAuth,
}

impl Default for OciLookup {
    fn default() -> Self {
        OciLookup::new()
    }
}

impl OciLookup {
    /// Anonymous lookups with the client's default settings
    pub fn new() -> Self {
        OciLookup::with_config(ClientConfig::default(), RegistryAuth::Anonymous)
    }

    /// Anonymous lookups limited by `timeouts`
    pub fn with_timeouts(timeouts: Timeouts) -> Self {
        OciLookup::with_config(client_config(timeouts), RegistryAuth::Anonymous)
    }

    pub fn with_config(config: ClientConfig, auth: RegistryAuth) -> Self {
        OciLookup {
            client: oci_client::Client::new(config),
            auth,
        }
    }
}

#[async_trait]
impl DigestLookup for OciLookup {
    async fn lookup_digest(&self, repo_tag: &str) -> Result<String, ImageError> {
        let lookup_error = |message: String| ImageError::Lookup {
            image: repo_tag.to_owned(),
            message,
        };
        let reference: Reference = repo_tag.parse().map_err(|e| lookup_error(format!("{}", e)))?;
        log::debug!("{} looking up digest at {}", repo_tag, reference.resolve_registry());
        self.client
            .fetch_manifest_digest(&reference, &self.auth)
            .await
            .map_err(|e| lookup_error(e.to_string()))
    }
}

fn client_config(timeouts: Timeouts) -> ClientConfig {
    ClientConfig {
        read_timeout: timeouts.request,
        connect_timeout: timeouts.connect,
        ..ClientConfig::default()
    }
}
