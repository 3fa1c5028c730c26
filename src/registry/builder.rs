use crate::{
    errors::ImageError,
    registry::{auth::Auth, DefaultRegistry, RegistryClient},
};
use reqwest::header::HeaderValue;
use std::{convert::TryInto, time::Duration};

/// Network time limits, applied to both digest lookup paths
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Option<Duration>,
    pub connect: Option<Duration>,
}

/// Builder for configuring custom [RegistryClient] instances
pub struct RegistryClientBuilder {
    auth: Auth,
    network: reqwest::ClientBuilder,
    timeouts: Timeouts,
    default_registry: Option<DefaultRegistry>,
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        RegistryClientBuilder::new()
    }
}

impl RegistryClientBuilder {
    /// Start constructing a custom registry client
    pub fn new() -> Self {
        RegistryClientBuilder {
            network: reqwest::Client::builder().user_agent(RegistryClient::default_user_agent()),
            timeouts: Timeouts::default(),
            default_registry: None,
            auth: Auth::new(),
        }
    }

    /// Set a timeout for each network request
    ///
    /// This timeout applies from the beginning of a request until the last
    /// byte has been received. By default there is no timeout, and an
    /// unresponsive registry holds up the whole check.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.network = self.network.timeout(timeout);
        self.timeouts.request = Some(timeout);
        self
    }

    /// Set a timeout for only the initial connect phase of each network request
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.network = self.network.connect_timeout(timeout);
        self.timeouts.connect = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header used by this client
    ///
    /// By default, the value returned by
    /// [RegistryClient::default_user_agent()] is used.
    pub fn user_agent<V>(mut self, value: V) -> Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        self.network = self.network.user_agent(value);
        self
    }

    /// Change the registry server queried through its HTTP API
    ///
    /// The default if unset can be determined with
    /// [RegistryClient::default_registry()]
    pub fn registry(mut self, default_registry: &DefaultRegistry) -> Self {
        self.default_registry = Some(default_registry.clone());
        self
    }

    /// Send a username and password when requesting tokens
    pub fn login(mut self, username: String, password: Option<String>) -> Self {
        self.auth.login(username, password);
        self
    }

    /// Construct a RegistryClient using the parameters from this Builder
    pub fn build(self) -> Result<RegistryClient, ImageError> {
        let default_registry = self
            .default_registry
            .unwrap_or_else(RegistryClient::default_registry);
        log::debug!(
            "registry api at {}, tokens from {}",
            default_registry.network_url,
            default_registry.auth_realm
        );
        Ok(RegistryClient::from_parts(
            self.auth,
            self.network.build()?,
            self.timeouts,
            default_registry,
        ))
    }
}
