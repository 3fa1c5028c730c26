use crate::{errors::ImageError, image::Repository, registry::DefaultRegistry};

#[derive(Clone, Default)]
pub struct Auth {
    login: Option<Login>,
}

#[derive(Clone)]
struct Login {
    username: String,
    password: Option<String>,
}

#[derive(Deserialize)]
struct Token {
    #[serde(alias = "access_token")]
    token: String,
}

impl Auth {
    pub fn new() -> Self {
        Auth::default()
    }

    pub fn login(&mut self, username: String, password: Option<String>) {
        self.login = Some(Login { username, password });
    }

    /// Ask the token endpoint for a bearer token allowed to pull `repository`
    ///
    /// Reference: <https://docs.docker.com/registry/spec/auth/token/>
    pub async fn pull_token(
        &self,
        req: &reqwest::Client,
        registry: &DefaultRegistry,
        repository: &Repository,
    ) -> Result<String, ImageError> {
        let scope = format!("repository:{}:pull", repository);
        let req = req
            .get(registry.auth_realm.clone())
            .query(&[("service", registry.service.as_str()), ("scope", scope.as_str())]);
        let req = match &self.login {
            Some(login) => req.basic_auth(&login.username, login.password.as_ref()),
            None => req,
        };

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::debug!("token request for {} refused, {}", scope, status);
            return Err(ImageError::TokenStatus(status));
        }
        let body = response.bytes().await?;
        let token: Token = serde_json::from_slice(&body)?;
        log::debug!("received token for {}", scope);
        Ok(token.token)
    }
}
