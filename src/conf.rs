use std::fmt;
use std::path::PathBuf;

use twelf::{config, Layer};

use crate::error::GatewayError;

pub const ENV_PREFIX: &str = "ES_";
const REDACTED_VALUE: &str = "***";

/// Backend connection settings. Loaded from an optional TOML file and then
/// `ES_*` environment variables (`ES_URL`, `ES_USERNAME`, `ES_PASSWORD`, ...).
#[config]
#[derive(Default)]
pub struct Config {
    url: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    insecure: bool,
    #[serde(default)]
    root_certificates: Option<PathBuf>,
}

/// Resolved backend connection, built once at startup and handed to the client.
#[derive(Clone)]
pub struct Endpoint {
    url: String,
    basic_auth: Option<BasicAuth>,
    root_certificates: Option<PathBuf>,
    insecure: bool,
}

#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: Option<String>,
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> std::result::Result<Self, GatewayError> {
        let mut layers = Vec::with_capacity(2);
        if let Some(path) = path {
            layers.push(Layer::Toml(path));
        }
        layers.push(Layer::Env(Some(ENV_PREFIX.to_string())));
        Ok(Self::with_layers(&layers)?)
    }

    pub fn endpoint(&self) -> Endpoint {
        let basic_auth = self.username.as_ref().map(|username| BasicAuth {
            username: username.clone(),
            password: self.password.clone(),
        });
        Endpoint {
            url: self.url.clone(),
            basic_auth,
            root_certificates: self.root_certificates.clone(),
            insecure: self.insecure,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED_VALUE))
            .field("insecure", &self.insecure)
            .field("root_certificates", &self.root_certificates)
            .finish()
    }
}

impl BasicAuth {
    pub fn get_username(&self) -> &String {
        &self.username
    }
    pub fn get_password(&self) -> &Option<String> {
        &self.password
    }
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            basic_auth: None,
            root_certificates: None,
            insecure: false,
        }
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth = Some(BasicAuth {
            username: username.into(),
            password: Some(password.into()),
        });
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_root_certificates(mut self, path: Option<PathBuf>) -> Self {
        self.root_certificates = path;
        self
    }

    pub fn get_url(&self) -> &String {
        &self.url
    }
    pub fn get_root_certificates(&self) -> Option<&PathBuf> {
        self.root_certificates.as_ref()
    }
    pub fn is_insecure(&self) -> bool {
        self.insecure
    }
    pub fn has_basic_auth(&self) -> bool {
        self.basic_auth.is_some()
    }
    pub fn get_username(&self) -> String {
        if let Some(basic_auth) = &self.basic_auth {
            basic_auth.get_username().clone()
        } else {
            String::default()
        }
    }
    pub fn get_password(&self) -> Option<String> {
        if let Some(basic_auth) = &self.basic_auth {
            return basic_auth.get_password().clone();
        }
        None
    }

    /// Joins the base URL and a path that already starts with `/`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("username", &self.basic_auth.as_ref().map(|auth| &auth.username))
            .field("root_certificates", &self.root_certificates)
            .field("insecure", &self.insecure)
            .finish()
    }
}
