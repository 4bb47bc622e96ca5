//! WebDAV transfer settings
//!
//! Validated once, then immutable for the lifetime of a transfer manager.

use std::collections::HashMap;

use davsync_core::{Error, Profile, Result};
use url::Url;

/// Description of one accepted option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub id: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Never echoed back or logged
    pub sensitive: bool,
}

/// Options understood by [`WebdavSettings::from_options`]
pub const OPTION_SPECS: &[OptionSpec] = &[
    OptionSpec {
        id: "url",
        description: "URL (incl. path & port)",
        required: true,
        sensitive: false,
    },
    OptionSpec {
        id: "username",
        description: "Username",
        required: true,
        sensitive: false,
    },
    OptionSpec {
        id: "password",
        description: "Password",
        required: true,
        sensitive: true,
    },
];

/// Endpoint and credentials of a WebDAV repository
#[derive(Clone, PartialEq, Eq)]
pub struct WebdavSettings {
    url: String,
    username: String,
    password: String,
    secure: bool,
}

impl WebdavSettings {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let url = url.into();
        let username = username.into();
        let password = password.into();

        if username.is_empty() {
            return Err(Error::ConfigInvalid("username cannot be empty".to_string()));
        }

        let parsed = Url::parse(&url)
            .map_err(|e| Error::ConfigInvalid(format!("invalid URL '{url}': {e}")))?;
        let secure = match parsed.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(Error::ConfigInvalid(format!(
                    "unsupported URL scheme '{other}', expected http or https"
                )));
            }
        };
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(Error::ConfigInvalid(format!("URL '{url}' has no host")));
        }

        Ok(Self {
            url,
            username,
            password,
            secure,
        })
    }

    /// Build settings from a plugin option map, checking it against [`OPTION_SPECS`]
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        for spec in OPTION_SPECS {
            let present = options.get(spec.id).is_some_and(|v| !v.is_empty());
            if spec.required && !present {
                return Err(Error::ConfigInvalid(format!(
                    "missing required option '{}' ({})",
                    spec.id, spec.description
                )));
            }
        }

        if let Some(unknown) = options
            .keys()
            .find(|key| !OPTION_SPECS.iter().any(|spec| spec.id == key.as_str()))
        {
            return Err(Error::ConfigInvalid(format!("unknown option '{unknown}'")));
        }

        let get = |id: &str| options.get(id).cloned().unwrap_or_default();
        Self::new(get("url"), get("username"), get("password"))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether the endpoint uses TLS
    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl TryFrom<&Profile> for WebdavSettings {
    type Error = Error;

    fn try_from(profile: &Profile) -> Result<Self> {
        Self::from_options(&profile.options())
    }
}

impl std::fmt::Debug for WebdavSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebdavSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for WebdavSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WebdavSettings[url={}, username={}]",
            self.url, self.username
        )
    }
}
