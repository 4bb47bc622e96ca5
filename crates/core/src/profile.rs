//! Profile management
//!
//! A profile is a named remote repository: its URL and credentials.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// A named remote repository
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Profile name used on the command line
    pub name: String,

    /// Repository root URL (http or https)
    pub url: String,

    pub username: String,

    pub password: String,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Plugin options understood by storage backends
    pub fn options(&self) -> HashMap<String, String> {
        HashMap::from([
            ("url".to_string(), self.url.clone()),
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
        ])
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// CRUD over the profiles stored in the configuration file
#[derive(Debug, Clone)]
pub struct ProfileManager {
    config_manager: ConfigManager,
}

impl ProfileManager {
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_manager: ConfigManager::new()?,
        })
    }

    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    /// Add or replace a profile
    pub fn set(&self, profile: Profile) -> Result<()> {
        if profile.name.is_empty() {
            return Err(Error::ConfigInvalid(
                "profile name cannot be empty".to_string(),
            ));
        }

        let mut config = self.config_manager.load()?;
        match config.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => config.profiles.push(profile),
        }
        config.profiles.sort_by(|a, b| a.name.cmp(&b.name));

        self.config_manager.save(&config)
    }

    pub fn get(&self, name: &str) -> Result<Profile> {
        self.config_manager
            .load()?
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Profile>> {
        Ok(self.config_manager.load()?.profiles)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let before = config.profiles.len();
        config.profiles.retain(|p| p.name != name);

        if config.profiles.len() == before {
            return Err(Error::ProfileNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(temp: &TempDir) -> ProfileManager {
        ProfileManager::with_config_manager(ConfigManager::with_dir(temp.path()))
    }

    #[test]
    fn test_set_get_list_remove() {
        let temp = TempDir::new().unwrap();
        let profiles = manager(&temp);

        profiles
            .set(Profile::new("nas", "https://nas.local/dav", "alice", "pw"))
            .unwrap();
        profiles
            .set(Profile::new("box", "http://box.local/repo", "bob", "pw2"))
            .unwrap();

        let listed = profiles.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "box");

        assert_eq!(profiles.get("nas").unwrap().username, "alice");

        profiles.remove("nas").unwrap();
        assert!(matches!(
            profiles.get("nas"),
            Err(Error::ProfileNotFound(_))
        ));
        assert!(matches!(
            profiles.remove("nas"),
            Err(Error::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_set_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let profiles = manager(&temp);

        profiles
            .set(Profile::new("nas", "https://old/", "alice", "pw"))
            .unwrap();
        profiles
            .set(Profile::new("nas", "https://new/", "alice", "pw"))
            .unwrap();

        let listed = profiles.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].url, "https://new/");
    }

    #[test]
    fn test_empty_name_rejected() {
        let temp = TempDir::new().unwrap();
        let err = manager(&temp)
            .set(Profile::new("", "https://x/", "a", "b"))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_debug_hides_password() {
        let profile = Profile::new("nas", "https://nas/", "alice", "hunter2");
        let debug = format!("{profile:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_options() {
        let options = Profile::new("nas", "https://nas/", "alice", "pw").options();
        assert_eq!(options["url"], "https://nas/");
        assert_eq!(options["username"], "alice");
        assert_eq!(options["password"], "pw");
    }
}
