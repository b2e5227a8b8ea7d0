//! `server.properties` format.
//!
//! Keys keep the order they were first seen in. The well-known keys are
//! always present so a freshly created file is complete.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// File name of the properties file inside the server directory.
pub const PROPERTIES_FILE_NAME: &str = "server.properties";

const HEADER: &str = "#Minecraft server properties";

/// Well-known keys and their default values, in display order.
pub const DEFAULT_PROPERTIES: &[(&str, &str)] = &[
    ("motd", "A Minecraft Server"),
    ("server-port", "25565"),
    ("max-players", "20"),
    ("online-mode", "true"),
    ("white-list", "false"),
    ("level-name", "world"),
    ("level-seed", ""),
    ("gamemode", "survival"),
    ("difficulty", "normal"),
    ("pvp", "true"),
    ("spawn-protection", "16"),
    ("view-distance", "10"),
    ("simulation-distance", "10"),
    ("max-tick-time", "60000"),
];

/// Errors from reading, editing or writing server properties.
#[derive(Debug, Error)]
pub enum PropertiesError {
    #[error("Invalid property key: {0:?}")]
    InvalidKey(String),

    #[error("Invalid value for {key}: values cannot span lines")]
    InvalidValue { key: String },

    #[error("Unknown property: {0}")]
    UnknownKey(String),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered `key=value` pairs of a `server.properties` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerProperties {
    entries: Vec<(String, String)>,
}

impl Default for ServerProperties {
    fn default() -> Self {
        Self {
            entries: DEFAULT_PROPERTIES
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

impl ServerProperties {
    /// Parse file content on top of the defaults.
    ///
    /// Comment and blank lines are skipped; each remaining line is split on
    /// its first `=`. Lines without `=` are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut props = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                props.upsert(key.trim(), value.trim_start());
            }
        }
        props
    }

    /// Value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, appending the key if it is new.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), PropertiesError> {
        let key = key.trim();
        if key.is_empty()
            || key.starts_with('#')
            || key.contains(['=', ':', '\n', '\r'])
            || key.contains(char::is_whitespace)
        {
            return Err(PropertiesError::InvalidKey(key.to_string()));
        }
        if value.contains(['\n', '\r']) {
            return Err(PropertiesError::InvalidValue {
                key: key.to_string(),
            });
        }
        self.upsert(key, value);
        Ok(())
    }

    /// Restore every well-known key to its default. Other keys are kept.
    pub fn reset_to_defaults(&mut self) {
        for (key, value) in DEFAULT_PROPERTIES {
            self.upsert(key, value);
        }
    }

    /// Iterate over entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the file, header first.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(HEADER.len() + self.entries.len() * 24);
        out.push_str(HEADER);
        out.push('\n');
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    fn upsert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => value.clone_into(&mut entry.1),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }
}
