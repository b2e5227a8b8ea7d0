//! `server.properties` persistence.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use zcraft_core::{PROPERTIES_FILE_NAME, PropertiesError, ServerProperties};

/// Location of the properties file inside `server_dir`.
pub fn properties_path(server_dir: &Path) -> PathBuf {
    server_dir.join(PROPERTIES_FILE_NAME)
}

/// Load the properties file, or the defaults if it does not exist yet.
pub fn load_properties(server_dir: &Path) -> Result<ServerProperties, PropertiesError> {
    let path = properties_path(server_dir);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(ServerProperties::parse(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no server.properties yet, using defaults");
            Ok(ServerProperties::default())
        }
        Err(source) => Err(PropertiesError::Io { path, source }),
    }
}

/// Write the properties file, creating the server directory if needed.
pub fn save_properties(
    server_dir: &Path,
    properties: &ServerProperties,
) -> Result<(), PropertiesError> {
    let path = properties_path(server_dir);
    fs::create_dir_all(server_dir).map_err(|source| PropertiesError::Io {
        path: server_dir.to_path_buf(),
        source,
    })?;
    fs::write(&path, properties.render()).map_err(|source| PropertiesError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), entries = properties.len(), "server.properties saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = tempdir().unwrap();
        let props = load_properties(temp.path()).unwrap();
        assert_eq!(props, ServerProperties::default());
    }

    #[test]
    fn test_save_and_reload_keeps_unknown_keys() {
        let temp = tempdir().unwrap();
        fs::write(
            properties_path(temp.path()),
            "#Minecraft server properties\nenable-rcon=true\nmotd=Old\n",
        )
        .unwrap();

        let mut props = load_properties(temp.path()).unwrap();
        props.set("motd", "New").unwrap();
        save_properties(temp.path(), &props).unwrap();

        let reloaded = load_properties(temp.path()).unwrap();
        assert_eq!(reloaded.get("motd"), Some("New"));
        assert_eq!(reloaded.get("enable-rcon"), Some("true"));
    }
}
