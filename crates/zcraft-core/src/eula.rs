//! `eula.txt` format.

use std::path::PathBuf;
use thiserror::Error;

/// File name of the acknowledgement file inside the server directory.
pub const EULA_FILE_NAME: &str = "eula.txt";

/// Where the license text lives.
pub const EULA_URL: &str = "https://aka.ms/MinecraftEULA";

/// Errors from reading or writing the acknowledgement file.
#[derive(Debug, Error)]
pub enum EulaError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether the file content records an accepted license.
#[must_use]
pub fn is_accepted(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .any(|line| {
            line.split_once('=').is_some_and(|(key, value)| {
                key.trim() == "eula" && value.trim().eq_ignore_ascii_case("true")
            })
        })
}

/// Render the acknowledgement file.
#[must_use]
pub fn render(accepted: bool) -> String {
    format!(
        "#By changing the setting below to TRUE you are indicating your agreement to our EULA ({EULA_URL}).\neula={accepted}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted() {
        assert!(is_accepted("#header\neula=true\n"));
        assert!(is_accepted("eula = TRUE"));
    }

    #[test]
    fn test_not_accepted() {
        assert!(!is_accepted(""));
        assert!(!is_accepted("eula=false\n"));
        assert!(!is_accepted("#eula=true\neula=false\n"));
    }

    #[test]
    fn test_render() {
        let content = render(true);
        assert!(content.starts_with('#'));
        assert!(content.ends_with("eula=true\n"));
        assert!(is_accepted(&content));
        assert!(!is_accepted(&render(false)));
    }
}
