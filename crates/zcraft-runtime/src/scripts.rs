//! Launch script generation.
//!
//! Writes `start.sh` and `start.bat` into the server directory so the
//! server can be started by hand with the same memory flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use zcraft_core::{DEFAULT_ARTIFACT_NAME, LaunchSpec};

/// Paths of the generated scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchScripts {
    pub shell: PathBuf,
    pub batch: PathBuf,
}

fn java_line(spec: &LaunchSpec) -> String {
    format!(
        "java -Xmx{}G -Xms{}G -jar {DEFAULT_ARTIFACT_NAME} nogui",
        spec.max_ram_gb, spec.min_ram_gb
    )
}

/// Content of `start.sh`.
pub fn render_shell_script(spec: &LaunchSpec) -> String {
    format!("#!/bin/bash\n{}\n", java_line(spec))
}

/// Content of `start.bat`.
pub fn render_batch_script(spec: &LaunchSpec) -> String {
    format!("@echo off\r\n{}\r\npause\r\n", java_line(spec))
}

/// Write both scripts into `spec.working_dir`. `start.sh` is made executable.
pub fn write_launch_scripts(spec: &LaunchSpec) -> io::Result<LaunchScripts> {
    let dir: &Path = &spec.working_dir;
    fs::create_dir_all(dir)?;

    let batch = dir.join("start.bat");
    fs::write(&batch, render_batch_script(spec))?;

    let shell = dir.join("start.sh");
    fs::write(&shell, render_shell_script(spec))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&shell, fs::Permissions::from_mode(0o755))?;
    }

    info!(dir = %dir.display(), "launch scripts written");
    Ok(LaunchScripts { shell, batch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_script_content() {
        let spec = LaunchSpec::new("server.jar", "/srv/mc", 2, 4);
        assert_eq!(
            render_shell_script(&spec),
            "#!/bin/bash\njava -Xmx4G -Xms2G -jar server.jar nogui\n"
        );

        let batch = render_batch_script(&spec);
        assert!(batch.starts_with("@echo off\r\n"));
        assert!(batch.contains("java -Xmx4G -Xms2G -jar server.jar nogui"));
        assert!(batch.trim_end().ends_with("pause"));
    }

    #[test]
    fn test_write_scripts() {
        let temp = tempdir().unwrap();
        let spec = LaunchSpec::new("server.jar", temp.path().join("server"), 1, 2);

        let scripts = write_launch_scripts(&spec).unwrap();
        assert!(scripts.batch.is_file());
        assert!(
            fs::read_to_string(&scripts.shell)
                .unwrap()
                .contains("-Xmx2G -Xms1G")
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&scripts.shell).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }
}
