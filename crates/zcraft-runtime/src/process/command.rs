//! Launch command construction.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use zcraft_core::LaunchSpec;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Build the command that launches the server artifact.
///
/// `java -Xmx{max}G -Xms{min}G -jar <artifact> nogui`, run in the launch
/// working directory with all three standard streams piped. On Unix the
/// child gets its own process group so a terminal Ctrl+C reaches only the
/// manager, which then stops the server gracefully.
pub fn build_launch_command(spec: &LaunchSpec, artifact: &Path) -> Command {
    let mut cmd = Command::new(&spec.java_path);
    cmd.args(spec.jvm_args(artifact))
        .current_dir(&spec.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    cmd
}
