//! Production build worker.

use super::BuildWorker;
use crate::bundler::{Error, Result, settings::ThemeContext};
use async_trait::async_trait;

/// Runs a shell command in the theme root, e.g. `npm run build`.
///
/// The command's output is forwarded to the log. A non-zero exit status fails
/// the `theme_build` task.
#[derive(Debug, Clone)]
pub struct CommandBuildWorker {
    command: String,
}

impl CommandBuildWorker {
    /// Creates a worker running `command` through the platform shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn shell_command(&self) -> tokio::process::Command {
        #[cfg(windows)]
        {
            let mut cmd = tokio::process::Command::new("cmd");
            cmd.args(["/C", self.command.as_str()]);
            cmd
        }

        #[cfg(not(windows))]
        {
            let mut cmd = tokio::process::Command::new("sh");
            cmd.args(["-c", self.command.as_str()]);
            cmd
        }
    }
}

#[async_trait]
impl BuildWorker for CommandBuildWorker {
    async fn build(&self, context: &ThemeContext) -> Result<()> {
        log::info!("Running theme build: {}", self.command);

        let output = self
            .shell_command()
            .current_dir(context.theme_root())
            .output()
            .await
            .map_err(|e| {
                Error::GenericError(format!("Failed to run '{}': {}", self.command, e))
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("[theme build] {}", line);
        }

        if !output.status.success() {
            return Err(Error::GenericError(format!(
                "'{}' exited with {:?}: {}",
                self.command,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
