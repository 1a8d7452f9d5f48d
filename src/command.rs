use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::process::Command;

pub struct CommandExecutor;

impl CommandExecutor {
    pub fn execute(command: &str) -> Result<()> {
        info!("Executing command: {}", command);

        // Execute the command through a shell
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .context(format!("Failed to execute command: {}", command))?;

        if output.status.success() {
            if !output.stdout.is_empty() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                debug!("Command output: {}", stdout);
            }
            info!("Command executed successfully");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "Command execution failed with status: {:?}. Error: {}",
                output.status, stderr
            );
            Err(anyhow::anyhow!(
                "Command failed with status: {:?}",
                output.status
            ))
        }
    }

    /// Run `command` off the polling task so a slow command cannot stall
    /// the pad's poll cadence. The outcome is only logged.
    pub fn spawn(command: String, trigger: String) -> tokio::task::JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            if let Err(e) = CommandExecutor::execute(&command) {
                warn!("Command for {} failed: {}", trigger, e);
            }
        })
    }
}
