use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Directory holding `config.json`. Not created here; saving does that.
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config"))
        })
        .map(|dir| dir.join(PathBuf::from("unsplash-wallpaper")))
        .ok_or_else(|| {
            Error::Config(
                "Could not find config directory. Please set HOME or XDG_CONFIG_HOME environment variable.".to_string(),
            )
        })
}

pub fn send_notification(title: &str, message: &str, image: Option<&Path>) -> Result<()> {
    let mut notification = notify_rust::Notification::new();
    notification.summary(title).body(message);

    if let Some(image_path) = image {
        notification.image_path(image_path.to_string_lossy().as_ref());
    }

    notification
        .show()
        .map_err(|e| Error::DesktopEnv(e.to_string()))?;
    Ok(())
}
