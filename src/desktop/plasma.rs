use super::WallpaperManager;
use crate::utils::command_exists;
use crate::{Error, Result};
use std::path::Path;
use std::process::Command;

pub struct PlasmaManager;

impl PlasmaManager {
    pub fn new() -> Result<Self> {
        if !command_exists("qdbus") {
            return Err(Error::DesktopEnv(
                "QDBus command not found. Please install qdbus.".to_string(),
            ));
        }
        Ok(Self)
    }

    pub fn is_available() -> bool {
        std::env::var("KDE_SESSION_VERSION").is_ok()
    }
}

fn plasma_script(path: &Path) -> String {
    format!(
        r#"
        var allDesktops = desktops();
        for (i=0;i<allDesktops.length;i++) {{
            d = allDesktops[i];
            d.wallpaperPlugin = "org.kde.image";
            d.currentConfigGroup = Array("Wallpaper", "org.kde.image", "General");
            d.writeConfig("Image", "file://{}");
        }}
        "#,
        path.to_string_lossy()
    )
}

impl WallpaperManager for PlasmaManager {
    fn name(&self) -> &'static str {
        "plasma"
    }

    fn set_wallpaper(&self, path: &Path) -> Result<()> {
        let output = Command::new("qdbus")
            .args([
                "org.kde.plasmashell",
                "/PlasmaShell",
                "org.kde.PlasmaShell.evaluateScript",
            ])
            .arg(plasma_script(path))
            .output()?;

        if !output.status.success() {
            return Err(Error::DesktopEnv(format!(
                "Failed to set wallpaper: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(())
    }

    fn notify(&self, title: &str, message: &str, image: Option<&Path>) -> Result<()> {
        if !command_exists("kdialog") {
            return crate::utils::send_notification(title, message, image);
        }

        let mut cmd = Command::new("kdialog");
        cmd.args(["--title", title, "--passivepopup", message, "5"]);

        if let Some(image_path) = image {
            cmd.args(["--icon", &*image_path.to_string_lossy()]);
        }

        let output = cmd.output()?;

        if !output.status.success() {
            return crate::utils::send_notification(title, message, image);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_points_every_desktop_at_the_file() {
        let script = plasma_script(Path::new("/tmp/wallpaper-abcd1234.jpg"));
        assert!(script.contains(r#"d.writeConfig("Image", "file:///tmp/wallpaper-abcd1234.jpg");"#));
        assert!(script.contains("allDesktops.length"));
    }
}
