//! Fallback backend for GNOME, other X11 desktops, macOS and Windows.

use super::WallpaperManager;
use crate::{Error, Result};
use std::path::Path;

pub struct SystemManager;

impl WallpaperManager for SystemManager {
    fn name(&self) -> &'static str {
        "system"
    }

    fn set_wallpaper(&self, path: &Path) -> Result<()> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::DesktopEnv(format!("path is not valid UTF-8: {}", path.display())))?;

        wallpaper::set_from_path(path_str).map_err(|e| Error::DesktopEnv(e.to_string()))
    }
}
