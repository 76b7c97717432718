use crate::Result;
use crate::utils::send_notification;
use std::path::Path;

pub mod hyprland;
pub mod plasma;
pub mod system;

pub trait WallpaperManager {
    fn name(&self) -> &'static str;
    fn set_wallpaper(&self, path: &Path) -> Result<()>;

    fn notify(&self, title: &str, message: &str, image: Option<&Path>) -> Result<()> {
        send_notification(title, message, image)
    }
}

pub fn get_wallpaper_manager() -> Result<Box<dyn WallpaperManager>> {
    let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();

    match desktop.to_lowercase().as_str() {
        "hyprland" => Ok(Box::new(hyprland::HyprlandManager::new()?)),
        "kde" | "plasma" => Ok(Box::new(plasma::PlasmaManager::new()?)),
        _ => {
            if hyprland::HyprlandManager::is_available() {
                if let Ok(manager) = hyprland::HyprlandManager::new() {
                    return Ok(Box::new(manager));
                }
            }
            if plasma::PlasmaManager::is_available() {
                if let Ok(manager) = plasma::PlasmaManager::new() {
                    return Ok(Box::new(manager));
                }
            }
            Ok(Box::new(system::SystemManager))
        }
    }
}
