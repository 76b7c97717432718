pub mod config;
pub mod desktop;
pub mod progress;
pub mod unsplash;
pub mod utils;

pub use config::{ConfigStore, Options, PartialOptions};
pub use desktop::WallpaperManager;
pub use unsplash::{ImageClient, ImageId, ImageRequest};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Desktop environment error: {0}")]
    DesktopEnv(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("API error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, Error>;
