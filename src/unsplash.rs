use crate::config::Options;
use crate::progress::ProgressTracker;
use crate::{Error, Result};
use futures_util::StreamExt;
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tokio::fs::{File, create_dir_all};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_BASE_URL: &str = "https://unsplash.it/";
pub const BASE_URL_ENV: &str = "UNSPLASH_WALLPAPER_BASE_URL";

/// Crop directions the service documents. Others are forwarded untouched.
pub const GRAVITIES: [&str; 5] = ["north", "east", "south", "west", "center"];

pub fn is_known_gravity(gravity: &str) -> bool {
    GRAVITIES.contains(&gravity)
}

/// A specific image number. Numbers and numeric-looking strings arrive the
/// same way, as text; nothing beyond non-emptiness is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageId(String);

impl ImageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ImageId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err("image id must not be empty".to_string())
        } else {
            Ok(Self(s.to_string()))
        }
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-download parameters that are never saved to the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRequest {
    pub grayscale: bool,
    pub blur: bool,
    pub random: bool,
    pub image: Option<ImageId>,
    pub gravity: Option<String>,
}

/// Composes `<base>[g/]<width>/<height>/[?image=..][&gravity=..][&random][&blur]`.
/// The first query parameter gets `?`, every later one `&`.
pub fn build_url(base: &str, options: &Options, request: &ImageRequest) -> String {
    let mut url = base.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }

    if request.grayscale {
        url.push_str("g/");
    }

    url.push_str(&format!("{}/{}/", options.width, options.height));

    let mut has_query = false;

    if let Some(image) = &request.image {
        url.push(separator(&mut has_query));
        url.push_str(&format!("image={}", image));
    }

    if let Some(gravity) = &request.gravity {
        url.push(separator(&mut has_query));
        url.push_str(&format!("gravity={}", gravity));
    }

    let mut params = Vec::new();
    if request.random {
        params.push("random");
    }
    if request.blur {
        params.push("blur");
    }

    if !params.is_empty() {
        url.push(separator(&mut has_query));
        url.push_str(&params.join("&"));
    }

    url
}

fn separator(has_query: &mut bool) -> char {
    let sep = if *has_query { '&' } else { '?' };
    *has_query = true;
    sep
}

/// `wallpaper-<8 random alphanumerics>.jpg`
pub fn unique_file_name() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("wallpaper-{}.jpg", suffix)
}

pub struct ImageClient {
    client: Client,
    base_url: String,
}

impl ImageClient {
    pub fn new() -> Self {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn image_url(&self, options: &Options, request: &ImageRequest) -> String {
        build_url(&self.base_url, options, request)
    }

    /// Streams `url` into `dest`, calling `on_progress` with a percentage as
    /// chunks arrive and with exactly `100.0` once the file is complete.
    ///
    /// Transport failures come back as [`Error::Network`] (or [`Error::Api`]
    /// for a non-success status), failures writing the file as [`Error::Io`].
    pub async fn download<F>(&self, url: &str, dest: &Path, mut on_progress: F) -> Result<PathBuf>
    where
        F: FnMut(f64),
    {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent).await?;
            }
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "Failed to fetch image: HTTP {}",
                response.status()
            )));
        }

        let mut tracker = ProgressTracker::new(response.content_length());
        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            if let Some(percent) = tracker.advance(chunk.len() as u64, Instant::now()) {
                on_progress(percent);
            }
        }
        file.flush().await?;

        tracing::debug!(bytes = tracker.received(), path = %dest.display(), "download complete");
        on_progress(tracker.finish());
        Ok(dest.to_path_buf())
    }
}

impl Default for ImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://unsplash.it/";

    fn options(width: u32, height: u32) -> Options {
        Options {
            width,
            height,
            ..Options::default()
        }
    }

    #[test]
    fn specific_image() {
        let request = ImageRequest {
            image: Some("580".parse().unwrap()),
            ..Default::default()
        };
        let url = build_url(BASE, &options(1600, 1200), &request);
        assert_eq!(url, "https://unsplash.it/1600/1200/?image=580");
    }

    #[test]
    fn grayscale_random_blur() {
        let request = ImageRequest {
            grayscale: true,
            random: true,
            blur: true,
            ..Default::default()
        };
        let url = build_url(BASE, &Options::default(), &request);
        assert_eq!(url, "https://unsplash.it/g/2880/1800/?random&blur");
    }

    #[test]
    fn gravity_follows_image() {
        let request = ImageRequest {
            image: Some("327".parse().unwrap()),
            gravity: Some("south".to_string()),
            ..Default::default()
        };
        let url = build_url(BASE, &Options::default(), &request);
        assert_eq!(url, "https://unsplash.it/2880/1800/?image=327&gravity=south");
    }

    #[test]
    fn gravity_alone_opens_query() {
        let request = ImageRequest {
            gravity: Some("west".to_string()),
            blur: true,
            ..Default::default()
        };
        let url = build_url(BASE, &Options::default(), &request);
        assert_eq!(url, "https://unsplash.it/2880/1800/?gravity=west&blur");
    }

    #[test]
    fn image_and_random_coexist() {
        let request = ImageRequest {
            image: Some("12".parse().unwrap()),
            random: true,
            ..Default::default()
        };
        let url = build_url(BASE, &Options::default(), &request);
        assert_eq!(url, "https://unsplash.it/2880/1800/?image=12&random");
        assert_eq!(url.matches('?').count(), 1);
    }

    #[test]
    fn no_parameters_has_no_query() {
        let url = build_url(BASE, &options(800, 600), &ImageRequest::default());
        assert_eq!(url, "https://unsplash.it/800/600/");
    }

    #[test]
    fn base_without_trailing_slash() {
        let url = build_url("http://127.0.0.1:8080", &options(10, 20), &ImageRequest::default());
        assert_eq!(url, "http://127.0.0.1:8080/10/20/");
    }

    #[test]
    fn building_is_deterministic() {
        let request = ImageRequest {
            grayscale: true,
            image: Some("5".parse().unwrap()),
            gravity: Some("center".to_string()),
            random: true,
            blur: true,
        };
        let first = build_url(BASE, &Options::default(), &request);
        let second = build_url(BASE, &Options::default(), &request);
        assert_eq!(first, second);
        assert_eq!(
            first,
            "https://unsplash.it/g/2880/1800/?image=5&gravity=center&random&blur"
        );
    }

    #[test]
    fn unknown_gravity_is_forwarded() {
        assert!(!is_known_gravity("upside-down"));
        let request = ImageRequest {
            gravity: Some("upside-down".to_string()),
            ..Default::default()
        };
        let url = build_url(BASE, &Options::default(), &request);
        assert!(url.ends_with("?gravity=upside-down"));
    }

    #[test]
    fn known_gravities() {
        for gravity in GRAVITIES {
            assert!(is_known_gravity(gravity));
        }
    }

    #[test]
    fn image_id_rejects_empty() {
        assert!("".parse::<ImageId>().is_err());
        assert!("  ".parse::<ImageId>().is_err());
        assert_eq!("abc".parse::<ImageId>().unwrap().as_str(), "abc");
    }

    #[test]
    fn file_name_shape() {
        let name = unique_file_name();
        let suffix = name
            .strip_prefix("wallpaper-")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
