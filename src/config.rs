use crate::utils::get_config_dir;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_WIDTH: u32 = 2880;
pub const DEFAULT_HEIGHT: u32 = 1800;

/// The effective options of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Options {
    pub width: u32,
    pub height: u32,
    pub dir: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            dir: PathBuf::from("."),
        }
    }
}

/// Any subset of [`Options`], as found in the config file or on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub dir: Option<PathBuf>,
}

impl PartialOptions {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.dir.is_none()
    }

    /// Picks `width`, `height` and `dir` out of a saved JSON object one key
    /// at a time. A key of the wrong type is dropped without affecting the
    /// others; anything that is not an object yields nothing.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            tracing::debug!("saved config is not a JSON object");
            return Self::default();
        };

        let dimension = |key: &str| {
            let raw = map.get(key)?;
            let parsed = raw.as_u64().and_then(|n| u32::try_from(n).ok());
            if parsed.is_none() {
                tracing::debug!(key, value = %raw, "dropping saved value of the wrong type");
            }
            parsed
        };

        let dir = map.get("dir").and_then(|raw| match raw.as_str() {
            Some(dir) => Some(PathBuf::from(dir)),
            None => {
                tracing::debug!(key = "dir", value = %raw, "dropping saved value of the wrong type");
                None
            }
        });

        Self {
            width: dimension("width"),
            height: dimension("height"),
            dir,
        }
    }
}

impl Options {
    /// Layers `saved` over `defaults`, then `cli` over both. Each field is
    /// taken from the highest tier that provides it.
    pub fn merge(defaults: Options, saved: PartialOptions, cli: PartialOptions) -> Options {
        Options {
            width: cli.width.or(saved.width).unwrap_or(defaults.width),
            height: cli.height.or(saved.height).unwrap_or(defaults.height),
            dir: cli.dir.or(saved.dir).unwrap_or(defaults.dir),
        }
    }

    /// Directory the image is written to. A bare `.` means the working
    /// directory at download time.
    pub fn target_dir(&self, cwd: &Path) -> PathBuf {
        if self.dir == Path::new(".") {
            cwd.to_path_buf()
        } else {
            self.dir.clone()
        }
    }
}

/// Applies the `--dir` rule: anything longer than `.` that starts with a dot
/// is pinned to `cwd` now, everything else is kept as given.
pub fn resolve_dir_arg(raw: &str, cwd: &Path) -> PathBuf {
    if raw.len() > 1 && raw.starts_with('.') {
        normalize(&cwd.join(raw))
    } else {
        PathBuf::from(raw)
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::new(get_config_dir()?.join("config.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the saved options. A missing or unreadable file counts as empty.
    pub fn load(&self) -> PartialOptions {
        let content = match read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), "no saved config: {e}");
                return PartialOptions::default();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => PartialOptions::from_json(&value),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), "ignoring malformed config: {e}");
                PartialOptions::default()
            }
        }
    }

    /// Overwrites the config file with `options`, pretty printed.
    pub fn save(&self, options: &Options) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let mut content = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
        options
            .serialize(&mut serializer)
            .map_err(|e| Error::Config(e.to_string()))?;

        write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.json"));
        (dir, store)
    }

    #[test]
    fn merge_prefers_cli_then_saved_then_defaults() {
        let saved = PartialOptions {
            width: Some(1600),
            height: Some(1200),
            dir: None,
        };
        let cli = PartialOptions {
            width: Some(1024),
            ..Default::default()
        };

        let merged = Options::merge(Options::default(), saved, cli);

        assert_eq!(merged.width, 1024);
        assert_eq!(merged.height, 1200);
        assert_eq!(merged.dir, PathBuf::from("."));
    }

    #[test]
    fn merge_of_empty_tiers_is_defaults() {
        let merged = Options::merge(
            Options::default(),
            PartialOptions::default(),
            PartialOptions::default(),
        );
        assert_eq!(merged, Options::default());
    }

    #[test]
    fn dotted_dir_is_pinned_to_cwd() {
        let cwd = Path::new("/home/user/pictures");
        assert_eq!(
            resolve_dir_arg("./foo", cwd),
            PathBuf::from("/home/user/pictures/foo")
        );
        assert_eq!(
            resolve_dir_arg("../walls/./hd", cwd),
            PathBuf::from("/home/user/walls/hd")
        );
        assert_eq!(resolve_dir_arg("./", cwd), PathBuf::from("/home/user/pictures"));
    }

    #[test]
    fn single_dot_and_plain_paths_are_kept() {
        let cwd = Path::new("/somewhere");
        assert_eq!(resolve_dir_arg(".", cwd), PathBuf::from("."));
        assert_eq!(resolve_dir_arg("/Users/Shared", cwd), PathBuf::from("/Users/Shared"));
        assert_eq!(resolve_dir_arg("walls", cwd), PathBuf::from("walls"));
    }

    #[test]
    fn single_dot_resolves_at_download_time() {
        let options = Options::default();
        assert_eq!(options.target_dir(Path::new("/first")), PathBuf::from("/first"));
        assert_eq!(options.target_dir(Path::new("/second")), PathBuf::from("/second"));

        let pinned = Options {
            dir: PathBuf::from("/fixed"),
            ..Options::default()
        };
        assert_eq!(pinned.target_dir(Path::new("/second")), PathBuf::from("/fixed"));
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let (_dir, store) = store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn malformed_file_loads_as_empty() {
        let (_dir, store) = store();
        create_dir_all(store.path().parent().unwrap()).unwrap();
        write(store.path(), "{ width: nope").unwrap();

        let saved = store.load();
        assert!(saved.is_empty());
        assert_eq!(
            Options::merge(Options::default(), saved, PartialOptions::default()),
            Options::default()
        );
    }

    #[test]
    fn partial_file_keeps_present_keys_only() {
        let (_dir, store) = store();
        create_dir_all(store.path().parent().unwrap()).unwrap();
        write(store.path(), r#"{ "height": 900, "unrelated": true }"#).unwrap();

        let saved = store.load();
        assert_eq!(saved.height, Some(900));
        assert_eq!(saved.width, None);
        assert_eq!(saved.dir, None);
    }

    #[test]
    fn wrongly_typed_key_drops_only_itself() {
        let (_dir, store) = store();
        create_dir_all(store.path().parent().unwrap()).unwrap();
        write(store.path(), r#"{ "width": "1600", "height": 900, "dir": "/pics" }"#).unwrap();

        let saved = store.load();
        assert_eq!(saved.width, None);
        assert_eq!(saved.height, Some(900));
        assert_eq!(saved.dir, Some(PathBuf::from("/pics")));

        let merged = Options::merge(Options::default(), saved, PartialOptions::default());
        assert_eq!(merged.width, DEFAULT_WIDTH);
        assert_eq!(merged.dir, PathBuf::from("/pics"));
    }

    #[test]
    fn non_object_json_loads_as_empty() {
        let (_dir, store) = store();
        create_dir_all(store.path().parent().unwrap()).unwrap();
        write(store.path(), "[1600, 900]").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn out_of_range_dimension_is_dropped() {
        let saved = PartialOptions::from_json(&serde_json::json!({
            "width": -5,
            "height": 4_294_967_296u64,
            "dir": 7
        }));
        assert!(saved.is_empty());
    }

    #[test]
    fn save_overwrites_previous_file() {
        let (_dir, store) = store();
        store
            .save(&Options {
                width: 1600,
                ..Options::default()
            })
            .unwrap();
        store
            .save(&Options {
                width: 1280,
                ..Options::default()
            })
            .unwrap();

        let saved = store.load();
        assert_eq!(saved.width, Some(1280));
        assert_eq!(saved.height, Some(DEFAULT_HEIGHT));
        assert_eq!(saved.dir, Some(PathBuf::from(".")));
    }

    #[test]
    fn save_uses_four_space_indent() {
        let (_dir, store) = store();
        store.save(&Options::default()).unwrap();

        let content = read_to_string(store.path()).unwrap();
        assert_eq!(
            content,
            "{\n    \"width\": 2880,\n    \"height\": 1800,\n    \"dir\": \".\"\n}"
        );
    }
}
