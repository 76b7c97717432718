use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use unsplash_wallpaper::{
    ConfigStore, Error, ImageClient, ImageId, ImageRequest, Options, PartialOptions,
    config::resolve_dir_arg,
    desktop::get_wallpaper_manager,
    progress::DownloadBar,
    unsplash::{is_known_gravity, unique_file_name},
};

const USAGE: &str = r#"
Usage: unsplash-wallpaper [latest|random] [options]

Commands:
    latest                  Download the latest image.
                            $ unsplash-wallpaper latest
    random                  Download a random image.
                            $ unsplash-wallpaper random

Options:
    -w, --width <number>    Width of the image to download.
    -h, --height <number>   Height of the image to download.
    -d, --dir <path>        Directory to download into.
                            "." is the working directory of each run,
                            "./" pins the current working directory.
                            $ unsplash-wallpaper --dir "/Users/Shared"
                            $ unsplash-wallpaper -d .
    -s, --save-config       Store width, height and dir for later runs.
                            $ unsplash-wallpaper random -s --width 1600 --height 1200
    -i, --image <number>    Download a specific image by number
                            (https://unsplash.it/images).
                            $ unsplash-wallpaper -i 580
    -x, --gravity <dir>     Crop direction: north, east, south, west or center.
                            $ unsplash-wallpaper --image 327 --gravity south
    -g, --grayscale         Grayscale image.
    -b, --blur              Blurred image.
    -v, --version           Print the version.
        --help              Print this help.
"#;

const HINT: &str = "For help:\n$ unsplash-wallpaper --help";

#[derive(Parser, Debug)]
#[command(
    name = "unsplash-wallpaper",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    #[arg(help = "latest or random")]
    commands: Vec<String>,

    #[arg(short, long, num_args = 0..=1, help = "Width of the image to download")]
    width: Option<Option<String>>,
    #[arg(short = 'h', long, num_args = 0..=1, help = "Height of the image to download")]
    height: Option<Option<String>>,
    #[arg(short, long, num_args = 0..=1, help = "Directory to download into")]
    dir: Option<Option<String>>,
    #[arg(short, long, help = "Store width, height and dir for later runs")]
    save_config: bool,
    #[arg(short, long, num_args = 0..=1, help = "Download a specific image by number")]
    image: Option<Option<String>>,
    #[arg(
        short = 'x',
        long,
        num_args = 0..=1,
        help = "Crop direction (north, east, south, west, center)"
    )]
    gravity: Option<Option<String>>,
    #[arg(short, long)]
    grayscale: bool,
    #[arg(short, long)]
    blur: bool,
    #[arg(short, long)]
    version: bool,
    #[arg(long)]
    help: bool,
}

/// Value of an optional-value flag, if one was given and is not blank.
fn flag_value<'a>(flag: &'a Option<Option<String>>, name: &str) -> Option<&'a str> {
    match flag.as_ref()?.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            tracing::warn!(flag = name, "no value given, ignoring");
            None
        }
    }
}

/// Dimensions that are not whole numbers are ignored, the way a missing
/// flag would be.
fn lenient_dimension(flag: &Option<Option<String>>, name: &str) -> Option<u32> {
    let raw = flag_value(flag, name)?;
    match raw.parse::<u32>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(flag = name, value = raw, "ignoring non-numeric value: {e}");
            None
        }
    }
}

/// What a single invocation is going to do.
#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    print_help: bool,
    print_version: bool,
    should_download: bool,
    should_save: bool,
    needs_config_io: bool,
    print_hint: bool,
}

impl Args {
    fn has_command(&self, name: &str) -> bool {
        self.commands.iter().any(|c| c == name)
    }

    fn plan(&self) -> Plan {
        if self.help {
            return Plan {
                print_help: true,
                ..Plan::default()
            };
        }

        let should_download =
            self.has_command("latest") || self.has_command("random") || self.image.is_some();
        let should_save = self.save_config;

        Plan {
            print_help: false,
            print_version: self.version,
            should_download,
            should_save,
            needs_config_io: should_download || should_save,
            print_hint: !should_download && !should_save && !self.version,
        }
    }

    fn overrides(&self, cwd: &Path) -> PartialOptions {
        PartialOptions {
            width: lenient_dimension(&self.width, "width"),
            height: lenient_dimension(&self.height, "height"),
            dir: flag_value(&self.dir, "dir").map(|dir| resolve_dir_arg(dir, cwd)),
        }
    }

    fn image_request(&self) -> ImageRequest {
        ImageRequest {
            grayscale: self.grayscale,
            blur: self.blur,
            random: self.has_command("random"),
            image: self
                .image
                .as_ref()
                .and_then(|image| image.as_deref())
                .and_then(|image| image.parse::<ImageId>().ok()),
            gravity: flag_value(&self.gravity, "gravity").map(String::from),
        }
    }
}

const VALUE_LONGS: [&str; 5] = ["width", "height", "dir", "image", "gravity"];
const FLAG_LONGS: [&str; 5] = ["save-config", "grayscale", "blur", "version", "help"];
const VALUE_SHORTS: [char; 5] = ['w', 'h', 'd', 'i', 'x'];
const FLAG_SHORTS: [char; 4] = ['s', 'g', 'b', 'v'];

/// Separates flags the tool does not know (and the value following an
/// unknown flag) from the ones clap should see, so that they are kept
/// instead of aborting the run. Short clusters are taken apart one
/// character at a time.
fn split_unknown(raw: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut known = Vec::with_capacity(raw.len());
    let mut extra = Vec::new();
    let mut tokens = raw.into_iter().peekable();

    if let Some(program) = tokens.next() {
        known.push(program);
    }

    let takes_value = |next: Option<&String>| next.is_some_and(|n| !n.starts_with('-'));

    while let Some(token) = tokens.next() {
        if token == "--" {
            known.push(token);
            known.extend(tokens.by_ref());
            break;
        }

        if let Some(long) = token.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, _)) => (name, true),
                None => (long, false),
            };
            let consume = !inline_value && takes_value(tokens.peek());

            if VALUE_LONGS.contains(&name) {
                known.push(token);
                if consume {
                    known.extend(tokens.next());
                }
            } else if FLAG_LONGS.contains(&name) {
                known.push(token);
            } else {
                extra.push(token);
                if consume {
                    extra.extend(tokens.next());
                }
            }
            continue;
        }

        if let Some(shorts) = token.strip_prefix('-').filter(|s| !s.is_empty()) {
            for (i, c) in shorts.char_indices() {
                let rest = &shorts[i + c.len_utf8()..];
                let last = rest.is_empty();

                if VALUE_SHORTS.contains(&c) {
                    if last {
                        known.push(format!("-{c}"));
                        if takes_value(tokens.peek()) {
                            known.extend(tokens.next());
                        }
                    } else {
                        known.push(format!("-{c}{rest}"));
                    }
                    break;
                }

                if FLAG_SHORTS.contains(&c) {
                    known.push(format!("-{c}"));
                } else {
                    extra.push(format!("-{c}"));
                    if last && takes_value(tokens.peek()) {
                        extra.extend(tokens.next());
                    }
                }
            }
            continue;
        }

        known.push(token);
    }

    (known, extra)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn download_and_set(options: &Options, request: &ImageRequest) {
    if let Some(gravity) = &request.gravity {
        if !is_known_gravity(gravity) {
            tracing::warn!(%gravity, "unknown gravity, passing it through");
        }
    }

    let client = ImageClient::new();
    let url = client.image_url(options, request);
    println!("request {}", url);

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let dest = options.target_dir(&cwd).join(unique_file_name());

    let bar = DownloadBar::new();
    let path = match client.download(&url, &dest, |percent| bar.set(percent)).await {
        Ok(path) => path,
        Err(Error::Io(e)) => {
            bar.abandon();
            eprintln!("An error has occurred while writing the image: {}", e);
            return;
        }
        Err(e) => {
            bar.abandon();
            eprintln!("An error has occurred while downloading: {}", e);
            return;
        }
    };

    bar.finish();
    println!("Image saved to {}", path.display());

    match tokio::task::spawn_blocking(move || apply_wallpaper(&path)).await {
        Ok(()) => {}
        Err(e) => eprintln!("An error has occurred while setting wallpaper: {}", e),
    }
}

fn apply_wallpaper(path: &Path) {
    let manager = match get_wallpaper_manager() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("An error has occurred while setting wallpaper: {}", e);
            return;
        }
    };

    tracing::debug!(backend = manager.name(), path = %path.display(), "setting wallpaper");
    if let Err(e) = manager.set_wallpaper(path) {
        eprintln!("An error has occurred while setting wallpaper: {}", e);
        return;
    }

    println!("Check it out!");

    if let Err(e) = manager.notify("Unsplash Wallpaper", "Wallpaper updated", Some(path)) {
        tracing::debug!("notification failed: {}", e);
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let (argv, extra) = split_unknown(std::env::args().collect());
    if !extra.is_empty() {
        tracing::debug!(?extra, "ignoring unknown arguments");
    }

    let args = Args::parse_from(argv);
    let plan = args.plan();

    if plan.print_help {
        println!("{}", USAGE);
        return Ok(());
    }

    if plan.print_version {
        println!("version {}", env!("CARGO_PKG_VERSION"));
    }

    if plan.needs_config_io {
        let overrides = args.overrides(&std::env::current_dir()?);
        let store = ConfigStore::default_location();
        let saved = match &store {
            Ok(store) => store.load(),
            Err(e) => {
                tracing::debug!("no config location: {}", e);
                PartialOptions::default()
            }
        };
        let options = Options::merge(Options::default(), saved, overrides);
        tracing::debug!(?options, "effective options");

        if plan.should_download {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(download_and_set(&options, &args.image_request()));
        }

        if plan.should_save {
            store?.save(&options)?;
        }
    } else if plan.print_hint {
        println!("{}", HINT);
    }

    Ok(())
}
