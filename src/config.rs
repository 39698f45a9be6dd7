use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3069;
const DEFAULT_AUDIO_DIR: &str = "Musique";
const DEFAULT_VIDEO_DIR: &str = "Video";
const DEFAULT_VOLUME: f32 = 1.0;

fn default_public_url(port: u16, localhost: bool) -> String {
    if localhost {
        return format!("http://127.0.0.1:{port}");
    }
    let host = hostname::get()
        .ok()
        .and_then(|os| os.into_string().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("http://{host}:{port}")
}

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub localhost: Option<bool>,
    pub media_root: Option<PathBuf>,
    pub audio_dir: Option<String>,
    pub video_dir: Option<String>,
    pub public_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub exclude: Option<Vec<String>>,
    pub volume: Option<f32>,
    pub web_root: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub localhost: bool,
    pub media_root: PathBuf,
    pub audio_dir: String,
    pub video_dir: String,
    pub public_url: String,
    pub cache_dir: PathBuf,
    pub exclude: Vec<String>,
    pub volume: f32,
    pub web_root: Option<PathBuf>,
    pub rebuild: bool,
}

impl Config {
    /// Merge CLI flags over the config file over built-in defaults.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let media_root = args
            .media_root
            .clone()
            .or(file.media_root)
            .ok_or(ConfigError::MissingMediaRoot)?;

        let volume = file.volume.unwrap_or(DEFAULT_VOLUME);
        if !(0.0..=1.0).contains(&volume) {
            return Err(ConfigError::InvalidVolume(volume));
        }

        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let localhost = args.localhost || file.localhost.unwrap_or(false);
        let public_url = args
            .public_url
            .clone()
            .or(file.public_url)
            .unwrap_or_else(|| default_public_url(port, localhost));

        Ok(Config {
            port,
            localhost,
            media_root,
            audio_dir: file.audio_dir.unwrap_or_else(|| DEFAULT_AUDIO_DIR.to_string()),
            video_dir: file.video_dir.unwrap_or_else(|| DEFAULT_VIDEO_DIR.to_string()),
            public_url,
            cache_dir: args.cache_dir.clone().or(file.cache_dir).unwrap_or_else(|| PathBuf::from(".")),
            exclude: file.exclude.unwrap_or_default(),
            volume,
            web_root: file.web_root,
            rebuild: args.rebuild,
        })
    }

    pub fn audio_root(&self) -> PathBuf {
        self.media_root.join(&self.audio_dir)
    }

    pub fn video_root(&self) -> PathBuf {
        self.media_root.join(&self.video_dir)
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("cuecast.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("cuecast").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no media root given (pass a path or set media_root in the config file)")]
    MissingMediaRoot,
    #[error("volume must be between 0 and 1, got {0}")]
    InvalidVolume(f32),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
