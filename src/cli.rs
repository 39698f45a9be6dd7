use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cuecast",
    about = "Fuzzy-search media dispatcher: resolve a short query against your media folder and play it on every connected client",
    long_about = None,
    version = env!("CUECAST_VERSION"),
)]
pub struct Args {
    /// Media root holding the audio and video folders [config: media_root]
    pub media_root: Option<PathBuf>,

    /// HTTP port to listen on [default: 3069]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to TOML config file (overrides default search: ./cuecast.toml, ~/.config/cuecast/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind to localhost only (127.0.0.1) instead of all interfaces
    #[arg(long)]
    pub localhost: bool,

    /// Rescan the media folders instead of loading catalog snapshots
    #[arg(long)]
    pub rebuild: bool,

    /// Base URL clients use to fetch media [default: http://<hostname>:<port>]
    #[arg(long, value_name = "URL")]
    pub public_url: Option<String>,

    /// Directory for catalog snapshots [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}
