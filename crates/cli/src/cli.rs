use clap::Parser;

/// Find candidate torrents on every configured qBittorrent server and delete them.
#[derive(Debug, Parser)]
#[command(name = "seedsweep", version)]
pub struct Cli {
    /// Only report matches; delete nothing and leave the record store untouched.
    #[arg(short, long)]
    pub debug: bool,
}
