use std::path::PathBuf;

use clap::Parser;

/// Recursive subdomain enumerator: brute-force DNS resolution with
/// wildcard detection, zone-transfer probing, and dictionary feedback.
#[derive(Parser, Debug, Clone)]
#[clap(name = "subrecur", version, author)]
pub struct Args {
    /// Single apex domain to enumerate.
    #[clap(short = 'd', long, conflicts_with = "file")]
    pub domain: Option<String>,

    /// File of apex domains, one per line.
    #[clap(short = 'f', long = "file", conflicts_with = "domain")]
    pub file: Option<PathBuf>,

    /// Primary label dictionary, used on initial enumeration.
    #[clap(long = "df", default_value = "subdomains.txt")]
    pub primary_dict: PathBuf,

    /// Loop-pass label dictionary, used during recursive re-enumeration.
    #[clap(long = "ld", default_value = "mydict.txt")]
    pub loop_dict: PathBuf,

    /// Output file; defaults to `<apex-or-file><timestamp>.txt`.
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Worker count.
    #[clap(short = 't', long, default_value_t = 200)]
    pub threads: usize,

    /// Enable the loop-query fixed-point recursion.
    #[clap(short = 'l', long = "loop")]
    pub loop_query: bool,

    /// Disable the HTML content filter (enabled by default).
    #[clap(long = "nf")]
    pub no_filter: bool,

    /// Pin the DNS server; skips auto-selection.
    #[clap(long = "dns-server")]
    pub dns_server: Option<String>,

    /// Enable the scheduled-rerun loop, given as HH:MM.
    #[clap(long = "start-time")]
    pub start_time: Option<String>,

    /// Monitor baseline file; required when `--start-time` is given.
    #[clap(long = "mf")]
    pub monitor_file: Option<PathBuf>,

    /// Send results via email on completion.
    #[clap(short = 'e', long)]
    pub email: bool,

    /// Path to `config.yaml` (email settings and content filters).
    #[clap(short = 'c', long, default_value = "config.yaml")]
    pub config: PathBuf,
}
