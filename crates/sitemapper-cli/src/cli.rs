//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Batch two URL streams into groups and write an index
//! sitemapper generate --group blog=blog.txt --group docs=docs.jsonl \
//!     --folder public/sitemaps --base-url https://example.com/sitemaps/
//!
//! # Rebuild the index from the files already on disk
//! sitemapper index --folder public/sitemaps --base-url https://example.com/sitemaps/
//!
//! # Look inside a produced file
//! sitemapper inspect public/sitemaps/blog_1.xml.gz --list
//!
//! # Tell search engines about the index
//! sitemapper ping https://example.com/sitemaps/sitemap_index.xml.gz
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// Main CLI structure for the `sitemapper` command
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(
    about = "sitemapper - Batch URL streams into gzip sitemaps and indexes",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show informational logs
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Show debug logs, including split decisions
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress everything but errors
    #[arg(short = 'q', long, global = true, conflicts_with_all = ["verbose", "debug"])]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true, env = "SITEMAPPER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Batch entry streams into sitemap files and write an index
    Generate(GenerateArgs),

    /// Build the index by scanning a folder of sitemap files
    Index(IndexArgs),

    /// Print the kind and entry count of a produced file
    Inspect(InspectArgs),

    /// Notify search engines that an index was updated
    Ping(PingArgs),
}

/// Arguments for `sitemapper generate`
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Group and its input, one URL or JSON entry per line (`-` reads stdin)
    #[arg(
        long = "group",
        value_name = "NAME=FILE",
        required = true,
        value_parser = parse_group_spec
    )]
    pub groups: Vec<GroupSpec>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Mark every entry as a mobile page
    #[arg(long)]
    pub mobile: bool,

    /// Ping search engines after writing the index
    #[arg(long)]
    pub ping: bool,
}

/// Arguments for `sitemapper index`
#[derive(Args, Clone, Debug)]
pub struct IndexArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Output location overrides shared by `generate` and `index`
#[derive(Args, Clone, Debug, Default)]
pub struct OutputArgs {
    /// Folder receiving the produced files
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Public URL prefix of the folder, used for index locations
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// File name of the index document
    #[arg(long, value_name = "NAME")]
    pub index_name: Option<String>,
}

/// Arguments for `sitemapper inspect`
#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    /// Produced `.xml.gz` file
    pub file: PathBuf,

    /// Print every location
    #[arg(long)]
    pub list: bool,
}

/// Arguments for `sitemapper ping`
#[derive(Args, Clone, Debug)]
pub struct PingArgs {
    /// Public URL of the index
    pub url: String,
}

/// Where a group's entries come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input
    Stdin,
    /// A file of entry lines
    File(PathBuf),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One `--group NAME=FILE` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    pub input: InputSource,
}

fn parse_group_spec(value: &str) -> Result<GroupSpec, String> {
    let (name, input) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=FILE, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing group name in '{value}'"));
    }
    let input = match input.trim() {
        "" => return Err(format!("missing input file in '{value}'")),
        "-" => InputSource::Stdin,
        path => InputSource::File(PathBuf::from(path)),
    };
    Ok(GroupSpec {
        name: name.to_string(),
        input,
    })
}
