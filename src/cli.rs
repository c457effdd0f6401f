use clap::{Args, Parser, Subcommand};

use crate::languages::DEFAULT_LANGUAGES_URL;
use crate::source::DEFAULT_STATUS_BASE_URL;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn quiet(&self) -> bool {
        matches!(&self.command, Command::Import(args) if args.quiet)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a DokuWiki story repository into markdown plus a manifest.
    Import(ImportArgs),
    /// Convert a single DokuWiki file to markdown.
    Convert(ConvertArgs),
    /// Check converted chapters against the expected frame layout.
    Verify(VerifyArgs),
    Manifest {
        #[command(subcommand)]
        command: ManifestCommand,
    },
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Language code of the resource.
    #[arg(short, long)]
    pub lang: String,

    /// Git repository holding the DokuWiki sources (github only).
    #[arg(short, long, visible_alias = "gitrepo")]
    pub repo: String,

    /// Output directory for markdown files and `manifest.json`.
    #[arg(short, long, visible_alias = "outdir")]
    pub out: String,

    /// Suppress progress messages.
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent downloads.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Abort before writing the manifest when validation finds problems.
    #[arg(long)]
    pub strict: bool,

    /// Write into an existing output directory.
    #[arg(long)]
    pub force: bool,

    /// Language registry export (http/https/file).
    #[arg(long, default_value = DEFAULT_LANGUAGES_URL)]
    pub languages_url: String,

    /// Base location of per-language status documents.
    #[arg(long, default_value = DEFAULT_STATUS_BASE_URL)]
    pub status_url: String,

    /// Local JSON status file; when given, `--status-url` is not consulted.
    #[arg(long)]
    pub status_file: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// DokuWiki input file.
    #[arg(long)]
    pub input: String,

    /// Output markdown file (default: stdout).
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Directory holding `01.md` .. `50.md`.
    #[arg(long)]
    pub content: String,
}

#[derive(Debug, Subcommand)]
pub enum ManifestCommand {
    /// Rewrite a manifest of either shape as the current package manifest.
    Upgrade(ManifestUpgradeArgs),
}

#[derive(Debug, Args)]
pub struct ManifestUpgradeArgs {
    /// Input `manifest.json`.
    #[arg(long)]
    pub input: String,

    /// Output file path.
    #[arg(long)]
    pub out: String,

    /// `modified_at` stamp (default: today, `YYYYMMDD`).
    #[arg(long)]
    pub modified_at: Option<String>,

    /// Overwrite an existing output file.
    #[arg(long)]
    pub force: bool,
}
