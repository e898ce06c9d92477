use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "canonsync",
    version,
    about = "Segmentation, normalization and store sync for parallel canonical texts"
)]
pub struct Cli {
    /// Pipeline configuration (TOML). Defaults to <corpus-root>/pipeline.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Segment(SegmentArgs),
    Reconcile(ReconcileArgs),
    Normalize(NormalizeArgs),
    Sync(SyncArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    #[arg(long, default_value = ".cache/canon")]
    pub corpus_root: PathBuf,

    #[arg(long = "book")]
    pub books: Vec<String>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReconcileArgs {
    #[arg(long, default_value = ".cache/canon")]
    pub corpus_root: PathBuf,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[arg(long, default_value = ".cache/canon")]
    pub corpus_root: PathBuf,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    All,
    Sample,
    Off,
}

impl VerifyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sample => "sample",
            Self::Off => "off",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[arg(long, default_value = ".cache/canon")]
    pub corpus_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Write the statement batches to this SQL script instead of executing them.
    #[arg(long)]
    pub emit_sql: Option<PathBuf>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long, value_enum)]
    pub verify: Option<VerifyMode>,

    #[arg(long)]
    pub verify_sample: Option<usize>,

    /// Compare documents with the store without writing anything.
    #[arg(long, default_value_t = false)]
    pub verify_only: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/canon")]
    pub corpus_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
