use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "cslb",
    version,
    about = "CSLB contractor listing ingestion: PDF to text to CSV, with run reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Run(RunArgs),
    Inventory(InventoryArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RunMode {
    Daily,
    Manual,
    Test,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Manual => "manual",
            Self::Test => "test",
        }
    }

    pub fn archives(self) -> bool {
        matches!(self, Self::Daily)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(value_enum)]
    pub mode: RunMode,

    #[arg(long, default_value = "data/cslb")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub pdf_dir: Option<PathBuf>,

    #[arg(long)]
    pub text_dir: Option<PathBuf>,

    #[arg(long)]
    pub csv_dir: Option<PathBuf>,

    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub skip_index: bool,

    #[arg(long, default_value_t = 30)]
    pub retention_days: u32,

    #[arg(long, default_value_t = 120)]
    pub extract_timeout_secs: u64,

    #[arg(long, default_value_t = 500)]
    pub pause_ms: u64,

    #[arg(long, default_value = "pdftotext")]
    pub pdftotext_bin: String,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "data/cslb")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub pdf_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data/cslb")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn unknown_run_mode_is_a_usage_error() {
        let err = Cli::try_parse_from(["cslb", "run", "weekly"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(err.use_stderr());
    }

    #[test]
    fn run_mode_parses_with_defaults() {
        let cli = Cli::try_parse_from(["cslb", "run", "daily", "--pause-ms", "0"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.mode, RunMode::Daily);
        assert!(args.mode.archives());
        assert_eq!(args.data_root, PathBuf::from("data/cslb"));
        assert_eq!(args.retention_days, 30);
        assert_eq!(args.extract_timeout_secs, 120);
        assert_eq!(args.pause_ms, 0);
        assert!(!args.skip_index);
    }
}
