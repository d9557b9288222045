//! The `darkroom` command: one batch run over an assets directory.

mod progress;
mod setup;

use clap::Args;
use darkroom_core::{BatchDriver, Config, PhotoOutcome};
use std::path::{Path, PathBuf};

use progress::{create_progress_bar, print_summary};
use setup::{apply_overrides, resolve_layout};

/// Arguments for a batch run.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Assets directory holding `source/` and receiving `_generated/`
    #[arg(short, long, default_value = "assets/")]
    pub assets_dir: PathBuf,

    /// JPEG quality for every variant (1-100) [config default: 85]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Number of photos processed concurrently [default: half the CPUs]
    #[arg(short = 'p', long = "nproc", value_parser = clap::value_parser!(u32).range(1..))]
    pub nproc: Option<u32>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// UTC offset applied to EXIF capture times, e.g. +08:00
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<String>,

    /// Skip a photo that takes longer than this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Load configuration from `--config` or the default location.
///
/// An explicit path must load. A broken default file only warns, since a
/// fresh machine should still run with defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {:?}: {e}", path));
    }

    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check {:?}.",
                Config::default_path()
            );
            Ok(Config::default())
        }
    }
}

/// Execute a batch run.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config)?;
    let layout = resolve_layout(&args, &config);
    tracing::debug!("Assets layout: {:?}", layout);

    let extension = config.processing.extension.clone();
    let driver = BatchDriver::new(config)?;
    let files = driver.discover(&layout.source_dir).map_err(|e| {
        anyhow::anyhow!(
            "{e}\n\n  Hint: Darkroom expects photos in {:?}.",
            layout.source_dir
        )
    })?;
    if files.is_empty() {
        tracing::warn!("No .{} files found in {:?}", extension, layout.source_dir);
    }

    let progress = create_progress_bar(files.len() as u64, args.no_progress);

    let result = driver
        .run_discovered(files, &layout.generated_dir, |path, outcome| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match outcome {
                PhotoOutcome::Done { .. } => progress.set_message(name),
                PhotoOutcome::Skipped(reason) => {
                    progress.set_message(format!("{name} skipped ({reason})"))
                }
            }
            progress.inc(1);
        })
        .await;

    match result {
        Ok(summary) => {
            progress.finish_with_message("done");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            progress.abandon_with_message("aborted");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        TestCli::try_parse_from(std::iter::once("darkroom").chain(args.iter().copied()))
            .unwrap()
            .run
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.assets_dir, PathBuf::from("assets/"));
        assert_eq!(args.quality, None);
        assert_eq!(args.nproc, None);
        assert!(!args.no_progress);
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&["-a", "/srv/site/assets", "-q", "92", "-p", "8"]);
        assert_eq!(args.assets_dir, PathBuf::from("/srv/site/assets"));
        assert_eq!(args.quality, Some(92));
        assert_eq!(args.nproc, Some(8));
    }

    #[test]
    fn test_negative_utc_offset() {
        let args = parse(&["--utc-offset", "-05:00"]);
        assert_eq!(args.utc_offset.as_deref(), Some("-05:00"));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        assert!(TestCli::try_parse_from(["darkroom", "-q", "0"]).is_err());
        assert!(TestCli::try_parse_from(["darkroom", "-q", "101"]).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(TestCli::try_parse_from(["darkroom", "-p", "0"]).is_err());
    }

    #[test]
    fn test_explicit_config_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nquality = 70\n").unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().output.quality, 70);

        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[tokio::test]
    async fn test_execute_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            assets_dir: dir.path().to_path_buf(),
            no_progress: true,
            ..RunArgs::default()
        };
        assert!(execute(args, Config::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_execute_empty_source_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("source")).unwrap();
        let args = RunArgs {
            assets_dir: dir.path().to_path_buf(),
            no_progress: true,
            ..RunArgs::default()
        };
        execute(args, Config::default()).await.unwrap();

        let manifest = std::fs::read_to_string(dir.path().join("_generated/metas.json")).unwrap();
        assert_eq!(manifest, "[]");
    }
}
