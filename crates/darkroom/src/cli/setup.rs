//! Run setup: CLI overrides on top of the loaded config, assets layout.

use darkroom_core::{AssetLayout, Config};
use std::path::PathBuf;

use super::RunArgs;

/// Apply CLI flags over file configuration and re-validate the result.
pub fn apply_overrides(args: &RunArgs, config: &mut Config) -> anyhow::Result<()> {
    if let Some(quality) = args.quality {
        config.output.quality = quality;
    }
    if let Some(nproc) = args.nproc {
        config.processing.parallel_workers = nproc as usize;
    }
    if let Some(offset) = &args.utc_offset {
        config.metadata.default_utc_offset = offset.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.limits.photo_timeout_ms = Some(timeout_ms);
    }

    config.validate()?;
    tracing::debug!(
        "Quality {}, {} worker(s), UTC offset {}",
        config.output.quality,
        config.processing.parallel_workers,
        config.metadata.default_utc_offset
    );
    Ok(())
}

/// Resolve the assets directory (with `~` expanded) into the run layout.
pub fn resolve_layout(args: &RunArgs, config: &Config) -> AssetLayout {
    let raw = args.assets_dir.to_string_lossy();
    let assets_dir = PathBuf::from(shellexpand::tilde(&raw).into_owned());
    AssetLayout::resolve(&assets_dir, &config.layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let args = RunArgs {
            quality: Some(92),
            nproc: Some(3),
            utc_offset: Some("-05:00".to_string()),
            timeout_ms: Some(5_000),
            ..RunArgs::default()
        };
        let mut config = Config::default();
        apply_overrides(&args, &mut config).unwrap();

        assert_eq!(config.output.quality, 92);
        assert_eq!(config.processing.parallel_workers, 3);
        assert_eq!(config.metadata.default_utc_offset, "-05:00");
        assert_eq!(config.limits.photo_timeout_ms, Some(5_000));
    }

    #[test]
    fn test_absent_flags_keep_config_values() {
        let mut config = Config::default();
        config.output.quality = 70;
        apply_overrides(&RunArgs::default(), &mut config).unwrap();
        assert_eq!(config.output.quality, 70);
    }

    #[test]
    fn test_bad_offset_is_rejected() {
        let args = RunArgs {
            utc_offset: Some("eight hours".to_string()),
            ..RunArgs::default()
        };
        assert!(apply_overrides(&args, &mut Config::default()).is_err());
    }

    #[test]
    fn test_layout_under_assets_dir() {
        let args = RunArgs {
            assets_dir: PathBuf::from("/srv/assets"),
            ..RunArgs::default()
        };
        let layout = resolve_layout(&args, &Config::default());
        assert_eq!(layout.source_dir, PathBuf::from("/srv/assets/source"));
        assert_eq!(layout.generated_dir, PathBuf::from("/srv/assets/_generated"));
        assert_eq!(
            layout.manifest_path,
            PathBuf::from("/srv/assets/_generated/metas.json")
        );
    }

    #[test]
    fn test_layout_expands_tilde() {
        let args = RunArgs {
            assets_dir: PathBuf::from("~/assets"),
            ..RunArgs::default()
        };
        let layout = resolve_layout(&args, &Config::default());
        assert!(!layout.source_dir.starts_with("~"));
        assert!(layout.source_dir.ends_with("assets/source"));
    }
}
