use std::path::PathBuf;
use std::time::Duration;

use crate::cli::ExportArgs;
use crate::export::ExportOptions;
use crate::store::AssetFilter;

/// Export run configuration assembled from CLI arguments.
#[derive(Debug)]
pub struct ExportConfig {
    pub filter: AssetFilter,
    pub options: ExportOptions,
    pub no_progress_bar: bool,
}

impl ExportConfig {
    pub fn from_args(args: &ExportArgs) -> anyhow::Result<Self> {
        if args.chunk_time_sec < 0.0 || !args.chunk_time_sec.is_finite() {
            anyhow::bail!(
                "--chunk-time-sec must be a non-negative number, got {}",
                args.chunk_time_sec
            );
        }

        Ok(Self {
            filter: AssetFilter {
                include_images: !args.skip_images,
                include_videos: !args.skip_videos,
                include_cloud_data: !args.no_cloud_data,
            },
            options: ExportOptions {
                max_items: args.max_items,
                items_in_chunk: args.items_in_chunk,
                chunk_time: Duration::from_secs_f64(args.chunk_time_sec),
                use_original_file_names: args.use_original_file_names,
                include_album_data: args.include_album_data,
            },
            no_progress_bar: args.no_progress_bar,
        })
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn export_args(extra: &[&str]) -> ExportArgs {
        let mut argv = vec!["photolib-bridge", "export"];
        argv.extend_from_slice(extra);
        let cli = crate::cli::Cli::try_parse_from(argv).unwrap();
        match cli.command {
            crate::cli::Command::Export(args) => args,
            _ => unreachable!("export subcommand was given"),
        }
    }

    #[test]
    fn test_defaults_map_to_single_batch_export() {
        let config = ExportConfig::from_args(&export_args(&[])).unwrap();
        assert!(config.filter.include_images);
        assert!(config.filter.include_videos);
        assert!(config.filter.include_cloud_data);
        assert_eq!(config.options.max_items, 0);
        assert_eq!(config.options.items_in_chunk, 0);
        assert!(config.options.chunk_time.is_zero());
    }

    #[test]
    fn test_skip_flags_invert_into_filter() {
        let config = ExportConfig::from_args(&export_args(&[
            "--skip-videos",
            "--no-cloud-data",
        ]))
        .unwrap();
        assert!(config.filter.include_images);
        assert!(!config.filter.include_videos);
        assert!(!config.filter.include_cloud_data);
    }

    #[test]
    fn test_chunk_time_converts_to_duration() {
        let config =
            ExportConfig::from_args(&export_args(&["--chunk-time-sec", "2.5"])).unwrap();
        assert_eq!(config.options.chunk_time, Duration::from_millis(2500));
    }

    #[test]
    fn test_negative_chunk_time_rejected() {
        let mut args = export_args(&[]);
        args.chunk_time_sec = -1.0;
        assert!(ExportConfig::from_args(&args).is_err());

        args.chunk_time_sec = f64::NAN;
        assert!(ExportConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/manifest.json");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("manifest.json"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(
            expand_tilde("/absolute/manifest.json"),
            PathBuf::from("/absolute/manifest.json")
        );
        assert_eq!(
            expand_tilde("relative/manifest.json"),
            PathBuf::from("relative/manifest.json")
        );
    }
}
