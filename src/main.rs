//! photolib-bridge binary — drives the library service from the command
//! line. Exports stream as NDJSON batch envelopes on stdout so a host shell
//! (or a human with a pager) can consume chunks as they are flushed.

#![warn(clippy::all)]

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use clap::Parser;
use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use photolib_bridge::cli::{AuthArgs, Cli, Command, ExportArgs, ItemArgs, SaveArgs, ThumbnailArgs};
use photolib_bridge::config::{expand_tilde, ExportConfig};
use photolib_bridge::{LibraryService, ManifestStore};

/// Block until a shutdown signal arrives (SIGINT/SIGTERM/SIGHUP on unix,
/// Ctrl+C elsewhere).
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    let mut sighup = signal(SignalKind::hangup()).expect("failed to register SIGHUP handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
        _ = sighup.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for Ctrl+C");
}

/// Returns the token the export loop watches: the first signal cancels it,
/// which lets the exporter hand over the chunk it is assembling instead of
/// dying mid-write. A second signal exits immediately.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let export_token = token.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown requested, stopping after the current chunk (signal again to force exit)");
        export_token.cancel();

        wait_for_signal().await;
        tracing::warn!("Force exit requested");
        std::process::exit(130);
    });
    token
}

/// Spinner for long exports. Hidden when the user asked for quiet output or
/// stderr is not a TTY (piped output, cron jobs).
fn create_progress_bar(no_progress_bar: bool) -> ProgressBar {
    if no_progress_bar || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    ProgressBar::new_spinner()
}

async fn run_export(service: &LibraryService, args: ExportArgs) -> anyhow::Result<()> {
    let config = ExportConfig::from_args(&args)?;
    let cancel = shutdown_token();
    let pb = create_progress_bar(config.no_progress_bar);

    let pb_ref = &pb;
    let cancel_on_write_error = cancel.clone();
    let stats = service
        .export(&config.filter, &config.options, &cancel, |batch| {
            let line = match serde_json::to_string(&batch) {
                Ok(line) => line,
                Err(e) => {
                    pb_ref.suspend(|| tracing::error!("Could not serialize batch: {}", e));
                    return;
                }
            };
            let mut out = std::io::stdout().lock();
            if writeln!(out, "{line}").and_then(|_| out.flush()).is_err() {
                // Consumer went away; stop producing batches.
                cancel_on_write_error.cancel();
                return;
            }
            pb_ref.inc(batch.items.len() as u64);
            pb_ref.set_message(format!("chunk {}", batch.chunk_index));
        })
        .await?;

    pb.finish_and_clear();

    tracing::info!("── Export Summary ──");
    tracing::info!("  {} items in {} batches", stats.items, stats.batches);
    if stats.unresolved > 0 {
        tracing::info!("  {} items had no retrievable file", stats.unresolved);
    }
    if stats.cancelled {
        tracing::info!("  interrupted before completion");
    }

    Ok(())
}

async fn run_albums(service: &LibraryService) -> anyhow::Result<()> {
    let albums = service.albums().await?;
    for album in albums {
        println!("{}\t{}", album.id, album.title);
    }
    Ok(())
}

async fn run_thumbnail(service: &LibraryService, args: ThumbnailArgs) -> anyhow::Result<()> {
    let payload = service
        .thumbnail(&args.id, args.width, args.height, args.quality)
        .await?;
    tokio::fs::write(&args.out, &payload.data).await?;
    println!("{} ({} bytes, {})", args.out.display(), payload.data.len(), payload.mime_type);
    Ok(())
}

async fn run_item(service: &LibraryService, args: ItemArgs) -> anyhow::Result<()> {
    let encoded = service.item_base64(&args.id, &args.mime_type).await?;
    println!("{encoded}");
    Ok(())
}

async fn run_save(
    service: &LibraryService,
    args: SaveArgs,
    video: bool,
) -> anyhow::Result<()> {
    if video {
        service.save_video(&args.url, &args.album).await?;
    } else {
        service.save_image(&args.url, &args.album).await?;
    }
    println!("Saved into album '{}'", args.album);
    Ok(())
}

async fn run_auth(service: &LibraryService, args: AuthArgs) -> anyhow::Result<()> {
    if args.request {
        service.request_authorization().await?;
    }
    println!("{}", service.authorization().await.as_str());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let manifest_path = expand_tilde(&cli.manifest);
    let store = ManifestStore::open(&manifest_path).await.map_err(|e| {
        anyhow::anyhow!(
            "failed to load library manifest {}: {}",
            manifest_path.display(),
            e
        )
    })?;
    let service = LibraryService::new(Arc::new(store));

    match cli.command {
        Command::Export(args) => run_export(&service, args).await,
        Command::Albums => run_albums(&service).await,
        Command::Thumbnail(args) => run_thumbnail(&service, args).await,
        Command::Item(args) => run_item(&service, args).await,
        Command::SaveImage(args) => run_save(&service, args, false).await,
        Command::SaveVideo(args) => run_save(&service, args, true).await,
        Command::Auth(args) => run_auth(&service, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_hidden_when_disabled() {
        let pb = create_progress_bar(true);
        assert!(pb.is_hidden());
    }

    #[test]
    fn test_cli_module_reachable() {
        // Smoke check that the binary parses its own usage line.
        assert!(Cli::try_parse_from(["photolib-bridge", "albums"]).is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_token_only_cancels_on_signal() {
        // Signal delivery itself can't be exercised safely in a shared test
        // binary; the token must at least come back live.
        assert!(!shutdown_token().is_cancelled());
    }
}
