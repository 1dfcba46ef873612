//! `syncavatar` -- terminal front-end for the SyncAvatar backend.
//!
//! Uploads a portrait and a speech clip, follows the job until it finishes,
//! and saves the resulting video.
//!
//! # Environment variables
//!
//! | Variable                       | Default                 | Description                      |
//! |--------------------------------|-------------------------|----------------------------------|
//! | `SYNCAVATAR_API_URL`           | `http://localhost:8000` | Backend base address             |
//! | `SYNCAVATAR_POLL_INTERVAL_MS`  | `2000`                  | Delay between status checks      |
//! | `SYNCAVATAR_HTTP_TIMEOUT_SECS` | unset                   | Per-request timeout              |
//! | `SYNCAVATAR_DOWNLOAD_DIR`      | `.`                     | Where `avatar.mp4` is saved      |

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use syncavatar_app::config::ClientConfig;
use syncavatar_app::controller::{AppController, GenerateOutcome};
use syncavatar_app::picker::{inspect_file, DropOutcome};
use syncavatar_app::preview::{ObjectUrlRegistry, PreviewStore};
use syncavatar_app::render::{render_picker, render_view};
use syncavatar_app::viewer::ResultViewer;
use syncavatar_core::media::MediaCategory;
use syncavatar_core::view::View;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "syncavatar", version, about = "Turn a still portrait into a talking video")]
struct Cli {
    /// Portrait image (JPG or PNG).
    image: PathBuf,

    /// Speech audio (MP3 or WAV).
    audio: PathBuf,

    /// Directory the finished video is saved to.
    #[arg(long, env = "SYNCAVATAR_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Print the result URL without downloading it.
    #[arg(long)]
    no_download: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "syncavatar=info,syncavatar_app=info,syncavatar_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let api = Arc::new(config.build_api().context("Failed to build HTTP client")?);

    tracing::info!(
        api_url = %api.base_url(),
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Starting syncavatar",
    );

    let previews: Arc<dyn PreviewStore> = Arc::new(ObjectUrlRegistry::new());
    let controller = AppController::new(api.clone(), previews, config.poll_interval)
        .context("Invalid poll interval")?;

    for (category, path) in [
        (MediaCategory::Image, &cli.image),
        (MediaCategory::Audio, &cli.audio),
    ] {
        let file = inspect_file(path).await?;
        // Command-line paths carry no dialog filter, so they are validated
        // like a drop.
        if controller.drop_files(category, vec![file.clone()]).await == DropOutcome::Ignored {
            eprintln!(
                "{} is {}, expected {} ({})",
                path.display(),
                file.mime_type,
                category.accept_pattern(),
                category.format_hint()
            );
        }
        println!("{}", render_picker(&controller.picker_view(category).await));
    }

    let mut views = controller.subscribe();

    match controller.generate().await {
        GenerateOutcome::Submitted { job_id } => tracing::debug!(job_id = %job_id, "Tracking job"),
        GenerateOutcome::Skipped => {
            eprintln!("Both a portrait image and a speech audio file are required");
            return Ok(ExitCode::FAILURE);
        }
        GenerateOutcome::Failed { message } => {
            eprintln!("Error: {message}");
            return Ok(ExitCode::FAILURE);
        }
        GenerateOutcome::Abandoned => return Ok(ExitCode::FAILURE),
    }

    let final_view = tokio::select! {
        view = follow(&mut views) => view,
        () = shutdown_signal() => {
            controller.shutdown().await;
            return Ok(ExitCode::from(130));
        }
    };

    let code = match final_view {
        Some(View::Result { url }) => {
            let viewer = ResultViewer::new(url);
            if cli.no_download {
                ExitCode::SUCCESS
            } else {
                let dest_dir = cli.download_dir.unwrap_or(config.download_dir);
                let saved = viewer
                    .download(&api, &dest_dir)
                    .await
                    .context("Failed to download the result")?;
                println!("Saved to {}", saved.display());
                ExitCode::SUCCESS
            }
        }
        _ => ExitCode::FAILURE,
    };

    controller.shutdown().await;
    Ok(code)
}

/// Print every view change until the run reaches a terminal screen.
///
/// Returns the terminal view, or `None` if the controller went away.
async fn follow(views: &mut tokio::sync::watch::Receiver<View>) -> Option<View> {
    loop {
        let view = views.borrow_and_update().clone();
        println!("{}\n", render_view(&view));

        match view {
            View::Result { .. } => return Some(view),
            View::Upload { error: Some(_), .. } => return Some(view),
            _ => {}
        }

        if views.changed().await.is_err() {
            return None;
        }
    }
}

/// Wait for Ctrl-C (or SIGTERM on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
