//! Application startup
//!
//! Parses arguments, merges the configuration file, installs logging and runs a
//! single scan session under the shutdown coordinator. The outcome is printed as
//! text or JSON and mapped to the process exit code.

use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use serde_json::json;
use tokio::sync::broadcast;

use super::cli::{Args, LookupProvider, ScanConfig};
use super::overlay::run_overlay;
use crate::camera::{CameraStreamManager, FakeCameraBackend};
use crate::core::error_handling::{headline, log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::styles::{palette_to_clap, StyleRole};
use crate::decoder::{DecodeEngineAdapter, FixtureDecoder, StillImage};
use crate::lookup::{
    CachedLookup, CosmosLookup, LookupResult, ProductLookup, SimulatedLookup,
    DEFAULT_LOOKUP_DELAY,
};
use crate::notifications::api::get_notification_service_arc;
use crate::session::{ScanMode, ScanSession, ScanSessionController, SessionOutcome};
use crate::sink::{DraftItemWorkflow, ForwardingSink, ItemDraft};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CANCELLED: i32 = 130;

/// Run the binary and return its exit code
pub async fn startup() -> i32 {
    let terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());
    let mut args = parse_args(terminal);

    if let Err(e) = args.merge_config_file().await {
        eprintln!("{}", e);
        return EXIT_USAGE;
    }

    let use_color = args.color_choice().unwrap_or(terminal);
    colored::control::set_override(use_color);

    let log_format = match args.log_format_choice() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_USAGE;
        }
    };
    let log_file = args.log_file_path().map(|p| p.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        args.log_level.as_deref(),
        log_format,
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("{}", e);
        return EXIT_USAGE;
    }

    log::debug!("listscan {} starting", crate::core::version::long_version());

    let config = match args.resolve().await {
        Ok(config) => config,
        Err(e) => {
            log_error_with_context(&e, "Invalid options");
            return EXIT_USAGE;
        }
    };
    log::debug!("Resolved configuration: {:?}", config);

    ShutdownCoordinator::guard_with_coordinator(|_coordinator, shutdown_rx| {
        run_scan(config, shutdown_rx, use_color)
    })
    .await
}

fn parse_args(color: bool) -> Args {
    let matches = Args::command().styles(palette_to_clap(color)).get_matches();
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

async fn run_scan(
    config: ScanConfig,
    mut shutdown_rx: broadcast::Receiver<()>,
    use_color: bool,
) -> i32 {
    let still_image = match read_still_image(&config).await {
        Ok(image) => image,
        Err(message) => {
            log::error!("FATAL: {}", message);
            return EXIT_USAGE;
        }
    };
    let lookup = match build_lookup(&config) {
        Ok(lookup) => lookup,
        Err(e) => {
            log_error_with_context(&e, "Could not set up the product lookup");
            return EXIT_USAGE;
        }
    };

    let notifications = get_notification_service_arc();
    let backend = FakeCameraBackend::new()
        .with_frames(config.frames.clone())
        .with_frame_interval(config.frame_interval);
    let camera = Arc::new(CameraStreamManager::new(Arc::new(backend)));
    let decoder = Arc::new(DecodeEngineAdapter::new(
        Arc::new(FixtureDecoder::new()),
        config.symbologies.clone(),
    ));
    let (workflow, mut drafts) = DraftItemWorkflow::new(lookup);
    let sink = Arc::new(ForwardingSink::new(Arc::new(workflow)));
    let controller = ScanSessionController::new(camera, decoder, sink, notifications.clone())
        .with_constraints(config.constraints.clone());

    let (overlay_stop, overlay_rx) = broadcast::channel(1);
    let overlay = tokio::spawn(run_overlay(notifications, overlay_rx));

    let session = match controller
        .start_session(config.mode, config.options.clone())
        .await
    {
        Ok(session) => session,
        Err(e) => {
            stop_overlay(&overlay_stop);
            log_error_with_context(&e, "Could not start the scan session");
            return EXIT_USAGE;
        }
    };
    log::info!("Session {} started in {} mode", session.id(), session.mode());

    if let Some(image) = still_image {
        if let Err(e) = session.submit_image(image) {
            log::warn!("Image not submitted: {}", e);
        }
    }

    let outcome = tokio::select! {
        outcome = session.wait() => outcome,
        _ = shutdown_rx.recv() => session.cancel_and_wait().await,
    };
    controller.shutdown().await;

    stop_overlay(&overlay_stop);
    match overlay.await {
        Ok(Err(e)) => log::debug!("Scan overlay unavailable: {}", e),
        Err(e) => log::debug!("Scan overlay task failed: {}", e),
        Ok(Ok(())) => {}
    }

    // Drafting runs behind the session; only a successful scan produces a draft
    let draft = match &outcome {
        SessionOutcome::Succeeded(_) if config.lookup != LookupProvider::None => {
            tokio::select! {
                draft = drafts.recv() => draft,
                _ = shutdown_rx.recv() => None,
            }
        }
        _ => None,
    };
    if config.json {
        let document = outcome_json(&session.snapshot(), &outcome, draft.as_ref());
        match serde_json::to_string_pretty(&document) {
            Ok(text) => println!("{}", text),
            Err(e) => log::error!("Could not serialize the outcome: {}", e),
        }
    } else {
        match &outcome {
            SessionOutcome::Succeeded(_) => {
                println!("{}", render_outcome(&outcome, draft.as_ref(), use_color))
            }
            _ => eprintln!("{}", render_outcome(&outcome, draft.as_ref(), use_color)),
        }
    }

    exit_code(&outcome)
}

fn stop_overlay(overlay_stop: &broadcast::Sender<()>) {
    if overlay_stop.send(()).is_err() {
        log::trace!("Scan overlay already stopped");
    }
}

async fn read_still_image(config: &ScanConfig) -> Result<Option<StillImage>, String> {
    if config.mode != ScanMode::StillImage {
        return Ok(None);
    }
    // Without an image the session could only end on its timeout or Ctrl-C
    let Some(path) = &config.image else {
        return Err("Still-image mode needs --image <FILE>".to_string());
    };
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Error reading image {}: {}", path.display(), e))?;
    let media_type = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => Some("image/png"),
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            Some("image/jpeg")
        }
        _ => None,
    };
    let image = StillImage::new(bytes);
    Ok(Some(match media_type {
        Some(media_type) => image.with_media_type(media_type),
        None => image,
    }))
}

fn build_lookup(config: &ScanConfig) -> LookupResult<Option<Arc<dyn ProductLookup>>> {
    let lookup: Arc<dyn ProductLookup> = match config.lookup {
        LookupProvider::None => return Ok(None),
        LookupProvider::Simulated => Arc::new(SimulatedLookup::new(
            DEFAULT_LOOKUP_DELAY,
            config.options.simulation.seed,
        )),
        LookupProvider::Cosmos => {
            let token = config.cosmos_token.clone().unwrap_or_default();
            let cosmos = CosmosLookup::new(config.cosmos_url.clone(), token)?;
            Arc::new(CachedLookup::new(cosmos))
        }
    };
    log::debug!("Using {} product lookup", lookup.name());
    Ok(Some(lookup))
}

/// Process exit code for a session outcome
pub fn exit_code(outcome: &SessionOutcome) -> i32 {
    match outcome {
        SessionOutcome::Succeeded(_) => EXIT_SUCCESS,
        SessionOutcome::Failed(_) => EXIT_FAILURE,
        SessionOutcome::Cancelled => EXIT_CANCELLED,
    }
}

/// Terminal text for an outcome and the drafted item
pub fn render_outcome(outcome: &SessionOutcome, draft: Option<&ItemDraft>, color: bool) -> String {
    match outcome {
        SessionOutcome::Succeeded(result) => {
            let mut lines = vec![format!(
                "{} {} ({})",
                StyleRole::Success.paint("Scanned", color),
                StyleRole::Code.paint(&result.code, color),
                result.format
            )];
            if let Some(draft) = draft {
                let mut fields = vec![
                    ("Name", draft.name.clone()),
                    ("Category", draft.category.to_string()),
                    ("Quantity", draft.quantity.to_string()),
                ];
                if let Some(price) = draft.price {
                    fields.push(("Price", format!("{:.2}", price)));
                }
                for (key, value) in fields {
                    lines.push(format!(
                        "  {:<9} {}",
                        StyleRole::Key.paint(&format!("{}:", key), color),
                        StyleRole::Value.paint(&value, color)
                    ));
                }
            }
            lines.join("\n")
        }
        SessionOutcome::Failed(failure) => {
            let mut text = StyleRole::Error.paint(&format!("Scan failed: {}", failure), color);
            if failure.is_user_actionable() {
                text.push_str(&format!("\n  {}", headline(failure, failure.kind())));
            }
            text
        }
        SessionOutcome::Cancelled => StyleRole::Cancelled.paint("Scan cancelled", color),
    }
}

/// JSON document printed by `--json`
pub fn outcome_json(
    session: &ScanSession,
    outcome: &SessionOutcome,
    draft: Option<&ItemDraft>,
) -> serde_json::Value {
    json!({
        "session": session,
        "state": outcome.state(),
        "result": outcome.result(),
        "error": outcome.failure().map(|failure| json!({
            "kind": failure.kind(),
            "message": failure.to_string(),
        })),
        "draft": draft,
    })
}
