//! `arcdeck watch`: refresh periodically and stream change events until Ctrl-C.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;

use arcdeck_core::{Category, Console, ConsoleEvent, ControllerId};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::refresh::refresh_one;
use super::util;

const DEFAULT_WATCH_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct EventLine {
    timestamp: String,
    controller: String,
    kind: &'static str,
    ok: bool,
    detail: String,
}

fn event_line(event: &ConsoleEvent, names: &HashMap<ControllerId, String>) -> EventLine {
    let controller = names
        .get(&event.controller())
        .cloned()
        .unwrap_or_else(|| event.controller().to_string());
    match event {
        ConsoleEvent::CategoryUpdated {
            category,
            outcome,
            timestamp,
            ..
        } => EventLine {
            timestamp: timestamp.format("%H:%M:%S").to_string(),
            controller,
            kind: match category {
                Category::Config => "config",
                Category::Endpoints => "endpoints",
                Category::Registrations => "registrations",
            },
            ok: outcome.is_ok(),
            detail: match outcome {
                Ok(snapshot) => snapshot.summary(),
                Err(e) => e.to_string(),
            },
        },
        ConsoleEvent::TreeChanged {
            nodes,
            added,
            removed,
            updated,
            timestamp,
            ..
        } => {
            let mut detail = format!(
                "{} instances (+{} -{} ~{})",
                nodes.len(),
                added.len(),
                removed.len(),
                updated.len()
            );
            for (sign, keys) in [("+", added), ("-", removed)] {
                for key in keys {
                    detail.push_str(&format!("\n    {sign} {key}"));
                }
            }
            EventLine {
                timestamp: timestamp.format("%H:%M:%S").to_string(),
                controller,
                kind: "tree",
                ok: true,
                detail,
            }
        }
    }
}

fn render_line(line: &EventLine, format: OutputFormat, color: bool) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(line)?,
        OutputFormat::Table | OutputFormat::Plain => format!(
            "[{}] {:<16} {:<14} {}",
            line.timestamp,
            line.controller,
            line.kind,
            output::paint_outcome(line.ok, &line.detail, color)
        ),
    })
}

pub async fn handle(console: &Console, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let handles = util::select(console, args.controller.as_deref())?;
    if handles.is_empty() {
        if !global.quiet {
            eprintln!("No controllers to watch");
        }
        return Ok(());
    }

    let secs = args
        .interval
        .unwrap_or_else(|| console.settings().refresh_interval.as_secs());
    let interval = Duration::from_secs(if secs == 0 { DEFAULT_WATCH_SECS } else { secs });
    let names: HashMap<ControllerId, String> = handles
        .iter()
        .map(|h| (h.id(), h.identity().display_name()))
        .collect();
    let color = output::should_color(global.color);
    let cancel = CancellationToken::new();

    // Subscribe before the first refresh so its events are printed too.
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<ConsoleEvent>>();
    for handle in &handles {
        let mut events = handle.subscribe();
        let tx = tx.clone();
        let cancel = cancel.clone();
        let id = handle.id();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(controller = %id, skipped, "event stream lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
    }
    drop(tx);

    // Logins (and any prompts) happen here, one controller at a time.
    for handle in &handles {
        if let Err(e) = refresh_one(console, handle, &Category::ALL, false).await {
            cancel.cancel();
            return Err(e);
        }
    }

    // Watching everything: let the console drive the ticks. A single
    // controller is refreshed from this loop instead.
    let auto = if args.controller.is_none() {
        console.spawn_auto_refresh(interval, cancel.clone())
    } else {
        None
    };
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    if !global.quiet {
        eprintln!("Watching {} controller(s) every {}s; Ctrl-C to stop", handles.len(), interval.as_secs());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = rx.recv() => {
                let line = render_line(&event_line(&event, &names), global.output, color)?;
                output::print_output(&line, global.quiet);
            }
            _ = ticker.tick(), if auto.is_none() => {
                for handle in &handles {
                    match refresh_one(console, handle, &Category::ALL, false).await {
                        Ok(_) => {}
                        Err(CliError::Cancelled) => tracing::debug!("refresh cancelled"),
                        Err(e) => tracing::warn!(controller = %handle.id(), error = %e, "refresh failed"),
                    }
                }
            }
        }
    }

    cancel.cancel();
    if let Some(task) = auto {
        let _ = task.await;
    }
    Ok(())
}
