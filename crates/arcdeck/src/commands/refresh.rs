//! `arcdeck refresh`: fetch categories and print what each one did.
//!
//! Controllers are refreshed one after another so password prompts
//! never interleave on the terminal.

use serde::Serialize;
use tabled::Tabled;

use arcdeck_core::{Category, Console, ControllerHandle, RefreshReport};

use crate::cli::{GlobalOpts, RefreshArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize, Tabled)]
struct ReportRow {
    #[tabled(rename = "CONTROLLER")]
    controller: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "OK")]
    ok: bool,
    #[tabled(rename = "RESULT")]
    result: String,
    #[tabled(rename = "UPDATED")]
    updated_at: String,
}

fn report_rows(name: &str, report: &RefreshReport) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = report
        .categories
        .iter()
        .map(|c| ReportRow {
            controller: name.to_owned(),
            category: c.category.to_string(),
            ok: c.outcome.is_ok(),
            result: match &c.outcome {
                Ok(snapshot) => snapshot.summary(),
                Err(e) => e.to_string(),
            },
            updated_at: c.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    for sub in &report.registration_types {
        rows.push(ReportRow {
            controller: name.to_owned(),
            category: format!("  {}", sub.resource_type),
            ok: sub.outcome.is_ok(),
            result: match &sub.outcome {
                Ok(count) => format!("{count} instances"),
                Err(e) => e.to_string(),
            },
            updated_at: String::new(),
        });
    }
    rows
}

/// Refresh one controller, forcing a new login first when asked.
pub(super) async fn refresh_one(
    console: &Console,
    handle: &ControllerHandle,
    categories: &[Category],
    reauth: bool,
) -> Result<std::sync::Arc<RefreshReport>, CliError> {
    if reauth {
        console.reauthenticate(handle.id()).await?;
    }
    Ok(console
        .refresh_categories(handle.id(), categories.iter().copied())
        .await?)
}

pub async fn handle(
    console: &Console,
    args: RefreshArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let handles = util::select(console, args.controller.as_deref())?;
    if handles.is_empty() {
        if !global.quiet {
            eprintln!("No controllers to refresh");
        }
        return Ok(());
    }
    let categories = if args.categories.is_empty() {
        Category::ALL.to_vec()
    } else {
        args.categories
    };

    let mut rows = Vec::new();
    let mut failed = 0;
    let mut first_error = None;

    for handle in &handles {
        let name = handle.identity().display_name();
        match refresh_one(console, handle, &categories, args.reauth).await {
            Ok(report) => {
                failed += report.failures().count();
                rows.extend(report_rows(&name, &report));
            }
            // Cancelling one prompt stops the whole run.
            Err(CliError::Cancelled) => return Err(CliError::Cancelled),
            Err(e) => {
                rows.push(ReportRow {
                    controller: name,
                    category: "login".into(),
                    ok: false,
                    result: e.to_string(),
                    updated_at: String::new(),
                });
                first_error.get_or_insert(e);
            }
        }
    }

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &rows,
        |r| ReportRow {
            controller: r.controller.clone(),
            category: r.category.clone(),
            ok: r.ok,
            result: output::paint_outcome(r.ok, &r.result, color),
            updated_at: r.updated_at.clone(),
        },
        |r| format!("{}\t{}\t{}", r.controller, r.category.trim(), r.ok),
    )?;
    output::print_output(&out, global.quiet);

    if let Some(e) = first_error {
        return Err(e);
    }
    if failed > 0 {
        return Err(CliError::RefreshIncomplete { failed });
    }
    Ok(())
}
