//! `arcdeck tree`: refresh registrations and print the instance tree.

use serde::Serialize;
use tabled::Tabled;

use arcdeck_core::{Category, Console, ResourceNode};

use crate::cli::{GlobalOpts, TreeArgs};
use crate::error::CliError;
use crate::output;

use super::refresh::refresh_one;
use super::util;

#[derive(Debug, Serialize, Tabled)]
struct NodeRow {
    #[tabled(rename = "CONTROLLER")]
    controller: String,
    #[tabled(rename = "TYPE")]
    #[serde(rename = "type")]
    kind: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "SERVER")]
    server: String,
    #[tabled(rename = "USER")]
    default_user: String,
}

fn node_row(controller: &str, node: &ResourceNode) -> NodeRow {
    let model = node.model();
    NodeRow {
        controller: controller.to_owned(),
        kind: model.resource_type().label().to_owned(),
        name: node.name().to_owned(),
        state: output::or_dash(node.state().as_deref()),
        server: node
            .target()
            .map_or_else(|| "-".to_owned(), |t| model.server_string(&t)),
        default_user: model.default_user().to_owned(),
    }
}

pub async fn handle(console: &Console, args: TreeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let handles = util::select(console, args.controller.as_deref())?;

    let mut rows = Vec::new();
    for handle in &handles {
        let report = refresh_one(console, handle, &[Category::Registrations], false).await?;
        if let Some(Err(e)) = report.failures().next().map(|f| &f.outcome) {
            tracing::warn!(controller = %handle.id(), error = %e, "showing last known tree");
        }
        let name = handle.identity().display_name();
        rows.extend(handle.nodes().iter().map(|node| node_row(&name, node)));
    }

    if rows.is_empty() && global.output == crate::cli::OutputFormat::Table {
        if !global.quiet {
            eprintln!("No managed instances");
        }
        return Ok(());
    }

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &rows,
        |r| NodeRow {
            controller: r.controller.clone(),
            kind: r.kind.clone(),
            name: r.name.clone(),
            state: output::paint_state(&r.state, color),
            server: r.server.clone(),
            default_user: r.default_user.clone(),
        },
        |r| format!("{}/{}", r.controller, r.name),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
