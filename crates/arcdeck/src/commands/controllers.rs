//! Controller list management: add, list, edit, remove.

use tabled::Tabled;

use arcdeck_core::{Console, ControllerIdentity, ControllerUpdate, NewController};

use crate::cli::{AddArgs, EditArgs, GlobalOpts, RemoveArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ControllerRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "NAMESPACE")]
    namespace: String,
    #[tabled(rename = "USER")]
    username: String,
    #[tabled(rename = "REMEMBER")]
    remember: String,
    #[tabled(rename = "ID")]
    id: String,
}

fn row(c: &ControllerIdentity) -> ControllerRow {
    ControllerRow {
        name: c.display_name(),
        url: c.url.to_string(),
        namespace: c.namespace.clone(),
        username: c.username.clone(),
        remember: if c.remember_password { "yes" } else { "no" }.into(),
        id: c.id.to_string(),
    }
}

fn detail(c: &ControllerIdentity) -> String {
    format!(
        "Name:       {}\nURL:        {}\nNamespace:  {}\nUser:       {}\nRemember:   {}\nID:         {}",
        c.display_name(),
        c.url,
        c.namespace,
        c.username,
        c.remember_password,
        c.id
    )
}

fn render_one(identity: &ControllerIdentity, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, identity, detail, |c| c.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn add(console: &Console, args: AddArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let identity = console
        .add_controller(NewController {
            url: args.url,
            namespace: args.namespace,
            username: args.username,
            remember_password: !args.no_remember,
            name: args.name,
        })
        .await?;
    if !global.quiet {
        eprintln!("Controller '{}' added", identity.display_name());
    }
    render_one(&identity, global)
}

pub fn list(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let controllers = console.controllers();
    if controllers.is_empty() && global.output == crate::cli::OutputFormat::Table {
        if !global.quiet {
            eprintln!("No controllers yet. Add one with: arcdeck add <URL> -n <NAMESPACE> -u <USER>");
        }
        return Ok(());
    }
    let out = output::render_list(
        global.output,
        &controllers,
        row,
        |c| c.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn edit(console: &Console, args: EditArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let handle = console.find(&args.controller)?;
    let update = ControllerUpdate {
        name: args.name,
        url: args.url,
        namespace: args.namespace,
        username: args.username,
        remember_password: args.remember,
    };
    let identity = console.update_controller(handle.id(), update).await?;
    if !global.quiet {
        eprintln!("Controller '{}' updated", identity.display_name());
    }
    render_one(&identity, global)
}

pub async fn remove(
    console: &Console,
    args: RemoveArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let handle = console.find(&args.controller)?;
    let name = handle.identity().display_name();
    if !util::confirm(
        &format!("Remove controller '{name}' and its stored passwords?"),
        global.yes,
    )? {
        return Ok(());
    }
    console.remove_controller(handle.id()).await?;
    if !global.quiet {
        eprintln!("Controller '{name}' removed");
    }
    Ok(())
}
