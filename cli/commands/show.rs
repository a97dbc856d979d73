use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;

use crate::cli_args::{ShowArgs, ShowItem};
use crate::load_config_for_command;
use crate::output::print_json;

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    item: &'a str,
    values: &'a [String],
}

pub fn handle_show_command(args: ShowArgs, quiet: bool) -> Result<()> {
    let (config, _root) = load_config_for_command(&args.project_config, &args.filters, quiet)
        .context("Failed to load configuration for show command")?;

    let (item, values) = match args.item {
        ShowItem::Ignored {} => ("ignored", config.filters.ignored_folders.clone()),
        ShowItem::Extensions {} => ("extensions", config.filters.extensions.as_slice().to_vec()),
    };

    if args.format_output.format.as_deref() == Some("json") {
        return print_json(&ListOutput {
            item,
            values: &values,
        });
    }

    if values.is_empty() {
        println!("{}", "(None)".dimmed());
        return Ok(());
    }
    for value in &values {
        println!("{}", value);
    }
    if !quiet {
        eprintln!("{}", format!("{} {} configured", values.len(), item).dimmed());
    }
    Ok(())
}
