use anyhow::{Context, Result};
use colored::*;

use crate::cli_args::TreeArgs;
use crate::output::{print_json, print_status, render_tree, write_to_stdout};
use crate::{load_config_for_command, open_session};

pub fn handle_tree_command(args: TreeArgs, quiet: bool) -> Result<()> {
    let (config, root) = load_config_for_command(&args.project_config, &args.filters, quiet)
        .context("Failed to load configuration for tree command")?;
    let session = open_session(&config, root)?;

    let json = args.format_output.format.as_deref() == Some("json");
    match session.tree() {
        Some(tree) if json => print_json(tree)?,
        Some(tree) => write_to_stdout(&render_tree(tree, None))?,
        None if json => write_to_stdout("null")?,
        None => println!(
            "{}",
            "(Empty tree: the root folder itself is on the ignore list)".yellow()
        ),
    }

    if let Some(tree) = session.tree() {
        let stats = tree.stats();
        log::info!(
            "{} folders, {} files, {} unreadable",
            stats.directories,
            stats.files,
            stats.annotated
        );
    }
    print_status(session.status(), quiet);
    Ok(())
}
