use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use colored::*;
use filemerge_core::{MergeOutcome, OutputTarget, Session};
use std::path::{Path, PathBuf};

use crate::cli_args::MergeArgs;
use crate::clipboard;
use crate::output::{print_status, write_to_file, write_to_stdout};
use crate::{load_config_for_command, open_session};

enum Destination {
    File(PathBuf),
    Stdout,
    Clipboard,
}

pub fn handle_merge_command(args: MergeArgs, quiet: bool) -> Result<()> {
    let (config, root) = load_config_for_command(&args.project_config, &args.filters, quiet)
        .context("Failed to load configuration for merge command")?;
    let mut session = open_session(&config, root)?;
    log::info!("Merging files with extensions: {}", session.extensions());

    apply_selection(&mut session, &args)?;
    log::debug!(
        "{} nodes checked after selection",
        session.selection().checked_count()
    );

    if args.list {
        let files = session.checked_files();
        let root = session.root().unwrap_or(Path::new(""));
        for file in &files {
            println!("{}", relative_display(file, root));
        }
        if !quiet {
            eprintln!("{}", format!("{} files selected", files.len()).dimmed());
        }
        return Ok(());
    }

    let outcome = session.generate()?;
    let destination = match (&args.output, args.stdout, config.output.target) {
        (Some(path), _, _) => Destination::File(path.clone()),
        (None, true, _) => Destination::Stdout,
        (None, false, OutputTarget::Stdout) => Destination::Stdout,
        (None, false, OutputTarget::Clipboard) => Destination::Clipboard,
    };

    match destination {
        Destination::Clipboard => {
            clipboard::copy_text(&outcome.content)?;
            print_status(session.status(), quiet);
        }
        Destination::Stdout => {
            write_to_stdout(&outcome.content)?;
            print_status(&summary(&outcome, "stdout"), quiet);
        }
        Destination::File(path) => {
            write_to_file(&path, &outcome.content)?;
            print_status(&summary(&outcome, &path.display().to_string()), quiet);
        }
    }
    Ok(())
}

/// `--all` first, then the explicit paths, then `--skip`.
fn apply_selection(session: &mut Session, args: &MergeArgs) -> Result<()> {
    if args.all {
        let affected = session.check_all()?;
        log::debug!("--all checked {} nodes", affected);
    }
    for path in &args.select {
        let affected = session
            .check(path, true)
            .with_context(|| format!("Cannot select '{}'", path.display()))?;
        log::debug!("Checked '{}' ({} nodes)", path.display(), affected);
    }
    for path in &args.skip {
        let affected = session
            .check(path, false)
            .with_context(|| format!("Cannot skip '{}'", path.display()))?;
        log::debug!("Unchecked '{}' ({} nodes)", path.display(), affected);
    }
    Ok(())
}

fn summary(outcome: &MergeOutcome, target: &str) -> String {
    let size = Byte::from_u128(outcome.content.len() as u128)
        .unwrap_or_default()
        .get_appropriate_unit(UnitType::Binary);
    format!(
        "Merged {} files ({:.2}) to {}.",
        outcome.file_count(),
        size,
        target
    )
}

fn relative_display(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn summary_mentions_count_and_target() {
        let outcome = MergeOutcome {
            content: "x".repeat(2048),
            files: vec![PathBuf::from("/p/a.cs"), PathBuf::from("/p/b.cs")],
        };
        let text = summary(&outcome, "stdout");
        assert!(text.starts_with("Merged 2 files ("));
        assert!(text.contains("KiB"));
        assert!(text.ends_with("to stdout."));
    }

    #[test]
    fn relative_display_strips_root() {
        let shown = relative_display(Path::new("/p/src/a.cs"), Path::new("/p"));
        assert_eq!(shown, PathBuf::from("src").join("a.cs").display().to_string());
    }
}
