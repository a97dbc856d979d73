use anyhow::{Context, Result};
use colored::*;
use filemerge_core::{FileSystemEntry, Selection};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

// --- Public Output Functions ---

/// Renders the tree with box-drawing guides; checked nodes get a `[x]` marker.
pub fn render_tree(tree: &FileSystemEntry, selection: Option<&Selection>) -> String {
    let mut out = String::new();
    out.push_str(&node_text(tree, selection));
    out.push('\n');
    let children = tree.children();
    for (i, child) in children.iter().enumerate() {
        render_branch(child, selection, "", i + 1 == children.len(), &mut out);
    }
    out
}

pub fn print_status(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message.green());
    }
}

pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(data).context("Failed to serialize JSON output")?;
    write_to_stdout(&content)
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file {}", path.display()))?;
    Ok(())
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Asks before replacing an existing file. Quiet mode never overwrites.
pub fn confirm_overwrite(path: &Path, quiet: bool) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    if quiet {
        anyhow::bail!(
            "Target file '{}' exists. Overwrite prevented in quiet mode.",
            path.display()
        );
    }
    print!(
        "{} File already exists at '{}'. Overwrite? [{}/{}] ",
        "⚠️".yellow(),
        path.display().to_string().cyan(),
        "y".green(),
        "N".red()
    );
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .context("Failed to read user input")?;
    if response.trim().eq_ignore_ascii_case("y") {
        Ok(true)
    } else {
        println!("Save cancelled.");
        Ok(false)
    }
}

// --- Internal Helpers ---

fn render_branch(
    entry: &FileSystemEntry,
    selection: Option<&Selection>,
    prefix: &str,
    last: bool,
    out: &mut String,
) {
    let connector = if last { "└── " } else { "├── " };
    out.push_str(&format!(
        "{}{}{}\n",
        prefix.dimmed(),
        connector.dimmed(),
        node_text(entry, selection)
    ));
    let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
    let children = entry.children();
    for (i, child) in children.iter().enumerate() {
        render_branch(child, selection, &child_prefix, i + 1 == children.len(), out);
    }
}

fn node_text(entry: &FileSystemEntry, selection: Option<&Selection>) -> String {
    let marker = match selection {
        Some(sel) if sel.is_checked(entry.path()) => format!("{} ", "[x]".green()),
        Some(_) => format!("{} ", "[ ]".dimmed()),
        None => String::new(),
    };
    let text = match entry {
        FileSystemEntry::Directory(dir) => {
            let name = format!("{}/", dir.name).blue().bold().to_string();
            match &dir.annotation {
                Some(note) => format!("{} {}", name, format!("({})", note).yellow()),
                None => name,
            }
        }
        FileSystemEntry::File(file) => file.name.clone(),
    };
    format!("{}{}", marker, text)
}
