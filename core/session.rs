use crate::config::Config;
use crate::error::{AppError, Result};
use crate::exclusion::ExclusionMatcher;
use crate::extensions::ExtensionSet;
use crate::merge::MergeEngine;
use crate::selection::Selection;
use crate::tree::{FileSystemEntry, TreeBuilder};
use std::path::{Path, PathBuf};

pub const NO_SELECTION_MESSAGE: &str = "Please select at least one file to merge.";

/// Result of merging the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: String,
    pub files: Vec<PathBuf>,
}

impl MergeOutcome {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Everything the interactive shell works against: the current root, filters,
/// tree and checkbox state, plus the last status line.
///
/// The tree is rebuilt wholesale on [`Session::load`], [`Session::refresh`] and
/// [`Session::set_ignored_folders`]; each rebuild starts with nothing checked.
#[derive(Debug)]
pub struct Session {
    root: Option<PathBuf>,
    extensions: ExtensionSet,
    exclusions: ExclusionMatcher,
    hide_empty_directories: bool,
    engine: MergeEngine,
    tree: Option<FileSystemEntry>,
    selection: Selection,
    status: String,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            root: None,
            extensions: config.filters.extensions.clone(),
            exclusions: config.exclusion_matcher()?,
            hide_empty_directories: config.filters.hide_empty_directories,
            engine: config.merge_engine()?,
            tree: None,
            selection: Selection::new(),
            status: String::new(),
        })
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn tree(&self) -> Option<&FileSystemEntry> {
        self.tree.as_ref()
    }

    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn ignored_folders(&self) -> Vec<String> {
        self.exclusions.ignored_folders()
    }

    /// Points the session at `root` and builds its tree.
    ///
    /// On failure the tree is left empty and the error is returned.
    pub fn load(&mut self, root: impl Into<PathBuf>) -> Result<()> {
        self.root = Some(root.into());
        self.rebuild()
    }

    /// Applies a new extension spec and rebuilds. A spec that fails to parse is
    /// reported through the status line and the previous extensions stay active.
    pub fn refresh(&mut self, raw_extensions: Option<&str>) -> Result<()> {
        let mut parse_error = None;
        if let Some(raw) = raw_extensions {
            if let Err(e) = self.extensions.update_from(raw) {
                parse_error = Some(e.to_string());
            }
        }
        if self.root.is_some() {
            self.rebuild()?;
        }
        if let Some(msg) = parse_error {
            self.status = msg;
        }
        Ok(())
    }

    /// Replaces the ignored folder list and rebuilds the tree if one is loaded.
    pub fn set_ignored_folders<I, S>(&mut self, folders: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.set_ignored_folders(folders)?;
        if self.root.is_some() {
            self.rebuild()?;
        }
        Ok(())
    }

    fn rebuild(&mut self) -> Result<()> {
        self.tree = None;
        self.selection.reset();
        let Some(root) = self.root.as_deref() else {
            return Err(AppError::InvalidArgument("No folder selected.".to_string()));
        };
        self.status = "Loading file tree...".to_string();

        let built = TreeBuilder::new(&self.exclusions, &self.extensions)
            .hide_empty_directories(self.hide_empty_directories)
            .build(root);
        match built {
            Ok(tree) => {
                self.tree = tree;
                self.status = format!(
                    "Ready - Extensions: {} | {} folders ignored",
                    self.extensions,
                    self.exclusions.len()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("Error loading directory: {}", e);
                self.status = "Error loading file tree".to_string();
                Err(e)
            }
        }
    }

    /// Resolves `path` (absolute, or relative to the root) to a node of the current tree.
    pub fn resolve(&self, path: &Path) -> Option<&FileSystemEntry> {
        find_node(self.tree.as_ref()?, self.root.as_deref(), path)
    }

    /// Checks or unchecks the node at `path` and everything below it.
    pub fn check(&mut self, path: &Path, value: bool) -> Result<usize> {
        let tree = self.tree.as_ref().ok_or_else(|| {
            AppError::InvalidArgument("No file tree is loaded.".to_string())
        })?;
        let node = find_node(tree, self.root.as_deref(), path).ok_or_else(|| {
            AppError::InvalidArgument(format!(
                "'{}' is not part of the loaded tree (excluded, filtered out, or missing)",
                path.display()
            ))
        })?;
        Ok(self.selection.set_checked(node, value))
    }

    pub fn check_all(&mut self) -> Result<usize> {
        let tree = self.tree.as_ref().ok_or_else(|| {
            AppError::InvalidArgument("No file tree is loaded.".to_string())
        })?;
        Ok(self.selection.set_checked(tree, true))
    }

    pub fn clear_all(&mut self) {
        if let Some(tree) = self.tree.as_ref() {
            self.selection.clear_all(tree);
        } else {
            self.selection.reset();
        }
        self.status = "All selections cleared".to_string();
    }

    pub fn checked_files(&self) -> Vec<PathBuf> {
        match self.tree.as_ref() {
            Some(tree) => self.selection.collect_checked(tree, &self.extensions),
            None => Vec::new(),
        }
    }

    /// Merges the checked files in tree order.
    pub fn generate(&mut self) -> Result<MergeOutcome> {
        let files = self.checked_files();
        if files.is_empty() {
            return Err(AppError::InvalidArgument(NO_SELECTION_MESSAGE.to_string()));
        }
        match self.engine.merge(&files) {
            Ok(content) => {
                self.status = format!("Successfully merged {} files to clipboard.", files.len());
                Ok(MergeOutcome { content, files })
            }
            Err(e) => {
                self.status = "Failed to merge files.".to_string();
                Err(e)
            }
        }
    }
}

fn find_node<'t>(
    tree: &'t FileSystemEntry,
    root: Option<&Path>,
    path: &Path,
) -> Option<&'t FileSystemEntry> {
    let absolute = match root {
        Some(root) if !path.is_absolute() => root.join(path),
        _ => path.to_path_buf(),
    };
    tree.find(&normalize(&absolute))
}

/// Lexically removes `.` and `..` components so user-typed paths line up with tree paths.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
