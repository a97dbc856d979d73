use crate::error::{AppError, Result};
use crate::exclusion::ExclusionMatcher;
use crate::extensions::ExtensionSet;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileSystemEntry {
    Directory(DirectoryNode),
    File(FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<FileSystemEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<DirectoryAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub name: String,
    pub path: PathBuf,
    pub included: bool,
}

/// Why a directory's contents are missing from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryAnnotation {
    AccessDenied,
    Error(String),
}

impl fmt::Display for DirectoryAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryAnnotation::AccessDenied => write!(f, "Access Denied"),
            DirectoryAnnotation::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TreeStats {
    pub directories: usize,
    pub files: usize,
    pub annotated: usize,
}

impl DirectoryNode {
    fn new(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            children: Vec::new(),
            annotation: None,
        }
    }

    fn has_files(&self) -> bool {
        self.children.iter().any(|child| match child {
            FileSystemEntry::File(_) => true,
            FileSystemEntry::Directory(dir) => dir.has_files(),
        })
    }

    fn prune_empty(&mut self) {
        for child in self.children.iter_mut() {
            if let FileSystemEntry::Directory(dir) = child {
                dir.prune_empty();
            }
        }
        self.children.retain(|child| match child {
            FileSystemEntry::File(_) => true,
            FileSystemEntry::Directory(dir) => dir.annotation.is_some() || dir.has_files(),
        });
    }
}

impl FileSystemEntry {
    pub fn name(&self) -> &str {
        match self {
            FileSystemEntry::Directory(dir) => &dir.name,
            FileSystemEntry::File(file) => &file.name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileSystemEntry::Directory(dir) => &dir.path,
            FileSystemEntry::File(file) => &file.path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileSystemEntry::Directory(_))
    }

    pub fn children(&self) -> &[FileSystemEntry] {
        match self {
            FileSystemEntry::Directory(dir) => &dir.children,
            FileSystemEntry::File(_) => &[],
        }
    }

    /// Display text for the node, including any annotation: `logs (Access Denied)`.
    pub fn label(&self) -> String {
        match self {
            FileSystemEntry::Directory(DirectoryNode {
                name,
                annotation: Some(note),
                ..
            }) => format!("{} ({})", name, note),
            _ => self.name().to_string(),
        }
    }

    /// Pre-order search by full path.
    pub fn find(&self, path: &Path) -> Option<&FileSystemEntry> {
        if self.path() == path {
            return Some(self);
        }
        if !path.starts_with(self.path()) {
            return None;
        }
        self.children().iter().find_map(|child| child.find(path))
    }

    /// Every file node below (and including) this entry, in pre-order.
    pub fn files(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a FileNode>) {
        match self {
            FileSystemEntry::File(file) => out.push(file),
            FileSystemEntry::Directory(dir) => {
                for child in &dir.children {
                    child.collect_files(out);
                }
            }
        }
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.accumulate(&mut stats);
        stats
    }

    fn accumulate(&self, stats: &mut TreeStats) {
        match self {
            FileSystemEntry::File(_) => stats.files += 1,
            FileSystemEntry::Directory(dir) => {
                stats.directories += 1;
                if dir.annotation.is_some() {
                    stats.annotated += 1;
                }
                for child in &dir.children {
                    child.accumulate(stats);
                }
            }
        }
    }
}

/// Builds the filtered directory tree for one root.
///
/// Excluded directories are dropped with their whole subtree, files whose
/// extension is not in the set are left out. Directories come before files
/// inside each level, both sorted by name.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'a> {
    exclusions: &'a ExclusionMatcher,
    extensions: &'a ExtensionSet,
    hide_empty_directories: bool,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(exclusions: &'a ExclusionMatcher, extensions: &'a ExtensionSet) -> Self {
        Self {
            exclusions,
            extensions,
            hide_empty_directories: false,
        }
    }

    pub fn hide_empty_directories(mut self, hide: bool) -> Self {
        self.hide_empty_directories = hide;
        self
    }

    /// Returns `Ok(None)` when the root's own name is excluded.
    pub fn build(&self, root: &Path) -> Result<Option<FileSystemEntry>> {
        log::debug!("Building tree for root: {}", root.display());
        let metadata = fs::metadata(root).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::RootNotFound {
                path: root.to_path_buf(),
            },
            _ => AppError::RootInaccessible {
                path: root.to_path_buf(),
                source: e,
            },
        })?;
        if !metadata.is_dir() {
            return Err(AppError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        let root_name = entry_name(root);
        if self.exclusions.is_excluded(&root_name) {
            log::info!(
                "Root folder '{}' is on the exclusion list; tree is empty",
                root_name
            );
            return Ok(None);
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by(dirs_first_by_name)
            .into_iter()
            .filter_entry(|entry| self.keep(entry));

        let mut stack: Vec<DirectoryNode> = Vec::new();
        for item in walker {
            match item {
                Ok(entry) => {
                    let depth = entry.depth();
                    close_until(&mut stack, depth);
                    let name = if depth == 0 {
                        root_name.clone()
                    } else {
                        entry.file_name().to_string_lossy().into_owned()
                    };
                    let path = entry.path().to_path_buf();
                    if entry.file_type().is_dir() {
                        log::trace!("Entering directory: {}", path.display());
                        stack.push(DirectoryNode::new(name, path));
                    } else if let Some(parent) = stack.last_mut() {
                        log::trace!("Adding file: {}", path.display());
                        parent.children.push(FileSystemEntry::File(FileNode {
                            name,
                            path,
                            included: true,
                        }));
                    }
                }
                Err(err) => self.record_error(&mut stack, err)?,
            }
        }

        close_until(&mut stack, 1);
        let Some(mut root_node) = stack.pop() else {
            return Err(AppError::RootNotFound {
                path: root.to_path_buf(),
            });
        };
        if self.hide_empty_directories {
            root_node.prune_empty();
        }
        let tree = FileSystemEntry::Directory(root_node);
        let stats = tree.stats();
        log::info!(
            "Tree built: {} directories, {} files, {} unreadable",
            stats.directories,
            stats.files,
            stats.annotated
        );
        Ok(Some(tree))
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let file_type = entry.file_type();
        if file_type.is_dir() {
            !self
                .exclusions
                .is_excluded(&entry.file_name().to_string_lossy())
        } else if file_type.is_file() {
            self.extensions.is_allowed(entry.path())
        } else {
            false
        }
    }

    /// Directory read failures annotate the directory and the walk moves on.
    /// Only a failure to read the root itself aborts the build.
    fn record_error(&self, stack: &mut Vec<DirectoryNode>, err: walkdir::Error) -> Result<()> {
        let annotation = annotation_for(
            err.io_error().map(|e| e.kind()),
            err.io_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| err.to_string()),
        );
        match place_error(stack, err.path(), err.depth(), annotation) {
            ErrorPlacement::Root => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                Err(AppError::RootInaccessible { path, source })
            }
            ErrorPlacement::Annotated | ErrorPlacement::Skipped => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorPlacement {
    Root,
    Annotated,
    Skipped,
}

fn annotation_for(kind: Option<ErrorKind>, message: String) -> DirectoryAnnotation {
    match kind {
        Some(ErrorKind::PermissionDenied) => DirectoryAnnotation::AccessDenied,
        _ => DirectoryAnnotation::Error(message),
    }
}

/// Decides where a walk error lands on the open-directory stack.
///
/// An error carrying the path of the directory on top of the stack means its
/// listing failed: that directory is annotated (or, for the root, the build
/// fails). A path-less error happened mid-listing and annotates the directory
/// being listed. Anything else concerns a single entry, which is dropped.
fn place_error(
    stack: &mut Vec<DirectoryNode>,
    path: Option<&Path>,
    depth: usize,
    annotation: DirectoryAnnotation,
) -> ErrorPlacement {
    let failed_dir = match (path, stack.last()) {
        (Some(path), Some(top)) => top.path == path,
        _ => false,
    };
    if failed_dir && stack.len() == 1 {
        return ErrorPlacement::Root;
    }
    if failed_dir {
        if let Some(top) = stack.last_mut() {
            log::warn!("Cannot read directory {}: {}", top.path.display(), annotation);
            top.annotation = Some(annotation);
        }
        return ErrorPlacement::Annotated;
    }

    close_until(stack, depth);
    match path {
        Some(path) => {
            log::warn!("Skipping {}: {}", path.display(), annotation);
            ErrorPlacement::Skipped
        }
        None => match stack.last_mut() {
            Some(top) => {
                log::warn!(
                    "Error while listing {}: {}",
                    top.path.display(),
                    annotation
                );
                top.annotation.get_or_insert(annotation);
                ErrorPlacement::Annotated
            }
            None => ErrorPlacement::Skipped,
        },
    }
}

/// Convenience wrapper over [`TreeBuilder`] with default options.
pub fn build_tree(
    root: &Path,
    exclusions: &ExclusionMatcher,
    extensions: &ExtensionSet,
) -> Result<Option<FileSystemEntry>> {
    TreeBuilder::new(exclusions, extensions).build(root)
}

fn dirs_first_by_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Pops finished directories until the stack holds `depth` entries, keeping the root.
fn close_until(stack: &mut Vec<DirectoryNode>, depth: usize) {
    while stack.len() > depth.max(1) {
        if let Some(done) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(FileSystemEntry::Directory(done));
            }
        }
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
