use crate::extensions::ExtensionSet;
use crate::tree::FileSystemEntry;
use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A node was checked or unchecked by the caller.
    Toggled { path: PathBuf, checked: bool },
    /// The change on `path` was pushed down to its descendants.
    Cascaded {
        path: PathBuf,
        checked: bool,
        affected: usize,
    },
    Cleared,
}

type Observer = Box<dyn FnMut(&SelectionEvent)>;

#[derive(Default)]
struct Notifier {
    observer: Option<Observer>,
    muted: usize,
}

impl Notifier {
    fn emit(&mut self, event: SelectionEvent) {
        if self.muted > 0 {
            log::trace!("Suppressed selection event during cascade: {:?}", event);
            return;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    fn mute(&mut self) -> MuteGuard<'_> {
        self.muted += 1;
        MuteGuard { notifier: self }
    }
}

/// Keeps notifications off while alive; `Drop` turns them back on, unwinding included.
struct MuteGuard<'a> {
    notifier: &'a mut Notifier,
}

impl Deref for MuteGuard<'_> {
    type Target = Notifier;

    fn deref(&self) -> &Notifier {
        self.notifier
    }
}

impl DerefMut for MuteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Notifier {
        self.notifier
    }
}

impl Drop for MuteGuard<'_> {
    fn drop(&mut self) {
        self.notifier.muted -= 1;
    }
}

/// Checkbox state over a [`FileSystemEntry`] tree, keyed by node path.
///
/// Setting a node pushes the same value down to every descendant. Ancestors
/// are never recomputed from their children.
#[derive(Default)]
pub struct Selection {
    checked: HashSet<PathBuf>,
    notifier: Notifier,
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("checked", &self.checked)
            .field("has_observer", &self.notifier.observer.is_some())
            .finish()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&SelectionEvent) + 'static,
    {
        self.notifier.observer = Some(Box::new(observer));
    }

    pub fn is_checked(&self, path: &Path) -> bool {
        self.checked.contains(path)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Sets `node` and all of its descendants to `value`.
    /// Returns how many descendants were visited.
    pub fn set_checked(&mut self, node: &FileSystemEntry, value: bool) -> usize {
        apply(&mut self.checked, node.path(), value);
        self.notifier.emit(SelectionEvent::Toggled {
            path: node.path().to_path_buf(),
            checked: value,
        });

        let affected: usize = {
            let mut notifier = self.notifier.mute();
            node.children()
                .iter()
                .map(|child| cascade(&mut self.checked, &mut notifier, child, value))
                .sum()
        };

        if node.is_dir() {
            log::debug!(
                "Cascaded checked={} from {} to {} descendants",
                value,
                node.path().display(),
                affected
            );
            self.notifier.emit(SelectionEvent::Cascaded {
                path: node.path().to_path_buf(),
                checked: value,
                affected,
            });
        }
        affected
    }

    /// Unchecks every node of `tree`.
    pub fn clear_all(&mut self, tree: &FileSystemEntry) {
        {
            let mut notifier = self.notifier.mute();
            cascade(&mut self.checked, &mut notifier, tree, false);
        }
        if !self.checked.is_empty() {
            log::debug!(
                "Dropping {} checked paths not present in the tree",
                self.checked.len()
            );
            self.checked.clear();
        }
        self.notifier.emit(SelectionEvent::Cleared);
    }

    /// Forgets every checked path without walking a tree. Used when the tree is rebuilt.
    pub fn reset(&mut self) {
        self.checked.clear();
    }

    /// Checked file paths in tree order.
    ///
    /// Files are re-tested against `extensions`, so a filter change made after the
    /// tree was built never lets a non-matching file through.
    pub fn collect_checked(
        &self,
        tree: &FileSystemEntry,
        extensions: &ExtensionSet,
    ) -> Vec<PathBuf> {
        tree.files()
            .into_iter()
            .filter(|file| {
                self.checked.contains(&file.path) && extensions.is_allowed(&file.path)
            })
            .map(|file| file.path.clone())
            .collect()
    }
}

fn apply(checked: &mut HashSet<PathBuf>, path: &Path, value: bool) -> bool {
    if value {
        checked.insert(path.to_path_buf())
    } else {
        checked.remove(path)
    }
}

fn cascade(
    checked: &mut HashSet<PathBuf>,
    notifier: &mut Notifier,
    node: &FileSystemEntry,
    value: bool,
) -> usize {
    if apply(checked, node.path(), value) {
        notifier.emit(SelectionEvent::Toggled {
            path: node.path().to_path_buf(),
            checked: value,
        });
    }
    1 + node
        .children()
        .iter()
        .map(|child| cascade(checked, notifier, child, value))
        .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::parse_extensions;
    use crate::tree::{DirectoryNode, FileNode};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn file(path: &str) -> FileSystemEntry {
        let path = PathBuf::from(path);
        FileSystemEntry::File(FileNode {
            name: path.file_name().unwrap().to_string_lossy().into_owned(),
            path,
            included: true,
        })
    }

    fn dir(path: &str, children: Vec<FileSystemEntry>) -> FileSystemEntry {
        let path = PathBuf::from(path);
        FileSystemEntry::Directory(DirectoryNode {
            name: path.file_name().unwrap().to_string_lossy().into_owned(),
            path,
            children,
            annotation: None,
        })
    }

    fn sample() -> FileSystemEntry {
        dir(
            "/p",
            vec![
                dir("/p/src", vec![file("/p/src/a.cs"), file("/p/src/b.cs")]),
                dir("/p/empty", vec![]),
                file("/p/root.cs"),
            ],
        )
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn checking_a_directory_selects_all_files_in_preorder() {
        let tree = sample();
        let exts = parse_extensions("cs").unwrap();
        let mut selection = Selection::new();

        let affected = selection.set_checked(&tree, true);
        assert_eq!(affected, 5);
        assert_eq!(
            selection.collect_checked(&tree, &exts),
            paths(&["/p/src/a.cs", "/p/src/b.cs", "/p/root.cs"])
        );

        selection.clear_all(&tree);
        assert!(selection.collect_checked(&tree, &exts).is_empty());
    }

    #[test]
    fn unchecking_a_child_leaves_ancestors_alone() {
        let tree = sample();
        let exts = parse_extensions("cs").unwrap();
        let mut selection = Selection::new();
        selection.set_checked(&tree, true);

        let a = tree.find(Path::new("/p/src/a.cs")).unwrap();
        assert_eq!(selection.set_checked(a, false), 0);

        assert!(selection.is_checked(Path::new("/p")));
        assert!(selection.is_checked(Path::new("/p/src")));
        assert_eq!(
            selection.collect_checked(&tree, &exts),
            paths(&["/p/src/b.cs", "/p/root.cs"])
        );
    }

    #[test]
    fn clear_all_is_idempotent() {
        let tree = sample();
        let mut selection = Selection::new();
        selection.set_checked(&tree, true);

        selection.clear_all(&tree);
        assert_eq!(selection.checked_count(), 0);
        selection.clear_all(&tree);
        assert_eq!(selection.checked_count(), 0);
    }

    #[test]
    fn collect_rechecks_current_extensions() {
        let tree = sample();
        let mut selection = Selection::new();
        selection.set_checked(&tree, true);

        let narrower = parse_extensions("json").unwrap();
        assert!(selection.collect_checked(&tree, &narrower).is_empty());
    }

    #[test]
    fn cascade_reports_once_instead_of_per_node() {
        let tree = sample();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut selection = Selection::new();
        selection.set_observer(move |event| sink.borrow_mut().push(event.clone()));

        selection.set_checked(&tree, true);
        assert_eq!(
            *events.borrow(),
            vec![
                SelectionEvent::Toggled {
                    path: PathBuf::from("/p"),
                    checked: true
                },
                SelectionEvent::Cascaded {
                    path: PathBuf::from("/p"),
                    checked: true,
                    affected: 5
                },
            ]
        );

        // Notifications are live again once the cascade is over.
        events.borrow_mut().clear();
        let leaf = tree.find(Path::new("/p/root.cs")).unwrap();
        selection.set_checked(leaf, false);
        selection.clear_all(&tree);
        assert_eq!(
            *events.borrow(),
            vec![
                SelectionEvent::Toggled {
                    path: PathBuf::from("/p/root.cs"),
                    checked: false
                },
                SelectionEvent::Cleared,
            ]
        );
    }
}
