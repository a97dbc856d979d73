use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

pub const DEFAULT_EXTENSIONS: &[&str] = &[".cs", ".json", ".ts", ".tsx"];

const TOKEN_SEPARATORS: &[char] = &[',', ';', ' '];
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '*', '?'];

/// Normalized file extensions (dot-prefixed, lower-case) in the order they were given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ExtensionSet {
    ordered: Vec<String>,
    lookup: HashSet<String>,
}

impl ExtensionSet {
    pub fn empty() -> Self {
        Self {
            ordered: Vec::new(),
            lookup: HashSet::new(),
        }
    }

    fn from_normalized(tokens: Vec<String>) -> Self {
        let mut set = Self::empty();
        for token in tokens {
            if set.lookup.insert(token.clone()) {
                set.ordered.push(token);
            }
        }
        set
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// True when the file's extension (with its dot) is in the set.
    /// Files without an extension never match.
    pub fn is_allowed(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.lookup.contains(&ext))
    }

    /// Replaces the set with the parsed `raw` spec. The current set is kept when parsing fails.
    pub fn update_from(&mut self, raw: &str) -> Result<()> {
        match parse_extensions(raw) {
            Ok(parsed) => {
                log::debug!("Extensions updated: {}", parsed);
                *self = parsed;
                Ok(())
            }
            Err(e) => {
                log::warn!("Keeping previous extensions ({}): {}", self, e);
                Err(e)
            }
        }
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::from_normalized(DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ordered.join(", "))
    }
}

impl TryFrom<Vec<String>> for ExtensionSet {
    type Error = AppError;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        parse_extensions(&tokens.join(","))
    }
}

impl From<ExtensionSet> for Vec<String> {
    fn from(set: ExtensionSet) -> Self {
        set.ordered
    }
}

/// Parses a comma, semicolon or space separated extension list.
///
/// Lower-cased extension of the file name, dot included: everything from the last
/// `.` on. A dot-only name such as `.ts` is its own extension; a trailing dot is none.
fn extension_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let dot = name.rfind('.')?;
    if dot + 1 == name.len() {
        return None;
    }
    Some(name[dot..].to_lowercase())
}

/// `".cs, .json,ts"` yields `[".cs", ".json", ".ts"]`.
pub fn parse_extensions(raw: &str) -> Result<ExtensionSet> {
    let mut tokens = Vec::new();
    for token in raw.split(TOKEN_SEPARATORS) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        tokens.push(normalize_token(token)?);
    }
    log::trace!("Parsed extension spec '{}' into {:?}", raw, tokens);
    Ok(ExtensionSet::from_normalized(tokens))
}

fn normalize_token(token: &str) -> Result<String> {
    if token.contains(FORBIDDEN_CHARS) {
        return Err(AppError::ExtensionParse(format!(
            "'{}' is not a file extension",
            token
        )));
    }
    let dotted = if token.starts_with('.') {
        token.to_string()
    } else {
        format!(".{}", token)
    };
    if dotted.len() == 1 {
        return Err(AppError::ExtensionParse(
            "a bare '.' is not a file extension".to_string(),
        ));
    }
    Ok(dotted.to_lowercase())
}
