use crate::error::{AppError, Result};
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const DEFAULT_COPYRIGHT_HOLDER: &str = "Sports Interactive Ltd.";
pub const DEFAULT_SEPARATOR: &str = "// ----------------------";
pub const FILE_HEADER_PREFIX: &str = "// File: ";

const RULE_LINE: &str = "// --------------------------------------------------------------------------";

/// Removes the three-line copyright banner that heads source files:
///
/// ```text
/// // --------------------------------------------------------------------------
/// // (c) Sports Interactive Ltd.
/// // --------------------------------------------------------------------------
/// ```
#[derive(Debug, Clone)]
pub struct CopyrightStripper {
    pattern: Regex,
}

impl CopyrightStripper {
    pub fn new(holder: &str) -> Result<Self> {
        let rule = regex::escape(RULE_LINE);
        let owner = regex::escape(&format!("// (c) {}", holder));
        let pattern = Regex::new(&format!(r"{rule}\r?\n{owner}\r?\n{rule}(?:\r?\n)?"))?;
        Ok(Self { pattern })
    }

    /// Strips the first banner found; content without one is returned untouched.
    pub fn strip<'a>(&self, content: &'a str) -> Cow<'a, str> {
        self.pattern.replacen(content, 1, "")
    }
}

/// Concatenates files into one text blob, each preceded by a `// File:` header
/// and followed by a separator line.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    stripper: Option<CopyrightStripper>,
    separator: String,
}

impl MergeEngine {
    pub fn new(stripper: Option<CopyrightStripper>, separator: impl Into<String>) -> Self {
        Self {
            stripper,
            separator: separator.into(),
        }
    }

    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(
            Some(CopyrightStripper::new(DEFAULT_COPYRIGHT_HOLDER)?),
            DEFAULT_SEPARATOR,
        ))
    }

    /// Reads and joins `paths` in the given order. Any unreadable file fails the whole merge.
    pub fn merge<P: AsRef<Path>>(&self, paths: &[P]) -> Result<String> {
        log::info!("Merging {} files...", paths.len());
        let mut output = String::new();
        for path in paths {
            let path = path.as_ref();
            let content = read_source(path)?;
            let cleaned = match &self.stripper {
                Some(stripper) => stripper.strip(&content),
                None => Cow::Borrowed(content.as_str()),
            };
            if cleaned.len() != content.len() {
                log::trace!("Stripped copyright banner from {}", path.display());
            }
            // Writing to a String cannot fail.
            let _ = write!(
                output,
                "{}{}\n{}\n\n{}\n\n",
                FILE_HEADER_PREFIX,
                path.display(),
                cleaned,
                self.separator
            );
        }
        log::debug!("Merged output is {} bytes", output.len());
        Ok(output)
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads a source file as text. A leading UTF-8 BOM is dropped and bytes that
/// are not valid UTF-8 become U+FFFD; only I/O failures are errors.
fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| {
        log::error!("Failed to read {}: {}", path.display(), e);
        AppError::FileRead {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);
    let text = String::from_utf8_lossy(body);
    if let Cow::Owned(_) = text {
        log::warn!(
            "{} is not valid UTF-8; invalid bytes were replaced",
            path.display()
        );
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn banner(newline: &str) -> String {
        format!(
            "{RULE_LINE}{newline}// (c) Sports Interactive Ltd.{newline}{RULE_LINE}{newline}"
        )
    }

    #[rstest]
    #[case("\n")]
    #[case("\r\n")]
    fn strips_banner_with_either_line_ending(#[case] newline: &str) {
        let stripper = CopyrightStripper::new(DEFAULT_COPYRIGHT_HOLDER).unwrap();
        let input = format!("{}int x;{newline}", banner(newline));
        assert_eq!(stripper.strip(&input), format!("int x;{newline}"));
    }

    #[test]
    fn strips_banner_without_trailing_newline() {
        let stripper = CopyrightStripper::new(DEFAULT_COPYRIGHT_HOLDER).unwrap();
        let input = banner("\n");
        assert_eq!(stripper.strip(input.trim_end()), "");
    }

    #[test]
    fn only_first_banner_is_removed() {
        let stripper = CopyrightStripper::new(DEFAULT_COPYRIGHT_HOLDER).unwrap();
        let input = format!("{}a{}", banner("\n"), banner("\n"));
        assert_eq!(stripper.strip(&input), format!("a{}", banner("\n")));
    }

    #[test]
    fn other_holders_are_left_alone() {
        let stripper = CopyrightStripper::new(DEFAULT_COPYRIGHT_HOLDER).unwrap();
        let input = banner("\n").replace("Sports Interactive Ltd.", "Sports Interactive Ltdx");
        assert_eq!(stripper.strip(&input), input);
    }

    #[test]
    fn merge_writes_headers_content_and_separators_in_order() {
        let tmp = TempDir::new().unwrap();
        let f1 = tmp.path().join("f1.cs");
        let f2 = tmp.path().join("f2.cs");
        fs::write(&f1, format!("{}int x;", banner("\r\n"))).unwrap();
        fs::write(&f2, "int y;").unwrap();

        let out = MergeEngine::with_defaults()
            .unwrap()
            .merge(&[&f1, &f2])
            .unwrap();

        assert!(!out.contains("Sports Interactive"));
        assert!(!out.contains(RULE_LINE));
        assert_eq!(out.matches(FILE_HEADER_PREFIX).count(), 2);
        assert_eq!(out.matches(DEFAULT_SEPARATOR).count(), 2);
        let expected = format!(
            "// File: {}\nint x;\n\n{sep}\n\n// File: {}\nint y;\n\n{sep}\n\n",
            f1.display(),
            f2.display(),
            sep = DEFAULT_SEPARATOR
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn unreadable_file_fails_the_whole_merge() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.cs");
        fs::write(&good, "ok").unwrap();
        let missing = tmp.path().join("missing.cs");

        let err = MergeEngine::with_defaults()
            .unwrap()
            .merge(&[&good, &missing])
            .unwrap_err();
        match err {
            AppError::FileRead { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stripping_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("f.cs");
        fs::write(&f, banner("\n")).unwrap();
        let out = MergeEngine::new(None, "---").merge(&[&f]).unwrap();
        assert!(out.contains("Sports Interactive"));
        assert!(out.ends_with("\n\n---\n\n"));
    }

    #[test]
    fn byte_order_mark_is_dropped_before_stripping() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("bom.cs");
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(format!("{}int x;", banner("\r\n")).as_bytes());
        fs::write(&f, bytes).unwrap();

        let out = MergeEngine::with_defaults().unwrap().merge(&[&f]).unwrap();

        assert!(!out.contains('\u{feff}'));
        assert_eq!(
            out,
            format!("// File: {}\nint x;\n\n{DEFAULT_SEPARATOR}\n\n", f.display())
        );
    }

    #[test]
    fn non_utf8_file_is_merged_lossily() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.cs");
        let b = tmp.path().join("b.cs");
        fs::write(&a, "int a;").unwrap();
        fs::write(&b, b"// Caf\xe9\nint b;").unwrap();

        let out = MergeEngine::with_defaults()
            .unwrap()
            .merge(&[&a, &b])
            .unwrap();

        assert!(out.contains("int a;"));
        assert!(out.contains("// Caf\u{fffd}\nint b;"));
        assert_eq!(out.matches(FILE_HEADER_PREFIX).count(), 2);
    }
}
