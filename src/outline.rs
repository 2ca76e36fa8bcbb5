//! Plain-text outline pages: `- ` bullets nested with tabs, `key:: value`
//! page properties, `[[...]]` page references.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::errors::{Error, Result};

/// `[[name]]`
pub fn page_ref(name: &str) -> String {
    format!("[[{}]]", name)
}

/// `[[a]], [[b]]`
pub fn page_refs<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| page_ref(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `key:: value`
pub fn property(key: &str, value: impl std::fmt::Display) -> String {
    format!("{}:: {}", key, value)
}

/// Create `path` with `lines` unless it already exists. Returns whether it wrote.
/// Not atomic: check-then-write is fine for a single writer.
pub fn write_once(path: &Path, lines: &[String]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|e| Error::io(path, e))?;
    Ok(true)
}

/// Append a block to `path`, starting on a fresh line.
pub fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    let content = format!("\n{}", lines.join("\n"));
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn refs() {
        assert_eq!(page_ref("Milano"), "[[Milano]]");
        assert_eq!(page_refs(&["a", "b c"]), "[[a]], [[b c]]");
        assert_eq!(page_refs::<&str>(&[]), "");
        assert_eq!(property("rank", page_ref("genus")), "rank:: [[genus]]");
    }

    #[test]
    fn write_once_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.md");
        assert!(write_once(&path, &["first".to_string()]).unwrap());
        assert!(!write_once(&path, &["second".to_string()]).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");
    }

    #[test]
    fn append_starts_on_new_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.md");
        fs::write(&path, "- existing").unwrap();
        append_lines(&path, &["- one".to_string(), "- two".to_string()]).unwrap();
        append_lines(&path, &["- three".to_string()]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "- existing\n- one\n- two\n- three"
        );
    }
}
