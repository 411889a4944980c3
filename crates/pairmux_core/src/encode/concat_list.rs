//! Concat demuxer list file.
//!
//! Format: one `file '<absolute-path>'` line per segment. Inside the quotes
//! a literal `'` is written as `'\''` (close quote, escaped quote, reopen).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ordered list of segments for the concat demuxer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatList {
    entries: Vec<PathBuf>,
}

impl ConcatList {
    /// Relative paths are resolved to absolute ones here, so the list
    /// stays valid wherever the list file itself is written.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let entries = paths
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf())
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Render the list file content (trailing newline included).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for path in &self.entries {
            out.push_str("file '");
            out.push_str(&escape_list_path(path));
            out.push_str("'\n");
        }
        out
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())
    }
}

/// Escape a path for use inside a single-quoted concat list entry.
pub fn escape_list_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_line_per_segment_in_order() {
        let list = ConcatList::new(["/out/seg_b.mp4", "/out/seg_a.mp4"]);
        let rendered = list.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec!["file '/out/seg_b.mp4'", "file '/out/seg_a.mp4'"]
        );
    }

    #[test]
    fn escapes_single_quotes() {
        let list = ConcatList::new(["/out/it's here.mp4"]);
        assert_eq!(list.render(), "file '/out/it'\\''s here.mp4'\n");
    }

    #[test]
    fn relative_paths_become_absolute() {
        let list = ConcatList::new(["segments/x.mp4"]);
        assert!(list.entries()[0].is_absolute());
        assert!(list.entries()[0].ends_with("segments/x.mp4"));
    }

    #[test]
    fn empty_list_renders_nothing() {
        let list = ConcatList::new(Vec::<PathBuf>::new());
        assert!(list.is_empty());
        assert_eq!(list.render(), "");
    }
}
