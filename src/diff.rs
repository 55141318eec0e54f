//! Unified diff parsing, restricting formatting to touched lines.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// An inclusive range of lines allowed to be reformatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffChunk {
    pub beg: u32,
    pub end: u32,
}

impl DiffChunk {
    pub fn covers(&self, lno: u32) -> bool {
        lno >= self.beg && lno <= self.end
    }
}

static RE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+\+\+\s+(\S+)").unwrap());
static RE_CHUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@@.+\+(\d+)(,(\d+))?.+@@").unwrap());

/// Extract per path diff chunks from a unified diff. Only added or changed
/// lines end up in chunks, context and removed lines never do.
pub fn parse(input: &str) -> HashMap<String, Vec<DiffChunk>> {
    let mut files: HashMap<String, Vec<DiffChunk>> = HashMap::new();
    let mut path: Option<String> = None;
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if let Some(m) = RE_PATH.captures(line) {
            let mut p = m.get(1).unwrap().as_str();
            // Trim the git prefix.
            p = p.strip_prefix("b/").unwrap_or(p);
            path = Some(p.to_string());
            files.entry(p.to_string()).or_default();
            continue;
        }

        let Some(m) = RE_CHUNK.captures(line) else {
            continue;
        };
        let Some(path) = path.as_ref() else {
            // Chunks cannot be present before the path.
            continue;
        };
        let beg: u32 = m.get(1).unwrap().as_str().parse().unwrap_or(0);
        let len: u32 = match m.get(3) {
            Some(n) => n.as_str().parse().unwrap_or(1),
            None => 1,
        };
        if beg == 0 {
            continue;
        }
        let end = beg + len.saturating_sub(1);

        let chunks = files.get_mut(path).unwrap();
        let mut lno = beg;
        let mut open: Option<DiffChunk> = None;
        while lno <= end {
            let Some(&line) = lines.peek() else {
                break;
            };
            match line.bytes().next() {
                Some(b'-') => {
                    lines.next();
                }
                Some(b'+') => {
                    match open.as_mut() {
                        Some(du) => du.end = lno,
                        None => open = Some(DiffChunk { beg: lno, end: lno }),
                    }
                    lines.next();
                    lno += 1;
                }
                _ => {
                    if let Some(du) = open.take() {
                        chunks.push(du);
                    }
                    lines.next();
                    lno += 1;
                }
            }
        }
        if let Some(du) = open.take() {
            chunks.push(du);
        }
    }

    for (path, chunks) in &files {
        for du in chunks {
            log::debug!("diff: {}: {}-{}", path, du.beg, du.end);
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_chunk() {
        let diff = "\
--- a/foo.c
+++ b/foo.c
@@ -1,3 +1,3 @@
 int a;
-int b ;
+int b;
 int c;
";
        let files = parse(diff);
        let chunks = files.get("foo.c").unwrap();
        assert_eq!(chunks, &vec![DiffChunk { beg: 2, end: 2 }]);
    }

    #[test]
    fn test_parse_multiple_files() {
        let diff = "\
+++ b/a.c
@@ -1 +1,2 @@
+int a;
+int b;
+++ b/b.c
@@ -5 +7 @@
+int c;
";
        let files = parse(diff);
        assert_eq!(files.get("a.c").unwrap(), &vec![DiffChunk { beg: 1, end: 2 }]);
        assert_eq!(files.get("b.c").unwrap(), &vec![DiffChunk { beg: 7, end: 7 }]);
    }

    #[test]
    fn test_covers() {
        let du = DiffChunk { beg: 3, end: 5 };
        assert!(!du.covers(2));
        assert!(du.covers(3));
        assert!(du.covers(5));
        assert!(!du.covers(6));
    }
}
