//! Unified diff parsing.
//!
//! The parser is a single left-to-right scan driven by [`ScanState`]. Lines
//! that carry no addressable content (preamble, `index`/`---`/`+++` headers
//! before the first hunk) are dropped. Hunk headers that cannot be parsed are
//! skipped rather than aborting the parse; see [`HunkHeader::Malformed`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const FILE_MARKER: &str = "diff --git";
const HUNK_MARKER: &str = "@@";
const NEW_SIDE_PREFIX: &str = " b/";
const QUOTED_NEW_SIDE_PREFIX: &str = " \"b/";

/// One contiguous block of changed lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// First line of the hunk in the new file version
    pub start_line: u32,
    /// The full `@@ ... @@` header line
    pub header: String,
    pub additions: Vec<String>,
    pub deletions: Vec<String>,
    pub context: Vec<String>,
}

impl Hunk {
    fn new(start_line: u32, header: &str) -> Self {
        Self {
            start_line,
            header: header.to_string(),
            ..Default::default()
        }
    }
}

/// Summary of diff statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub hunks: usize,
    pub insertions: usize,
    pub deletions: usize,
}

/// File path to hunks, in order of first appearance in the diff text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDiff {
    files: IndexMap<String, Vec<Hunk>>,
}

impl FileDiff {
    pub fn get(&self, path: &str) -> Option<&[Hunk]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Hunk])> {
        self.files.iter().map(|(path, hunks)| (path.as_str(), hunks.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn summary(&self) -> DiffSummary {
        let hunks = || self.files.values().flatten();
        DiffSummary {
            files_changed: self.files.len(),
            hunks: hunks().count(),
            insertions: hunks().map(|h| h.additions.len()).sum(),
            deletions: hunks().map(|h| h.deletions.len()).sum(),
        }
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<Hunk>> {
        self.files
    }

    /// Register a file with no hunks yet. Re-registering keeps the original
    /// position and starts a fresh hunk list.
    fn open_file(&mut self, path: &str) {
        self.files.insert(path.to_string(), Vec::new());
    }

    fn push_hunk(&mut self, path: &str, hunk: Hunk) {
        if let Some(hunks) = self.files.get_mut(path) {
            hunks.push(hunk);
        }
    }
}

/// Result of reading a `@@` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkHeader {
    Valid { start_line: u32 },
    /// Missing range tokens or a non-numeric new-file start. The hunk is skipped.
    Malformed,
}

impl HunkHeader {
    /// Parse `@@ -a[,b] +c[,d] @@ [section]`, keeping `c`
    pub fn parse(line: &str) -> Self {
        let Some(ranges) = line.split(HUNK_MARKER).nth(1) else {
            return Self::Malformed;
        };
        let mut tokens = ranges.split_whitespace();
        let (Some(old), Some(new)) = (tokens.next(), tokens.next()) else {
            return Self::Malformed;
        };
        if !old.starts_with('-') {
            return Self::Malformed;
        }
        let Some(new) = new.strip_prefix('+') else {
            return Self::Malformed;
        };
        let start = new.split(',').next().unwrap_or_default();
        match start.parse::<u32>() {
            Ok(start_line) => Self::Valid { start_line },
            Err(_) => Self::Malformed,
        }
    }
}

/// A hunk header that was skipped during parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedHunk {
    pub path: String,
    pub header: String,
}

/// Scanner position: outside any file, or inside one with an optional open hunk
#[derive(Debug)]
enum ScanState {
    NoFile,
    InFile { path: String, hunk: Option<Hunk> },
}

/// How a single line inside a hunk is classified
enum HunkLine<'a> {
    Addition(&'a str),
    Deletion(&'a str),
    Context(&'a str),
    NoNewlineMarker,
}

impl<'a> HunkLine<'a> {
    fn classify(line: &'a str) -> Self {
        if line.starts_with('\\') {
            Self::NoNewlineMarker
        } else if let Some(rest) = line.strip_prefix('+').filter(|_| !line.starts_with("+++")) {
            Self::Addition(rest)
        } else if let Some(rest) = line.strip_prefix('-').filter(|_| !line.starts_with("---")) {
            Self::Deletion(rest)
        } else {
            Self::Context(line.strip_prefix(' ').unwrap_or(line))
        }
    }
}

struct Parser {
    output: FileDiff,
    skipped: Vec<SkippedHunk>,
    state: ScanState,
}

impl Parser {
    fn new() -> Self {
        Self {
            output: FileDiff::default(),
            skipped: Vec::new(),
            state: ScanState::NoFile,
        }
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with(FILE_MARKER) {
            self.start_file(line);
        } else if line.starts_with(HUNK_MARKER) {
            self.start_hunk(line);
        } else if let ScanState::InFile {
            hunk: Some(hunk), ..
        } = &mut self.state
        {
            match HunkLine::classify(line) {
                HunkLine::Addition(text) => hunk.additions.push(text.to_string()),
                HunkLine::Deletion(text) => hunk.deletions.push(text.to_string()),
                HunkLine::Context(text) => hunk.context.push(text.to_string()),
                HunkLine::NoNewlineMarker => {}
            }
        }
    }

    fn start_file(&mut self, line: &str) {
        self.flush_hunk();
        self.state = match new_side_path(line) {
            Some(path) => {
                self.output.open_file(&path);
                ScanState::InFile { path, hunk: None }
            }
            None => ScanState::NoFile,
        };
    }

    fn start_hunk(&mut self, line: &str) {
        self.flush_hunk();
        let ScanState::InFile { path, hunk } = &mut self.state else {
            return;
        };
        match HunkHeader::parse(line) {
            HunkHeader::Valid { start_line } => *hunk = Some(Hunk::new(start_line, line)),
            HunkHeader::Malformed => self.skipped.push(SkippedHunk {
                path: path.clone(),
                header: line.to_string(),
            }),
        }
    }

    fn flush_hunk(&mut self) {
        if let ScanState::InFile { path, hunk } = &mut self.state {
            if let Some(done) = hunk.take() {
                self.output.push_hunk(path, done);
            }
        }
    }

    fn finish(mut self) -> (FileDiff, Vec<SkippedHunk>) {
        self.flush_hunk();
        (self.output, self.skipped)
    }
}

/// Path after `b/` on a `diff --git` line.
///
/// Git C-quotes paths with special or non-ASCII bytes
/// (`"b/caf\303\251.py"`); those are unquoted.
fn new_side_path(line: &str) -> Option<String> {
    if let Some(quoted) = line
        .rsplit_once(QUOTED_NEW_SIDE_PREFIX)
        .and_then(|(_, rest)| rest.strip_suffix('"'))
    {
        return Some(unquote_c_style(quoted));
    }
    line.rsplit_once(NEW_SIDE_PREFIX).map(|(_, path)| path.to_string())
}

/// Undo git's C-style path quoting (`\"`, `\\`, `\t`, `\n`, octal bytes)
fn unquote_c_style(quoted: &str) -> String {
    let mut bytes = Vec::with_capacity(quoted.len());
    let mut iter = quoted.bytes().peekable();

    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match iter.next() {
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&o @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(o - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse unified diff text into per-file hunks. Never fails.
pub fn parse_diff(diff_text: &str) -> FileDiff {
    parse_diff_with_diagnostics(diff_text).0
}

/// Like [`parse_diff`], also returning the hunk headers that were skipped
pub fn parse_diff_with_diagnostics(diff_text: &str) -> (FileDiff, Vec<SkippedHunk>) {
    let mut parser = Parser::new();
    // Split on LF only: a trailing CR is line content
    for line in diff_text.split_terminator('\n') {
        parser.feed(line);
    }
    parser.finish()
}
