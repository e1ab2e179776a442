/// Platform-independent path keys for the directory tree.
///
/// A `NormalizedPath` is an ordered list of non-empty segments split on the
/// platform's separators: `/` everywhere, plus `\` on Windows. A Windows
/// drive such as `C:` becomes an ordinary first segment. Values are
/// immutable; every operation returns a new path.
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{is_separator, Component, Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<CompactString>", into = "Vec<CompactString>")]
pub struct NormalizedPath {
    segments: Vec<CompactString>,
}

impl NormalizedPath {
    /// Split a raw path string into segments, dropping the empty tokens left
    /// by leading, trailing or repeated separators.
    pub fn new(raw: &str) -> Self {
        Self::from_segments(raw.split(is_separator))
    }

    /// Build from pre-split segments. Empty segments are discarded.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            segments: segments
                .into_iter()
                .filter(|s| !s.as_ref().is_empty())
                .map(|s| CompactString::new(s.as_ref()))
                .collect(),
        }
    }

    /// Segments of `path`'s components. The root and `.` contribute nothing.
    pub fn from_path(path: &Path) -> Self {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Prefix(prefix) => {
                    segments.extend(Self::new(&prefix.as_os_str().to_string_lossy()).segments);
                }
                Component::Normal(name) => {
                    segments.push(CompactString::new(name.to_string_lossy()));
                }
                Component::ParentDir => segments.push(CompactString::new("..")),
                Component::RootDir | Component::CurDir => {}
            }
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[CompactString] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(CompactString::as_str)
    }

    /// All segments but the last. The parent of an empty path is empty.
    pub fn parent(&self) -> NormalizedPath {
        self.slice(0, Some(self.len().saturating_sub(1)))
    }

    /// `true` when `other`'s segments are a prefix of ours.
    /// An empty `other` is a prefix of everything.
    pub fn starts_with(&self, other: &NormalizedPath) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// Strip `root` from the front of this path.
    ///
    /// Lenient: when `root` is not a prefix the path is returned unchanged,
    /// so callers needing strict behaviour must check [`starts_with`] first.
    ///
    /// [`starts_with`]: NormalizedPath::starts_with
    pub fn remove_root(&self, root: &NormalizedPath) -> NormalizedPath {
        if self.starts_with(root) {
            self.slice(root.len(), None)
        } else {
            self.clone()
        }
    }

    pub fn join(&self, other: &NormalizedPath) -> NormalizedPath {
        let mut segments = Vec::with_capacity(self.len() + other.len());
        segments.extend_from_slice(&self.segments);
        segments.extend_from_slice(&other.segments);
        Self { segments }
    }

    /// Append one segment. Empty names leave the path unchanged.
    pub fn child(&self, name: &str) -> NormalizedPath {
        let mut out = self.clone();
        if !name.is_empty() {
            out.segments.push(CompactString::new(name));
        }
        out
    }

    /// Half-open sub-range of segments. Out-of-range bounds clamp to the
    /// path length and an inverted range yields an empty path.
    pub fn slice(&self, start: usize, end: Option<usize>) -> NormalizedPath {
        let len = self.segments.len();
        let end = end.unwrap_or(len).min(len);
        let start = start.min(end);
        Self {
            segments: self.segments[start..end].to_vec(),
        }
    }

    /// Rebuild an absolute platform path.
    ///
    /// On Unix the result gets a leading `/`; on Windows the first segment is
    /// expected to be a drive (`C:`) and receives a trailing separator.
    pub fn to_path_buf(&self) -> PathBuf {
        let mut out = PathBuf::new();
        if cfg!(windows) {
            for (i, seg) in self.segments.iter().enumerate() {
                if i == 0 && seg.ends_with(':') {
                    out.push(format!("{seg}\\"));
                } else {
                    out.push(seg.as_str());
                }
            }
        } else {
            out.push("/");
            for seg in &self.segments {
                out.push(seg.as_str());
            }
        }
        out
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

impl From<Vec<CompactString>> for NormalizedPath {
    fn from(segments: Vec<CompactString>) -> Self {
        Self::from_segments(segments)
    }
}

impl From<NormalizedPath> for Vec<CompactString> {
    fn from(path: NormalizedPath) -> Self {
        path.segments
    }
}

impl From<&str> for NormalizedPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}
