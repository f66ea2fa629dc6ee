//! Frame payloads and per-role frame sequences

use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::StreamRole;

/// One hop's worth of analysis output, as an opaque text record.
///
/// The payload is the trimmed object text followed by exactly one `\n`, the
/// delimiter the viz server expects. Frames are immutable and cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    payload: Arc<str>,
}

impl Frame {
    /// Build a frame from one object's text.
    ///
    /// Surrounding whitespace is trimmed and a single trailing newline is appended.
    pub fn new(object: &str) -> Self {
        let trimmed = object.trim();
        let mut payload = String::with_capacity(trimmed.len() + 1);
        payload.push_str(trimmed);
        payload.push('\n');
        Self { payload: payload.into() }
    }

    /// Wire payload including the trailing newline
    pub fn as_str(&self) -> &str {
        &self.payload
    }

    /// Wire bytes including the trailing newline
    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    /// Object text without the trailing newline
    pub fn body(&self) -> &str {
        &self.payload[..self.payload.len() - 1]
    }

    /// Bytes written per send, newline included
    pub fn wire_len(&self) -> usize {
        self.payload.len()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frame").field(&self.body()).finish()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Ordered frames for one stream role, in recording order.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    role: StreamRole,
    source: PathBuf,
    frames: Arc<[Frame]>,
}

impl FrameSequence {
    pub fn new(role: StreamRole, source: impl Into<PathBuf>, frames: Vec<Frame>) -> Self {
        Self { role, source: source.into(), frames: frames.into() }
    }

    pub fn role(&self) -> StreamRole {
        self.role
    }

    /// File the frames were loaded from (`<memory>` for in-memory text)
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, or `None` past the end of this sequence
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

impl Index<usize> for FrameSequence {
    type Output = Frame;

    fn index(&self, index: usize) -> &Frame {
        &self.frames[index]
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_trimmed_and_newline_terminated() {
        let frame = Frame::new("\n  {\"timeStamp\": 1}  \n\n");
        assert_eq!(frame.as_str(), "{\"timeStamp\": 1}\n");
        assert_eq!(frame.body(), "{\"timeStamp\": 1}");
        assert_eq!(frame.as_bytes().last(), Some(&b'\n'));
        assert_eq!(frame.wire_len(), frame.body().len() + 1);
    }

    #[test]
    fn sequence_clones_share_frames() {
        let seq = FrameSequence::new(
            StreamRole::Tracking,
            "<memory>",
            vec![Frame::new("{}"), Frame::new("{\"a\":1}")],
        );
        let copy = seq.clone();
        assert!(Arc::ptr_eq(&seq.frames, &copy.frames));
        assert_eq!(copy.len(), 2);
        assert_eq!(copy[1].body(), "{\"a\":1}");
        assert!(copy.get(2).is_none());
    }
}
