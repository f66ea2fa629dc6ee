//! Brace-depth scanner for back-to-back JSON objects
//!
//! Tracks nesting depth together with string and escape state, so braces
//! inside string values never end a frame. Text between top-level objects is
//! skipped; whitespace silently, anything else with a warning.

use tracing::warn;

use crate::types::Frame;

/// Lazy iterator over the top-level objects in `text`.
#[derive(Debug, Clone)]
pub struct ScanFrames<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> ScanFrames<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Byte offset just past the end of the last object found
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Move to the next `{`, reporting any non-whitespace skipped on the way.
    fn seek_object_start(&mut self) -> Option<usize> {
        let rest = &self.text[self.pos..];
        let found = rest.find('{');
        let skipped = match found {
            Some(offset) => &rest[..offset],
            None => rest,
        };

        let stray = skipped.trim();
        if !stray.is_empty() {
            warn!(
                "Skipping {} bytes of text outside any frame at offset {}",
                stray.len(),
                self.pos
            );
        }

        match found {
            Some(offset) => {
                self.pos += offset;
                Some(self.pos)
            }
            None => {
                self.pos = self.text.len();
                None
            }
        }
    }
}

impl Iterator for ScanFrames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let start = self.seek_object_start()?;
        let bytes = self.text.as_bytes();

        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &b) in bytes.iter().enumerate().skip(start) {
            if in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                }
                continue;
            }

            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Some(Frame::new(&self.text[start..self.pos]));
                    }
                }
                _ => {}
            }
        }

        // Input ended inside an object: close it once, the same repair the
        // boundary splitter applies to a final chunk.
        self.pos = self.text.len();
        let chunk = self.text[start..].trim_end();
        warn!("Final frame at offset {} is not closed", start);
        if chunk.ends_with('}') {
            Some(Frame::new(chunk))
        } else {
            Some(Frame::new(&format!("{chunk}}}")))
        }
    }
}
