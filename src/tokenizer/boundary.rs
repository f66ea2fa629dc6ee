//! Brace-adjacency splitter
//!
//! Splits wherever a `}` is followed by optional whitespace and a `{`, then
//! repairs each chunk so it starts with `{` and ends with `}`. Purely lexical:
//! a literal `}{` inside a string value will be split.

use crate::types::Frame;

/// Lazy iterator over the chunks between `}\s*{` boundaries.
#[derive(Debug, Clone)]
pub struct BoundaryFrames<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> BoundaryFrames<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0, done: false }
    }

    /// Next boundary at or after `from`: (end of current chunk, start of next).
    fn find_boundary(&self, from: usize) -> Option<(usize, usize)> {
        let rest = &self.text[from..];
        for (offset, _) in rest.match_indices('}') {
            let close = from + offset;
            let after = &self.text[close + 1..];
            let gap = after.len() - after.trim_start().len();
            if after[gap..].starts_with('{') {
                return Some((close + 1, close + 1 + gap));
            }
        }
        None
    }

    fn repair(chunk: &str) -> Option<Frame> {
        let trimmed = chunk.trim();
        if trimmed.is_empty() {
            return None;
        }

        let open = if trimmed.starts_with('{') { "" } else { "{" };
        let close = if trimmed.ends_with('}') { "" } else { "}" };
        Some(Frame::new(&format!("{open}{chunk}{close}")))
    }
}

impl Iterator for BoundaryFrames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        while !self.done {
            let chunk = match self.find_boundary(self.pos) {
                Some((end, next)) => {
                    let chunk = &self.text[self.pos..end];
                    self.pos = next;
                    chunk
                }
                None => {
                    self.done = true;
                    &self.text[self.pos..]
                }
            };

            if let Some(frame) = Self::repair(chunk) {
                return Some(frame);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(text: &str) -> Vec<String> {
        BoundaryFrames::new(text).map(|f| f.body().to_string()).collect()
    }

    #[test]
    fn splits_on_close_open_with_whitespace() {
        assert_eq!(bodies("{\"a\":1}\n  {\"b\":2}"), vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(bodies("{\"a\":1}{\"b\":2}"), vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn single_object_is_one_frame() {
        assert_eq!(bodies("\n{\n  \"a\": {\"b\": 1}\n}\n\n"), vec!["{\n  \"a\": {\"b\": 1}\n}"]);
    }

    #[test]
    fn nested_close_brace_without_open_does_not_split() {
        assert_eq!(bodies("{\"a\": {\"b\": 1},\n\"c\": 2}").len(), 1);
    }

    #[test]
    fn missing_outer_braces_are_restored() {
        assert_eq!(bodies("\"a\":1}{\"b\":2"), vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn empty_input_has_no_frames() {
        assert!(bodies("").is_empty());
        assert!(bodies("\n \n").is_empty());
    }

    #[test]
    fn literal_boundary_in_string_is_split() {
        assert_eq!(bodies(r#"{"tag": "}{"}"#).len(), 2);
    }
}
