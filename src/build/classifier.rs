//! Line-oriented classification of toolchain output

use crate::models::LineClass;

/// Classify one complete line of toolchain output.
///
/// Matching is a case-insensitive substring test and "error" wins over
/// "warning". [`LineClass::Info`] is never produced here.
pub fn classify(line: &str) -> LineClass {
    let lower = line.to_lowercase();
    if lower.contains("error") {
        LineClass::Error
    } else if lower.contains("warning") {
        LineClass::Warning
    } else {
        LineClass::Plain
    }
}

/// Accumulates raw output chunks and yields complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without terminators
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Take whatever partial line is left once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify("Error: foo"), LineClass::Error);
        assert_eq!(classify("warning: bar"), LineClass::Warning);
        assert_eq!(classify("build ok"), LineClass::Plain);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("main.c:3: ERROR unknown type"), LineClass::Error);
        assert_eq!(classify("WaRnInG: implicit declaration"), LineClass::Warning);
    }

    #[test]
    fn test_error_takes_precedence_over_warning() {
        assert_eq!(classify("warning treated as error"), LineClass::Error);
        assert_eq!(classify("error: warning flags"), LineClass::Error);
    }

    #[test]
    fn test_line_buffer_holds_partial_lines() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"main.c:1: warn").is_empty());
        assert_eq!(buffer.push(b"ing: x\r\nlinking"), vec!["main.c:1: warning: x"]);
        assert_eq!(buffer.push(b"...\n\n"), vec!["linking...", ""]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_line_buffer_finish_returns_tail() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"done\nno newline");
        assert_eq!(buffer.finish().as_deref(), Some("no newline"));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_line_buffer_joins_split_utf8() {
        let mut buffer = LineBuffer::new();
        let text = "ñ\n".as_bytes();
        assert!(buffer.push(&text[..1]).is_empty());
        assert_eq!(buffer.push(&text[1..]), vec!["ñ"]);
    }
}
