//! Markdown code-region detection.
//!
//! Image references and tag lines that sit inside code are literal text, not
//! markup. This module finds the byte ranges covered by fenced code blocks
//! (```` ``` ```` or `~~~`, closed by a fence of the same character and at
//! least the same length) and inline code spans (a backtick run closed by a
//! run of equal length on the same line). An unclosed fence runs to the end
//! of the text.

use std::ops::Range;

/// Byte ranges of a text that are inside code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeRegions {
    ranges: Vec<Range<usize>>,
}

struct OpenFence {
    marker: char,
    len: usize,
    start: usize,
}

impl CodeRegions {
    /// Scans `text` for fenced blocks and inline code spans.
    pub fn scan(text: &str) -> Self {
        let mut ranges = Vec::new();
        let mut fence: Option<OpenFence> = None;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            match (&fence, fence_marker(line)) {
                (None, Some((marker, len))) => {
                    fence = Some(OpenFence {
                        marker,
                        len,
                        start: line_start,
                    });
                }
                (Some(open), Some((marker, len))) if marker == open.marker && len >= open.len => {
                    ranges.push(open.start..offset);
                    fence = None;
                }
                (Some(_), _) => {}
                (None, None) => inline_spans(line, line_start, &mut ranges),
            }
        }

        if let Some(open) = fence {
            ranges.push(open.start..text.len());
        }

        Self { ranges }
    }

    /// True when the byte at `pos` is inside code.
    pub fn contains(&self, pos: usize) -> bool {
        self.ranges.iter().any(|range| range.contains(&pos))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Returns the fence character and run length if `line` opens or closes a fence.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn inline_spans(line: &str, line_start: usize, ranges: &mut Vec<Range<usize>>) {
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let open_start = i;
        let run = backtick_run(bytes, i);
        i += run;

        // Look for a closing run of exactly the same length.
        let mut j = i;
        let mut closed = None;
        while j < bytes.len() {
            if bytes[j] == b'`' {
                let close_run = backtick_run(bytes, j);
                if close_run == run {
                    closed = Some(j + close_run);
                    break;
                }
                j += close_run;
            } else {
                j += 1;
            }
        }

        if let Some(end) = closed {
            ranges.push(line_start + open_start..line_start + end);
            i = end;
        }
    }
}

fn backtick_run(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|b| **b == b'`').count()
}
