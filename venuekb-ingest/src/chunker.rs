//! Line-aligned transcript chunking
//!
//! Chunks are contiguous slices of the transcript. Joining them with `'\n'`
//! reproduces the input exactly; a line is never split, so a single line longer
//! than the budget becomes its own oversized chunk.

/// Split `text` into chunks of at most `max_chars` characters.
pub fn chunk_transcript(text: &str, max_chars: usize) -> Chunks<'_> {
    Chunks {
        text,
        pos: 0,
        max_chars,
        done: text.is_empty(),
    }
}

/// Iterator over transcript chunks; single pass, not restartable.
#[derive(Debug)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of the next unconsumed line
    pos: usize,
    max_chars: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }

        let start = self.pos;
        let mut chars = 0usize;
        let mut lines = 0usize;

        loop {
            let rest = &self.text[self.pos..];
            let (line, newline_at) = match rest.find('\n') {
                Some(i) => (&rest[..i], Some(self.pos + i)),
                None => (rest, None),
            };

            let separator = usize::from(lines > 0);
            let candidate = chars + separator + line.chars().count();
            if lines > 0 && candidate > self.max_chars {
                // `pos - 1` is the newline separating this chunk from the next line
                return Some(&self.text[start..self.pos - 1]);
            }

            chars = candidate;
            lines += 1;

            match newline_at {
                Some(i) => self.pos = i + 1,
                None => {
                    self.done = true;
                    return Some(&self.text[start..]);
                }
            }
        }
    }
}
