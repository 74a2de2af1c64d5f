use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder};

use crate::encoding::TextEncoding;

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl Default for LineEnding {
    fn default() -> Self {
        Self::Lf
    }
}

impl LineEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// The terminator conventionally used by the host platform.
    pub const fn native() -> LineEnding {
        if cfg!(windows) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// One decoded line, tagged with whether a terminator sequence was actually
/// consumed from the source. The terminator characters themselves are never
/// part of `text`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DecodedLine {
    pub text: String,
    pub terminated: bool,
}

/// Decodes characters from a byte resource one line at a time while keeping
/// a running count of every character consumed, terminator characters
/// included.
///
/// The decoder holds no handle to the resource; each call borrows it, so a
/// single owner can interleave line decoding with direct access. The cursor
/// only ever moves forward.
pub struct LineDecoder {
    encoding: TextEncoding,
    ending: LineEnding,
    decoder: Decoder,
    terminator: Vec<char>,
    terminator_index: usize,
    terminator_matched: bool,
    pending: VecDeque<char>,
    chars_consumed: u64,
    eof: bool,
}

impl fmt::Debug for LineDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineDecoder")
            .field("encoding", &self.encoding)
            .field("ending", &self.ending)
            .field("chars_consumed", &self.chars_consumed)
            .field("pending", &self.pending.len())
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl LineDecoder {
    pub fn new(encoding: TextEncoding, ending: LineEnding) -> LineDecoder {
        LineDecoder {
            encoding,
            ending,
            decoder: encoding.new_decoder(),
            terminator: ending.as_str().chars().collect(),
            terminator_index: 0,
            terminator_matched: false,
            pending: VecDeque::new(),
            chars_consumed: 0,
            eof: false,
        }
    }

    #[inline(always)]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    #[inline(always)]
    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }

    /// The running count of characters consumed so far.
    #[inline(always)]
    pub fn chars_consumed(&self) -> u64 {
        self.chars_consumed
    }

    /// Decode and consume the next character, or `None` at end of input.
    pub fn read_char<R: Read>(&mut self, src: &mut R) -> io::Result<Option<char>> {
        loop {
            if let Some(c) = self.pending.pop_front() {
                self.chars_consumed += 1;
                self.terminator_matched = self.advance_terminator(c);
                return Ok(Some(c));
            }

            if self.eof {
                return Ok(None);
            }

            self.refill(src)?;
        }
    }

    /// Accumulate characters until a full terminator match or end of input.
    ///
    /// End of input with nothing accumulated means no line was produced. A
    /// final line cut off by end of input comes back with `terminated:
    /// false`; the caller must not invent a terminator for it.
    pub fn read_line<R: Read>(&mut self, src: &mut R) -> io::Result<Option<DecodedLine>> {
        let start = self.chars_consumed;
        let mut text = String::new();

        loop {
            let c = match self.read_char(src)? {
                Some(c) => c,
                None => {
                    if text.is_empty() {
                        return Ok(None);
                    }

                    tracing::debug!(
                        chars = self.chars_consumed - start,
                        terminated = false,
                        "decoded final line"
                    );
                    return Ok(Some(DecodedLine {
                        text,
                        terminated: false,
                    }));
                }
            };

            text.push(c);

            if self.terminator_matched {
                for _ in 0..self.terminator.len() {
                    text.pop();
                }

                tracing::debug!(
                    chars = self.chars_consumed - start,
                    terminated = true,
                    "decoded line"
                );
                return Ok(Some(DecodedLine {
                    text,
                    terminated: true,
                }));
            }
        }
    }

    // Forward scan against the fixed terminator sequence. A mismatch resets
    // the index without re-matching; terminators that repeat inside
    // themselves are not detected across the reset.
    fn advance_terminator(&mut self, c: char) -> bool {
        if c == self.terminator[self.terminator_index] {
            self.terminator_index += 1;
            if self.terminator_index == self.terminator.len() {
                self.terminator_index = 0;
                return true;
            }
        } else {
            self.terminator_index = 0;
        }

        false
    }

    fn refill<R: Read>(&mut self, src: &mut R) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let n = src.read(&mut chunk)?;

        let mut decoded = String::new();
        if n == 0 {
            // Flush any partial sequence still buffered in the decoder.
            decoded.reserve(self.decoder.max_utf8_buffer_length(0).unwrap_or(16));
            loop {
                let (result, _, _) = self.decoder.decode_to_string(&[], &mut decoded, true);
                match result {
                    CoderResult::InputEmpty => break,
                    CoderResult::OutputFull => decoded.reserve(16),
                }
            }
            self.eof = true;
        } else {
            decoded.reserve(self.decoder.max_utf8_buffer_length(n).unwrap_or(n * 3));
            let mut consumed = 0;
            loop {
                let (result, read, _) =
                    self.decoder
                        .decode_to_string(&chunk[consumed..n], &mut decoded, false);
                consumed += read;
                match result {
                    CoderResult::InputEmpty => break,
                    CoderResult::OutputFull => decoded.reserve(CHUNK_SIZE),
                }
            }
        }

        self.pending.extend(decoded.chars());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lf() -> LineDecoder {
        LineDecoder::new(TextEncoding::Ascii, LineEnding::Lf)
    }

    fn crlf() -> LineDecoder {
        LineDecoder::new(TextEncoding::Ascii, LineEnding::CrLf)
    }

    fn line(text: &str, terminated: bool) -> DecodedLine {
        DecodedLine {
            text: text.to_string(),
            terminated,
        }
    }

    #[test]
    fn lines_with_trailing_terminator() {
        let mut src = Cursor::new(b"one\ntwo\n".to_vec());
        let mut dec = lf();

        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("one", true)));
        assert_eq!(dec.chars_consumed(), 4);
        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("two", true)));
        assert_eq!(dec.chars_consumed(), 8);
        assert_eq!(dec.read_line(&mut src).unwrap(), None);
        assert_eq!(dec.chars_consumed(), 8);
    }

    #[test]
    fn final_line_without_terminator() {
        let mut src = Cursor::new(b"one\ntwo".to_vec());
        let mut dec = lf();

        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("one", true)));
        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("two", false)));
        assert_eq!(dec.chars_consumed(), 7);
        assert_eq!(dec.read_line(&mut src).unwrap(), None);
    }

    #[test]
    fn empty_input_produces_no_line() {
        let mut src = Cursor::new(Vec::new());
        let mut dec = lf();

        assert_eq!(dec.read_line(&mut src).unwrap(), None);
        assert_eq!(dec.chars_consumed(), 0);
    }

    #[test]
    fn blank_lines_are_distinct_from_no_line() {
        let mut src = Cursor::new(b"\n\n".to_vec());
        let mut dec = lf();

        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("", true)));
        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("", true)));
        assert_eq!(dec.read_line(&mut src).unwrap(), None);
    }

    #[test]
    fn crlf_terminator_is_excluded_whole() {
        let mut src = Cursor::new(b"a\r\nb\r\n".to_vec());
        let mut dec = crlf();

        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("a", true)));
        assert_eq!(dec.chars_consumed(), 3);
        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("b", true)));
        assert_eq!(dec.read_line(&mut src).unwrap(), None);
    }

    #[test]
    fn lone_carriage_return_stays_in_line() {
        let mut src = Cursor::new(b"a\rb\r\n".to_vec());
        let mut dec = crlf();

        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("a\rb", true)));
    }

    #[test]
    fn partial_terminator_at_end_of_input() {
        let mut src = Cursor::new(b"abc\r".to_vec());
        let mut dec = crlf();

        assert_eq!(dec.read_line(&mut src).unwrap(), Some(line("abc\r", false)));
    }

    #[test]
    fn read_char_counts_each_character() {
        let mut src = Cursor::new(b"hi\n".to_vec());
        let mut dec = lf();

        assert_eq!(dec.read_char(&mut src).unwrap(), Some('h'));
        assert_eq!(dec.read_char(&mut src).unwrap(), Some('i'));
        assert_eq!(dec.chars_consumed(), 2);
        assert_eq!(dec.read_char(&mut src).unwrap(), Some('\n'));
        assert_eq!(dec.read_char(&mut src).unwrap(), None);
        assert_eq!(dec.chars_consumed(), 3);
    }

    #[test]
    fn utf8_multibyte_counts_characters_not_bytes() {
        let mut src = Cursor::new("h\u{e9}llo\n".as_bytes().to_vec());
        let mut dec = LineDecoder::new(TextEncoding::Utf8, LineEnding::Lf);

        assert_eq!(
            dec.read_line(&mut src).unwrap(),
            Some(line("h\u{e9}llo", true))
        );
        assert_eq!(dec.chars_consumed(), 6);
    }
}
