use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};

use regex::Regex;

use crate::decode::{DecodedLine, LineDecoder, LineEnding};
use crate::encoding::TextEncoding;
use crate::error::{ReplaceError, RewriteError};
use crate::source::ByteSource;

/// The replacement rule: called once per match, left to right, with the
/// matched text. A failure aborts the read that triggered it.
pub type ReplaceFn = Box<dyn FnMut(&str) -> Result<String, ReplaceError> + Send>;

/// A byte stream that rewrites each line of the wrapped resource as it is
/// read, while passing writes, seeks and length operations straight
/// through.
///
/// Reads of any size are served from an internal staging buffer holding at
/// most one transformed line at a time; a request larger than one line
/// pulls further lines until it is satisfied or the source is exhausted. A
/// zero-byte read means end of stream.
///
/// The stream takes exclusive ownership of the resource. Dropping the
/// stream releases it; `into_inner` hands it back.
pub struct RewriteStream<S: ByteSource> {
    source: S,
    pattern: Regex,
    replace: ReplaceFn,
    decoder: LineDecoder,
    staged: Vec<u8>,
    delivered: usize,
}

impl<S: ByteSource> fmt::Debug for RewriteStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteStream")
            .field("pattern", &self.pattern.as_str())
            .field("decoder", &self.decoder)
            .field("staged", &self.staged.len())
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}

impl<S: ByteSource> RewriteStream<S> {
    /// Wrap `source` with the default encoding and terminator.
    ///
    /// The pattern is compiled eagerly; an invalid pattern fails here,
    /// before any I/O happens.
    pub fn new(source: S, pattern: &str, replace: ReplaceFn) -> Result<Self, RewriteError> {
        Self::with_options(
            source,
            pattern,
            replace,
            TextEncoding::default(),
            LineEnding::default(),
        )
    }

    pub fn with_encoding(
        source: S,
        pattern: &str,
        replace: ReplaceFn,
        encoding: TextEncoding,
    ) -> Result<Self, RewriteError> {
        Self::with_options(source, pattern, replace, encoding, LineEnding::default())
    }

    pub fn with_options(
        source: S,
        pattern: &str,
        replace: ReplaceFn,
        encoding: TextEncoding,
        ending: LineEnding,
    ) -> Result<Self, RewriteError> {
        let pattern = Regex::new(pattern).map_err(|err| RewriteError::Pattern {
            pattern: pattern.to_string(),
            source: err,
        })?;

        Ok(RewriteStream {
            source,
            pattern,
            replace,
            decoder: LineDecoder::new(encoding, ending),
            staged: Vec::new(),
            delivered: 0,
        })
    }

    #[inline(always)]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    #[inline(always)]
    pub fn encoding(&self) -> TextEncoding {
        self.decoder.encoding()
    }

    #[inline(always)]
    pub fn line_ending(&self) -> LineEnding {
        self.decoder.line_ending()
    }

    /// Characters the decode cursor has consumed from the source so far.
    #[inline(always)]
    pub fn chars_consumed(&self) -> u64 {
        self.decoder.chars_consumed()
    }

    #[inline(always)]
    pub fn len(&self) -> io::Result<u64> {
        self.source.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> io::Result<bool> {
        self.source.is_empty()
    }

    #[inline(always)]
    pub fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.source.set_len(len)
    }

    #[inline(always)]
    pub fn can_read(&self) -> bool {
        self.source.can_read()
    }

    #[inline(always)]
    pub fn can_write(&self) -> bool {
        self.source.can_write()
    }

    #[inline(always)]
    pub fn can_seek(&self) -> bool {
        self.source.can_seek()
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.source.seek(SeekFrom::Current(0))
    }

    pub fn set_position(&mut self, pos: u64) -> io::Result<u64> {
        self.source.seek(SeekFrom::Start(pos))
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Release the underlying resource without closing it.
    pub fn into_inner(self) -> S {
        self.source
    }

    // Rewrite one decoded line, re-encode it (restoring the terminator only
    // if one was consumed) and make it the new staging buffer.
    fn stage(&mut self, line: DecodedLine) -> io::Result<()> {
        let pattern = &self.pattern;
        let replace = &mut self.replace;

        let mut rewritten = String::with_capacity(line.text.len());
        let mut last_match = 0;
        let mut matches = 0u32;

        for m in pattern.find_iter(&line.text) {
            rewritten.push_str(&line.text[last_match..m.start()]);
            let replacement = replace(m.as_str()).map_err(|err| {
                io::Error::new(
                    io::ErrorKind::Other,
                    RewriteError::Replacement {
                        matched: m.as_str().to_string(),
                        source: err,
                    },
                )
            })?;
            rewritten.push_str(&replacement);
            last_match = m.end();
            matches += 1;
        }
        rewritten.push_str(&line.text[last_match..]);

        if line.terminated {
            rewritten.push_str(self.decoder.line_ending().as_str());
        }

        tracing::trace!(
            in_len = line.text.len(),
            out_len = rewritten.len(),
            matches,
            terminated = line.terminated,
            "staged line"
        );

        self.staged = self.decoder.encoding().encode(&rewritten);
        self.delivered = 0;
        Ok(())
    }
}

impl<S: ByteSource> Read for RewriteStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        while written < buf.len() {
            if self.delivered >= self.staged.len() {
                let line = match self.decoder.read_line(&mut self.source)? {
                    Some(line) => line,
                    None => break,
                };
                self.stage(line)?;
            }

            let available = &self.staged[self.delivered..];
            let count = available.len().min(buf.len() - written);
            buf[written..written + count].copy_from_slice(&available[..count]);
            self.delivered += count;
            written += count;
        }

        Ok(written)
    }
}

impl<S: ByteSource> Write for RewriteStream<S> {
    /// Writes are raw, untransformed bytes handed straight to the resource.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.source.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.source.flush()
    }
}

/// Seeking is a raw passthrough. The decode cursor and staging buffer are
/// not reset; interleaving seeks with transformed reads leaves them stale,
/// which is the caller's responsibility.
impl<S: ByteSource> Seek for RewriteStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.source.seek(pos)
    }
}
