//! Cursors over 32-bit word buffers.
//!
//! Every stream this crate produces or consumes is a sequence of `u32` words. Readers fail with
//! [`OpforgeError::CorruptStream`] carrying the offending word offset.

use crate::foundation::error::{OpforgeError, OpforgeResult};

/// Forward-only reader over a borrowed word buffer.
#[derive(Clone, Debug)]
pub struct WordReader<'a> {
    words: &'a [u32],
    pos: usize,
}

impl<'a> WordReader<'a> {
    /// Start reading at the beginning of `words`.
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, pos: 0 }
    }

    /// Current word offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Words left to read.
    pub fn remaining(&self) -> usize {
        self.words.len() - self.pos
    }

    /// `true` once every word has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos == self.words.len()
    }

    /// Read one word.
    pub fn read_u32(&mut self) -> OpforgeResult<u32> {
        let w = self
            .words
            .get(self.pos)
            .copied()
            .ok_or_else(|| OpforgeError::corrupt(self.pos, "unexpected end of stream"))?;
        self.pos += 1;
        Ok(w)
    }

    /// Read one word as a two's complement integer.
    pub fn read_i32(&mut self) -> OpforgeResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read one word as `f32` bits.
    pub fn read_f32(&mut self) -> OpforgeResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read a word that must equal `expected`.
    pub fn expect_u32(&mut self, expected: u32, what: &str) -> OpforgeResult<()> {
        let at = self.pos;
        let got = self.read_u32()?;
        if got != expected {
            return Err(OpforgeError::corrupt(
                at,
                format!("bad {what}: expected {expected:#010x}, found {got:#010x}"),
            ));
        }
        Ok(())
    }

    /// Borrow the next `n` words and advance past them.
    pub fn take(&mut self, n: usize) -> OpforgeResult<&'a [u32]> {
        if n > self.remaining() {
            return Err(OpforgeError::corrupt(
                self.pos,
                format!("need {n} words, only {} left", self.remaining()),
            ));
        }
        let s = &self.words[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    /// Skip `n` words.
    pub fn skip(&mut self, n: usize) -> OpforgeResult<()> {
        self.take(n).map(|_| ())
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> OpforgeResult<String> {
        let at = self.pos;
        let len = self.read_u32()? as usize;
        let packed = self.take(string_payload_words(len))?;
        let mut bytes = Vec::with_capacity(len);
        for w in packed {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        bytes.truncate(len);
        String::from_utf8(bytes).map_err(|_| OpforgeError::corrupt(at, "string is not UTF-8"))
    }
}

/// Growable word sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WordWriter {
    words: Vec<u32>,
}

impl WordWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Words written so far.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Append one word.
    pub fn write_u32(&mut self, v: u32) {
        self.words.push(v);
    }

    /// Append a two's complement integer.
    pub fn write_i32(&mut self, v: i32) {
        self.words.push(v as u32);
    }

    /// Append `f32` bits.
    pub fn write_f32(&mut self, v: f32) {
        self.words.push(v.to_bits());
    }

    /// Append raw words.
    pub fn write_words(&mut self, ws: &[u32]) {
        self.words.extend_from_slice(ws);
    }

    /// Append a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) {
        push_string(&mut self.words, s);
    }

    /// Reserve a placeholder word and return its offset for [`WordWriter::patch`].
    pub fn reserve(&mut self) -> usize {
        self.words.push(0);
        self.words.len() - 1
    }

    /// Overwrite a previously reserved word.
    pub fn patch(&mut self, at: usize, v: u32) {
        self.words[at] = v;
    }

    /// Borrow the written words.
    pub fn as_slice(&self) -> &[u32] {
        &self.words
    }

    /// Finish writing.
    pub fn into_words(self) -> Vec<u32> {
        self.words
    }
}

/// Words needed for the byte payload of a string of `len` bytes (length word excluded).
pub fn string_payload_words(len: usize) -> usize {
    len.div_ceil(4)
}

/// Words needed for a length-prefixed string.
pub fn string_words(s: &str) -> usize {
    1 + string_payload_words(s.len())
}

pub(crate) fn push_string(out: &mut Vec<u32>, s: &str) {
    let bytes = s.as_bytes();
    out.push(bytes.len() as u32);
    for chunk in bytes.chunks(4) {
        let mut w = [0u8; 4];
        w[..chunk.len()].copy_from_slice(chunk);
        out.push(u32::from_le_bytes(w));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/words.rs"]
mod tests;
