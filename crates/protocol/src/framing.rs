//! RFC5425 octet-counted framing
//!
//! `SYSLOG-FRAME = MSG-LEN SP SYSLOG-MSG` where `MSG-LEN` is the decimal
//! length of `SYSLOG-MSG` in octets (`NONZERO-DIGIT *DIGIT`).
//!
//! The decoder keeps the length of a partially received frame between calls
//! so a frame split across many reads is only scanned once.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::FrameError;
use crate::parser::ParsedResult;
use crate::rfc5424;

/// Digits scanned before a MSG-LEN prefix is declared malformed
const MAX_LENGTH_DIGITS: usize = 10;

/// Splits an RFC5425 stream into frames and parses each as RFC5424
#[derive(Debug, Clone)]
pub struct OctetCountingDecoder {
    best_effort: bool,
    max_frame_length: usize,
    /// MSG-LEN of the frame being received, once its prefix is consumed
    pending: Option<usize>,
}

impl OctetCountingDecoder {
    /// Create a decoder with the default frame limit
    pub fn new(best_effort: bool) -> Self {
        Self {
            best_effort,
            max_frame_length: crate::MAX_MESSAGE_SIZE,
            pending: None,
        }
    }

    /// Override the largest MSG-LEN accepted
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    /// Scan a MSG-LEN prefix; returns `(length, prefix_len)` once the
    /// terminating space is buffered
    fn frame_length(&self, src: &BytesMut) -> Result<Option<(usize, usize)>, FrameError> {
        for (i, byte) in src.iter().enumerate() {
            match *byte {
                b' ' if i > 0 => {
                    let length = src[..i]
                        .iter()
                        .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
                    let length = usize::try_from(length).unwrap_or(usize::MAX);
                    if length > self.max_frame_length {
                        return Err(FrameError::too_large(length, self.max_frame_length));
                    }
                    return Ok(Some((length, i + 1)));
                }
                b'1'..=b'9' => {}
                b'0' if i > 0 => {}
                _ => return Err(FrameError::invalid_length(i)),
            }
            if i >= MAX_LENGTH_DIGITS {
                return Err(FrameError::invalid_length(i));
            }
        }
        Ok(None)
    }
}

impl Decoder for OctetCountingDecoder {
    type Item = ParsedResult;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let length = match self.pending {
            Some(length) => length,
            None => {
                let Some((length, prefix_len)) = self.frame_length(src)? else {
                    return Ok(None);
                };
                src.advance(prefix_len);
                self.pending = Some(length);
                length
            }
        };

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        self.pending = None;
        let frame = src.split_to(length);
        Ok(Some(rfc5424::parse(&frame, self.best_effort)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(result) => Ok(Some(result)),
            None if src.is_empty() && self.pending.is_none() => Ok(None),
            None => Err(FrameError::Truncated {
                remaining: src.len(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "framing_test.rs"]
mod framing_test;
