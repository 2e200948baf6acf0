//! RFC5424 message parser
//!
//! Parses `SYSLOG-MSG = HEADER SP STRUCTURED-DATA [SP MSG]` from a byte
//! slice. The grammar is strict: field lengths, the printable US-ASCII
//! alphabet and PRI range are all enforced.
//!
//! # Best effort
//!
//! With `best_effort` set, a message whose PRI and VERSION parsed is returned
//! together with the error that stopped parsing. Everything parsed up to that
//! point (including completed structured data elements) is kept.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::error::ParseError;
use crate::message::{StructuredData, SyslogMessage, decode_priority};
use crate::parser::ParsedResult;

// =============================================================================
// Constants
// =============================================================================

const NIL: u8 = b'-';
const SP: u8 = b' ';
const BOM: &[u8] = b"\xEF\xBB\xBF";

const MAX_HOSTNAME_LEN: usize = 255;
const MAX_APPNAME_LEN: usize = 48;
const MAX_PROCID_LEN: usize = 128;
const MAX_MSGID_LEN: usize = 32;
const MAX_SD_NAME_LEN: usize = 32;

/// TIME-SECFRAC allows at most microsecond precision
const MAX_SECFRAC_DIGITS: usize = 6;

// =============================================================================
// Entry Point
// =============================================================================

/// Parse one RFC5424 message
pub fn parse(input: &[u8], best_effort: bool) -> ParsedResult {
    if input.is_empty() {
        return ParsedResult::failed(ParseError::Empty);
    }

    let mut cursor = Cursor::new(input);
    let mut message = match cursor.priority_and_version() {
        Ok(message) => message,
        Err(e) => return ParsedResult::failed(e),
    };

    match cursor.remainder(&mut message) {
        Ok(()) => ParsedResult::parsed(message),
        Err(e) if best_effort => ParsedResult::partial(message, e),
        Err(e) => ParsedResult::failed(e),
    }
}

// =============================================================================
// Cursor
// =============================================================================

struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_space(&mut self) -> Result<(), ParseError> {
        if self.eat(SP) {
            Ok(())
        } else {
            Err(ParseError::Space(self.pos))
        }
    }

    /// Length of the run of bytes matching `pred` starting at the cursor
    fn run_len(&self, pred: impl Fn(u8) -> bool) -> usize {
        self.input[self.pos..].iter().take_while(|b| pred(**b)).count()
    }

    /// Consume up to `max` ASCII digits
    fn digits(&mut self, max: usize) -> &'a [u8] {
        let input = self.input;
        let start = self.pos;
        let len = self.run_len(|b| b.is_ascii_digit()).min(max);
        self.pos += len;
        &input[start..start + len]
    }

    fn priority_and_version(&mut self) -> Result<SyslogMessage, ParseError> {
        let prival = self.priority()?;
        let version = self.version()?;
        let (facility, severity) = decode_priority(prival).ok_or(ParseError::PriorityRange(1))?;
        Ok(SyslogMessage::new(facility, severity, version))
    }

    /// `"<" PRIVAL ">"`, PRIVAL = 1*3DIGIT in 0..=191 without leading zeros
    fn priority(&mut self) -> Result<u8, ParseError> {
        if !self.eat(b'<') {
            return Err(ParseError::Priority(self.pos));
        }

        let start = self.pos;
        let digits = self.digits(3);
        if digits.is_empty() || (digits.len() > 1 && digits[0] == b'0') {
            return Err(ParseError::Priority(start));
        }
        if !self.eat(b'>') {
            return Err(ParseError::Priority(self.pos));
        }

        u8::try_from(to_number(digits))
            .ok()
            .filter(|prival| *prival <= 191)
            .ok_or(ParseError::PriorityRange(start))
    }

    /// `NONZERO-DIGIT 0*2DIGIT`
    fn version(&mut self) -> Result<u16, ParseError> {
        if !matches!(self.peek(), Some(b'1'..=b'9')) {
            return Err(ParseError::Version(self.pos));
        }
        Ok(to_number(self.digits(3)))
    }

    /// Everything after VERSION
    fn remainder(&mut self, message: &mut SyslogMessage) -> Result<(), ParseError> {
        self.expect_space()?;
        message.timestamp = self.timestamp()?;
        self.expect_space()?;
        message.hostname = self.header_field(MAX_HOSTNAME_LEN, ParseError::Hostname)?;
        self.expect_space()?;
        message.appname = self.header_field(MAX_APPNAME_LEN, ParseError::AppName)?;
        self.expect_space()?;
        message.procid = self.header_field(MAX_PROCID_LEN, ParseError::ProcId)?;
        self.expect_space()?;
        message.msgid = self.header_field(MAX_MSGID_LEN, ParseError::MsgId)?;
        self.expect_space()?;
        self.structured_data(message)?;

        match self.peek() {
            None => Ok(()),
            Some(SP) => {
                self.pos += 1;
                message.message = self.msg();
                Ok(())
            }
            Some(_) => Err(ParseError::Space(self.pos)),
        }
    }

    fn timestamp(&mut self) -> Result<Option<DateTime<FixedOffset>>, ParseError> {
        let start = self.pos;
        let len = self.run_len(is_print_ascii);
        let token = &self.input[start..start + len];

        if token == [NIL] {
            self.pos += 1;
            return Ok(None);
        }

        let text = std::str::from_utf8(token).map_err(|_| ParseError::Timestamp(start))?;
        if !is_rfc5424_timestamp(text) {
            return Err(ParseError::Timestamp(start));
        }
        let timestamp =
            DateTime::parse_from_rfc3339(text).map_err(|_| ParseError::Timestamp(start))?;

        self.pos += len;
        Ok(Some(timestamp))
    }

    /// NILVALUE or `1*max PRINTUSASCII`
    fn header_field(
        &mut self,
        max: usize,
        error: fn(usize) -> ParseError,
    ) -> Result<Option<String>, ParseError> {
        let start = self.pos;
        let len = self.run_len(is_print_ascii);
        if len == 0 || len > max {
            return Err(error(start));
        }
        self.pos += len;

        let token = &self.input[start..self.pos];
        if token == [NIL] {
            return Ok(None);
        }
        ascii_string(token).map(Some).ok_or(error(start))
    }

    fn structured_data(&mut self, message: &mut SyslogMessage) -> Result<(), ParseError> {
        if self.eat(NIL) {
            return Ok(());
        }
        if self.peek() != Some(b'[') {
            return Err(ParseError::StructuredData(self.pos));
        }

        let mut elements = StructuredData::new();
        let result = self.sd_elements(&mut elements);
        if !elements.is_empty() {
            message.structured_data = Some(elements);
        }
        result
    }

    fn sd_elements(&mut self, elements: &mut StructuredData) -> Result<(), ParseError> {
        while self.peek() == Some(b'[') {
            let element_start = self.pos;
            self.pos += 1;

            let id = self.sd_name(ParseError::SdId)?;
            let mut params = BTreeMap::new();

            loop {
                match self.peek() {
                    Some(b']') => {
                        self.pos += 1;
                        break;
                    }
                    Some(SP) => {
                        self.pos += 1;
                        let name = self.sd_name(ParseError::SdParamName)?;
                        if !self.eat(b'=') {
                            return Err(ParseError::SdParamName(self.pos));
                        }
                        let value = self.sd_param_value()?;
                        params.insert(name, value);
                    }
                    _ => return Err(ParseError::StructuredData(self.pos)),
                }
            }

            if elements.contains_key(&id) {
                return Err(ParseError::DuplicateSdId {
                    id,
                    position: element_start,
                });
            }
            elements.insert(id, params);
        }
        Ok(())
    }

    /// SD-NAME = 1*32PRINTUSASCII except '=', SP, ']', '"'
    fn sd_name(&mut self, error: fn(usize) -> ParseError) -> Result<String, ParseError> {
        let start = self.pos;
        let len = self.run_len(is_sd_name_char);
        if len == 0 || len > MAX_SD_NAME_LEN {
            return Err(error(start));
        }
        self.pos += len;
        ascii_string(&self.input[start..self.pos]).ok_or(error(start))
    }

    /// `%d34 PARAM-VALUE %d34` with `\"`, `\\` and `\]` unescaped
    fn sd_param_value(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        if !self.eat(b'"') {
            return Err(ParseError::SdParamValue(start));
        }

        let mut value = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::SdParamValue(start)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(escaped @ (b'"' | b'\\' | b']')) => {
                            value.push(escaped);
                            self.pos += 1;
                        }
                        // A lone backslash is an ordinary character
                        _ => value.push(b'\\'),
                    }
                }
                Some(byte) => {
                    value.push(byte);
                    self.pos += 1;
                }
            }
        }

        String::from_utf8(value).map_err(|_| ParseError::SdParamValue(start))
    }

    /// MSG: optional BOM, then any octets up to the end of input
    fn msg(&mut self) -> Option<String> {
        let rest = &self.input[self.pos..];
        let rest = rest.strip_prefix(BOM).unwrap_or(rest);
        self.pos = self.input.len();

        if rest.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(rest).into_owned())
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

#[inline]
fn is_print_ascii(byte: u8) -> bool {
    (33..=126).contains(&byte)
}

#[inline]
fn is_sd_name_char(byte: u8) -> bool {
    is_print_ascii(byte) && !matches!(byte, b'=' | b']' | b'"')
}

fn ascii_string(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}

fn to_number(digits: &[u8]) -> u16 {
    digits
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'))
}

/// RFC5424 narrows RFC3339: uppercase `T`, at most six fractional digits
fn is_rfc5424_timestamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.get(10) != Some(&b'T') {
        return false;
    }
    match bytes.get(19) {
        Some(b'.') => {
            let fraction = bytes[20..].iter().take_while(|b| b.is_ascii_digit()).count();
            (1..=MAX_SECFRAC_DIGITS).contains(&fraction)
        }
        _ => true,
    }
}

#[cfg(test)]
#[path = "rfc5424_test.rs"]
mod rfc5424_test;
