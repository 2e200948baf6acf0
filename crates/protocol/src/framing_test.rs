//! Tests for RFC5425 octet-counted framing

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::{FrameError, ParseError};
use crate::framing::OctetCountingDecoder;

fn frame(msg: &str) -> String {
    format!("{} {}", msg.len(), msg)
}

#[test]
fn test_decodes_back_to_back_frames() {
    let mut decoder = OctetCountingDecoder::new(false);
    let input = format!(
        "{}{}",
        frame("<14>1 - host1 - - - - first"),
        frame("<14>1 - host2 - - - - second")
    );
    let mut buf = BytesMut::from(input.as_bytes());

    let first = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(first.message.unwrap().hostname.as_deref(), Some("host1"));

    let second = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(second.message.unwrap().message.as_deref(), Some("second"));

    assert!(decoder.decode(&mut buf).unwrap().is_none());
    assert!(buf.is_empty());
}

#[test]
fn test_frame_split_across_reads() {
    let mut decoder = OctetCountingDecoder::new(false);
    let input = frame("<14>1 - - - - - - split message");
    let (head, tail) = input.split_at(7);

    let mut buf = BytesMut::from(&head.as_bytes()[..2]);
    assert!(decoder.decode(&mut buf).unwrap().is_none());

    buf.extend_from_slice(&head.as_bytes()[2..]);
    assert!(decoder.decode(&mut buf).unwrap().is_none());

    buf.extend_from_slice(tail.as_bytes());
    let result = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(result.message.unwrap().message.as_deref(), Some("split message"));
}

#[test]
fn test_message_error_does_not_break_framing() {
    let mut decoder = OctetCountingDecoder::new(false);
    let input = format!("{}{}", frame("garbage"), frame("<14>1 - - - - - - ok"));
    let mut buf = BytesMut::from(input.as_bytes());

    let bad = decoder.decode(&mut buf).unwrap().unwrap();
    assert!(bad.message.is_none());
    assert_eq!(bad.error, Some(ParseError::Priority(0)));

    let good = decoder.decode(&mut buf).unwrap().unwrap();
    assert!(good.is_ok());
}

#[test]
fn test_invalid_length_prefix() {
    let mut decoder = OctetCountingDecoder::new(false);

    let mut buf = BytesMut::from("<14>1 - - - - - -");
    assert!(matches!(
        decoder.decode(&mut buf),
        Err(FrameError::InvalidLength { position: 0 })
    ));

    let mut decoder = OctetCountingDecoder::new(false);
    let mut buf = BytesMut::from("012 <14>1 ");
    assert!(matches!(
        decoder.decode(&mut buf),
        Err(FrameError::InvalidLength { position: 0 })
    ));

    let mut decoder = OctetCountingDecoder::new(false);
    let mut buf = BytesMut::from("12x");
    assert!(matches!(
        decoder.decode(&mut buf),
        Err(FrameError::InvalidLength { position: 2 })
    ));
}

#[test]
fn test_overlong_length_prefix() {
    let mut decoder = OctetCountingDecoder::new(false);
    let mut buf = BytesMut::from("12345678901");
    assert!(matches!(
        decoder.decode(&mut buf),
        Err(FrameError::InvalidLength { position: 10 })
    ));
}

#[test]
fn test_frame_too_large() {
    let mut decoder = OctetCountingDecoder::new(false).with_max_frame_length(16);
    let mut buf = BytesMut::from("17 ");
    assert!(matches!(
        decoder.decode(&mut buf),
        Err(FrameError::TooLarge { length: 17, max: 16 })
    ));
}

#[test]
fn test_decode_eof_with_partial_frame() {
    let mut decoder = OctetCountingDecoder::new(false);
    let mut buf = BytesMut::from("30 <14>1 - -");
    assert!(decoder.decode(&mut buf).unwrap().is_none());
    assert!(matches!(
        decoder.decode_eof(&mut buf),
        Err(FrameError::Truncated { remaining: 9 })
    ));
}

#[test]
fn test_decode_eof_on_clean_boundary() {
    let mut decoder = OctetCountingDecoder::new(false);
    let mut buf = BytesMut::from(frame("<14>1 - - - - - -").as_bytes());
    assert!(decoder.decode_eof(&mut buf).unwrap().is_some());
    assert!(decoder.decode_eof(&mut buf).unwrap().is_none());
}

#[test]
fn test_best_effort_flows_through_decoder() {
    let mut decoder = OctetCountingDecoder::new(true);
    let mut buf = BytesMut::from(frame("<14>1 - host - - - [x").as_bytes());
    let result = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(result.message.unwrap().hostname.as_deref(), Some("host"));
    assert!(result.error.is_some());
}
