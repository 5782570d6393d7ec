use almacen_relay::core::RelayError;
use almacen_relay::core::protocol::{MAX_FRAME_SIZE, WireFrame, WireFrameCodec};
use bytes::BytesMut;
use serde_json::json;
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn test_decode_waits_for_a_complete_line() {
    let mut codec = WireFrameCodec;
    let mut buf = BytesMut::from(&br#"{"event":"update user","data":{"id":"u1""#[..]);

    assert!(codec.decode(&mut buf).unwrap().is_none());

    buf.extend_from_slice(b"}}\n");
    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.event, "update user");
    assert_eq!(frame.data, json!({"id": "u1"}));
    assert!(codec.decode(&mut buf).unwrap().is_none());
}

#[test]
fn test_decode_two_frames_from_one_buffer() {
    let mut codec = WireFrameCodec;
    let mut buf = BytesMut::from(
        &b"{\"event\":\"update marca\",\"data\":{\"id\":1}}\n{\"event\":\"update categoria\",\"data\":{\"id\":2}}\n"[..],
    );

    let first = codec.decode(&mut buf).unwrap().unwrap();
    let second = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(first.event, "update marca");
    assert_eq!(second.event, "update categoria");
    assert!(buf.is_empty());
}

#[test]
fn test_decode_skips_blank_lines_and_accepts_crlf() {
    let mut codec = WireFrameCodec;
    let mut buf = BytesMut::from(&b"\n\r\n{\"event\":\"update user\"}\r\n"[..]);

    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.event, "update user");
    // A frame without data defaults to null.
    assert_eq!(frame.data, json!(null));
}

#[test]
fn test_decode_rejects_malformed_json_but_consumes_the_line() {
    let mut codec = WireFrameCodec;
    let mut buf = BytesMut::from(&b"not json at all\n{\"event\":\"update user\"}\n"[..]);

    let err = codec.decode(&mut buf).unwrap_err();
    assert!(matches!(err, RelayError::MalformedFrame(_)));

    // The stream re-synchronizes at the next line.
    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.event, "update user");
}

#[test]
fn test_decode_rejects_oversized_frames() {
    let mut codec = WireFrameCodec;
    let mut buf = BytesMut::new();
    buf.resize(MAX_FRAME_SIZE + 2, b'x');

    let err = codec.decode(&mut buf).unwrap_err();
    assert_eq!(err, RelayError::FrameTooLarge(MAX_FRAME_SIZE));
}

#[test]
fn test_encode_decode_roundtrip() {
    let mut codec = WireFrameCodec;
    let frame = WireFrame::new("user updated", json!({"id": "u42", "estado": false}));

    let mut buf = BytesMut::new();
    codec.encode(frame.clone(), &mut buf).unwrap();
    assert_eq!(buf.last(), Some(&b'\n'));

    let decoded = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(decoded, frame);
}

#[test]
fn test_encode_to_bytes_matches_codec_output() {
    let frame = WireFrame::new("force logout", json!("u42"));
    let bytes = frame.encode_to_bytes().unwrap();

    let mut buf = BytesMut::from(&bytes[..]);
    let decoded = WireFrameCodec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(decoded, frame);
}
