//! Wire Module Tests
//!
//! ## Test Scopes
//! - **Framing**: Header layout, hex case handling and the declared-length check.
//! - **Messages**: Id mapping and decoding of typed messages out of frames.

#[cfg(test)]
mod tests {
    use crate::error::V2vError;
    use crate::wire::codec::{self, HEADER_LEN, WireMessage};
    use crate::wire::messages::*;

    // ============================================================
    // FRAMING TESTS
    // ============================================================

    #[test]
    fn test_header_is_zero_padded_hex() {
        let frame = codec::encode(FOLLOW_REQUEST, b"abc").unwrap();

        // 1002 = 0x03ea
        assert_eq!(&frame[..HEADER_LEN], b"03ea000003");
        assert_eq!(&frame[HEADER_LEN..], b"abc");
    }

    #[test]
    fn test_roundtrip_preserves_id_and_payload() {
        let cases: [(u16, &[u8]); 3] = [
            (LEADER_STATUS, b"\x00\x01\x02\xff"),
            (u16::MAX, b""),
            (0, &[7u8; 300]),
        ];

        for (id, payload) in cases {
            let frame = codec::encode(id, payload).unwrap();
            let decoded = codec::decode(&frame).unwrap();

            assert_eq!(decoded, WireMessage::new(id, payload.to_vec()));
        }
    }

    #[test]
    fn test_decode_accepts_uppercase_hex() {
        let decoded = codec::decode(b"0BB9000002hi").unwrap();

        assert_eq!(decoded.id, FOLLOWER_STATUS);
        assert_eq!(decoded.payload, b"hi");
    }

    #[test]
    fn test_decode_rejects_short_frame() {
        let result = codec::decode(b"03ea0000");

        assert!(matches!(result, Err(V2vError::Malformed { .. })));
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut frame = codec::encode(STOP_FOLLOW, b"payload").unwrap();

        // One byte too many
        frame.push(b'!');
        assert!(matches!(codec::decode(&frame), Err(V2vError::Malformed { .. })));

        // Two bytes too few
        frame.truncate(frame.len() - 3);
        assert!(matches!(codec::decode(&frame), Err(V2vError::Malformed { .. })));
    }

    #[test]
    fn test_decode_rejects_non_hex_header() {
        assert!(matches!(
            codec::decode(b"03ez000000"),
            Err(V2vError::Malformed { .. })
        ));
        assert!(matches!(
            codec::decode(b"+3ea000000"),
            Err(V2vError::Malformed { .. })
        ));
    }

    #[test]
    fn test_header_only_frame_is_valid() {
        let decoded = codec::decode(b"03ec000000").unwrap();

        assert_eq!(decoded.id, STOP_FOLLOW);
        assert!(decoded.payload.is_empty());
    }

    // ============================================================
    // MESSAGE TESTS
    // ============================================================

    #[test]
    fn test_message_ids() {
        assert_eq!(ProtocolMessage::follow_request().id(), 1002);
        assert_eq!(ProtocolMessage::follow_response().id(), 1003);
        assert_eq!(ProtocolMessage::stop_follow().id(), 1004);
        assert_eq!(ProtocolMessage::follower_status().id(), 3001);
    }

    #[test]
    fn test_leader_status_survives_framing() {
        let msg = ProtocolMessage::LeaderStatus(LeaderStatus {
            timestamp_ms: 1_700_000_000_000,
            speed: 0.25,
            steering_angle: -0.1,
            distance_traveled: 12.5,
        });

        let frame = msg.to_frame().unwrap();
        let wire = codec::decode(&frame).unwrap();

        assert_eq!(wire.id, LEADER_STATUS);
        assert_eq!(ProtocolMessage::from_wire(&wire).unwrap(), msg);
    }

    #[test]
    fn test_announce_presence_survives_framing() {
        let msg = ProtocolMessage::AnnouncePresence(AnnouncePresence {
            vehicle_ip: "192.168.8.1".to_string(),
            group_id: "7".to_string(),
        });

        let wire = codec::decode(&msg.to_frame().unwrap()).unwrap();

        if let ProtocolMessage::AnnouncePresence(decoded) = ProtocolMessage::from_wire(&wire).unwrap() {
            assert_eq!(decoded.vehicle_ip, "192.168.8.1");
            assert_eq!(decoded.group_id, "7");
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_unknown_id_is_reported() {
        let wire = codec::decode(&codec::encode(4242, b"").unwrap()).unwrap();

        let result = ProtocolMessage::from_wire(&wire);

        assert!(matches!(result, Err(V2vError::UnknownMessageId(4242))));
    }

    #[test]
    fn test_truncated_payload_is_malformed() {
        // A LeaderStatus needs 20 bytes of fields; give it 3.
        let wire = WireMessage::new(LEADER_STATUS, vec![1, 2, 3]);

        let result = ProtocolMessage::from_wire(&wire);

        assert!(matches!(result, Err(V2vError::Malformed { .. })));
    }
}
