//! Decoding of calendar server responses into operation chains.
//!
//! A response is a flat sequence of operations. Each starts with a one-byte
//! type tag. APPEND and PREPEND carry a length-prefixed value; ATTESTATION
//! carries an 8-byte magic tag followed by a length-prefixed payload whose
//! layout depends on the tag.

use sst_types::{AttestationStatus, Error, Operation, OperationType, Result};

use crate::varint::{read_length_prefixed, read_varint, write_length_prefixed, write_varint};

pub const ATTESTATION_TAG_SIZE: usize = 8;

pub const BITCOIN_TAG: [u8; ATTESTATION_TAG_SIZE] = [0x05, 0x88, 0x96, 0x0d, 0x73, 0xd7, 0x19, 0x01];
pub const LITECOIN_TAG: [u8; ATTESTATION_TAG_SIZE] = [0x06, 0x86, 0x9a, 0x0d, 0x73, 0xd7, 0x1b, 0x45];
pub const PENDING_TAG: [u8; ATTESTATION_TAG_SIZE] = [0x83, 0xdf, 0xe3, 0x0d, 0x2e, 0xf9, 0x0c, 0x8e];

const ATTESTATION_TAGS: [([u8; ATTESTATION_TAG_SIZE], AttestationStatus); 3] = [
    (BITCOIN_TAG, AttestationStatus::Bitcoin),
    (LITECOIN_TAG, AttestationStatus::Litecoin),
    (PENDING_TAG, AttestationStatus::Pending),
];

/// Parse a complete calendar response. Any malformed or unknown operation
/// fails the whole parse.
pub fn parse(bytes: &[u8]) -> Result<Vec<Operation>> {
    let mut operations = Vec::new();
    let mut remainder = bytes;

    while let Some((&tag, rest)) = remainder.split_first() {
        let kind = OperationType::try_from(i32::from(tag))
            .map_err(|_| Error::UnsupportedOperation(tag))?;
        remainder = rest;

        let operation = match kind {
            OperationType::Sha1 => Operation::sha1(),
            OperationType::Ripemd160 => Operation::ripemd160(),
            OperationType::Sha256 => Operation::sha256(),
            OperationType::Append | OperationType::Prepend => {
                let (value, rest) = read_length_prefixed(remainder)?;
                remainder = rest;
                if kind == OperationType::Append {
                    Operation::append(value.to_vec())
                } else {
                    Operation::prepend(value.to_vec())
                }
            }
            OperationType::Attestation => {
                let (operation, rest) = parse_attestation(remainder)?;
                remainder = rest;
                operation
            }
        };

        operations.push(operation);
    }

    Ok(operations)
}

/// Status for an 8-byte magic tag; anything unrecognized is UNKNOWN.
pub fn attestation_status(tag: &[u8]) -> AttestationStatus {
    ATTESTATION_TAGS
        .iter()
        .find(|(known, _)| known.as_slice() == tag)
        .map_or(AttestationStatus::Unknown, |(_, status)| *status)
}

fn parse_attestation(bytes: &[u8]) -> Result<(Operation, &[u8])> {
    if bytes.len() < ATTESTATION_TAG_SIZE {
        return Err(Error::TruncatedInput {
            needed: ATTESTATION_TAG_SIZE,
            available: bytes.len(),
        });
    }
    let (tag, rest) = bytes.split_at(ATTESTATION_TAG_SIZE);
    let (payload, rest) = read_length_prefixed(rest)?;

    // The payload has its own framing, independent of the outer stream
    let operation = match attestation_status(tag) {
        AttestationStatus::Pending => {
            let (url, _) = read_length_prefixed(payload)?;
            let url = std::str::from_utf8(url).map_err(|_| Error::InvalidCalendarUrl)?;
            Operation::pending(url)
        }
        status @ (AttestationStatus::Bitcoin | AttestationStatus::Litecoin) => {
            let (height, _) = read_varint(payload)?;
            let height = u32::try_from(height).map_err(|_| Error::VarintOverflow)?;
            Operation::anchored(status, height)
        }
        _ => Operation::unknown_attestation(),
    };

    Ok((operation, rest))
}

/// Write operations back out in calendar wire format.
///
/// Attestations whose status has no magic tag (UNKNOWN, INVALID) cannot be
/// written, since the parsed tag and payload are not retained.
pub fn serialize(operations: &[Operation]) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    for operation in operations {
        let kind = OperationType::try_from(operation.kind)
            .map_err(|_| Error::UnhandledOperation(operation.kind))?;
        out.push(kind as u8);

        match kind {
            OperationType::Sha1 | OperationType::Ripemd160 | OperationType::Sha256 => {}
            OperationType::Append | OperationType::Prepend => {
                write_length_prefixed(&operation.value, &mut out);
            }
            OperationType::Attestation => {
                let status = AttestationStatus::try_from(operation.status)
                    .map_err(|_| Error::UnserializableAttestation(operation.status))?;
                let (tag, payload) = match status {
                    AttestationStatus::Pending => {
                        let mut payload = Vec::new();
                        write_length_prefixed(operation.calendar_url.as_bytes(), &mut payload);
                        (PENDING_TAG, payload)
                    }
                    AttestationStatus::Bitcoin | AttestationStatus::Litecoin => {
                        let mut payload = Vec::new();
                        write_varint(u64::from(operation.block_height), &mut payload);
                        let tag = if status == AttestationStatus::Bitcoin {
                            BITCOIN_TAG
                        } else {
                            LITECOIN_TAG
                        };
                        (tag, payload)
                    }
                    AttestationStatus::Unknown | AttestationStatus::Invalid => {
                        return Err(Error::UnserializableAttestation(operation.status))
                    }
                };
                out.extend_from_slice(&tag);
                write_length_prefixed(&payload, &mut out);
            }
        }
    }

    Ok(out)
}

/// Reverse a byte sequence (on-chain display order).
pub fn reverse(input: &[u8]) -> Vec<u8> {
    input.iter().rev().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DIGEST_RESPONSE: &str = include_str!("../../testdata/digest-01-request.hex");
    const TIMESTAMP_RESPONSE: &str = include_str!("../../testdata/digest-01-response.hex");

    const BOB: &str = "https://bob.btc.calendar.opentimestamps.org";

    fn fixture(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str.trim()).unwrap()
    }

    #[test]
    fn test_parse_digest_response() {
        let operations = parse(&fixture(DIGEST_RESPONSE)).unwrap();

        assert_eq!(operations.len(), 5);
        assert_eq!(operations[0].kind, OperationType::Append as i32);
        assert_eq!(operations[1], Operation::sha256());
        assert_eq!(hex::encode(&operations[2].value), "5e6d10ee");
        assert_eq!(operations[2].kind, OperationType::Prepend as i32);
        assert_eq!(hex::encode(&operations[3].value), "21de054589a79bd4");
        assert_eq!(operations[4], Operation::pending(BOB));
        assert_eq!(operations[4].block_height, 0);
    }

    #[test]
    fn test_parse_timestamp_response() {
        let operations = parse(&fixture(TIMESTAMP_RESPONSE)).unwrap();

        assert_eq!(operations.len(), 66);
        assert_eq!(
            hex::encode(&operations[25].value),
            "010000000145238927573033099b6c10c16a37657fdd891f2057e6a9e5c248c774c9b76c5d0000000000fdffffff02fe5b0500000000001600142a8d531f9f574785bd735fb3b8bddd5789a78e090000000000000000226a20"
        );
        assert_eq!(hex::encode(&operations[26].value), "177a0900");
        assert_eq!(
            operations[65],
            Operation::anchored(AttestationStatus::Bitcoin, 621_080)
        );
    }

    #[test]
    fn test_sha1_and_ripemd160_parse() {
        let mut bytes = fixture(DIGEST_RESPONSE);
        // Byte 18 is the SHA256 tag following the first APPEND
        assert_eq!(bytes[18], 0x08);

        bytes[18] = 0x02;
        assert_eq!(parse(&bytes).unwrap()[1], Operation::sha1());

        bytes[18] = 0x03;
        assert_eq!(parse(&bytes).unwrap()[1], Operation::ripemd160());
    }

    #[test]
    fn test_unknown_magic_tag_is_unknown_status() {
        let hex_str = DIGEST_RESPONSE.trim().replace("83dfe30d2ef90c8e", "0123456789abcdef");
        let operations = parse(&hex::decode(hex_str).unwrap()).unwrap();

        assert_eq!(operations.len(), 5);
        assert_eq!(operations[4].status, AttestationStatus::Unknown as i32);
        assert!(operations[4].calendar_url.is_empty());
    }

    #[test]
    fn test_litecoin_attestation() {
        // SHA256, then a LITECOIN attestation at height 1234567
        let bytes = hex::decode("080006869a0d73d71b450387ad4b").unwrap();
        let operations = parse(&bytes).unwrap();

        assert_eq!(operations.len(), 2);
        assert_eq!(operations[0], Operation::sha256());
        assert_eq!(
            operations[1],
            Operation::anchored(AttestationStatus::Litecoin, 1_234_567)
        );
        assert!(operations[1].calendar_url.is_empty());

        assert_eq!(serialize(&operations).unwrap(), bytes);
    }

    #[test]
    fn test_unknown_tag_mid_stream_fails_whole_parse() {
        let mut bytes = fixture(DIGEST_RESPONSE);
        bytes[18] = 0x42;
        assert!(matches!(parse(&bytes), Err(Error::UnsupportedOperation(0x42))));

        // Valid operations followed by garbage still produce no partial result
        let mut bytes = fixture(TIMESTAMP_RESPONSE);
        bytes.push(0x01);
        assert!(matches!(parse(&bytes), Err(Error::UnsupportedOperation(0x01))));
    }

    #[test]
    fn test_corrupted_bitcoin_tag_fails() {
        // Replacing the tag shifts the stream, leaving bytes that are not operations
        let hex_str = TIMESTAMP_RESPONSE
            .trim()
            .replace("0588960d73d71901", "ffffffffffffffff00");
        assert!(parse(&hex::decode(hex_str).unwrap()).is_err());
    }

    #[test]
    fn test_truncated_response() {
        let bytes = fixture(DIGEST_RESPONSE);
        let truncated = &bytes[..bytes.len() - 4];
        assert!(matches!(parse(truncated), Err(Error::TruncatedInput { .. })));
    }

    #[test]
    fn test_truncated_attestation_tag() {
        let bytes = [0x00, 0x83, 0xdf, 0xe3];
        assert!(matches!(
            parse(&bytes),
            Err(Error::TruncatedInput {
                needed: 8,
                available: 3
            })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_serialize_matches_fixture() {
        let bytes = fixture(TIMESTAMP_RESPONSE);
        let operations = parse(&bytes).unwrap();
        assert_eq!(serialize(&operations).unwrap(), bytes);
    }

    #[test]
    fn test_serialize_rejects_unknown_attestation() {
        let result = serialize(&[Operation::unknown_attestation()]);
        assert!(matches!(result, Err(Error::UnserializableAttestation(1))));
    }

    #[test]
    fn test_reverse() {
        let hash =
            hex::decode("093febd0f49a812931239b920acabbab20c3511a49d44e79effba8d44ec2b102").unwrap();
        assert_eq!(
            hex::encode(reverse(&hash)),
            "02b1c24ed4a8fbef794ed4491a51c320abbbca0a929b233129819af4d0eb3f09"
        );
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            let _ = parse(&bytes);
        }

        #[test]
        fn prop_truncated_attestation_never_parses(cut in 1usize..54) {
            // The trailing pending attestation spans the last 54 bytes
            let bytes = fixture(DIGEST_RESPONSE);
            prop_assert!(parse(&bytes[..bytes.len() - cut]).is_err());
        }
    }
}
