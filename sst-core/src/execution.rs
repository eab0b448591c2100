//! Operation chain execution
//!
//! Two folds over the same operation semantics: [`derive_key`] stops at the
//! first attestation and yields the calendar lookup key, [`fold`] runs the
//! whole chain and recovers the proof artifacts embedded along the way.

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest as _, Sha256};
use sst_types::{Attestation, CalendarKey, Error, Operation, OperationType, Result};

use crate::parser::reverse;

/// An APPEND of exactly this many bytes closes a serialized transaction
/// (the trailing lock time).
const LOCK_TIME_SIZE: usize = 4;

/// A PREPEND longer than this is the transaction body preceding the
/// timestamp Merkle root.
const TRANSACTION_PREFIX_THRESHOLD: usize = 64;

enum Step<'a> {
    Sha1,
    Ripemd160,
    Sha256,
    Append(&'a [u8]),
    Prepend(&'a [u8]),
    Attest(&'a Operation),
}

impl<'a> Step<'a> {
    fn of(operation: &'a Operation) -> Result<Self> {
        let kind = OperationType::try_from(operation.kind)
            .map_err(|_| Error::UnhandledOperation(operation.kind))?;

        Ok(match kind {
            OperationType::Sha1 => Self::Sha1,
            OperationType::Ripemd160 => Self::Ripemd160,
            OperationType::Sha256 => Self::Sha256,
            OperationType::Append => Self::Append(&operation.value),
            OperationType::Prepend => Self::Prepend(&operation.value),
            OperationType::Attestation => Self::Attest(operation),
        })
    }

    /// Transform the accumulator. Attestations leave it untouched.
    fn apply(&self, accumulator: Vec<u8>) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(&accumulator).to_vec(),
            Self::Ripemd160 => Ripemd160::digest(&accumulator).to_vec(),
            Self::Sha256 => sha256(&accumulator),
            Self::Append(value) => [accumulator.as_slice(), *value].concat(),
            Self::Prepend(value) => [*value, accumulator.as_slice()].concat(),
            Self::Attest(_) => accumulator,
        }
    }
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Fold `initial` through the operations preceding the first attestation.
///
/// A chain with no attestation is folded in full.
pub fn derive_key(initial: &[u8], operations: &[Operation]) -> Result<CalendarKey> {
    let mut accumulator = initial.to_vec();

    for operation in operations {
        let step = Step::of(operation)?;
        if matches!(step, Step::Attest(_)) {
            break;
        }
        accumulator = step.apply(accumulator);
    }

    Ok(CalendarKey::new(accumulator))
}

/// Proof fields observed during a fold, applied to the attestation once the
/// whole chain has been consumed.
#[derive(Debug, Default)]
struct ProofBuilder {
    status: Option<i32>,
    calendar_url: Option<String>,
    block_height: Option<u32>,
    transaction_id: Option<Vec<u8>>,
    timestamp_merkle_root: Option<Vec<u8>>,
}

impl ProofBuilder {
    fn observe(mut self, step: &Step<'_>, before: &[u8], after: &[u8]) -> Self {
        match step {
            Step::Append(value) if value.len() == LOCK_TIME_SIZE => {
                self.transaction_id = Some(reverse(&double_sha256(after)));
            }
            Step::Prepend(value) if value.len() > TRANSACTION_PREFIX_THRESHOLD => {
                self.timestamp_merkle_root = Some(before.to_vec());
            }
            Step::Attest(operation) => {
                self.status = Some(operation.status);
                if !operation.calendar_url.is_empty() {
                    self.calendar_url = Some(operation.calendar_url.clone());
                }
                if operation.block_height != 0 {
                    self.block_height = Some(operation.block_height);
                }
            }
            _ => {}
        }
        self
    }

    fn build(self, mut attestation: Attestation, accumulator: &[u8]) -> Attestation {
        if let Some(status) = self.status {
            attestation.status = status;
        }
        if let Some(url) = self.calendar_url {
            attestation.calendar_url = url;
        }
        if let Some(height) = self.block_height {
            attestation.block_height = height;
        }
        if let Some(txid) = self.transaction_id {
            attestation.transaction_id = txid;
        }
        if let Some(root) = self.timestamp_merkle_root {
            attestation.timestamp_merkle_root = root;
        }
        if attestation.block_height != 0 {
            attestation.block_merkle_root = reverse(accumulator);
        }
        attestation
    }
}

/// Fold `initial` through every operation of `attestation`, filling in its
/// status, calendar URL, block height and recovered Merkle data.
///
/// Any unrecognized operation type fails the whole fold and no field of the
/// attestation is changed.
pub fn fold(initial: &[u8], attestation: Attestation) -> Result<Attestation> {
    let (accumulator, proof) = attestation.operations.iter().try_fold(
        (initial.to_vec(), ProofBuilder::default()),
        |(accumulator, proof), operation| {
            let step = Step::of(operation)?;
            let next = step.apply(accumulator.clone());
            let proof = proof.observe(&step, &accumulator, &next);
            Ok::<_, Error>((next, proof))
        },
    )?;

    Ok(proof.build(attestation, &accumulator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use proptest::prelude::*;
    use sst_types::AttestationStatus;

    const HASH: &str = "093febd0f49a812931239b920acabbab20c3511a49d44e79effba8d44ec2b102";
    const DIGEST_RESPONSE: &str = include_str!("../../testdata/digest-01-request.hex");

    fn hash() -> Vec<u8> {
        hex::decode(HASH).unwrap()
    }

    fn digest_operations() -> Vec<Operation> {
        parse(&hex::decode(DIGEST_RESPONSE.trim()).unwrap()).unwrap()
    }

    #[test]
    fn test_derive_key() {
        let key = derive_key(&hash(), &digest_operations()).unwrap();
        assert_eq!(
            key.to_hex(),
            "5e6d10ee8c8db23b3cf21796e1fcb74499d8d756653ab6134d4fcf92c6f0bb61f0a37f3d21de054589a79bd4"
        );
    }

    #[test]
    fn test_derive_key_without_attestation() {
        let operations = digest_operations();
        let key = derive_key(&hash(), &operations[..operations.len() - 2]).unwrap();
        assert_eq!(
            key.to_hex(),
            "5e6d10ee8c8db23b3cf21796e1fcb74499d8d756653ab6134d4fcf92c6f0bb61f0a37f3d"
        );
    }

    #[test]
    fn test_derive_key_of_empty_chain_is_initial() {
        let key = derive_key(&hash(), &[]).unwrap();
        assert_eq!(key.as_bytes(), hash().as_slice());
    }

    #[test]
    fn test_fold_pending() {
        let folded = fold(&hash(), Attestation::with_operations(digest_operations())).unwrap();

        assert_eq!(folded.calendar_url, "https://bob.btc.calendar.opentimestamps.org");
        assert_eq!(folded.status, AttestationStatus::Pending as i32);
        assert_eq!(folded.block_height, 0);
        assert!(folded.block_merkle_root.is_empty());
        assert!(folded.transaction_id.is_empty());
        assert!(folded.timestamp_merkle_root.is_empty());
    }

    #[test]
    fn test_fold_keeps_existing_url() {
        let mut operations = digest_operations();
        operations.push(Operation::anchored(AttestationStatus::Litecoin, 0));
        let folded = fold(&hash(), Attestation::with_operations(operations)).unwrap();

        // Last attestation wins for status; empty URL and zero height do not overwrite
        assert_eq!(folded.status, AttestationStatus::Litecoin as i32);
        assert_eq!(folded.calendar_url, "https://bob.btc.calendar.opentimestamps.org");
        assert!(folded.block_merkle_root.is_empty());
    }

    #[test]
    fn test_sha1_and_ripemd160_fold() {
        for replacement in [Operation::sha1(), Operation::ripemd160()] {
            let mut operations = digest_operations();
            operations[1] = replacement;
            assert!(derive_key(&hash(), &operations).is_ok());
            assert!(fold(&hash(), Attestation::with_operations(operations)).is_ok());
        }
    }

    #[test]
    fn test_invalid_operation_type() {
        let mut operations = digest_operations();
        operations[0].kind = 123;

        let result = fold(&hash(), Attestation::with_operations(operations.clone()));
        assert!(matches!(result, Err(Error::UnhandledOperation(123))));
        assert!(matches!(
            derive_key(&hash(), &operations),
            Err(Error::UnhandledOperation(123))
        ));
    }

    #[test]
    fn test_transaction_id_from_four_byte_append() {
        let operations = vec![Operation::append(vec![0, 0, 0, 0])];
        let folded = fold(b"tx", Attestation::with_operations(operations)).unwrap();

        let mut expected = double_sha256(b"tx\0\0\0\0");
        expected.reverse();
        assert_eq!(folded.transaction_id, expected);
    }

    #[test]
    fn test_timestamp_merkle_root_is_pre_prepend_accumulator() {
        let operations = vec![Operation::sha256(), Operation::prepend(vec![7; 65])];
        let folded = fold(b"root", Attestation::with_operations(operations)).unwrap();
        assert_eq!(folded.timestamp_merkle_root, sha256(b"root"));

        // 64 bytes is not enough
        let operations = vec![Operation::prepend(vec![7; 64])];
        let folded = fold(b"root", Attestation::with_operations(operations)).unwrap();
        assert!(folded.timestamp_merkle_root.is_empty());
    }

    #[test]
    fn test_block_merkle_root_is_reversed_accumulator() {
        let operations = vec![
            Operation::sha256(),
            Operation::anchored(AttestationStatus::Bitcoin, 1),
        ];
        let folded = fold(b"block", Attestation::with_operations(operations)).unwrap();
        assert_eq!(folded.block_merkle_root, reverse(&sha256(b"block")));
    }

    prop_compose! {
        fn arb_operation()(choice in 0u8..5, value in prop::collection::vec(any::<u8>(), 0..80)) -> Operation {
            match choice {
                0 => Operation::sha1(),
                1 => Operation::ripemd160(),
                2 => Operation::sha256(),
                3 => Operation::append(value),
                _ => Operation::prepend(value),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_fold_is_deterministic(
            initial in prop::collection::vec(any::<u8>(), 1..64),
            operations in prop::collection::vec(arb_operation(), 0..16),
        ) {
            let first = fold(&initial, Attestation::with_operations(operations.clone())).unwrap();
            let second = fold(&initial, Attestation::with_operations(operations)).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_key_survives_continuation(
            prefix in prop::collection::vec(arb_operation(), 0..8),
            continuation in prop::collection::vec(arb_operation(), 0..8),
        ) {
            let mut operations = prefix;
            operations.push(Operation::pending("https://calendar.example"));
            let before = derive_key(b"initial", &operations).unwrap();

            operations.extend(continuation);
            operations.push(Operation::anchored(AttestationStatus::Bitcoin, 1));
            prop_assert_eq!(before, derive_key(b"initial", &operations).unwrap());
        }
    }
}
