//! The timestamp aggregate: a content hash, the context mixed into its digest
//! hash, and one attestation per calendar.

use prost::Message;
use sha2::{Digest as _, Sha256};
use sst_types::{
    Attestation, CalendarKey, Digest, Error, Identity, Location, Nonce, Result, TimestampRecord,
};

use crate::execution::{derive_key, fold};
use crate::nonce::NonceGenerator;
use crate::parser::parse;

/// Current time as Unix seconds, saturating outside the `u32` range.
pub(crate) fn unix_now() -> u32 {
    saturating_u32(chrono::Utc::now().timestamp())
}

fn saturating_u32(seconds: i64) -> u32 {
    u32::try_from(seconds).unwrap_or(if seconds < 0 { 0 } else { u32::MAX })
}

#[derive(Clone, Debug, PartialEq)]
pub struct Timestamp {
    record: TimestampRecord,
}

impl Timestamp {
    /// Start a fresh timestamp for `hash` with a random nonce.
    pub fn new(hash: &[u8]) -> Result<Self> {
        Self::with_nonce(hash, NonceGenerator::new().generate())
    }

    pub fn with_nonce(hash: &[u8], nonce: Nonce) -> Result<Self> {
        if hash.is_empty() {
            return Err(Error::EmptyHash);
        }

        Ok(Self {
            record: TimestampRecord {
                hash: hash.to_vec(),
                nonce: nonce.as_bytes().to_vec(),
                created: unix_now(),
                ..Default::default()
            },
        })
    }

    /// Reconstruct from the persisted binary record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record = TimestampRecord::decode(bytes)?;
        Self::from_record(record)
    }

    pub fn from_record(record: TimestampRecord) -> Result<Self> {
        if record.hash.is_empty() {
            return Err(Error::MalformedAggregate("record has no hash".to_string()));
        }
        Ok(Self { record })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.record.encode_to_vec()
    }

    pub fn hash(&self) -> &[u8] {
        &self.record.hash
    }

    pub fn nonce(&self) -> &[u8] {
        &self.record.nonce
    }

    pub fn created(&self) -> u32 {
        self.record.created
    }

    pub fn source(&self) -> &str {
        &self.record.source
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.record.identity.as_ref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.record.location.as_ref()
    }

    pub fn attestations(&self) -> &[Attestation] {
        &self.record.attestations
    }

    /// The value submitted to calendars:
    /// `SHA256(SHA256(hash || nonce || source || identity || location))`,
    /// where absent context contributes nothing.
    pub fn digest_hash(&self) -> Digest {
        let mut combined = [self.record.hash.as_slice(), self.record.nonce.as_slice()].concat();

        if !self.record.source.is_empty() {
            combined.extend_from_slice(self.record.source.as_bytes());
        }
        if let Some(identity) = &self.record.identity {
            combined.extend(identity.encode_to_vec());
        }
        if let Some(location) = &self.record.location {
            combined.extend(location.encode_to_vec());
        }

        let bytes: [u8; 32] = Sha256::digest(Sha256::digest(&combined)).into();
        Digest::new(bytes)
    }

    /// Attach `attestation` unless one from the same calendar exists.
    pub fn add_attestation(&mut self, mut attestation: Attestation) -> bool {
        let exists = self
            .record
            .attestations
            .iter()
            .any(|a| a.calendar_url == attestation.calendar_url);
        if exists {
            return false;
        }

        attestation.submitted = unix_now();
        self.record.attestations.push(attestation);
        true
    }

    /// Fold a calendar's `/digest` response into a new attestation.
    pub fn import_digest_response(&mut self, bytes: &[u8]) -> Result<bool> {
        let operations = parse(bytes)?;
        let attestation = fold(
            self.digest_hash().as_bytes(),
            Attestation::with_operations(operations),
        )?;
        Ok(self.add_attestation(attestation))
    }

    pub fn is_stamped(&self) -> bool {
        !self.record.attestations.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Attestation> {
        self.record.attestations.iter().filter(|a| a.is_pending())
    }

    pub fn has_pending(&self) -> bool {
        self.pending().next().is_some()
    }

    /// Lookup key for `attestation` on its calendar.
    pub fn calendar_key(&self, attestation: &Attestation) -> Result<CalendarKey> {
        derive_key(self.digest_hash().as_bytes(), &attestation.operations)
    }

    fn position_by_key(&self, key: &CalendarKey) -> Result<usize> {
        let digest = self.digest_hash();
        self.record
            .attestations
            .iter()
            .position(|a| {
                derive_key(digest.as_bytes(), &a.operations).is_ok_and(|derived| derived == *key)
            })
            .ok_or(Error::NotFound)
    }

    pub fn attestation_by_key(&self, key: &CalendarKey) -> Result<&Attestation> {
        let index = self.position_by_key(key)?;
        Ok(&self.record.attestations[index])
    }

    /// Extend the pending attestation for `key` with a calendar's
    /// `/timestamp` continuation and re-fold it.
    ///
    /// The attestation is only replaced once the whole continuation has
    /// parsed and folded.
    pub fn upgrade_attestation(&mut self, key: &CalendarKey, bytes: &[u8]) -> Result<()> {
        let index = self.position_by_key(key)?;
        let current = &self.record.attestations[index];
        if !current.is_pending() {
            return Err(Error::AlreadyUpgraded);
        }

        let continuation = parse(bytes)?;
        let mut extended = current.clone();
        extended.operations.extend(continuation);

        let upgraded = fold(self.digest_hash().as_bytes(), extended)?;
        self.record.attestations[index] = upgraded;
        Ok(())
    }

    fn ensure_unstamped(&self, field: &'static str) -> Result<()> {
        if self.is_stamped() {
            return Err(Error::AlreadyStamped(field));
        }
        Ok(())
    }

    /// Replace the nonce. Attestations already held keep the lookup keys of
    /// the old digest hash.
    pub fn set_nonce(&mut self, nonce: Nonce) {
        self.record.nonce = nonce.as_bytes().to_vec();
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.record.source = source.into();
    }

    /// Identity and location are fixed once any calendar has seen the digest.
    pub fn set_identity(&mut self, identity: Identity) -> Result<()> {
        self.ensure_unstamped("identity")?;
        self.record.identity = Some(identity);
        Ok(())
    }

    pub fn set_location(&mut self, location: Location) -> Result<()> {
        self.ensure_unstamped("location")?;
        self.record.location = Some(location);
        Ok(())
    }
}
