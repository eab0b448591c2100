//! Unsigned base-128 varints and length-prefixed byte blocks
//!
//! Groups of seven bits are stored least-significant first; the high bit of
//! each byte flags that another byte follows.

use sst_types::{Error, Result};

const CONTINUATION: u8 = 0b1000_0000;
const GROUP: u8 = 0b0111_1111;

/// Read one varint, returning its value and the bytes after it.
pub fn read_varint(bytes: &[u8]) -> Result<(u64, &[u8])> {
    let mut value = 0u64;

    for (position, &byte) in bytes.iter().enumerate() {
        let group = u64::from(byte & GROUP);

        // Zero groups are allowed at any position; anything else must fit
        if group != 0 {
            let shifted = u32::try_from(position)
                .ok()
                .and_then(|p| p.checked_mul(7))
                .and_then(|shift| {
                    group
                        .checked_shl(shift)
                        .filter(|shifted| shifted >> shift == group)
                })
                .ok_or(Error::VarintOverflow)?;
            value |= shifted;
        }

        if byte & CONTINUATION == 0 {
            return Ok((value, &bytes[position + 1..]));
        }
    }

    Err(Error::TruncatedInput {
        needed: bytes.len() + 1,
        available: bytes.len(),
    })
}

/// Read a varint length `n`, then split off the next `n` bytes.
pub fn read_length_prefixed(bytes: &[u8]) -> Result<(&[u8], &[u8])> {
    let (size, remainder) = read_varint(bytes)?;

    let size = match usize::try_from(size) {
        Ok(size) if size <= remainder.len() => size,
        _ => {
            return Err(Error::TruncatedInput {
                needed: usize::try_from(size).unwrap_or(usize::MAX),
                available: remainder.len(),
            })
        }
    };

    Ok(remainder.split_at(size))
}

/// Append the varint encoding of `value` to `out`.
pub fn write_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let group = (value & u64::from(GROUP)) as u8;
        value >>= 7;
        if value == 0 {
            out.push(group);
            return;
        }
        out.push(group | CONTINUATION);
    }
}

/// Append `block` preceded by its varint length.
pub fn write_length_prefixed(block: &[u8], out: &mut Vec<u8>) {
    write_varint(block.len() as u64, out);
    out.extend_from_slice(block);
}
