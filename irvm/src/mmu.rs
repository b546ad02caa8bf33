// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! Bounds-checked little-endian word access to a flat byte buffer.

use std::ops::Range;

use thiserror::Error;

use crate::{arch::WORD_BYTES, word::Word};

/// A 4-byte access that does not fit inside memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("4-byte access at {address} is out of bound")]
pub struct OutOfBound {
    pub address: Word,
}

/// The byte range `[address, address + 4)` if it lies within `length`
/// bytes. The address is read through the signed view, so negative
/// addresses are always out of bound.
fn word_range(address: Word, length: usize) -> Result<Range<usize>, OutOfBound> {
    let start = usize::try_from(address.signed()).map_err(|_| OutOfBound { address })?;
    match start.checked_add(WORD_BYTES as usize) {
        Some(end) if end <= length => Ok(start..end),
        _ => Err(OutOfBound { address }),
    }
}

pub fn load32(address: Word, memory: &[u8]) -> Result<Word, OutOfBound> {
    let range = word_range(address, memory.len())?;
    let mut bytes = [0; WORD_BYTES as usize];
    bytes.copy_from_slice(&memory[range]);
    Ok(Word::from_le_bytes(bytes))
}

pub fn store32(value: Word, address: Word, memory: &mut [u8]) -> Result<(), OutOfBound> {
    let range = word_range(address, memory.len())?;
    memory[range].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load32, store32, OutOfBound};
    use crate::word::Word;

    #[test]
    fn store_then_load() {
        let mut memory = [0u8; 8];

        store32(Word::from_u32(0xff00_0000), Word::ZERO, &mut memory)
            .expect("address 0 is in bounds");
        assert_eq!(
            Ok(Word::from_u32(0xff00_0000)),
            load32(Word::ZERO, &memory)
        );
        assert_eq!(
            Ok(Word::from_u32(0x0000_00ff)),
            load32(Word::from_i32(3), &memory)
        );

        store32(Word::from_u32(0xff00_0000), Word::from_i32(4), &mut memory)
            .expect("address 4 is in bounds");
        assert_eq!(
            Ok(Word::from_u32(0xff00_0000)),
            load32(Word::from_i32(4), &memory)
        );
    }

    #[test]
    fn little_endian_layout() {
        let mut memory = [0u8; 4];
        store32(Word::from_u32(0x0403_0201), Word::ZERO, &mut memory)
            .expect("address 0 is in bounds");
        assert_eq!([1, 2, 3, 4], memory);
    }

    #[test]
    fn out_of_bound_accesses() {
        let mut memory = [0u8; 8];
        for address in [Word::from_i32(-1), Word::from_i32(5), Word::from_i32(i32::MAX)] {
            assert_eq!(
                Err(OutOfBound { address }),
                store32(Word::from_u32(0xff00_0000), address, &mut memory)
            );
            assert_eq!(Err(OutOfBound { address }), load32(address, &memory));
        }
        assert_eq!([0u8; 8], memory);
    }
}
