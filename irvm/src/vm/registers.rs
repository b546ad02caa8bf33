// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use crate::word::Word;

/// The register file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    /// Return value of the last `RETURN`.
    pub eax: Word,
    /// Next parameter slot of the frame being entered.
    pub ebx: Word,
    /// Bytes of arguments pushed for the next call.
    pub ecx: Word,
    /// Top of the global variable segment.
    pub edx: Word,
    pub ebp: Word,
    pub esp: Word,
    pub eip: Word,
}

impl Registers {
    /// Registers before startup: everything zero except `esp`, which sits
    /// at the top of a memory of `memory_size` bytes.
    pub fn initial(memory_size: u32) -> Self {
        Self {
            esp: Word::from_u32(memory_size),
            ..Self::default()
        }
    }
}
