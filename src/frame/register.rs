// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! 16-bit data cells.

use crate::frame::Word;

/// An opaque 16-bit cell, transmitted big-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Register(Word);

impl Register {
    /// Builds a register from its two wire bytes, high byte first.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// The register value.
    #[must_use]
    pub const fn value(self) -> Word {
        self.0
    }

    /// The two wire bytes, high byte first.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<Word> for Register {
    fn from(value: Word) -> Self {
        Self(value)
    }
}

impl From<Register> for Word {
    fn from(register: Register) -> Self {
        register.0
    }
}

/// Splits a big-endian byte sequence into registers, two bytes each.
///
/// A trailing odd byte is ignored.
#[must_use]
pub fn registers_from_bytes(data: &[u8]) -> Vec<Register> {
    data.chunks_exact(2)
        .map(|pair| Register::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// Serialises registers as a big-endian byte sequence.
#[must_use]
pub fn registers_to_bytes(registers: &[Register]) -> Vec<u8> {
    let mut data = Vec::with_capacity(registers.len() * 2);
    for register in registers {
        data.extend_from_slice(&register.to_be_bytes());
    }
    data
}
