// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::fmt;

use num_traits::AsPrimitive;

use crate::arch::WORD_BYTES;

/// A 32-bit machine word. Arithmetic wraps, and [`Word::signed`] and
/// [`Word::unsigned`] are two views of the same bit pattern.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Word(u32);

impl Word {
    pub const ZERO: Word = Word(0);

    /// Byte size of a word as a word.
    pub const BYTES: Word = Word(WORD_BYTES);

    /// Keeps the low 32 bits of any primitive integer.
    pub fn truncate<T: AsPrimitive<u32>>(value: T) -> Self {
        Self(value.as_())
    }

    pub const fn from_i32(value: i32) -> Self {
        Self(value as u32)
    }

    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    pub const fn signed(self) -> i32 {
        self.0 as i32
    }

    pub const fn unsigned(self) -> u32 {
        self.0
    }

    pub const fn wrapping_add(self, rhs: Word) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }

    pub const fn wrapping_sub(self, rhs: Word) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }

    pub const fn wrapping_mul(self, rhs: Word) -> Self {
        Self(self.0.wrapping_mul(rhs.0))
    }

    /// Signed division truncating toward zero, `None` when `rhs` is zero.
    /// `i32::MIN / -1` wraps back to `i32::MIN`.
    pub const fn wrapping_div_signed(self, rhs: Word) -> Option<Self> {
        if rhs.0 == 0 {
            None
        } else {
            Some(Self::from_i32(self.signed().wrapping_div(rhs.signed())))
        }
    }

    /// Unsigned division, `None` when `rhs` is zero.
    pub const fn wrapping_div_unsigned(self, rhs: Word) -> Option<Self> {
        if rhs.0 == 0 {
            None
        } else {
            Some(Self(self.0 / rhs.0))
        }
    }

    pub const fn to_le_bytes(self) -> [u8; WORD_BYTES as usize] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; WORD_BYTES as usize]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

impl From<i32> for Word {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<u32> for Word {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<Word> for i32 {
    fn from(value: Word) -> Self {
        value.signed()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.signed(), f)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({} / {:#010x})", self.signed(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Word;

    #[test]
    fn truncates_to_signed_view() {
        assert_eq!(i32::MIN, Word::truncate(2_147_483_648_i64).signed());
        assert_eq!(i32::MAX, Word::truncate(-2_147_483_649_i64).signed());
        assert_eq!(-1, Word::truncate(u32::MAX).signed());
    }

    #[test]
    fn truncates_to_unsigned_view() {
        assert_eq!(0, Word::truncate(4_294_967_296_i64).unsigned());
        assert_eq!(2_147_483_648, Word::truncate(2_147_483_648_i64).unsigned());
        assert_eq!(u32::MAX, Word::from_i32(-1).unsigned());
    }

    #[test]
    fn views_share_one_bit_pattern() {
        for n in [0_i64, 1, -1, 123_456_789, -987_654_321, 1 << 40] {
            let word = Word::truncate(n);
            assert_eq!(word, Word::from_u32(word.unsigned()));
            assert_eq!(word, Word::from_i32(word.signed()));
            assert_eq!(n.rem_euclid(1 << 32) as u32, word.unsigned());
        }
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(
            Word::from_i32(i32::MIN),
            Word::from_i32(i32::MAX).wrapping_add(Word::from_i32(1))
        );
        assert_eq!(
            Word::from_i32(i32::MAX),
            Word::from_i32(i32::MIN).wrapping_sub(Word::from_i32(1))
        );
        assert_eq!(
            Some(Word::from_i32(i32::MIN)),
            Word::from_i32(i32::MIN).wrapping_div_signed(Word::from_i32(-1))
        );
        assert_eq!(None, Word::from_i32(5).wrapping_div_signed(Word::ZERO));
        assert_eq!(None, Word::from_i32(5).wrapping_div_unsigned(Word::ZERO));
    }

    #[test]
    fn displays_signed_value() {
        assert_eq!("-1", Word::from_u32(u32::MAX).to_string());
    }
}
