// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! Arithmetic and relational operations over [`Word`]s. Addition,
//! subtraction and multiplication are the same for both views of a word;
//! ordering and division are offered per view.

use paste::paste;

use crate::{
    instruction::{MathOp, RelOp},
    word::Word,
};

pub fn add(a: Word, b: Word) -> Word {
    a.wrapping_add(b)
}

pub fn sub(a: Word, b: Word) -> Word {
    a.wrapping_sub(b)
}

pub fn mul(a: Word, b: Word) -> Word {
    a.wrapping_mul(b)
}

/// Signed division truncating toward zero. `None` when `b` is zero; raising
/// an error for that is left to the caller.
pub fn div(a: Word, b: Word) -> Option<Word> {
    a.wrapping_div_signed(b)
}

pub fn div_unsigned(a: Word, b: Word) -> Option<Word> {
    a.wrapping_div_unsigned(b)
}

pub fn eq(a: Word, b: Word) -> bool {
    a == b
}

pub fn ne(a: Word, b: Word) -> bool {
    a != b
}

macro_rules! ordering_ops {
    ($($name:ident => $op:tt),*) => {
        paste! {
            $(
                #[doc = concat!("`a ", stringify!($op), " b` over the signed view.")]
                pub fn [<$name _signed>](a: Word, b: Word) -> bool {
                    a.signed() $op b.signed()
                }

                #[doc = concat!("`a ", stringify!($op), " b` over the unsigned view.")]
                pub fn [<$name _unsigned>](a: Word, b: Word) -> bool {
                    a.unsigned() $op b.unsigned()
                }
            )*
        }
    };
}

ordering_ops!(lt => <, le => <=, gt => >, ge => >=);

/// Applies a math operator. `None` only for division by zero.
pub fn apply(op: MathOp, a: Word, b: Word) -> Option<Word> {
    match op {
        MathOp::Add => Some(add(a, b)),
        MathOp::Sub => Some(sub(a, b)),
        MathOp::Mul => Some(mul(a, b)),
        MathOp::Div => div(a, b),
    }
}

/// Applies a relational operator. The IR has no unsigned comparisons, so
/// ordering uses the signed view.
pub fn compare(op: RelOp, a: Word, b: Word) -> bool {
    match op {
        RelOp::Eq => eq(a, b),
        RelOp::Ne => ne(a, b),
        RelOp::Lt => lt_signed(a, b),
        RelOp::Le => le_signed(a, b),
        RelOp::Gt => gt_signed(a, b),
        RelOp::Ge => ge_signed(a, b),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn w(value: i64) -> Word {
        Word::truncate(value)
    }

    #[test]
    fn arithmetic_wraps_to_32_bits() {
        assert_eq!(w(12), add(w(5), w(7)));
        assert_eq!(w(-2), sub(w(5), w(7)));
        assert_eq!(w(-794_967_296), mul(w(50_000), w(70_000)));
        assert_eq!(w(i32::MIN as i64), add(w(i32::MAX as i64), w(1)));
    }

    #[rstest]
    #[case(7, -5, -1)]
    #[case(-7, 5, -1)]
    #[case(-7, -5, 1)]
    #[case(7, 2, 3)]
    #[case(i32::MIN as i64, -1, i32::MIN as i64)]
    fn division_truncates_toward_zero(
        #[case] a: i64,
        #[case] b: i64,
        #[case] quotient: i64,
    ) {
        assert_eq!(Some(w(quotient)), div(w(a), w(b)));
    }

    #[test]
    fn division_by_zero_is_left_to_the_caller() {
        assert_eq!(None, div(w(1), w(0)));
        assert_eq!(None, apply(MathOp::Div, w(1), w(0)));
        assert_eq!(None, div_unsigned(w(1), w(0)));
    }

    #[test]
    fn unsigned_division_uses_unsigned_view() {
        assert_eq!(Some(w(0x7fff_ffff)), div_unsigned(w(-1), w(2)));
    }

    #[test]
    fn equality_ignores_view() {
        assert!(eq(w(-1), Word::from_u32(u32::MAX)));
        assert!(ne(w(1), w(-1)));
    }

    #[test]
    fn ordering_differs_between_views() {
        assert!(lt_unsigned(w(0), w(1)));
        assert!(lt_signed(w(-1), w(1)));
        assert!(!lt_unsigned(w(-1), w(1)));
        assert!(ge_unsigned(w(-1), w(1)));
        assert!(le_signed(w(3), w(3)));
        assert!(gt_signed(w(3), w(-3)));
        assert!(!gt_unsigned(w(3), w(-3)));
    }

    #[rstest]
    #[case(RelOp::Eq, 2, 2, true)]
    #[case(RelOp::Ne, 2, 2, false)]
    #[case(RelOp::Lt, -1, 0, true)]
    #[case(RelOp::Le, 0, -1, false)]
    #[case(RelOp::Gt, 0, -1, true)]
    #[case(RelOp::Ge, -5, -5, true)]
    fn compare_uses_signed_ordering(
        #[case] op: RelOp,
        #[case] a: i64,
        #[case] b: i64,
        #[case] expected: bool,
    ) {
        assert_eq!(expected, compare(op, w(a), w(b)));
    }
}
