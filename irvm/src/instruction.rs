// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::fmt;

use enum_keys::enum_keys;

use crate::{error::StaticError, word::Word};

/// An operand that produces one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Singular {
    /// `#n`, already truncated to a word.
    Imm(Word),
    /// `x`, the value stored in `x`.
    Id(String),
    /// `&x`, the address of `x`.
    AddressId(String),
    /// `*x`, the value stored at the address held in `x`.
    DerefId(String),
}

impl fmt::Display for Singular {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imm(value) => write!(f, "#{}", value),
            Self::Id(id) => write!(f, "{}", id),
            Self::AddressId(id) => write!(f, "&{}", id),
            Self::DerefId(id) => write!(f, "*{}", id),
        }
    }
}

/// An assignable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LValue {
    /// `x`. Writing to an undeclared `x` declares it as a 4-byte local.
    Id(String),
    /// `*x`, the location whose address is held in `x`.
    DerefId(String),
}

impl LValue {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::DerefId(id) => id,
        }
    }
}

impl fmt::Display for LValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::DerefId(id) => write!(f, "*{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl MathOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }
}

/// Right hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RValue {
    Singular(Singular),
    BinaryMathOp(Singular, MathOp, Singular),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub left: Singular,
    pub op: RelOp,
    pub right: Singular,
}

/// One decoded line of IR.
#[enum_keys(public)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `FUNCTION f :`
    Function { id: String },
    /// `x := a` or `x := a op b`
    Assign { lvalue: LValue, rvalue: RValue },
    /// `DEC x size`
    Dec { id: String, size: Word },
    /// `GLOBAL_DEC x size`
    GlobalDec { id: String, size: Word },
    /// `LABEL l :`
    Label { id: String },
    /// `GOTO l`
    Goto { id: String },
    /// `IF a relop b GOTO l`
    If { condition: Condition, goto_id: String },
    /// `ARG a`
    Arg { value: Singular },
    /// `CALL f`
    Call { id: String },
    /// `x := CALL f`
    AssignCall { lvalue: LValue, function_id: String },
    /// `PARAM x`
    Param { id: String },
    /// `RETURN a`
    Return { value: Singular },
    /// `READ x`
    Read { lvalue: LValue },
    /// `WRITE a`
    Write { value: Singular },
    Empty,
    Comment,
    Error(StaticError),
}

