// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use enum_keys::enum_keys;
use thiserror::Error;

use crate::word::Word;

/// A defect in IR source text, found before execution.
#[enum_keys(public)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StaticError {
    #[error("Unrecognized IR instruction")]
    UnrecognizedInstruction,
    #[error("Illegal IR format")]
    IllegalInstructionFormat,
    #[error("FUNCTION id illegal")]
    FunctionIllegalId,
    #[error("Illegal left hand side of assignment")]
    AssignIllegalLeft,
    #[error("Illegal right hand side of assignment")]
    AssignIllegalRight,
    #[error("Right hand side immediate number of assignment too large")]
    AssignRightImmTooLarge,
    #[error("Illegal math operator on RHS of assignment")]
    AssignIllegalRightOperator,
    #[error("Illegal first Singular operand on RHS of assignment")]
    AssignIllegalRightOperand1,
    #[error("First immediate number operand on RHS of assignment too large")]
    AssignRightOperand1ImmTooLarge,
    #[error("Illegal second Singular operand on RHS of assignment")]
    AssignIllegalRightOperand2,
    #[error("Second immediate number operand on RHS of assignment too large")]
    AssignRightOperand2ImmTooLarge,
    #[error("DEC's id illegal")]
    DecIllegalId,
    #[error("DEC's size format illegal")]
    DecIllegalSizeFormat,
    #[error("DEC's size too large")]
    DecSizeTooLarge,
    #[error("DEC's size not a multiple of 4")]
    #[key = "DEC_SIZE_NOT_4_MULTIPLE"]
    DecSizeNot4Multiple,
    #[error("GLOBAL_DEC's id illegal")]
    GlobalDecIllegalId,
    #[error("GLOBAL_DEC's size format illegal")]
    GlobalDecIllegalSizeFormat,
    #[error("GLOBAL_DEC's size too large")]
    GlobalDecSizeTooLarge,
    #[error("GLOBAL_DEC's size not a multiple of 4")]
    #[key = "GLOBAL_DEC_SIZE_NOT_4_MULTIPLE"]
    GlobalDecSizeNot4Multiple,
    #[error("LABEL's id illegal")]
    LabelIllegalId,
    #[error("GOTO's id illegal")]
    GotoIllegalId,
    #[error("IF's relop illegal")]
    IfIllegalCondOperator,
    #[error("IF's first Singular operand in condition illegal")]
    IfIllegalCondOperand1,
    #[error("IF's first immediate number operand in condition too large")]
    IfCondOperand1ImmTooLarge,
    #[error("IF's second Singular operand in condition illegal")]
    IfIllegalCondOperand2,
    #[error("IF's second immediate number operand in condition too large")]
    IfCondOperand2ImmTooLarge,
    #[error("IF's GOTO id illegal")]
    IfIllegalGotoId,
    #[error("ARG's Singular arg illegal")]
    ArgIllegal,
    #[error("ARG's immediate number arg too large")]
    ArgImmTooLarge,
    #[error("CALL's function id illegal")]
    CallIllegalId,
    #[error("PARAM's param id illegal")]
    ParamIllegalId,
    #[error("RETURN's Singular return value illegal")]
    ReturnIllegal,
    #[error("RETURN's immediate number return value too large")]
    ReturnImmTooLarge,
    #[error("Illegal LValue for READ")]
    ReadIllegal,
    #[error("Illegal Singular for WRITE")]
    WriteIllegal,
    #[error("Immediate number for WRITE too large")]
    WriteImmTooLarge,
    #[error("Label '{id}' already declared (last declared at line {last_line_number})")]
    DuplicateLabelId { id: String, last_line_number: usize },
    #[error("Function '{id}' already declared (last declared at line {last_line_number})")]
    DuplicateFunctionId { id: String, last_line_number: usize },
    #[error("Function main is not defined")]
    NoMainFunction,
}

impl StaticError {
    /// Whether this error comes from decoding a single line, as opposed to
    /// checks across the whole program.
    pub fn is_decode_error(&self) -> bool {
        !matches!(
            self,
            Self::DuplicateLabelId { .. }
                | Self::DuplicateFunctionId { .. }
                | Self::NoMainFunction
        )
    }

    /// Interpolation values for this error's message.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::DuplicateLabelId {
                id,
                last_line_number,
            }
            | Self::DuplicateFunctionId {
                id,
                last_line_number,
            } => vec![
                ("id", id.clone()),
                ("lastLineNumber", last_line_number.to_string()),
            ],
            _ => vec![],
        }
    }
}

/// A defect found while executing an already decoded program.
#[enum_keys(public)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Global variable segment overflow")]
    GlobalVariableSegmentOverflow,
    #[error("Stack overflow")]
    StackOverflow,
    #[error("Can't find variable '{id}'")]
    VariableNotFound { id: String },
    #[error("Can't find function '{id}'")]
    FunctionNotFound { id: String },
    #[error("Can't find label '{id}'")]
    LabelNotFound { id: String },
    #[error("Reading instruction from {address} is out of bound")]
    InstructionReadOutOfBound { address: Word },
    #[error("Reading 4 bytes from {address} is out of bound")]
    MemoryReadOutOfBound { address: Word },
    #[error("Writing 4 bytes to {address} is out of bound")]
    MemoryWriteOutOfBound { address: Word },
    #[error("Empty local variable stack")]
    EmptyVariableTableStack,
    #[error("DEC's variable id '{id}' already declared (last declared at line {last_line_number})")]
    DuplicateDecId { id: String, last_line_number: usize },
    #[error("GLOBAL_DEC's global variable id '{id}' already declared (last declared at line {last_line_number})")]
    DuplicateGlobalDecId { id: String, last_line_number: usize },
    #[error("PARAM's param id '{id}' already declared (last declared at line {last_line_number})")]
    DuplicateParamId { id: String, last_line_number: usize },
    #[error("Cannot divide by 0")]
    DivideByZero,
    #[error("Illegal input integer")]
    InputIntIllegal,
    #[error("Absolute value of input integer too large")]
    InputIntAbsTooLarge,
}

impl RuntimeError {
    /// Interpolation values for this error's message.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::VariableNotFound { id }
            | Self::FunctionNotFound { id }
            | Self::LabelNotFound { id } => vec![("id", id.clone())],
            Self::InstructionReadOutOfBound { address }
            | Self::MemoryReadOutOfBound { address }
            | Self::MemoryWriteOutOfBound { address } => {
                vec![("address", address.to_string())]
            }
            Self::DuplicateDecId {
                id,
                last_line_number,
            }
            | Self::DuplicateGlobalDecId {
                id,
                last_line_number,
            }
            | Self::DuplicateParamId {
                id,
                last_line_number,
            } => vec![
                ("id", id.clone()),
                ("lastLineNumber", last_line_number.to_string()),
            ],
            _ => vec![],
        }
    }
}

/// Source location of a reported error. Lines and columns count from 1 and
/// both ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start_line_number: usize,
    pub end_line_number: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl SourceSpan {
    /// A span covering one whole source line of `line_length` characters.
    pub fn line(line_number: usize, line_length: usize) -> Self {
        Self {
            start_line_number: line_number,
            end_line_number: line_number,
            start_column: 1,
            end_column: line_length,
        }
    }
}

/// An error as presented to the host. `span` is `None` for errors that
/// belong to no single line, such as a missing `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorItem<E> {
    pub span: Option<SourceSpan>,
    pub error: E,
}

impl<E> ErrorItem<E> {
    pub fn line_number(&self) -> Option<usize> {
        self.span.map(|span| span.start_line_number)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{RuntimeError, StaticError};

    #[test]
    fn keys_are_unique_across_taxonomies() {
        let mut seen = HashSet::new();
        for key in StaticError::KEYS.iter().chain(RuntimeError::KEYS.iter()) {
            assert!(seen.insert(*key), "duplicate message key {}", key);
        }
    }

    #[test]
    fn keys_match_catalog_spelling() {
        assert_eq!(
            "DEC_SIZE_NOT_4_MULTIPLE",
            StaticError::DecSizeNot4Multiple.key()
        );
        assert_eq!(
            "IF_COND_OPERAND2_IMM_TOO_LARGE",
            StaticError::IfCondOperand2ImmTooLarge.key()
        );
        assert_eq!(
            "DUPLICATE_PARAM_ID",
            RuntimeError::DuplicateParamId {
                id: "x".into(),
                last_line_number: 3
            }
            .key()
        );
    }

    #[test]
    fn duplicate_errors_carry_their_earlier_line() {
        let error = RuntimeError::DuplicateDecId {
            id: "x".into(),
            last_line_number: 7,
        };
        assert_eq!(
            vec![("id", "x".to_string()), ("lastLineNumber", "7".to_string())],
            error.values()
        );
        assert_eq!(
            "DEC's variable id 'x' already declared (last declared at line 7)",
            error.to_string()
        );
    }
}
