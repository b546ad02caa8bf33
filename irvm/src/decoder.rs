// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! Line decoder for the IR. [`decode`] is pure: it looks at one line of text
//! and never fails, reporting malformed lines as [`Instruction::Error`].

use crate::{
    arch::DECLARATION_ALIGNMENT,
    error::StaticError,
    instruction::{Condition, Instruction, LValue, MathOp, RValue, RelOp, Singular},
    word::Word,
};

/// Words that may not be used as function, label or declaration names.
pub const KEYWORDS: [&str; 12] = [
    "FUNCTION",
    "DEC",
    "GLOBAL_DEC",
    "LABEL",
    "GOTO",
    "IF",
    "ARG",
    "PARAM",
    "CALL",
    "RETURN",
    "READ",
    "WRITE",
];

/// Why a singular operand was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandError {
    Illegal,
    ImmTooLarge,
}

/// Decodes one line of IR.
pub fn decode(line: &str) -> Instruction {
    let tokens = line
        .trim()
        .split([' ', '\t'])
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>();

    let Some(head) = tokens.first() else {
        return Instruction::Empty;
    };
    if head.starts_with(';') {
        return Instruction::Comment;
    }

    let decoded = match *head {
        "FUNCTION" => decode_function(&tokens),
        "DEC" => decode_declaration(&tokens, DEC_ERRORS, |id, size| {
            Instruction::Dec { id, size }
        }),
        "GLOBAL_DEC" => {
            decode_declaration(&tokens, GLOBAL_DEC_ERRORS, |id, size| {
                Instruction::GlobalDec { id, size }
            })
        }
        "LABEL" => decode_label(&tokens),
        "GOTO" => decode_unary_id(&tokens, StaticError::GotoIllegalId, |id| {
            Instruction::Goto { id }
        }),
        "IF" => decode_if(&tokens),
        "ARG" => decode_unary_singular(
            &tokens,
            (StaticError::ArgIllegal, StaticError::ArgImmTooLarge),
            |value| Instruction::Arg { value },
        ),
        "CALL" => decode_unary_id(&tokens, StaticError::CallIllegalId, |id| {
            Instruction::Call { id }
        }),
        "PARAM" => decode_unary_id(&tokens, StaticError::ParamIllegalId, |id| {
            Instruction::Param { id }
        }),
        "RETURN" => decode_unary_singular(
            &tokens,
            (StaticError::ReturnIllegal, StaticError::ReturnImmTooLarge),
            |value| Instruction::Return { value },
        ),
        "READ" => decode_read(&tokens),
        "WRITE" => decode_unary_singular(
            &tokens,
            (StaticError::WriteIllegal, StaticError::WriteImmTooLarge),
            |value| Instruction::Write { value },
        ),
        _ => decode_assignment_like(&tokens),
    };

    decoded.unwrap_or_else(Instruction::Error)
}

type DecodeResult = Result<Instruction, StaticError>;

/// Tries `lvalue := rvalue` and then `lvalue := CALL id`. A line that fits
/// the shape of neither is unrecognized; otherwise the first shape-specific
/// error is reported.
fn decode_assignment_like(tokens: &[&str]) -> DecodeResult {
    let assign_error = match decode_assign(tokens) {
        Ok(assign) => return Ok(assign),
        Err(error) => error,
    };
    let assign_call_error = match decode_assign_call(tokens) {
        Ok(assign_call) => return Ok(assign_call),
        Err(error) => error,
    };

    if assign_error != StaticError::IllegalInstructionFormat {
        Err(assign_error)
    } else if assign_call_error != StaticError::IllegalInstructionFormat {
        Err(assign_call_error)
    } else {
        Err(StaticError::UnrecognizedInstruction)
    }
}

fn decode_function(tokens: &[&str]) -> DecodeResult {
    let [_, id, ":"] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    let id = decode_id(id).ok_or(StaticError::FunctionIllegalId)?;
    Ok(Instruction::Function { id })
}

fn decode_label(tokens: &[&str]) -> DecodeResult {
    let [_, id, ":"] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    let id = decode_id(id).ok_or(StaticError::LabelIllegalId)?;
    Ok(Instruction::Label { id })
}

fn decode_assign(tokens: &[&str]) -> DecodeResult {
    match tokens {
        [lvalue, ":=", singular] => {
            let lvalue =
                decode_lvalue(lvalue).ok_or(StaticError::AssignIllegalLeft)?;
            let singular = decode_singular(singular).map_err(|error| {
                pick(
                    error,
                    StaticError::AssignIllegalRight,
                    StaticError::AssignRightImmTooLarge,
                )
            })?;
            Ok(Instruction::Assign {
                lvalue,
                rvalue: RValue::Singular(singular),
            })
        }
        [lvalue, ":=", left, op, right] => {
            let lvalue =
                decode_lvalue(lvalue).ok_or(StaticError::AssignIllegalLeft)?;
            let left = decode_singular(left).map_err(|error| {
                pick(
                    error,
                    StaticError::AssignIllegalRightOperand1,
                    StaticError::AssignRightOperand1ImmTooLarge,
                )
            })?;
            let op = MathOp::from_token(op)
                .ok_or(StaticError::AssignIllegalRightOperator)?;
            let right = decode_singular(right).map_err(|error| {
                pick(
                    error,
                    StaticError::AssignIllegalRightOperand2,
                    StaticError::AssignRightOperand2ImmTooLarge,
                )
            })?;
            Ok(Instruction::Assign {
                lvalue,
                rvalue: RValue::BinaryMathOp(left, op, right),
            })
        }
        _ => Err(StaticError::IllegalInstructionFormat),
    }
}

fn decode_assign_call(tokens: &[&str]) -> DecodeResult {
    let [lvalue, ":=", "CALL", function_id] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    let lvalue = decode_lvalue(lvalue).ok_or(StaticError::AssignIllegalLeft)?;
    let function_id =
        decode_id(function_id).ok_or(StaticError::CallIllegalId)?;
    Ok(Instruction::AssignCall {
        lvalue,
        function_id,
    })
}

/// Error codes of a sized declaration, in validation order: id, size
/// format, size range, size alignment.
type DeclarationErrors = [StaticError; 4];

const DEC_ERRORS: DeclarationErrors = [
    StaticError::DecIllegalId,
    StaticError::DecIllegalSizeFormat,
    StaticError::DecSizeTooLarge,
    StaticError::DecSizeNot4Multiple,
];

const GLOBAL_DEC_ERRORS: DeclarationErrors = [
    StaticError::GlobalDecIllegalId,
    StaticError::GlobalDecIllegalSizeFormat,
    StaticError::GlobalDecSizeTooLarge,
    StaticError::GlobalDecSizeNot4Multiple,
];

fn decode_declaration(
    tokens: &[&str],
    errors: DeclarationErrors,
    f: impl FnOnce(String, Word) -> Instruction,
) -> DecodeResult {
    let [illegal_id, illegal_size_format, size_too_large, size_not_aligned] =
        errors;
    let [_, id, size] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    let id = decode_id(id).ok_or(illegal_id)?;
    if !is_decimal(size) {
        return Err(illegal_size_format);
    }
    let size = size.parse::<i32>().map_err(|_| size_too_large)?;
    if size % DECLARATION_ALIGNMENT != 0 {
        return Err(size_not_aligned);
    }
    Ok(f(id, Word::from_i32(size)))
}

fn decode_if(tokens: &[&str]) -> DecodeResult {
    let [_, left, op, right, "GOTO", goto_id] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    let left = decode_singular(left).map_err(|error| {
        pick(
            error,
            StaticError::IfIllegalCondOperand1,
            StaticError::IfCondOperand1ImmTooLarge,
        )
    })?;
    let op = RelOp::from_token(op).ok_or(StaticError::IfIllegalCondOperator)?;
    let right = decode_singular(right).map_err(|error| {
        pick(
            error,
            StaticError::IfIllegalCondOperand2,
            StaticError::IfCondOperand2ImmTooLarge,
        )
    })?;
    let goto_id = decode_id(goto_id).ok_or(StaticError::IfIllegalGotoId)?;
    Ok(Instruction::If {
        condition: Condition { left, op, right },
        goto_id,
    })
}

fn decode_read(tokens: &[&str]) -> DecodeResult {
    let [_, lvalue] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    let lvalue = decode_lvalue(lvalue).ok_or(StaticError::ReadIllegal)?;
    Ok(Instruction::Read { lvalue })
}

fn decode_unary_id(
    tokens: &[&str],
    illegal: StaticError,
    f: impl FnOnce(String) -> Instruction,
) -> DecodeResult {
    let [_, id] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    decode_id(id).map(f).ok_or(illegal)
}

fn decode_unary_singular(
    tokens: &[&str],
    (illegal, imm_too_large): (StaticError, StaticError),
    f: impl FnOnce(Singular) -> Instruction,
) -> DecodeResult {
    let [_, singular] = tokens else {
        return Err(StaticError::IllegalInstructionFormat);
    };
    decode_singular(singular)
        .map(f)
        .map_err(|error| pick(error, illegal, imm_too_large))
}

fn pick(
    error: OperandError,
    illegal: StaticError,
    imm_too_large: StaticError,
) -> StaticError {
    match error {
        OperandError::Illegal => illegal,
        OperandError::ImmTooLarge => imm_too_large,
    }
}

fn is_decimal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit())
}

/// Whether `token` matches `[A-Za-z_]\w*`, ASCII only.
fn is_identifier(token: &str) -> bool {
    let mut bytes = token.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => bytes
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_'),
        _ => false,
    }
}

/// A declaration, label or function name.
fn decode_id(token: &str) -> Option<String> {
    (is_identifier(token) && !KEYWORDS.contains(&token))
        .then(|| token.to_string())
}

/// Operand names are not checked against [`KEYWORDS`], so `x := CALL` reads
/// the variable `CALL`.
fn decode_operand_name(token: &str) -> Option<String> {
    is_identifier(token).then(|| token.to_string())
}

fn decode_singular(token: &str) -> Result<Singular, OperandError> {
    if let Some(imm) = token.strip_prefix('#') {
        let digits = imm.strip_prefix('-').unwrap_or(imm);
        if !is_decimal(digits) {
            return Err(OperandError::Illegal);
        }
        return imm
            .parse::<i32>()
            .map(|value| Singular::Imm(Word::from_i32(value)))
            .map_err(|_| OperandError::ImmTooLarge);
    }

    let singular = if let Some(id) = token.strip_prefix('*') {
        decode_operand_name(id).map(Singular::DerefId)
    } else if let Some(id) = token.strip_prefix('&') {
        decode_operand_name(id).map(Singular::AddressId)
    } else {
        decode_operand_name(token).map(Singular::Id)
    };
    singular.ok_or(OperandError::Illegal)
}

fn decode_lvalue(token: &str) -> Option<LValue> {
    match token.strip_prefix('*') {
        Some(id) => decode_operand_name(id).map(LValue::DerefId),
        None => decode_operand_name(token).map(LValue::Id),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::decode;
    use crate::{
        error::StaticError,
        instruction::{
            Condition, Instruction, LValue, MathOp, RValue, RelOp, Singular,
        },
        word::Word,
    };

    fn id(name: &str) -> Singular {
        Singular::Id(name.into())
    }

    fn imm(value: i32) -> Singular {
        Singular::Imm(Word::from_i32(value))
    }

    #[rstest]
    #[case("")]
    #[case("   \t ")]
    #[case("\r")]
    fn blank_lines_are_empty(#[case] line: &str) {
        assert_eq!(Instruction::Empty, decode(line));
    }

    #[rstest]
    #[case("; a comment")]
    #[case("  \t;indented")]
    #[case(";")]
    fn semicolon_starts_a_comment(#[case] line: &str) {
        assert_eq!(Instruction::Comment, decode(line));
    }

    #[test]
    fn decodes_headers() {
        assert_eq!(
            Instruction::Label { id: "L1".into() },
            decode("LABEL L1 :")
        );
        assert_eq!(
            Instruction::Function { id: "main".into() },
            decode("\tFUNCTION   main  :  ")
        );
    }

    #[rstest]
    #[case("WRITE #1\r")]
    #[case("  WRITE   #1 \r")]
    #[case("WRITE\t#1\r\n")]
    fn trailing_carriage_returns_are_ignored(#[case] line: &str) {
        assert_eq!(Instruction::Write { value: imm(1) }, decode(line));
        assert_eq!(
            Instruction::Goto { id: "L".into() },
            decode(&line.replace("WRITE", "GOTO").replace("#1", "L"))
        );
    }

    #[test]
    fn decodes_assignments() {
        assert_eq!(
            Instruction::Assign {
                lvalue: LValue::Id("x".into()),
                rvalue: RValue::Singular(imm(5)),
            },
            decode("x := #5")
        );
        assert_eq!(
            Instruction::Assign {
                lvalue: LValue::Id("x".into()),
                rvalue: RValue::BinaryMathOp(id("y"), MathOp::Add, id("z")),
            },
            decode("x := y + z")
        );
        assert_eq!(
            Instruction::Assign {
                lvalue: LValue::DerefId("p".into()),
                rvalue: RValue::BinaryMathOp(
                    Singular::AddressId("a".into()),
                    MathOp::Div,
                    Singular::DerefId("q".into())
                ),
            },
            decode("*p := &a / *q")
        );
    }

    #[test]
    fn decodes_assign_call() {
        assert_eq!(
            Instruction::AssignCall {
                lvalue: LValue::Id("r".into()),
                function_id: "fact".into(),
            },
            decode("r := CALL fact")
        );
    }

    #[test]
    fn decodes_control_flow() {
        assert_eq!(
            Instruction::If {
                condition: Condition {
                    left: id("a"),
                    op: RelOp::Eq,
                    right: id("b"),
                },
                goto_id: "L".into(),
            },
            decode("IF a == b GOTO L")
        );
        assert_eq!(Instruction::Goto { id: "L".into() }, decode("GOTO L"));
        assert_eq!(Instruction::Call { id: "f".into() }, decode("CALL f"));
        assert_eq!(
            Instruction::Return { value: imm(-3) },
            decode("RETURN #-3")
        );
    }

    #[test]
    fn decodes_declarations() {
        assert_eq!(
            Instruction::Dec {
                id: "arr".into(),
                size: Word::from_i32(40),
            },
            decode("DEC arr 40")
        );
        assert_eq!(
            Instruction::GlobalDec {
                id: "g".into(),
                size: Word::from_i32(4),
            },
            decode("GLOBAL_DEC g 4")
        );
        assert_eq!(Instruction::Param { id: "n".into() }, decode("PARAM n"));
    }

    #[test]
    fn decodes_io() {
        assert_eq!(
            Instruction::Read {
                lvalue: LValue::DerefId("p".into())
            },
            decode("READ *p")
        );
        assert_eq!(
            Instruction::Write {
                value: Singular::AddressId("x".into())
            },
            decode("WRITE &x")
        );
        assert_eq!(Instruction::Arg { value: imm(0) }, decode("ARG #-0"));
    }

    #[rstest]
    #[case("DEC x 3", StaticError::DecSizeNot4Multiple)]
    #[case("DEC x -4", StaticError::DecIllegalSizeFormat)]
    #[case("DEC x 4096000000", StaticError::DecSizeTooLarge)]
    #[case("DEC GOTO 4", StaticError::DecIllegalId)]
    #[case("DEC x", StaticError::IllegalInstructionFormat)]
    #[case("GLOBAL_DEC 1x 4", StaticError::GlobalDecIllegalId)]
    #[case("GLOBAL_DEC g #4", StaticError::GlobalDecIllegalSizeFormat)]
    #[case("GLOBAL_DEC g 2147483648", StaticError::GlobalDecSizeTooLarge)]
    #[case("GLOBAL_DEC g 6", StaticError::GlobalDecSizeNot4Multiple)]
    #[case("FUNCTION main", StaticError::IllegalInstructionFormat)]
    #[case("FUNCTION IF :", StaticError::FunctionIllegalId)]
    #[case("LABEL 0 :", StaticError::LabelIllegalId)]
    #[case("LABEL L ;", StaticError::IllegalInstructionFormat)]
    #[case("GOTO", StaticError::IllegalInstructionFormat)]
    #[case("GOTO *L", StaticError::GotoIllegalId)]
    #[case("IF a == b THEN L", StaticError::IllegalInstructionFormat)]
    #[case("IF $a == b GOTO L", StaticError::IfIllegalCondOperand1)]
    #[case("IF #2147483648 == b GOTO L", StaticError::IfCondOperand1ImmTooLarge)]
    #[case("IF a =< b GOTO L", StaticError::IfIllegalCondOperator)]
    #[case("IF a == b? GOTO L", StaticError::IfIllegalCondOperand2)]
    #[case("IF a == #-2147483649 GOTO L", StaticError::IfCondOperand2ImmTooLarge)]
    #[case("IF a == b GOTO READ", StaticError::IfIllegalGotoId)]
    #[case("ARG #x", StaticError::ArgIllegal)]
    #[case("ARG #99999999999", StaticError::ArgImmTooLarge)]
    #[case("CALL &f", StaticError::CallIllegalId)]
    #[case("PARAM WRITE", StaticError::ParamIllegalId)]
    #[case("RETURN", StaticError::IllegalInstructionFormat)]
    #[case("RETURN x+1", StaticError::ReturnIllegal)]
    #[case("RETURN #3000000000", StaticError::ReturnImmTooLarge)]
    #[case("READ &x", StaticError::ReadIllegal)]
    #[case("WRITE x y", StaticError::IllegalInstructionFormat)]
    #[case("WRITE **x", StaticError::WriteIllegal)]
    #[case("WRITE #2147483648", StaticError::WriteImmTooLarge)]
    fn rejects_malformed_keyword_lines(
        #[case] line: &str,
        #[case] error: StaticError,
    ) {
        assert_eq!(Instruction::Error(error), decode(line));
    }

    #[rstest]
    #[case("&x := #1", StaticError::AssignIllegalLeft)]
    #[case("x := ?", StaticError::AssignIllegalRight)]
    #[case("x := #2147483648", StaticError::AssignRightImmTooLarge)]
    #[case("x := 1 + y", StaticError::AssignIllegalRightOperand1)]
    #[case("x := #-2147483649 + y", StaticError::AssignRightOperand1ImmTooLarge)]
    #[case("x := y % z", StaticError::AssignIllegalRightOperator)]
    #[case("x := y + &", StaticError::AssignIllegalRightOperand2)]
    #[case("x := y - #2147483648", StaticError::AssignRightOperand2ImmTooLarge)]
    #[case("&r := CALL f", StaticError::AssignIllegalLeft)]
    #[case("r := CALL 9f", StaticError::CallIllegalId)]
    #[case("hello world", StaticError::UnrecognizedInstruction)]
    #[case("x = y", StaticError::UnrecognizedInstruction)]
    #[case("x := CALL f g", StaticError::AssignIllegalRightOperator)]
    #[case("READ x := y", StaticError::IllegalInstructionFormat)]
    fn rejects_malformed_assignments(
        #[case] line: &str,
        #[case] error: StaticError,
    ) {
        assert_eq!(Instruction::Error(error), decode(line));
    }

    #[test]
    fn immediates_keep_the_signed_range() {
        assert_eq!(
            Instruction::Write {
                value: imm(i32::MIN)
            },
            decode("WRITE #-2147483648")
        );
        assert_eq!(
            Instruction::Write {
                value: imm(i32::MAX)
            },
            decode("WRITE #2147483647")
        );
    }

    #[test]
    fn operand_names_may_be_keywords() {
        assert_eq!(
            Instruction::Assign {
                lvalue: LValue::Id("x".into()),
                rvalue: RValue::Singular(id("CALL")),
            },
            decode("x := CALL")
        );
    }
}
