// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

use std::collections::{hash_map::Entry, HashMap};

use crate::{
    arch::ENTRY_FUNCTION,
    decoder::decode,
    error::{ErrorItem, SourceSpan, StaticError},
    instruction::Instruction,
    word::Word,
};

/// How much of a program [`Program::load`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Only collects decode errors. Used while the source is being edited.
    Preview,
    /// Builds the instruction stream and symbol tables and checks the whole
    /// program, as required before execution.
    Strict,
}

/// An instruction kept in the stream together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableInstruction {
    pub instruction: Instruction,
    pub line_number: usize,
    /// Length of the raw source line in characters.
    pub line_length: usize,
}

impl ExecutableInstruction {
    pub fn span(&self) -> SourceSpan {
        SourceSpan::line(self.line_number, self.line_length)
    }
}

/// A label or function table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Offset of the instruction before the target, so that advancing the
    /// instruction pointer after a jump lands on the target. `-1` when the
    /// target is the first instruction.
    pub offset_before: Word,
    pub line_number: usize,
}

/// A decoded IR program: the executable instruction stream, its label and
/// function tables, and every static error found while building them.
#[derive(Debug, Default)]
pub struct Program {
    text: Vec<ExecutableInstruction>,
    labels: HashMap<String, Symbol>,
    functions: HashMap<String, Symbol>,
    static_errors: Vec<ErrorItem<StaticError>>,
}

impl Program {
    /// Decodes every line of `lines`. All static errors are collected; a
    /// program is runnable only if there are none.
    pub fn load<S: AsRef<str>>(lines: &[S], mode: DecodeMode) -> Self {
        let mut program = Self::default();

        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let line_number = index + 1;
            let line_length = line.chars().count();
            let span = SourceSpan::line(line_number, line_length);

            match decode(line) {
                Instruction::Empty | Instruction::Comment => {}
                Instruction::Error(error) => {
                    program.static_errors.push(ErrorItem {
                        span: Some(span),
                        error,
                    });
                }
                _ if mode == DecodeMode::Preview => {}
                Instruction::Label { id } => {
                    program.insert_symbol(SymbolKind::Label, id, line_number, span);
                }
                Instruction::Function { id } => {
                    program.insert_symbol(SymbolKind::Function, id, line_number, span);
                }
                instruction => program.text.push(ExecutableInstruction {
                    instruction,
                    line_number,
                    line_length,
                }),
            }
        }

        if mode == DecodeMode::Strict
            && !program.functions.contains_key(ENTRY_FUNCTION)
        {
            program.static_errors.push(ErrorItem {
                span: None,
                error: StaticError::NoMainFunction,
            });
        }

        log::debug!(
            "loaded {} lines ({:?}): {} instructions, {} labels, {} functions, {} static errors",
            lines.len(),
            mode,
            program.text.len(),
            program.labels.len(),
            program.functions.len(),
            program.static_errors.len()
        );

        program
    }

    fn insert_symbol(
        &mut self,
        kind: SymbolKind,
        id: String,
        line_number: usize,
        span: SourceSpan,
    ) {
        let offset_before =
            Word::truncate(self.text.len()).wrapping_sub(Word::from_i32(1));
        let table = match kind {
            SymbolKind::Label => &mut self.labels,
            SymbolKind::Function => &mut self.functions,
        };

        match table.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(Symbol {
                    offset_before,
                    line_number,
                });
            }
            Entry::Occupied(entry) => {
                let id = entry.key().clone();
                let last_line_number = entry.get().line_number;
                let error = match kind {
                    SymbolKind::Label => StaticError::DuplicateLabelId {
                        id,
                        last_line_number,
                    },
                    SymbolKind::Function => StaticError::DuplicateFunctionId {
                        id,
                        last_line_number,
                    },
                };
                self.static_errors.push(ErrorItem {
                    span: Some(span),
                    error,
                });
            }
        }
    }

    /// Whether the program was loaded without static errors.
    pub fn is_valid(&self) -> bool {
        self.static_errors.is_empty()
    }

    pub fn static_errors(&self) -> &[ErrorItem<StaticError>] {
        &self.static_errors
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The instruction at `offset`, read through the signed view.
    pub fn get(&self, offset: Word) -> Option<&ExecutableInstruction> {
        usize::try_from(offset.signed())
            .ok()
            .and_then(|index| self.text.get(index))
    }

    pub fn instructions(&self) -> &[ExecutableInstruction] {
        &self.text
    }

    pub fn label(&self, id: &str) -> Option<Symbol> {
        self.labels.get(id).copied()
    }

    pub fn function(&self, id: &str) -> Option<Symbol> {
        self.functions.get(id).copied()
    }
}

#[derive(Clone, Copy)]
enum SymbolKind {
    Label,
    Function,
}

#[cfg(test)]
mod tests {
    use super::{DecodeMode, Program, Symbol};
    use crate::{
        error::{ErrorItem, SourceSpan, StaticError},
        instruction::Instruction,
        word::Word,
    };

    const SOURCE: &str = "\
; sums 1..n
FUNCTION main :
READ n
i := #0

LABEL loop :
IF i >= n GOTO done
i := i + #1
GOTO loop
LABEL done :
WRITE i
RETURN #0";

    fn lines(source: &str) -> Vec<&str> {
        source.split('\n').collect()
    }

    #[test]
    fn strict_load_builds_stream_and_tables() {
        let program = Program::load(&lines(SOURCE), DecodeMode::Strict);

        assert!(program.is_valid());
        assert_eq!(7, program.len());
        assert_eq!(
            Some(Symbol {
                offset_before: Word::from_i32(-1),
                line_number: 2
            }),
            program.function("main")
        );
        assert_eq!(
            Some(Symbol {
                offset_before: Word::from_i32(1),
                line_number: 6
            }),
            program.label("loop")
        );
        assert_eq!(
            Some(Word::from_i32(4)),
            program.label("done").map(|done| done.offset_before)
        );
        assert_eq!(None, program.label("main"));

        let first = program.get(Word::ZERO).expect("stream is not empty");
        assert_eq!(3, first.line_number);
        assert_eq!(6, first.line_length);
        assert_eq!(SourceSpan::line(3, 6), first.span());
        assert!(program.get(Word::from_i32(-1)).is_none());
        assert!(program.get(Word::from_i32(7)).is_none());
    }

    #[test]
    fn decode_errors_are_all_collected() {
        let program = Program::load(
            &["FUNCTION main :", "DEC x 3", "x := y %", "RETURN #0"],
            DecodeMode::Strict,
        );

        assert!(!program.is_valid());
        assert_eq!(
            &[
                ErrorItem {
                    span: Some(SourceSpan::line(2, 7)),
                    error: StaticError::DecSizeNot4Multiple,
                },
                ErrorItem {
                    span: Some(SourceSpan::line(3, 8)),
                    error: StaticError::UnrecognizedInstruction,
                },
            ],
            program.static_errors()
        );
    }

    #[test]
    fn missing_main_has_no_line() {
        let program =
            Program::load(&["FUNCTION f :", "RETURN #0"], DecodeMode::Strict);
        assert_eq!(
            &[ErrorItem {
                span: None,
                error: StaticError::NoMainFunction,
            }],
            program.static_errors()
        );
    }

    #[test]
    fn duplicate_symbols_keep_the_first_definition() {
        let program = Program::load(
            &[
                "FUNCTION main :",
                "LABEL a :",
                "WRITE #1",
                "LABEL a :",
                "FUNCTION main :",
                "RETURN #0",
            ],
            DecodeMode::Strict,
        );

        assert_eq!(
            &[
                ErrorItem {
                    span: Some(SourceSpan::line(4, 9)),
                    error: StaticError::DuplicateLabelId {
                        id: "a".into(),
                        last_line_number: 2
                    },
                },
                ErrorItem {
                    span: Some(SourceSpan::line(5, 15)),
                    error: StaticError::DuplicateFunctionId {
                        id: "main".into(),
                        last_line_number: 1
                    },
                },
            ],
            program.static_errors()
        );
        assert_eq!(Some(2), program.label("a").map(|label| label.line_number));
        assert_eq!(
            Some(Word::from_i32(-1)),
            program.function("main").map(|main| main.offset_before)
        );
    }

    #[test]
    fn preview_only_collects_decode_errors() {
        let program = Program::load(
            &["FUNCTION f :", "LABEL a :", "LABEL a :", "GOTO"],
            DecodeMode::Preview,
        );

        assert!(program.is_empty());
        assert_eq!(None, program.label("a"));
        assert_eq!(
            &[ErrorItem {
                span: Some(SourceSpan::line(4, 4)),
                error: StaticError::IllegalInstructionFormat,
            }],
            program.static_errors()
        );
    }

    #[test]
    fn global_declarations_stay_in_the_stream() {
        let program = Program::load(
            &["GLOBAL_DEC g 8", "FUNCTION main :", "RETURN g"],
            DecodeMode::Strict,
        );

        assert!(program.is_valid());
        assert_eq!(
            Some(Word::ZERO),
            program.function("main").map(|main| main.offset_before)
        );
        assert!(matches!(
            program.instructions()[0].instruction,
            Instruction::GlobalDec { .. }
        ));
    }
}
