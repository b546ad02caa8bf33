// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! Console output of a VM, buffered as lines of typed fragments until the
//! host flushes them.

use std::fmt;

use crate::error::{RuntimeError, StaticError};

/// How a host should present a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Input,
    Output,
    Prompt,
    Arrow,
}

/// A localizable console message: a stable key plus interpolation values.
/// [`fmt::Display`] renders the English text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    DecodeErrorPrefix { line_number: usize },
    StaticErrorPrefix { line_number: usize },
    StaticErrorPrefixNoLineNumber,
    Static(StaticError),
    RuntimeErrorPrefix { line_number: usize },
    RuntimeErrorPrefixNoLn,
    Runtime(RuntimeError),
    MaxStepReached { max_execution_step_count: u64 },
    WriteOutput { value: i32 },
    ReadPrompt { name: String },
    ConsoleArrow,
    ReadInput { value: String },
    ProgramExited { return_value: i32 },
    /// `time` is wall-clock milliseconds.
    ExecutionStepCountTime { step_count: u64, time: u128 },
}

impl Message {
    /// Catalog key. Errors use their own key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DecodeErrorPrefix { .. } => "DECODE_ERROR_PREFIX",
            Self::StaticErrorPrefix { .. } => "STATIC_ERROR_PREFIX",
            Self::StaticErrorPrefixNoLineNumber => {
                "STATIC_ERROR_PREFIX_NO_LINE_NUMBER"
            }
            Self::Static(error) => error.key(),
            Self::RuntimeErrorPrefix { .. } => "RUNTIME_ERROR_PREFIX",
            Self::RuntimeErrorPrefixNoLn => "RUNTIME_ERROR_PREFIX_NO_LN",
            Self::Runtime(error) => error.key(),
            Self::MaxStepReached { .. } => "MAX_STEP_REACHED",
            Self::WriteOutput { .. } => "WRITE_OUTPUT",
            Self::ReadPrompt { .. } => "READ_PROMPT",
            Self::ConsoleArrow => "CONSOLE_ARROW",
            Self::ReadInput { .. } => "READ_INPUT",
            Self::ProgramExited { .. } => "PROGRAM_EXITED",
            Self::ExecutionStepCountTime { .. } => "EXECUTION_STEP_COUNT_TIME",
        }
    }

    /// Interpolation values, named as the catalogs spell them.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::DecodeErrorPrefix { line_number }
            | Self::StaticErrorPrefix { line_number }
            | Self::RuntimeErrorPrefix { line_number } => {
                vec![("lineNumber", line_number.to_string())]
            }
            Self::Static(error) => error.values(),
            Self::Runtime(error) => error.values(),
            Self::MaxStepReached {
                max_execution_step_count,
            } => vec![(
                "maxExecutionStepCount",
                max_execution_step_count.to_string(),
            )],
            Self::WriteOutput { value } => vec![("value", value.to_string())],
            Self::ReadPrompt { name } => vec![("name", name.clone())],
            Self::ReadInput { value } => vec![("value", value.clone())],
            Self::ProgramExited { return_value } => {
                vec![("returnValue", return_value.to_string())]
            }
            Self::ExecutionStepCountTime { step_count, time } => vec![
                ("stepCount", step_count.to_string()),
                ("time", time.to_string()),
            ],
            Self::StaticErrorPrefixNoLineNumber
            | Self::RuntimeErrorPrefixNoLn
            | Self::ConsoleArrow => vec![],
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecodeErrorPrefix { line_number } => {
                write!(f, "IR Decoding Error(Line {}): ", line_number)
            }
            Self::StaticErrorPrefix { line_number } => {
                write!(f, "Static Check Error(Line {}): ", line_number)
            }
            Self::StaticErrorPrefixNoLineNumber => {
                write!(f, "Static Check Error: ")
            }
            Self::Static(error) => fmt::Display::fmt(error, f),
            Self::RuntimeErrorPrefix { line_number } => {
                write!(f, "Runtime Error(Line {}): ", line_number)
            }
            Self::RuntimeErrorPrefixNoLn => write!(f, "Runtime Error: "),
            Self::Runtime(error) => fmt::Display::fmt(error, f),
            Self::MaxStepReached {
                max_execution_step_count,
            } => write!(
                f,
                "Maximum execution step count reached({})",
                max_execution_step_count
            ),
            Self::WriteOutput { value } => write!(f, "{}", value),
            Self::ReadPrompt { name } => {
                write!(f, "Please enter a value for {}:", name)
            }
            Self::ConsoleArrow => write!(f, ">"),
            Self::ReadInput { value } => write!(f, "{}", value),
            Self::ProgramExited { return_value } => {
                write!(f, "Program exited with return value {}.", return_value)
            }
            Self::ExecutionStepCountTime { step_count, time } => write!(
                f,
                "Execution step count: {}; Execution time: {}ms",
                step_count, time
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub message: Message,
    pub severity: Severity,
}

impl Fragment {
    pub fn new(message: Message, severity: Severity) -> Self {
        Self { message, severity }
    }
}

pub type ConsoleLine = Vec<Fragment>;

/// Console lines not yet taken by the host.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    lines: Vec<ConsoleLine>,
}

impl WriteBuffer {
    pub fn push_line(&mut self, line: ConsoleLine) {
        self.lines.push(line);
    }

    /// Pushes a line made of one fragment.
    pub fn push(&mut self, message: Message, severity: Severity) {
        self.push_line(vec![Fragment::new(message, severity)]);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Hands over every buffered line, oldest first, leaving the buffer
    /// empty.
    pub fn flush(&mut self) -> Vec<ConsoleLine> {
        std::mem::take(&mut self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::{Fragment, Message, Severity, WriteBuffer};
    use crate::{
        error::{RuntimeError, StaticError},
        word::Word,
    };

    #[test]
    fn errors_keep_their_own_keys() {
        assert_eq!(
            "DIVIDE_BY_ZERO",
            Message::Runtime(RuntimeError::DivideByZero).key()
        );
        assert_eq!(
            "NO_MAIN_FUNCTION",
            Message::Static(StaticError::NoMainFunction).key()
        );
        assert_eq!(
            "RUNTIME_ERROR_PREFIX_NO_LN",
            Message::RuntimeErrorPrefixNoLn.key()
        );
    }

    #[test]
    fn values_use_catalog_names() {
        assert_eq!(
            vec![("lineNumber", "12".to_string())],
            Message::RuntimeErrorPrefix { line_number: 12 }.values()
        );
        assert_eq!(
            vec![("address", "-4".to_string())],
            Message::Runtime(RuntimeError::MemoryReadOutOfBound {
                address: Word::from_i32(-4)
            })
            .values()
        );
        assert_eq!(
            vec![
                ("stepCount", "7".to_string()),
                ("time", "3".to_string())
            ],
            Message::ExecutionStepCountTime {
                step_count: 7,
                time: 3
            }
            .values()
        );
    }

    #[test]
    fn english_rendering() {
        assert_eq!(
            "Runtime Error(Line 3): Cannot divide by 0",
            format!(
                "{}{}",
                Message::RuntimeErrorPrefix { line_number: 3 },
                Message::Runtime(RuntimeError::DivideByZero)
            )
        );
        assert_eq!(
            "Please enter a value for *p:",
            Message::ReadPrompt { name: "*p".into() }.to_string()
        );
        assert_eq!("-42", Message::WriteOutput { value: -42 }.to_string());
    }

    #[test]
    fn flush_hands_over_lines_in_order() {
        let mut buffer = WriteBuffer::default();
        buffer.push(Message::WriteOutput { value: 1 }, Severity::Output);
        buffer.push_line(vec![
            Fragment::new(Message::ConsoleArrow, Severity::Arrow),
            Fragment::new(
                Message::ReadInput { value: "2".into() },
                Severity::Input,
            ),
        ]);

        let lines = buffer.flush();
        assert_eq!(2, lines.len());
        assert_eq!(Message::WriteOutput { value: 1 }, lines[0][0].message);
        assert_eq!(Severity::Input, lines[1][1].severity);
        assert!(buffer.is_empty());
        assert!(buffer.flush().is_empty());
    }
}
