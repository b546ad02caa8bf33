// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::collections::BTreeMap;

use crate::{error::RuntimeError, instruction::LValue, word::Word};

/// A declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    pub address: Word,
    pub size: Word,
    /// Line of the declaration, or of the write that declared it implicitly.
    pub line_number: usize,
}

/// Variables by name, ordered so that listings are stable.
pub type VariableTable = BTreeMap<String, Variable>;

/// Variable tables of a running VM. Between steps there is one local frame
/// and one assign-call target per active call.
#[derive(Debug, Default)]
pub struct Tables {
    pub globals: VariableTable,
    pub frames: Vec<VariableTable>,
    /// Where the return value of each active call is stored, if anywhere.
    pub assign_call_targets: Vec<Option<LValue>>,
}

impl Tables {
    /// Looks `id` up in the innermost frame and then among the globals.
    pub fn find(&self, id: &str) -> Result<Option<Variable>, RuntimeError> {
        let frame = self
            .frames
            .last()
            .ok_or(RuntimeError::EmptyVariableTableStack)?;
        Ok(frame.get(id).or_else(|| self.globals.get(id)).copied())
    }

    /// Like [`Tables::find`], but a missing variable is an error.
    pub fn get(&self, id: &str) -> Result<Variable, RuntimeError> {
        self.find(id)?.ok_or_else(|| RuntimeError::VariableNotFound {
            id: id.to_string(),
        })
    }

    pub fn innermost_mut(&mut self) -> Result<&mut VariableTable, RuntimeError> {
        self.frames
            .last_mut()
            .ok_or(RuntimeError::EmptyVariableTableStack)
    }
}
