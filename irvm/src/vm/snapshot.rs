// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! Read-only views of a [`Vm`] for hosts that display its state.

use super::{tables::VariableTable, Vm, VmState};
use crate::{
    console::Message,
    error::{ErrorItem, RuntimeError, StaticError},
    mmu,
    options::VmOptions,
    word::Word,
};

/// A variable and the words it currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDetail {
    pub id: String,
    pub address: Word,
    pub size: Word,
    /// One entry per 4 bytes of the variable, `None` where the word lies
    /// outside memory.
    pub values: Vec<Option<Word>>,
}

/// The local variables of one active call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableDetail {
    pub function: String,
    /// `0` for `main`.
    pub depth: usize,
    pub variables: Vec<VariableDetail>,
}

/// Memory in use, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total: i64,
    pub used: i64,
    pub stack_total: i64,
    pub stack_used: i64,
    pub global_variable_total: i64,
    pub global_variable_used: i64,
}

/// Highest usage seen since the last reset, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeakMemoryUsage {
    pub total: i64,
    pub stack: i64,
    pub global_variable: i64,
}

impl Vm {
    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn options(&self) -> VmOptions {
        self.options
    }

    pub fn registers(&self) -> &super::Registers {
        &self.registers
    }

    /// Source line of the instruction the next step executes, or of the
    /// `READ` waiting for input.
    pub fn current_line_number(&self) -> Option<usize> {
        self.program
            .get(self.registers.eip)
            .map(|current| current.line_number)
    }

    /// Names of the active functions, outermost first.
    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    pub fn static_errors(&self) -> &[ErrorItem<StaticError>] {
        &self.static_errors
    }

    pub fn runtime_errors(&self) -> &[ErrorItem<RuntimeError>] {
        &self.runtime_errors
    }

    /// The value `main` returned, once the program has exited.
    pub fn return_value(&self) -> Option<i32> {
        self.state
            .is_exited()
            .then(|| self.registers.eax.signed())
    }

    /// The prompt of the `READ` waiting for input.
    pub fn pending_prompt(&self) -> Option<Message> {
        self.pending_read.as_ref().map(|pending| Message::ReadPrompt {
            name: pending.name.clone(),
        })
    }

    pub fn global_variable_details(&self) -> Vec<VariableDetail> {
        self.variable_details(&self.tables.globals)
    }

    /// Local variables of every active call, outermost first.
    pub fn local_variable_details_stack(&self) -> Vec<LocalVariableDetail> {
        self.call_stack
            .iter()
            .zip(&self.tables.frames)
            .enumerate()
            .map(|(depth, (function, frame))| LocalVariableDetail {
                function: function.clone(),
                depth,
                variables: self.variable_details(frame),
            })
            .collect()
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        let memory_size = i64::from(self.options.memory_size);
        let stack_size = i64::from(self.options.stack_size);
        let esp = i64::from(self.registers.esp.signed());
        let edx = i64::from(self.registers.edx.signed());
        MemoryUsage {
            total: memory_size,
            used: edx + memory_size - esp,
            stack_total: stack_size,
            stack_used: memory_size - esp,
            global_variable_total: memory_size - stack_size,
            global_variable_used: edx,
        }
    }

    pub fn peak_memory_usage(&self) -> PeakMemoryUsage {
        self.peak_memory_usage
    }

    fn variable_details(&self, table: &VariableTable) -> Vec<VariableDetail> {
        table
            .iter()
            .map(|(id, variable)| VariableDetail {
                id: id.clone(),
                address: variable.address,
                size: variable.size,
                values: (0..variable.size.unsigned() / Word::BYTES.unsigned())
                    .map(|index| {
                        let address = variable
                            .address
                            .wrapping_add(Word::from_u32(index * Word::BYTES.unsigned()));
                        mmu::load32(address, &self.memory).ok()
                    })
                    .collect(),
            })
            .collect()
    }
}
