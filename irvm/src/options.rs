// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use crate::arch::{
    DEFAULT_MAX_EXECUTION_STEP_COUNT, DEFAULT_MEMORY_SIZE, DEFAULT_STACK_SIZE,
    MAX_MAX_EXECUTION_STEP_COUNT, MAX_MEMORY_SIZE, MAX_STACK_SIZE,
    MIN_MAX_EXECUTION_STEP_COUNT, MIN_MEMORY_SIZE, MIN_STACK_SIZE,
};

/// Limits a VM runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmOptions {
    /// `0` means unlimited.
    pub max_execution_step_count: u64,
    /// Bytes of memory, global segment and stack together.
    pub memory_size: u32,
    /// Bytes at the top of memory reserved for the stack.
    pub stack_size: u32,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            max_execution_step_count: DEFAULT_MAX_EXECUTION_STEP_COUNT,
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// A partial change to [`VmOptions`]. `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmOptionsUpdate {
    pub max_execution_step_count: Option<u64>,
    pub memory_size: Option<u32>,
    pub stack_size: Option<u32>,
}

impl VmOptions {
    /// Applies `update` field by field, clamping each value into its range
    /// and keeping the stack no larger than memory. A memory size smaller
    /// than the stack is raised to the stack size; a stack size larger
    /// than memory is lowered to the memory size.
    pub fn apply(&mut self, update: VmOptionsUpdate) {
        if let Some(count) = update.max_execution_step_count {
            self.max_execution_step_count = count
                .clamp(MIN_MAX_EXECUTION_STEP_COUNT, MAX_MAX_EXECUTION_STEP_COUNT);
        }
        if let Some(size) = update.memory_size {
            self.memory_size = size
                .clamp(MIN_MEMORY_SIZE, MAX_MEMORY_SIZE)
                .max(self.stack_size);
        }
        if let Some(size) = update.stack_size {
            self.stack_size = size
                .clamp(MIN_STACK_SIZE, MAX_STACK_SIZE)
                .min(self.memory_size);
        }
    }
}
