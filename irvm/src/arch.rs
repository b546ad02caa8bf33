// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use static_assertions::const_assert;

/// Bytes moved by every load, store, push and pop.
pub const WORD_BYTES: u32 = 4;

/// Every `DEC`/`GLOBAL_DEC` size must be a multiple of this.
pub const DECLARATION_ALIGNMENT: i32 = WORD_BYTES as i32;

/// Byte that fills fresh memory so reads of uninitialized variables stand
/// out. Global variables are zeroed on allocation instead.
pub const MEMORY_FILLER: u8 = 0xCC;

/// Name of the function execution starts in.
pub const ENTRY_FUNCTION: &str = "main";

/// Largest magnitude accepted from console input before truncation to 32
/// bits (`2^53 - 1`).
pub const MAX_INPUT_MAGNITUDE: u64 = (1 << 53) - 1;

pub const DEFAULT_MAX_EXECUTION_STEP_COUNT: u64 = 1_000_000;
pub const MIN_MAX_EXECUTION_STEP_COUNT: u64 = 0;
pub const MAX_MAX_EXECUTION_STEP_COUNT: u64 = 999_999_999;
const_assert!(DEFAULT_MAX_EXECUTION_STEP_COUNT <= MAX_MAX_EXECUTION_STEP_COUNT);

pub const DEFAULT_MEMORY_SIZE: u32 = 16 * 1024;
pub const MIN_MEMORY_SIZE: u32 = 1024;
pub const MAX_MEMORY_SIZE: u32 = 16 * 1024 * 1024;
const_assert!(MIN_MEMORY_SIZE <= DEFAULT_MEMORY_SIZE);
const_assert!(DEFAULT_MEMORY_SIZE <= MAX_MEMORY_SIZE);
// every address must be representable by the signed view of a `Word`
const_assert!(MAX_MEMORY_SIZE <= i32::MAX as u32);

pub const DEFAULT_STACK_SIZE: u32 = 8 * 1024;
pub const MIN_STACK_SIZE: u32 = 512;
pub const MAX_STACK_SIZE: u32 = MAX_MEMORY_SIZE - MIN_MEMORY_SIZE;
const_assert!(MIN_STACK_SIZE <= MIN_MEMORY_SIZE);
const_assert!(DEFAULT_STACK_SIZE <= DEFAULT_MEMORY_SIZE);
const_assert!(MIN_STACK_SIZE <= DEFAULT_STACK_SIZE);

// startup pushes three words before any instruction runs
const_assert!(3 * WORD_BYTES <= MIN_STACK_SIZE);
const_assert!(MIN_STACK_SIZE % WORD_BYTES == 0);
