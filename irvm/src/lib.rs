// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! A virtual machine for a three-address intermediate representation: a
//! line-oriented decoder, a static checker, and a stepping execution engine
//! over a flat little-endian memory.

#![forbid(unsafe_code)]

pub mod alu;
pub mod arch;
pub mod console;
pub mod decoder;
pub mod error;
pub mod instruction;
pub mod mmu;
pub mod options;
pub mod program;
pub mod vm;
pub mod word;
