// Copyright (C) 2024 Ethan Uppal and Utku Melemetci. All rights reserved.

//! The execution engine. A [`Vm`] owns its source text, decoded program,
//! registers, memory and variable tables, and is driven one instruction at
//! a time by [`Vm::step`].

use std::{sync::Arc, time::Instant};

use static_assertions::assert_impl_all;

use crate::{
    alu,
    arch::{ENTRY_FUNCTION, MAX_INPUT_MAGNITUDE, MEMORY_FILLER},
    console::{ConsoleLine, Fragment, Message, Severity, WriteBuffer},
    error::{ErrorItem, RuntimeError, SourceSpan, StaticError},
    instruction::{Instruction, LValue, RValue, Singular},
    mmu,
    options::{VmOptions, VmOptionsUpdate},
    program::{DecodeMode, ExecutableInstruction, Program},
    word::Word,
};

mod registers;
mod snapshot;
mod tables;

pub use registers::Registers;
pub use snapshot::{
    LocalVariableDetail, MemoryUsage, PeakMemoryUsage, VariableDetail,
};
pub use tables::Variable;
use tables::Tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmState {
    /// Source loaded, nothing decoded or allocated yet.
    Initial,
    /// Between steps.
    Free,
    /// Inside a step.
    Busy,
    /// Suspended on `READ` until [`Vm::supply_input`].
    WaitInput,
    StaticCheckFailed,
    RuntimeError,
    MaxStepReached,
    /// `main` returned 0.
    ExitedNormally,
    /// `main` returned something other than 0.
    ExitedAbnormally,
}

impl VmState {
    pub fn is_exited(self) -> bool {
        matches!(self, Self::ExitedNormally | Self::ExitedAbnormally)
    }
}

/// A `READ` waiting for its input line.
#[derive(Debug, Clone)]
struct PendingRead {
    address: Word,
    /// `x` or `*x`, as shown in the prompt.
    name: String,
    span: SourceSpan,
}

/// What the rest of a step does after an instruction ran.
enum Flow {
    Next,
    WaitInput,
    Exited,
}

pub struct Vm {
    source: Vec<String>,
    program: Arc<Program>,
    options: VmOptions,
    initial_registers: Registers,
    registers: Registers,
    memory: Vec<u8>,
    tables: Tables,
    state: VmState,
    step_count: u64,
    call_stack: Vec<String>,
    static_errors: Vec<ErrorItem<StaticError>>,
    runtime_errors: Vec<ErrorItem<RuntimeError>>,
    peak_memory_usage: PeakMemoryUsage,
    write_buffer: WriteBuffer,
    pending_read: Option<PendingRead>,
    started_at: Option<Instant>,
}

// hosts may drive a VM from a worker thread
assert_impl_all!(Vm: Send);

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        let options = VmOptions::default();
        let initial_registers = Registers::initial(options.memory_size);
        Self {
            source: Vec::new(),
            program: Arc::default(),
            options,
            initial_registers,
            registers: initial_registers,
            memory: Vec::new(),
            tables: Tables::default(),
            state: VmState::Initial,
            step_count: 0,
            call_stack: Vec::new(),
            static_errors: Vec::new(),
            runtime_errors: Vec::new(),
            peak_memory_usage: PeakMemoryUsage::default(),
            write_buffer: WriteBuffer::default(),
            pending_read: None,
            started_at: None,
        }
    }

    /// Replaces the source text, one entry per line, and resets.
    pub fn load<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cancel_input();
        self.source = lines.into_iter().map(Into::into).collect();
        self.reset();
    }

    /// Decode errors of the current source text. The VM is not touched.
    pub fn preview_static_errors(&self) -> Vec<ErrorItem<StaticError>> {
        Program::load(&self.source, DecodeMode::Preview)
            .static_errors()
            .to_vec()
    }

    /// Changes the options. Ignored unless the VM is [`VmState::Initial`].
    pub fn configure(&mut self, update: VmOptionsUpdate) {
        if self.state != VmState::Initial {
            log::debug!("ignoring configure in state {:?}", self.state);
            return;
        }
        self.options.apply(update);
        if update.memory_size.is_some() {
            self.initial_registers.esp = Word::from_u32(self.options.memory_size);
            self.registers.esp = self.initial_registers.esp;
            self.update_peak_memory_usage();
        }
    }

    /// Discards everything but the source text and the options.
    pub fn reset(&mut self) {
        self.program = Arc::default();
        self.registers = self.initial_registers;
        self.memory = Vec::new();
        self.tables = Tables::default();
        self.state = VmState::Initial;
        self.step_count = 0;
        self.call_stack.clear();
        self.static_errors.clear();
        self.runtime_errors.clear();
        self.peak_memory_usage = PeakMemoryUsage::default();
        self.write_buffer = WriteBuffer::default();
        self.pending_read = None;
        self.started_at = None;
    }

    /// Takes the console lines written so far.
    pub fn flush_write_buffer(&mut self) -> Vec<ConsoleLine> {
        self.write_buffer.flush()
    }

    /// Steps until the VM stops being [`VmState::Free`].
    pub fn run(&mut self) {
        loop {
            self.step();
            if self.state != VmState::Free {
                break;
            }
        }
    }

    /// Executes one instruction. From [`VmState::Initial`] this first
    /// decodes the program and sets up memory; from an exited state the
    /// program starts over. In any other state but [`VmState::Free`] this
    /// does nothing.
    pub fn step(&mut self) {
        if self.state.is_exited() {
            self.reset();
        }
        if self.state == VmState::Initial {
            self.reset();
            self.prepare();
        }
        if self.state != VmState::Free {
            return;
        }
        self.state = VmState::Busy;

        let max_execution_step_count = self.options.max_execution_step_count;
        if max_execution_step_count > 0
            && self.step_count >= max_execution_step_count
        {
            log::debug!("step limit {} reached", max_execution_step_count);
            self.state = VmState::MaxStepReached;
            self.write_buffer.push(
                Message::MaxStepReached {
                    max_execution_step_count,
                },
                Severity::Error,
            );
            return;
        }

        let program = Arc::clone(&self.program);
        let Some(current) = program.get(self.registers.eip) else {
            self.raise(
                None,
                RuntimeError::InstructionReadOutOfBound {
                    address: self.registers.eip,
                },
            );
            return;
        };

        self.step_count += 1;
        log::trace!(
            "step {} at line {}: {}",
            self.step_count,
            current.line_number,
            current.instruction.key()
        );

        match self.execute(current) {
            Ok(Flow::Next) => self.advance(),
            Ok(Flow::WaitInput | Flow::Exited) => {}
            Err(error) => self.raise(Some(current.span()), error),
        }
    }

    /// Answers a pending `READ` with one line of input. Ignored unless the
    /// VM is [`VmState::WaitInput`].
    pub fn supply_input(&mut self, line: &str) {
        if self.state != VmState::WaitInput {
            log::debug!("ignoring input in state {:?}", self.state);
            return;
        }
        let Some(pending) = self.pending_read.take() else {
            return;
        };
        self.state = VmState::Busy;
        self.write_buffer.push_line(vec![
            Fragment::new(Message::ConsoleArrow, Severity::Arrow),
            Fragment::new(
                Message::ReadInput {
                    value: line.to_string(),
                },
                Severity::Input,
            ),
        ]);

        let stored = parse_input(line)
            .and_then(|value| self.store_word(value, pending.address));
        match stored {
            Ok(()) => self.advance(),
            Err(error) => self.raise(Some(pending.span), error),
        }
    }

    /// Releases a pending `READ` as if an empty line was entered.
    pub fn cancel_input(&mut self) {
        if self.state == VmState::WaitInput {
            self.supply_input("");
        }
    }

    fn prepare(&mut self) {
        let program = Program::load(&self.source, DecodeMode::Strict);
        self.static_errors = program.static_errors().to_vec();
        for item in &self.static_errors {
            let prefix = match item.line_number() {
                Some(line_number) if item.error.is_decode_error() => {
                    Message::DecodeErrorPrefix { line_number }
                }
                Some(line_number) => Message::StaticErrorPrefix { line_number },
                None => Message::StaticErrorPrefixNoLineNumber,
            };
            self.write_buffer.push_line(vec![
                Fragment::new(prefix, Severity::Error),
                Fragment::new(Message::Static(item.error.clone()), Severity::Error),
            ]);
        }
        if !program.is_valid() {
            log::debug!(
                "static check failed with {} errors",
                self.static_errors.len()
            );
            self.state = VmState::StaticCheckFailed;
            return;
        }

        self.program = Arc::new(program);
        match self.initialize() {
            Ok(()) => {
                log::debug!(
                    "started at eip {} with {} bytes of globals",
                    self.registers.eip,
                    self.registers.edx
                );
                self.state = VmState::Free;
                self.started_at = Some(Instant::now());
            }
            Err(error) => self.raise(None, error),
        }
    }

    /// Sets up the stack for `main` and allocates the global variables.
    fn initialize(&mut self) -> Result<(), RuntimeError> {
        let main = self.program.function(ENTRY_FUNCTION).ok_or_else(|| {
            RuntimeError::FunctionNotFound {
                id: ENTRY_FUNCTION.to_string(),
            }
        })?;
        self.registers.eip = main.offset_before.wrapping_add(Word::from_i32(1));
        self.memory = vec![MEMORY_FILLER; self.options.memory_size as usize];
        self.registers.esp = Word::from_u32(self.options.memory_size);
        self.update_peak_memory_usage();

        self.push(self.registers.ecx)?;
        // returning to the end of the stream exits
        self.push(Word::truncate(self.program.len()))?;
        self.push(self.registers.ebp)?;
        self.registers.ebp = self.registers.esp;
        self.tables.assign_call_targets.push(None);
        self.tables.frames.push(Default::default());
        self.call_stack.push(ENTRY_FUNCTION.to_string());

        let program = Arc::clone(&self.program);
        for current in program.instructions() {
            if let Instruction::GlobalDec { id, size } = &current.instruction {
                self.allocate_global(id, *size, current.line_number)?;
                self.step_count += 1;
            }
        }
        self.skip_global_declarations();
        Ok(())
    }

    fn allocate_global(
        &mut self,
        id: &str,
        size: Word,
        line_number: usize,
    ) -> Result<(), RuntimeError> {
        let segment_size =
            i64::from(self.options.memory_size) - i64::from(self.options.stack_size);
        if i64::from(self.registers.edx.signed()) + i64::from(size.signed())
            > segment_size
        {
            return Err(RuntimeError::GlobalVariableSegmentOverflow);
        }
        if let Some(existing) = self.tables.globals.get(id) {
            return Err(RuntimeError::DuplicateGlobalDecId {
                id: id.to_string(),
                last_line_number: existing.line_number,
            });
        }

        let start = self.registers.edx.unsigned() as usize;
        let end = start + size.unsigned() as usize;
        self.memory[start..end].fill(0);
        self.tables.globals.insert(
            id.to_string(),
            Variable {
                address: self.registers.edx,
                size,
                line_number,
            },
        );
        self.registers.edx = alu::add(self.registers.edx, size);
        self.update_peak_memory_usage();
        Ok(())
    }

    fn execute(
        &mut self,
        current: &ExecutableInstruction,
    ) -> Result<Flow, RuntimeError> {
        let line_number = current.line_number;
        match &current.instruction {
            Instruction::Arg { value } => {
                let value = self.singular_value(value)?;
                self.push(value)?;
                self.registers.ecx = alu::add(self.registers.ecx, Word::BYTES);
            }
            Instruction::Assign { lvalue, rvalue } => {
                let value = self.rvalue(rvalue)?;
                let address = self.lvalue_address(lvalue, line_number)?;
                self.store_word(value, address)?;
            }
            Instruction::Call { id } => self.call(id, None)?,
            Instruction::AssignCall {
                lvalue,
                function_id,
            } => self.call(function_id, Some(lvalue.clone()))?,
            Instruction::Dec { id, size } => {
                self.create_stack_variable(id, *size, line_number)?;
            }
            Instruction::Goto { id } => self.jump_to_label(id)?,
            Instruction::If { condition, goto_id } => {
                let left = self.singular_value(&condition.left)?;
                let right = self.singular_value(&condition.right)?;
                let taken = alu::compare(condition.op, left, right);
                let label = self.program.label(goto_id).ok_or_else(|| {
                    RuntimeError::LabelNotFound {
                        id: goto_id.clone(),
                    }
                })?;
                if taken {
                    self.registers.eip = label.offset_before;
                }
            }
            Instruction::Param { id } => self.bind_param(id, line_number)?,
            Instruction::Return { value } => {
                let value = self.singular_value(value)?;
                return self.return_from_call(value, line_number);
            }
            Instruction::Read { lvalue } => {
                let address = self.lvalue_address(lvalue, line_number)?;
                let name = lvalue.to_string();
                self.write_buffer.push(
                    Message::ReadPrompt { name: name.clone() },
                    Severity::Prompt,
                );
                self.pending_read = Some(PendingRead {
                    address,
                    name,
                    span: current.span(),
                });
                self.state = VmState::WaitInput;
                return Ok(Flow::WaitInput);
            }
            Instruction::Write { value } => {
                let value = self.singular_value(value)?;
                self.write_buffer.push(
                    Message::WriteOutput {
                        value: value.signed(),
                    },
                    Severity::Output,
                );
            }
            // GLOBAL_DEC is allocated at startup and the rest never reach the
            // text stream
            Instruction::GlobalDec { .. }
            | Instruction::Function { .. }
            | Instruction::Label { .. }
            | Instruction::Empty
            | Instruction::Comment
            | Instruction::Error(_) => {}
        }
        Ok(Flow::Next)
    }

    fn call(
        &mut self,
        id: &str,
        target: Option<LValue>,
    ) -> Result<(), RuntimeError> {
        let function = self.program.function(id).ok_or_else(|| {
            RuntimeError::FunctionNotFound { id: id.to_string() }
        })?;
        log::trace!("call {} with {} bytes of arguments", id, self.registers.ecx);

        self.registers.ebx = self.registers.esp;
        self.push(self.registers.ecx)?;
        self.registers.ecx = Word::ZERO;
        self.push(self.registers.eip)?;
        self.push(self.registers.ebp)?;
        self.registers.ebp = self.registers.esp;
        self.tables.assign_call_targets.push(target);
        self.tables.frames.push(Default::default());
        self.call_stack.push(id.to_string());
        self.registers.eip = function.offset_before;
        Ok(())
    }

    fn return_from_call(
        &mut self,
        value: Word,
        line_number: usize,
    ) -> Result<Flow, RuntimeError> {
        self.registers.eax = value;
        self.registers.esp = self.registers.ebp;
        self.update_peak_memory_usage();
        self.registers.ebp = self.pop()?;
        self.registers.eip = self.pop()?;
        let argument_bytes = self.pop()?;
        self.registers.esp = alu::add(self.registers.esp, argument_bytes);
        self.update_peak_memory_usage();
        self.registers.ecx = Word::ZERO;

        if self.tables.frames.pop().is_none() {
            return Err(RuntimeError::EmptyVariableTableStack);
        }
        let returned_from = self.call_stack.pop();
        log::trace!("return {} from {:?}", value, returned_from);

        if self.registers.eip == Word::truncate(self.program.len()) {
            self.finalize();
            return Ok(Flow::Exited);
        }

        if let Some(target) = self.tables.assign_call_targets.pop().flatten() {
            let address = self.lvalue_address(&target, line_number)?;
            self.store_word(self.registers.eax, address)?;
        }
        Ok(Flow::Next)
    }

    fn bind_param(
        &mut self,
        id: &str,
        line_number: usize,
    ) -> Result<(), RuntimeError> {
        if let Some(existing) = self.tables.innermost_mut()?.get(id) {
            return Err(RuntimeError::DuplicateParamId {
                id: id.to_string(),
                last_line_number: existing.line_number,
            });
        }
        self.load_word(self.registers.ebx)?;

        let address = self.registers.ebx;
        self.tables.innermost_mut()?.insert(
            id.to_string(),
            Variable {
                address,
                size: Word::BYTES,
                line_number,
            },
        );
        self.registers.ebx = alu::add(address, Word::BYTES);
        Ok(())
    }

    fn jump_to_label(&mut self, id: &str) -> Result<(), RuntimeError> {
        let label = self
            .program
            .label(id)
            .ok_or_else(|| RuntimeError::LabelNotFound { id: id.to_string() })?;
        self.registers.eip = label.offset_before;
        Ok(())
    }

    /// Moves past the instruction just executed and any global declarations
    /// after it, ending the step.
    fn advance(&mut self) {
        self.registers.eip = alu::add(self.registers.eip, Word::from_i32(1));
        self.skip_global_declarations();
        self.state = VmState::Free;
    }

    fn skip_global_declarations(&mut self) {
        while let Some(ExecutableInstruction {
            instruction: Instruction::GlobalDec { .. },
            ..
        }) = self.program.get(self.registers.eip)
        {
            self.registers.eip = alu::add(self.registers.eip, Word::from_i32(1));
        }
    }

    fn finalize(&mut self) {
        let time = self
            .started_at
            .map(|started_at| started_at.elapsed().as_millis())
            .unwrap_or_default();
        self.registers.edx = Word::ZERO;
        self.update_peak_memory_usage();
        self.tables.globals.clear();

        let return_value = self.registers.eax.signed();
        let severity = if return_value == 0 {
            self.state = VmState::ExitedNormally;
            Severity::Success
        } else {
            self.state = VmState::ExitedAbnormally;
            Severity::Warning
        };
        log::debug!(
            "exited with {} after {} steps",
            return_value,
            self.step_count
        );
        self.write_buffer
            .push(Message::ProgramExited { return_value }, severity);
        self.write_buffer.push(
            Message::ExecutionStepCountTime {
                step_count: self.step_count,
                time,
            },
            severity,
        );
    }

    /// Stops the VM on `error`, recording it against `span`.
    fn raise(&mut self, span: Option<SourceSpan>, error: RuntimeError) {
        self.state = VmState::RuntimeError;
        let line_number = span.map(|span| span.start_line_number);
        match line_number {
            Some(line_number) => {
                log::warn!("runtime error at line {}: {}", line_number, error)
            }
            None => log::warn!("runtime error: {}", error),
        }

        let prefix = match line_number {
            Some(line_number) => Message::RuntimeErrorPrefix { line_number },
            None => Message::RuntimeErrorPrefixNoLn,
        };
        self.write_buffer.push_line(vec![
            Fragment::new(prefix, Severity::Error),
            Fragment::new(Message::Runtime(error.clone()), Severity::Error),
        ]);
        self.runtime_errors.push(ErrorItem { span, error });
    }

    fn load_word(&self, address: Word) -> Result<Word, RuntimeError> {
        mmu::load32(address, &self.memory).map_err(|error| {
            RuntimeError::MemoryReadOutOfBound {
                address: error.address,
            }
        })
    }

    fn store_word(
        &mut self,
        value: Word,
        address: Word,
    ) -> Result<(), RuntimeError> {
        mmu::store32(value, address, &mut self.memory).map_err(|error| {
            RuntimeError::MemoryWriteOutOfBound {
                address: error.address,
            }
        })
    }

    /// Fails unless `size` more bytes below `esp` stay within the stack.
    fn check_stack_room(&self, size: Word) -> Result<(), RuntimeError> {
        let new_esp =
            i64::from(self.registers.esp.signed()) - i64::from(size.signed());
        if i64::from(self.options.memory_size) - new_esp
            <= i64::from(self.options.stack_size)
        {
            Ok(())
        } else {
            Err(RuntimeError::StackOverflow)
        }
    }

    fn push(&mut self, value: Word) -> Result<(), RuntimeError> {
        self.check_stack_room(Word::BYTES)?;
        self.registers.esp = alu::sub(self.registers.esp, Word::BYTES);
        self.update_peak_memory_usage();
        self.store_word(value, self.registers.esp)
    }

    fn pop(&mut self) -> Result<Word, RuntimeError> {
        let value = self.load_word(self.registers.esp)?;
        self.registers.esp = alu::add(self.registers.esp, Word::BYTES);
        self.update_peak_memory_usage();
        Ok(value)
    }

    /// Declares `id` in the innermost frame, taking `size` bytes below
    /// `esp`.
    fn create_stack_variable(
        &mut self,
        id: &str,
        size: Word,
        line_number: usize,
    ) -> Result<Variable, RuntimeError> {
        self.check_stack_room(size)?;
        self.registers.esp = alu::sub(self.registers.esp, size);
        self.update_peak_memory_usage();

        let variable = Variable {
            address: self.registers.esp,
            size,
            line_number,
        };
        let frame = self.tables.innermost_mut()?;
        if let Some(existing) = frame.get(id) {
            return Err(RuntimeError::DuplicateDecId {
                id: id.to_string(),
                last_line_number: existing.line_number,
            });
        }
        frame.insert(id.to_string(), variable);
        Ok(variable)
    }

    fn singular_value(&self, singular: &Singular) -> Result<Word, RuntimeError> {
        match singular {
            Singular::Imm(value) => Ok(*value),
            Singular::AddressId(id) => Ok(self.tables.get(id)?.address),
            Singular::Id(id) => self.load_word(self.tables.get(id)?.address),
            Singular::DerefId(id) => {
                let pointer = self.load_word(self.tables.get(id)?.address)?;
                self.load_word(pointer)
            }
        }
    }

    fn rvalue(&self, rvalue: &RValue) -> Result<Word, RuntimeError> {
        match rvalue {
            RValue::Singular(singular) => self.singular_value(singular),
            RValue::BinaryMathOp(left, op, right) => {
                let left = self.singular_value(left)?;
                let right = self.singular_value(right)?;
                alu::apply(*op, left, right).ok_or(RuntimeError::DivideByZero)
            }
        }
    }

    /// Address written by an assignment to `lvalue`. A bare name that is
    /// not declared anywhere becomes a 4-byte local.
    fn lvalue_address(
        &mut self,
        lvalue: &LValue,
        line_number: usize,
    ) -> Result<Word, RuntimeError> {
        match (lvalue, self.tables.find(lvalue.id())?) {
            (LValue::Id(_), Some(variable)) => Ok(variable.address),
            (LValue::Id(id), None) => Ok(self
                .create_stack_variable(id, Word::BYTES, line_number)?
                .address),
            (LValue::DerefId(_), Some(variable)) => {
                self.load_word(variable.address)
            }
            (LValue::DerefId(id), None) => {
                Err(RuntimeError::VariableNotFound { id: id.clone() })
            }
        }
    }

    fn update_peak_memory_usage(&mut self) {
        let usage = self.memory_usage();
        let peak = &mut self.peak_memory_usage;
        peak.total = peak.total.max(usage.used);
        peak.stack = peak.stack.max(usage.stack_used);
        peak.global_variable =
            peak.global_variable.max(usage.global_variable_used);
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        self.cancel_input();
    }
}

/// Reads a decimal integer prefix: leading whitespace, an optional sign,
/// then digits. Anything after the digits is ignored.
fn parse_input(line: &str) -> Result<Word, RuntimeError> {
    let trimmed = line.trim_start();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digit_count = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digit_count == 0 {
        return Err(RuntimeError::InputIntIllegal);
    }

    let magnitude = unsigned[..digit_count]
        .parse::<u64>()
        .ok()
        .filter(|magnitude| *magnitude <= MAX_INPUT_MAGNITUDE)
        .ok_or(RuntimeError::InputIntAbsTooLarge)?;
    // at most 2^53 - 1, so this cannot overflow
    let value = magnitude as i64;
    Ok(Word::truncate(if negative { -value } else { value }))
}
