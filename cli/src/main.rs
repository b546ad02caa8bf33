// Copyright (C) 2024 Ethan Uppal. All rights reserved.

//! Runs one IR program to completion, answering `READ` from standard input
//! and printing program output and errors to standard output.

mod args;
mod catalog;
mod logger;

use std::{
    fs,
    io::{self, BufRead, Write},
    process::ExitCode,
};

use anyhow::Context;
use catalog::Language;
use irvm::{
    console::{ConsoleLine, Severity},
    options::VmOptionsUpdate,
    vm::{Vm, VmState},
};

fn main() -> ExitCode {
    logger::init();
    let Some(args) = args::parse(std::env::args().skip(1)) else {
        println!("{}", args::USAGE);
        return ExitCode::FAILURE;
    };
    match run(&args) {
        Ok(status) => ExitCode::from(status),
        Err(error) => {
            eprintln!("{:?}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &args::Args) -> anyhow::Result<u8> {
    let source = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    execute(&source, stdin.lock().lines(), args.language, &mut stdout)
}

/// Runs `source` without a step limit and returns the exit status.
fn execute<W: Write>(
    source: &str,
    mut input: impl Iterator<Item = io::Result<String>>,
    language: Language,
    out: &mut W,
) -> anyhow::Result<u8> {
    let mut vm = Vm::new();
    vm.configure(VmOptionsUpdate {
        max_execution_step_count: Some(0),
        ..Default::default()
    });
    vm.load(source.replace('\r', "").split('\n'));

    loop {
        vm.run();
        print_lines(out, vm.flush_write_buffer(), language)
            .context("failed to write program output")?;
        if vm.state() != VmState::WaitInput {
            break;
        }
        out.flush().context("failed to write program output")?;
        match input.next() {
            Some(line) => {
                let line = line.context("failed to read standard input")?;
                vm.supply_input(&line);
            }
            None => {
                log::debug!("standard input closed while waiting for input");
                vm.cancel_input();
            }
        }
    }
    Ok(exit_status(&vm))
}

/// Prints the output and error fragments of each line. Lines with neither
/// print nothing.
fn print_lines<W: Write>(
    out: &mut W,
    lines: Vec<ConsoleLine>,
    language: Language,
) -> io::Result<()> {
    for line in lines {
        let mut printed = false;
        for fragment in line.iter().filter(|fragment| {
            matches!(fragment.severity, Severity::Output | Severity::Error)
        }) {
            write!(out, "{}", catalog::render(&fragment.message, language))?;
            printed = true;
        }
        if printed {
            writeln!(out)?;
        }
    }
    Ok(())
}

fn exit_status(vm: &Vm) -> u8 {
    match vm.state() {
        VmState::ExitedNormally => 0,
        // truncated like a process exit status
        VmState::ExitedAbnormally => {
            vm.return_value().map_or(1, |value| value as u8)
        }
        _ => 1,
    }
}
