//! rars_sim 命令行入口
//!
//! 装载 ELF 或原始映像，运行到终止，然后按参数打印寄存器与内存。

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{debug, warn};

use rars_sim::cpu::{Flen, Hart};
use rars_sim::cpu::registers::fp_register_number;
use rars_sim::engine::{Simulator, StopReason};
use rars_sim::error::SimError;
use rars_sim::isa::Xlen;
use rars_sim::memory::{MemoryConfig, MemoryLayout};
use rars_sim::sim_env::{Program, SimConfig};

/// 内存转储每行的字数
const WORDS_PER_LINE: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DisplayFormat {
    Hex,
    Decimal,
    Ascii,
}

#[derive(Parser, Debug)]
#[command(version, about = "RISC-V instruction-set simulator", long_about = None)]
struct Args {
    /// Program to execute (RISC-V ELF, or raw little-endian words with --raw).
    file: PathBuf,
    /// Treat the file as raw machine code placed at the start of the text segment.
    #[arg(long)]
    raw: bool,
    /// Simulate a 64-bit hart.
    #[arg(long)]
    rv64: bool,
    /// ISA string such as rv32imfd or rv64g (defaults to every built-in extension).
    #[arg(long)]
    isa: Option<String>,
    /// Memory configuration: default, compact-data-at-zero or compact-text-at-zero.
    #[arg(long, default_value = "default")]
    memory_config: MemoryConfig,
    /// Allow writes to the text segment and execution from data segments.
    #[arg(long)]
    smc: bool,
    /// Maximum number of instructions per run (0 or less is unbounded).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    max_steps: i64,
    /// Start execution at the `main` symbol when the program defines one.
    #[arg(long)]
    start_at_main: bool,
    /// Pause at this address and print the requested state; may be repeated.
    #[arg(long = "break", value_name = "ADDR", value_parser = parse_addr)]
    breakpoints: Vec<u64>,
    /// Register to print after the run (x5, t0, f1, fcsr, pc, ...); may be repeated.
    #[arg(long = "reg", value_name = "NAME")]
    registers: Vec<String>,
    /// Inclusive word range to print after the run, e.g. 0x10010000-0x10010020.
    #[arg(long = "dump", value_name = "START-END", value_parser = parse_range)]
    dumps: Vec<(u64, u64)>,
    /// Format used for register and memory values.
    #[arg(long, value_enum, default_value_t = DisplayFormat::Hex)]
    format: DisplayFormat,
    /// Print the number of executed instructions.
    #[arg(long)]
    ic: bool,
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = stderrlog::new()
        .modules([module_path!(), "rars_sim"])
        .verbosity(args.verbose as usize + 1)
        .init()
    {
        eprintln!("failed to install logger: {err}");
    }

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, SimError> {
    let mut config = SimConfig::new()
        .with_memory_config(args.memory_config)
        .with_self_modifying_code(args.smc)
        .with_max_steps(args.max_steps)
        .with_breakpoints(args.breakpoints.iter().copied())
        .with_start_at_main(args.start_at_main);
    if let Some(isa) = &args.isa {
        config = config.with_isa(isa)?;
    }

    let program = if args.raw {
        let base = MemoryLayout::new(args.memory_config).text.start;
        Program::from_raw_file(&args.file, base)?
    } else {
        Program::from_elf_file(&args.file)?
    };
    if args.rv64 {
        config = config.with_xlen(Xlen::Rv64);
    } else if let Some(class) = program.class {
        config = config.with_xlen(class);
    }

    let mut sim = Simulator::new(config, program)?;
    debug!("{:?}", sim);
    if args.start_at_main && !sim.started_at_main() {
        warn!("program has no `main` symbol, starting at the entry point");
    }

    let exit = loop {
        let result = sim.run();
        flush_console(sim.hart_mut());
        match result {
            Ok(StopReason::Breakpoint) => display_post_mortem(&sim, args),
            Ok(StopReason::MaxSteps) => {
                println!("\nProgram terminated when maximum step limit {} reached.", args.max_steps);
                break ExitCode::SUCCESS;
            }
            Ok(StopReason::CliffTermination) => {
                println!("\nProgram terminated by dropping off the bottom.");
                break ExitCode::SUCCESS;
            }
            Ok(StopReason::NormalTermination(code)) => {
                println!("\nProgram terminated by calling exit");
                break ExitCode::from(code as u8);
            }
            Ok(StopReason::Stopped) => break ExitCode::SUCCESS,
            Err(fault) => {
                println!("\nError: {fault}");
                println!("Simulation terminated due to errors.");
                break ExitCode::FAILURE;
            }
        }
    };

    display_post_mortem(&sim, args);
    Ok(exit)
}

fn flush_console(hart: &mut Hart) {
    let output = hart.take_console();
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = stdout.write_all(&output).and_then(|_| stdout.flush()) {
        warn!("failed to write program output: {err}");
    }
}

fn display_post_mortem(sim: &Simulator, args: &Args) {
    if args.ic {
        println!("{}", sim.steps_executed());
    }
    for name in &args.registers {
        display_register(sim.hart(), name, args.format);
    }
    for &(start, end) in &args.dumps {
        display_memory(sim.hart(), start, end, args);
    }
}

fn display_register(hart: &Hart, name: &str, format: DisplayFormat) {
    let value = match hart.register_value(name) {
        Ok(value) => value,
        Err(err) => {
            warn!("{err}");
            return;
        }
    };

    let is_fp = hart.has_fp() && hart.int_register(name).is_err() && fp_register_number(name).is_some();
    let text = match (is_fp, format) {
        (true, DisplayFormat::Decimal) => match hart.fpr().flen() {
            Flen::Double => f64::from_bits(value).to_string(),
            Flen::Single => f32::from_bits(value as u32).to_string(),
        },
        (true, _) => format_value(value, 64, format),
        (false, _) => format_value(value, hart.xlen().bits(), format),
    };
    println!("{name}\t{text}");
}

fn format_value(value: u64, bits: u32, format: DisplayFormat) -> String {
    let width = (bits / 4) as usize;
    match format {
        DisplayFormat::Hex => format!("0x{value:0width$x}"),
        DisplayFormat::Decimal => {
            let shift = 64 - bits;
            (((value << shift) as i64) >> shift).to_string()
        }
        DisplayFormat::Ascii => {
            let bytes = value.to_be_bytes();
            bytes[bytes.len() - (bits / 8) as usize..]
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect()
        }
    }
}

/// 未写过的字显示为 `--------`
fn display_memory(hart: &Hart, start: u64, end: u64, args: &Args) {
    let memory = hart.memory();
    let mut line = String::new();
    for (i, addr) in (start & !3..=end).step_by(4).enumerate() {
        if i as u64 % WORDS_PER_LINE == 0 {
            if !line.is_empty() {
                println!("{}", line.trim_end());
                line.clear();
            }
            if args.verbose > 0 {
                line.push_str(&format!("Mem[0x{addr:08x}]\t"));
            }
        }
        let cell = if memory.segment_of(addr).is_none() {
            format!("Invalid address: 0x{addr:08x}")
        } else {
            match memory.raw_word(addr) {
                Some(word) => format_value(word as u64, 32, args.format),
                None => "--------".to_string(),
            }
        };
        line.push_str(&cell);
        line.push('\t');
    }
    println!("{}", line.trim_end());
}

fn parse_addr(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|err| format!("invalid address `{s}`: {err}"))
}

fn parse_range(s: &str) -> Result<(u64, u64), String> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| format!("expected START-END, got `{s}`"))?;
    let (start, end) = (parse_addr(start)?, parse_addr(end)?);
    if start > end {
        return Err(format!("range start 0x{start:x} is past its end 0x{end:x}"));
    }
    Ok((start, end))
}
