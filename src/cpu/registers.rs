//! Architectural state components: integer and floating-point register files and the CSR file.

use std::collections::HashMap;

use crate::error::RegisterNotFound;
use crate::isa::Xlen;

/// Generic register file with configurable count, element type, and zero-hardwire behavior.
///
/// - `N`: number of registers
/// - `T`: element type
/// - `ZERO_HARDWIRE`: if true, register 0 always reads as zero and writes are ignored
#[derive(Clone, Debug)]
pub struct GenericRegFile<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> {
    regs: [T; N],
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> GenericRegFile<N, T, ZERO_HARDWIRE> {
    pub fn new() -> Self {
        Self { regs: [T::default(); N] }
    }

    /// Reads register `reg`. Indices past the end read as the default value.
    #[inline]
    pub fn read(&self, reg: u8) -> T {
        if ZERO_HARDWIRE && reg == 0 {
            T::default()
        } else {
            self.regs.get(reg as usize).copied().unwrap_or_default()
        }
    }

    /// Writes register `reg`. Writes to indices past the end are ignored.
    #[inline]
    pub fn write(&mut self, reg: u8, value: T) {
        if ZERO_HARDWIRE && reg == 0 {
            return;
        }
        if let Some(slot) = self.regs.get_mut(reg as usize) {
            *slot = value;
        }
    }

    /// Bounds-checked read for callers holding an arbitrary index.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= N {
            None
        } else {
            Some(self.read(index as u8))
        }
    }

    pub fn snapshot(&self) -> &[T; N] {
        &self.regs
    }

    pub fn clear(&mut self) {
        self.regs = [T::default(); N];
    }
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> Default for GenericRegFile<N, T, ZERO_HARDWIRE> {
    fn default() -> Self {
        Self::new()
    }
}

/// ABI register numbers used by the runtime.
pub mod abi {
    pub const RA: u8 = 1;
    pub const SP: u8 = 2;
    pub const GP: u8 = 3;
    pub const A0: u8 = 10;
    pub const A1: u8 = 11;
    pub const A7: u8 = 17;
}

pub const INT_ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

pub const FP_ABI_NAMES: [&str; 32] = [
    "ft0", "ft1", "ft2", "ft3", "ft4", "ft5", "ft6", "ft7", "fs0", "fs1", "fa0", "fa1", "fa2", "fa3", "fa4", "fa5",
    "fa6", "fa7", "fs2", "fs3", "fs4", "fs5", "fs6", "fs7", "fs8", "fs9", "fs10", "fs11", "ft8", "ft9", "ft10", "ft11",
];

/// Resolve `xN`, an ABI name, or `fp` (alias of s0) to an integer register number.
pub fn int_register_number(name: &str) -> Option<u8> {
    if name == "fp" {
        return Some(8);
    }
    numbered(name, 'x').or_else(|| INT_ABI_NAMES.iter().position(|n| *n == name).map(|i| i as u8))
}

/// Resolve `fN` or an ABI name to a floating-point register number.
pub fn fp_register_number(name: &str) -> Option<u8> {
    numbered(name, 'f').or_else(|| FP_ABI_NAMES.iter().position(|n| *n == name).map(|i| i as u8))
}

fn numbered(name: &str, prefix: char) -> Option<u8> {
    let digits = name.strip_prefix(prefix)?;
    // 拒绝 "x01" 之类的写法
    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
        return None;
    }
    digits.parse::<u8>().ok().filter(|n| *n < 32)
}

/// Integer register file x0..x31. Values are kept normalized to the configured width.
#[derive(Clone, Debug)]
pub struct IntRegisterFile {
    regs: GenericRegFile<32, u64, true>,
    xlen: Xlen,
}

impl IntRegisterFile {
    pub fn new(xlen: Xlen) -> Self {
        Self { regs: GenericRegFile::new(), xlen }
    }

    pub fn xlen(&self) -> Xlen {
        self.xlen
    }

    #[inline]
    pub fn read(&self, reg: u8) -> u64 {
        self.regs.read(reg)
    }

    /// Read interpreted as a signed value of the configured width.
    #[inline]
    pub fn read_signed(&self, reg: u8) -> i64 {
        self.xlen.sext(self.regs.read(reg))
    }

    #[inline]
    pub fn write(&mut self, reg: u8, value: u64) {
        self.regs.write(reg, self.xlen.normalize(value))
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        self.regs.get(index)
    }

    pub fn snapshot(&self) -> &[u64; 32] {
        self.regs.snapshot()
    }

    pub fn clear(&mut self) {
        self.regs.clear()
    }
}

/// Width of the floating-point registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flen {
    Single,
    Double,
}

/// Canonical single-precision quiet NaN.
pub const F32_CANONICAL_NAN: u32 = 0x7FC0_0000;
/// Canonical double-precision quiet NaN.
pub const F64_CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

const NAN_BOX: u64 = 0xFFFF_FFFF_0000_0000;

/// Floating-point register file f0..f31.
///
/// With 64-bit registers, single-precision values are NaN-boxed: the upper half is all ones.
/// Reading a single from a slot that is not properly boxed yields the canonical NaN.
#[derive(Clone, Debug)]
pub struct FpRegisterFile {
    regs: GenericRegFile<32, u64, false>,
    flen: Flen,
}

impl FpRegisterFile {
    pub fn new(flen: Flen) -> Self {
        Self { regs: GenericRegFile::new(), flen }
    }

    pub fn flen(&self) -> Flen {
        self.flen
    }

    /// Raw register contents.
    #[inline]
    pub fn read_bits(&self, reg: u8) -> u64 {
        self.regs.read(reg)
    }

    #[inline]
    pub fn write_bits(&mut self, reg: u8, value: u64) {
        let value = match self.flen {
            Flen::Single => value & 0xFFFF_FFFF,
            Flen::Double => value,
        };
        self.regs.write(reg, value)
    }

    #[inline]
    pub fn read_single_bits(&self, reg: u8) -> u32 {
        let raw = self.regs.read(reg);
        match self.flen {
            Flen::Double if raw & NAN_BOX != NAN_BOX => F32_CANONICAL_NAN,
            _ => raw as u32,
        }
    }

    #[inline]
    pub fn write_single_bits(&mut self, reg: u8, value: u32) {
        let raw = match self.flen {
            Flen::Single => value as u64,
            Flen::Double => NAN_BOX | value as u64,
        };
        self.regs.write(reg, raw)
    }

    #[inline]
    pub fn read_double_bits(&self, reg: u8) -> u64 {
        self.regs.read(reg)
    }

    #[inline]
    pub fn write_double_bits(&mut self, reg: u8, value: u64) {
        self.write_bits(reg, value)
    }

    pub fn read_f32(&self, reg: u8) -> f32 {
        f32::from_bits(self.read_single_bits(reg))
    }

    pub fn write_f32(&mut self, reg: u8, value: f32) {
        self.write_single_bits(reg, value.to_bits())
    }

    pub fn read_f64(&self, reg: u8) -> f64 {
        f64::from_bits(self.read_double_bits(reg))
    }

    pub fn write_f64(&mut self, reg: u8, value: f64) {
        self.write_double_bits(reg, value.to_bits())
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        self.regs.get(index)
    }

    pub fn snapshot(&self) -> &[u64; 32] {
        self.regs.snapshot()
    }

    pub fn clear(&mut self) {
        self.regs.clear()
    }
}

/// Table entry for CSR declaration.
#[derive(Clone, Copy, Debug)]
pub struct CsrEntry {
    pub name: &'static str,
    pub addr: u16,
    pub reset: u64,
    /// Writes through CSR instructions are illegal.
    pub read_only: bool,
    /// Only present when XLEN is 32 (upper halves of the counters).
    pub rv32_only: bool,
}

impl CsrEntry {
    pub const fn rw(name: &'static str, addr: u16) -> Self {
        Self { name, addr, reset: 0, read_only: false, rv32_only: false }
    }

    pub const fn ro(name: &'static str, addr: u16) -> Self {
        Self { name, addr, reset: 0, read_only: true, rv32_only: false }
    }

    pub const fn rv32_only(mut self) -> Self {
        self.rv32_only = true;
        self
    }
}

/// Sparse CSR file: declared entries plus a hash table of stored values.
#[derive(Clone, Debug, Default)]
pub struct CsrFile {
    entries: Vec<CsrEntry>,
    table: HashMap<u16, u64>,
}

impl CsrFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of CSRs declared as a table. Entries not valid for `xlen` are skipped.
    pub fn register(&mut self, entries: &[CsrEntry], xlen: Xlen) {
        for e in entries.iter().filter(|e| !e.rv32_only || xlen == Xlen::Rv32) {
            self.entries.push(*e);
            self.table.insert(e.addr, e.reset);
        }
    }

    pub fn entry(&self, addr: u16) -> Option<&CsrEntry> {
        self.entries.iter().find(|e| e.addr == addr)
    }

    /// Resolve a CSR by name or by number (`0x003` or decimal).
    pub fn lookup(&self, name: &str) -> Result<u16, RegisterNotFound> {
        let by_number = match name.strip_prefix("0x") {
            Some(hex) => u16::from_str_radix(hex, 16).ok(),
            None => name.parse::<u16>().ok(),
        };
        self.entries
            .iter()
            .find(|e| e.name == name || Some(e.addr) == by_number)
            .map(|e| e.addr)
            .ok_or_else(|| RegisterNotFound(name.to_string()))
    }

    /// Stored value of a declared CSR.
    #[inline]
    pub fn read(&self, addr: u16) -> Option<u64> {
        self.table.get(&addr).copied()
    }

    /// Store a value; returns false if the CSR is not declared.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u64) -> bool {
        match self.table.get_mut(&addr) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[CsrEntry] {
        &self.entries
    }

    pub fn reset(&mut self) {
        for e in &self.entries {
            self.table.insert(e.addr, e.reset);
        }
    }
}
