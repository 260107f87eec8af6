//! 错误与运行时条件
//!
//! 分为三层：
//! - 构建期错误（[`TemplateError`]、[`BuildError`]），在组装指令表时报告
//! - 执行期异常（[`MemError`]、[`Exception`]），由语义动作返回，交给引擎处理
//! - 引擎对外报告的故障（[`Fault`]）以及加载期错误（[`SimError`]）

use std::fmt;

use thiserror::Error;

use crate::memory::AccessSize;

/// 格式模板编译错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template has {found} bits, expected 32")]
    Width { found: usize },
    #[error("invalid character `{0}` in template")]
    InvalidChar(char),
}

/// 指令表构建错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("bad template for `{name}`: {source}")]
    Template {
        name: &'static str,
        #[source]
        source: TemplateError,
    },
    #[error("`{new}` overlaps already registered `{existing}` (both match 0x{example:08x})")]
    Overlap {
        existing: &'static str,
        new: &'static str,
        example: u32,
    },
}

/// 访存错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemError {
    #[error("{access} access at 0x{addr:08x} is not aligned")]
    Unaligned { addr: u64, access: AccessSize },
    #[error("{access} access at 0x{addr:08x} is outside every segment")]
    OutOfRange { addr: u64, access: AccessSize },
    #[error("{access} write to text segment at 0x{addr:08x} while self-modifying code is disabled")]
    WriteProtected { addr: u64, access: AccessSize },
}

impl MemError {
    /// 出错的地址
    pub fn addr(&self) -> u64 {
        match *self {
            MemError::Unaligned { addr, .. }
            | MemError::OutOfRange { addr, .. }
            | MemError::WriteProtected { addr, .. } => addr,
        }
    }
}

/// 语义动作返回的异常条件
///
/// `Exit` 与 `Breakpoint` 并非错误，引擎将其转换为停止原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Exception {
    #[error("illegal instruction")]
    IllegalInstruction,
    #[error("instruction reserved for another register width")]
    ReservedInstruction,
    #[error(transparent)]
    Memory(#[from] MemError),
    #[error("arithmetic overflow")]
    Arithmetic,
    #[error("unknown environment call {0}")]
    UnknownSyscall(u64),
    #[error("program exit with code {0}")]
    Exit(i32),
    #[error("breakpoint")]
    Breakpoint,
}

/// 故障分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    IllegalInstruction,
    ReservedInstruction,
    AddressMisaligned,
    AddressOutOfRange,
    WriteProtection,
    Arithmetic,
    UnknownSyscall,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FaultKind::IllegalInstruction => "illegal instruction",
            FaultKind::ReservedInstruction => "reserved instruction",
            FaultKind::AddressMisaligned => "address misaligned",
            FaultKind::AddressOutOfRange => "address out of range",
            FaultKind::WriteProtection => "write protection violation",
            FaultKind::Arithmetic => "arithmetic overflow",
            FaultKind::UnknownSyscall => "unknown environment call",
        };
        f.write_str(text)
    }
}

/// 引擎报告的故障，会话进入 Faulted 状态直到复位
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at pc 0x{pc:08x}{}", describe_site(.address, .word, .mnemonic))]
pub struct Fault {
    pub kind: FaultKind,
    /// 相关的数据地址（访存故障）或系统调用号
    pub address: Option<u64>,
    pub pc: u64,
    pub word: Option<u32>,
    pub mnemonic: Option<&'static str>,
}

fn describe_site(address: &Option<u64>, word: &Option<u32>, mnemonic: &Option<&'static str>) -> String {
    let mut out = String::new();
    if let Some(mnemonic) = mnemonic {
        out.push_str(&format!(" ({mnemonic}"));
        if let Some(word) = word {
            out.push_str(&format!(" 0x{word:08x}"));
        }
        out.push(')');
    } else if let Some(word) = word {
        out.push_str(&format!(" (word 0x{word:08x})"));
    }
    if let Some(address) = address {
        out.push_str(&format!(", address 0x{address:08x}"));
    }
    out
}

impl Fault {
    /// 由异常构造故障；`Exit`/`Breakpoint` 不是故障，返回 None
    pub fn from_exception(exception: &Exception, pc: u64, word: Option<u32>, mnemonic: Option<&'static str>) -> Option<Self> {
        let (kind, address) = match exception {
            Exception::IllegalInstruction => (FaultKind::IllegalInstruction, None),
            Exception::ReservedInstruction => (FaultKind::ReservedInstruction, None),
            Exception::Memory(err @ MemError::Unaligned { .. }) => (FaultKind::AddressMisaligned, Some(err.addr())),
            Exception::Memory(err @ MemError::OutOfRange { .. }) => (FaultKind::AddressOutOfRange, Some(err.addr())),
            Exception::Memory(err @ MemError::WriteProtected { .. }) => (FaultKind::WriteProtection, Some(err.addr())),
            Exception::Arithmetic => (FaultKind::Arithmetic, None),
            Exception::UnknownSyscall(service) => (FaultKind::UnknownSyscall, Some(*service)),
            Exception::Exit(_) | Exception::Breakpoint => return None,
        };
        Some(Fault { kind, address, pc, word, mnemonic })
    }
}

/// 按名称查找寄存器失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("register `{0}` not found")]
pub struct RegisterNotFound(pub String);

/// 会话构建与程序加载错误
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ELF parse error: {0}")]
    ElfParse(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("program does not fit the memory layout: {0}")]
    Memory(#[from] MemError),
    #[error(transparent)]
    Build(#[from] BuildError),
}
