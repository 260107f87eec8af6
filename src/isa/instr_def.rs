//! 指令描述符
//!
//! 一条指令的静态定义（助记符、用法、格式模板、适用位宽、语义动作）
//! 写在各扩展的目录表里；注册进指令表时模板被编译成 [`Codec`]，
//! 得到运行时使用的 [`Descriptor`]。

use super::codec::{Codec, Operands};
use crate::cpu::Hart;
use crate::error::{BuildError, Exception};

/// 整数寄存器位宽
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Xlen {
    #[default]
    Rv32,
    Rv64,
}

impl Xlen {
    pub fn bits(self) -> u32 {
        match self {
            Xlen::Rv32 => 32,
            Xlen::Rv64 => 64,
        }
    }

    /// 截断到寄存器宽度
    #[inline]
    pub fn normalize(self, value: u64) -> u64 {
        match self {
            Xlen::Rv32 => value & 0xFFFF_FFFF,
            Xlen::Rv64 => value,
        }
    }

    /// 以寄存器宽度解释为有符号数
    #[inline]
    pub fn sext(self, value: u64) -> i64 {
        match self {
            Xlen::Rv32 => value as u32 as i32 as i64,
            Xlen::Rv64 => value as i64,
        }
    }

    /// 移位量掩码
    #[inline]
    pub fn shamt_mask(self) -> u32 {
        self.bits() - 1
    }
}

/// 描述符适用的位宽
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Both,
    Rv32Only,
    Rv64Only,
}

impl Applicability {
    pub fn includes(self, xlen: Xlen) -> bool {
        matches!(
            (self, xlen),
            (Applicability::Both, _) | (Applicability::Rv32Only, Xlen::Rv32) | (Applicability::Rv64Only, Xlen::Rv64)
        )
    }

    /// 是否存在同时适用两者的位宽
    pub fn overlaps(self, other: Applicability) -> bool {
        self.includes(Xlen::Rv32) && other.includes(Xlen::Rv32)
            || self.includes(Xlen::Rv64) && other.includes(Xlen::Rv64)
    }
}

pub type ExecResult = Result<(), Exception>;

/// 语义动作
///
/// 执行前引擎已将 pc 前进到下一条指令；跳转类动作基于 `Hart::instr_pc` 计算目标。
pub type Action = fn(&mut Hart, &Operands) -> ExecResult;

/// 指令的静态定义
#[derive(Clone, Copy)]
pub struct InstrDef {
    /// 用法示例，首个单词即助记符
    pub usage: &'static str,
    pub description: &'static str,
    /// 格式模板，见 [`Codec::compile`]
    pub template: &'static str,
    pub applicability: Applicability,
    pub action: Action,
}

impl InstrDef {
    pub const fn new(usage: &'static str, description: &'static str, template: &'static str, action: Action) -> Self {
        Self {
            usage,
            description,
            template,
            applicability: Applicability::Both,
            action,
        }
    }

    pub const fn rv32_only(mut self) -> Self {
        self.applicability = Applicability::Rv32Only;
        self
    }

    pub const fn rv64_only(mut self) -> Self {
        self.applicability = Applicability::Rv64Only;
        self
    }

    pub fn mnemonic(&self) -> &'static str {
        self.usage.split_whitespace().next().unwrap_or(self.usage)
    }
}

impl std::fmt::Debug for InstrDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrDef")
            .field("usage", &self.usage)
            .field("template", &self.template)
            .field("applicability", &self.applicability)
            .finish()
    }
}

/// 已编译的描述符
#[derive(Debug, Clone)]
pub struct Descriptor {
    def: &'static InstrDef,
    codec: Codec,
}

impl Descriptor {
    pub fn compile(def: &'static InstrDef) -> Result<Self, BuildError> {
        let codec = Codec::compile(def.template).map_err(|source| BuildError::Template {
            name: def.mnemonic(),
            source,
        })?;
        Ok(Self { def, codec })
    }

    pub fn def(&self) -> &'static InstrDef {
        self.def
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn mnemonic(&self) -> &'static str {
        self.def.mnemonic()
    }

    pub fn applicability(&self) -> Applicability {
        self.def.applicability
    }

    pub fn action(&self) -> Action {
        self.def.action
    }

    #[inline]
    pub fn matches(&self, word: u32) -> bool {
        self.codec.matches(word)
    }

    /// 两个描述符冲突：适用位宽有交集，且存在同时匹配两者的指令字
    pub fn conflicts_with(&self, other: &Descriptor) -> bool {
        self.applicability().overlaps(other.applicability()) && self.codec.conflicts_with(&other.codec)
    }
}
