//! ISA 配置
//!
//! 选择启用的扩展目录并组装指令表；重叠在组装时即报告。

use std::collections::BTreeSet;

use log::debug;

use super::instr_def::InstrDef;
use super::rvd::RVD_INSTRS;
use super::rvf::RVF_INSTRS;
use super::rvi::RVI_INSTRS;
use super::rvm::RVM_INSTRS;
use super::table::InstrTable;
use super::zicsr::ZICSR_INSTRS;
use crate::error::BuildError;

/// 支持的 ISA 扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IsaExtension {
    /// 基础整数指令集（必选）
    I,
    /// M 扩展：乘除法
    M,
    /// F 扩展：单精度浮点
    F,
    /// D 扩展：双精度浮点（隐含 F）
    D,
    /// Zicsr 扩展：CSR 操作指令
    Zicsr,
}

impl IsaExtension {
    pub fn instrs(self) -> &'static [InstrDef] {
        match self {
            IsaExtension::I => RVI_INSTRS,
            IsaExtension::M => RVM_INSTRS,
            IsaExtension::F => RVF_INSTRS,
            IsaExtension::D => RVD_INSTRS,
            IsaExtension::Zicsr => ZICSR_INSTRS,
        }
    }
}

impl std::fmt::Display for IsaExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsaExtension::I => write!(f, "I"),
            IsaExtension::M => write!(f, "M"),
            IsaExtension::F => write!(f, "F"),
            IsaExtension::D => write!(f, "D"),
            IsaExtension::Zicsr => write!(f, "_Zicsr"),
        }
    }
}

/// ISA 配置构建器
///
/// ```
/// use rars_sim::isa::IsaConfig;
///
/// let table = IsaConfig::new()
///     .with_m_extension()
///     .build()
///     .expect("无冲突");
/// assert!(table.find("mul").next().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct IsaConfig {
    extensions: BTreeSet<IsaExtension>,
    custom: Vec<(&'static str, &'static [InstrDef])>,
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl IsaConfig {
    /// 创建新的 ISA 配置（默认只有基础整数指令集）
    pub fn new() -> Self {
        let mut extensions = BTreeSet::new();
        extensions.insert(IsaExtension::I);
        Self {
            extensions,
            custom: Vec::new(),
        }
    }

    /// 启用全部内置扩展（RARS 的默认配置）
    pub fn full() -> Self {
        Self::new()
            .with_m_extension()
            .with_d_extension()
            .with_zicsr_extension()
    }

    pub fn with_m_extension(mut self) -> Self {
        self.extensions.insert(IsaExtension::M);
        self
    }

    pub fn with_f_extension(mut self) -> Self {
        self.extensions.insert(IsaExtension::F);
        self
    }

    /// 启用 D 扩展，同时启用 F
    pub fn with_d_extension(mut self) -> Self {
        self.extensions.insert(IsaExtension::F);
        self.extensions.insert(IsaExtension::D);
        self
    }

    pub fn with_zicsr_extension(mut self) -> Self {
        self.extensions.insert(IsaExtension::Zicsr);
        self
    }

    /// 追加自定义指令目录，组装时与内置目录一起做重叠检测
    pub fn with_custom(mut self, name: &'static str, instrs: &'static [InstrDef]) -> Self {
        self.custom.push((name, instrs));
        self
    }

    pub fn has_extension(&self, ext: IsaExtension) -> bool {
        self.extensions.contains(&ext)
    }

    pub fn extensions(&self) -> impl Iterator<Item = IsaExtension> + '_ {
        self.extensions.iter().copied()
    }

    /// 组装指令表
    pub fn build(&self) -> Result<InstrTable, BuildError> {
        let mut table = InstrTable::new();
        for ext in &self.extensions {
            table.register_all(ext.instrs())?;
        }
        for (name, instrs) in &self.custom {
            debug!("registering custom catalog {name} ({} instructions)", instrs.len());
            table.register_all(instrs)?;
        }
        debug!("instruction table built: {} ({} descriptors)", self.summary(), table.len());
        Ok(table)
    }

    /// 配置摘要，如 "RVIMFD_Zicsr"
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self.extensions.iter().map(|e| e.to_string()).collect();
        for (name, _) in &self.custom {
            parts.push(format!("_X{name}"));
        }
        format!("RV{}", parts.join(""))
    }
}
