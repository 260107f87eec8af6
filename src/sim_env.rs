//! 仿真环境配置与程序装载
//!
//! 本模块负责：
//! - 会话配置（[`SimConfig`]）：位宽、内存布局、ISA 扩展、自修改代码、步数上限与断点
//! - ISA 扩展字符串解析（[`IsaExtensions`]）
//! - 程序映像（[`Program`]）：由 ELF 文件、原始字映像或测试用的字序列构造
//!
//! # 示例
//!
//! ```no_run
//! use rars_sim::sim_env::{Program, SimConfig};
//!
//! let config = SimConfig::new()
//!     .with_isa("rv32imfd")
//!     .expect("valid ISA string")
//!     .with_max_steps(1000);
//! let program = Program::from_elf_file("program.elf").expect("failed to load ELF");
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use elf::abi::{EM_RISCV, PF_X, PT_LOAD};
use elf::endian::AnyEndian;
use elf::file::Class;
use elf::ElfBytes;
use log::debug;

use crate::error::SimError;
use crate::isa::{IsaConfig, Xlen};
use crate::memory::{Memory, MemoryConfig, MemoryLayout};

/// ISA 扩展配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsaExtensions {
    /// 启用 M 扩展（乘除法）
    pub m: bool,
    /// 启用 F 扩展（单精度浮点）
    pub f: bool,
    /// 启用 D 扩展（双精度浮点）
    pub d: bool,
    /// 启用 Zicsr 扩展（CSR 操作）
    pub zicsr: bool,
}

impl IsaExtensions {
    /// 仅基础整数指令集
    pub fn rv32i() -> Self {
        Self { m: false, f: false, d: false, zicsr: false }
    }

    /// 全部内置扩展（IMFD + Zicsr）
    pub fn full() -> Self {
        Self { m: true, f: true, d: true, zicsr: true }
    }

    /// 转换为指令表配置
    pub fn isa_config(&self) -> IsaConfig {
        let mut config = IsaConfig::new();
        if self.m {
            config = config.with_m_extension();
        }
        if self.d {
            config = config.with_d_extension();
        } else if self.f {
            config = config.with_f_extension();
        }
        if self.zicsr {
            config = config.with_zicsr_extension();
        }
        config
    }
}

impl Default for IsaExtensions {
    fn default() -> Self {
        Self::full()
    }
}

impl FromStr for IsaExtensions {
    type Err = SimError;

    /// 格式示例: "rv32imf", "rv64g", "imfd_zicsr"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        let s = s.strip_prefix("rv32").or_else(|| s.strip_prefix("rv64")).unwrap_or(&s);

        let mut parts = s.split('_');
        let letters = parts.next().unwrap_or_default();

        let mut ext = Self::rv32i();
        for c in letters.chars() {
            match c {
                'i' => {} // 基础指令集，总是启用
                'm' => ext.m = true,
                'f' => {
                    ext.f = true;
                    ext.zicsr = true; // F 扩展需要 Zicsr
                }
                'd' => {
                    ext.f = true;
                    ext.d = true;
                    ext.zicsr = true;
                }
                'g' => ext = Self::full(),
                other => {
                    return Err(SimError::Config(format!("unsupported ISA extension `{other}`")));
                }
            }
        }

        for part in parts.filter(|p| !p.is_empty()) {
            match part {
                "zicsr" => ext.zicsr = true,
                "zifencei" => {} // fence.i 按空操作处理，无需额外指令
                other => {
                    return Err(SimError::Config(format!("unsupported ISA extension `{other}`")));
                }
            }
        }

        Ok(ext)
    }
}

/// 仿真会话配置
///
/// 交给 [`crate::engine::Simulator`] 后即冻结，修改配置需要新建会话。
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub xlen: Xlen,
    pub memory_config: MemoryConfig,
    pub extensions: IsaExtensions,
    /// 允许写 text 段并从数据段取指
    pub self_modifying_code: bool,
    /// 每次 `run` 的最大执行指令数（<= 0 表示无限制）
    pub max_steps: i64,
    pub breakpoints: BTreeSet<u64>,
    /// 程序定义了 `main` 时从 `main` 开始执行
    pub start_at_main: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            xlen: Xlen::Rv32,
            memory_config: MemoryConfig::Default,
            extensions: IsaExtensions::full(),
            self_modifying_code: false,
            max_steps: 0,
            breakpoints: BTreeSet::new(),
            start_at_main: false,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xlen(mut self, xlen: Xlen) -> Self {
        self.xlen = xlen;
        self
    }

    pub fn with_memory_config(mut self, config: MemoryConfig) -> Self {
        self.memory_config = config;
        self
    }

    pub fn with_extensions(mut self, ext: IsaExtensions) -> Self {
        self.extensions = ext;
        self
    }

    /// 从 ISA 字符串设置扩展；`rv64` 前缀同时切换到 64 位
    pub fn with_isa(mut self, isa: &str) -> Result<Self, SimError> {
        self.extensions = isa.parse()?;
        if isa.to_ascii_lowercase().starts_with("rv64") {
            self.xlen = Xlen::Rv64;
        }
        Ok(self)
    }

    pub fn with_self_modifying_code(mut self, enabled: bool) -> Self {
        self.self_modifying_code = enabled;
        self
    }

    pub fn with_max_steps(mut self, max: i64) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_breakpoint(mut self, addr: u64) -> Self {
        self.breakpoints.insert(addr);
        self
    }

    pub fn with_breakpoints(mut self, addrs: impl IntoIterator<Item = u64>) -> Self {
        self.breakpoints.extend(addrs);
        self
    }

    pub fn with_start_at_main(mut self, enabled: bool) -> Self {
        self.start_at_main = enabled;
        self
    }

    /// 步数上限；None 表示无限制
    pub fn step_budget(&self) -> Option<u64> {
        (self.max_steps > 0).then_some(self.max_steps as u64)
    }
}

/// 一条程序语句：绑定到地址的机器字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub addr: u64,
    pub word: u32,
}

/// 一段初始化数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub addr: u64,
    pub bytes: Vec<u8>,
}

/// 装载到会话中的程序映像
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// 按地址排列的指令语句
    pub statements: Vec<Statement>,
    pub data: Vec<DataChunk>,
    /// 入口地址；None 时从 text 段起始处开始
    pub entry: Option<u64>,
    /// `main` 符号地址
    pub main: Option<u64>,
    /// ELF 文件声明的位宽
    pub class: Option<Xlen>,
}

impl Program {
    /// 把一串指令字从 `base` 开始依次排列
    pub fn from_words(base: u64, words: &[u32]) -> Self {
        let statements = words
            .iter()
            .enumerate()
            .map(|(i, &word)| Statement { addr: base + 4 * i as u64, word })
            .collect();
        Self { statements, entry: Some(base), ..Self::default() }
    }

    /// 小端字节流，末尾不足一个字的部分补零
    pub fn from_raw_bytes(base: u64, bytes: &[u8]) -> Self {
        Self::from_words(base, &words_of(bytes))
    }

    /// 读取原始映像文件（小端 32 位字序列）
    pub fn from_raw_file<P: AsRef<Path>>(path: P, base: u64) -> Result<Self, SimError> {
        let bytes = fs::read(path.as_ref())?;
        debug!("raw image {} ({} bytes) at 0x{base:08x}", path.as_ref().display(), bytes.len());
        Ok(Self::from_raw_bytes(base, &bytes))
    }

    /// 解析 ELF 文件
    pub fn from_elf_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let data = fs::read(path.as_ref())?;
        debug!("ELF {} ({} bytes)", path.as_ref().display(), data.len());
        Self::from_elf_bytes(&data)
    }

    /// 从字节数组解析 ELF（使用 elf crate）
    ///
    /// 可执行的 `PT_LOAD` 段成为指令语句，其余段成为数据（含补零的 bss）。
    pub fn from_elf_bytes(data: &[u8]) -> Result<Self, SimError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| SimError::ElfParse(format!("failed to parse ELF: {e}")))?;

        let header = &elf_file.ehdr;
        if header.e_machine != EM_RISCV {
            return Err(SimError::ElfParse(format!(
                "not a RISC-V ELF (machine type 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }
        if header.endianness != AnyEndian::Little {
            return Err(SimError::ElfParse("only little-endian ELF is supported".into()));
        }
        let class = match header.class {
            Class::ELF32 => Xlen::Rv32,
            Class::ELF64 => Xlen::Rv64,
        };

        let mut program = Program {
            entry: Some(header.e_entry),
            class: Some(class),
            ..Self::default()
        };

        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
                let bytes = elf_file
                    .segment_data(&phdr)
                    .map_err(|e| SimError::ElfParse(format!("failed to read segment data: {e}")))?;

                if phdr.p_flags & PF_X != 0 {
                    let words = words_of(bytes);
                    program.statements.extend(
                        words.iter().enumerate().map(|(i, &word)| Statement { addr: phdr.p_vaddr + 4 * i as u64, word }),
                    );
                } else {
                    let len = phdr.p_memsz.max(phdr.p_filesz);
                    if len > 0 && !fits_some_segment(phdr.p_vaddr, len) {
                        return Err(SimError::ElfParse(format!(
                            "segment at 0x{:08x} declares 0x{len:x} bytes, more than any memory segment holds",
                            phdr.p_vaddr
                        )));
                    }
                    let mut bytes = bytes.to_vec();
                    bytes.resize(len as usize, 0);
                    program.data.push(DataChunk { addr: phdr.p_vaddr, bytes });
                }
            }
        }
        program.statements.sort_by_key(|s| s.addr);

        if let Ok(Some((symtab, strtab))) = elf_file.symbol_table() {
            program.main = symtab
                .iter()
                .find(|sym| sym.st_value != 0 && strtab.get(sym.st_name as usize).is_ok_and(|name| name == "main"))
                .map(|sym| sym.st_value);
        }

        debug!(
            "ELF{} entry 0x{:08x}: {} statements, {} data chunks, main {:?}",
            class.bits(),
            header.e_entry,
            program.statements.len(),
            program.data.len(),
            program.main
        );
        Ok(program)
    }

    pub fn with_data(mut self, addr: u64, bytes: impl Into<Vec<u8>>) -> Self {
        self.data.push(DataChunk { addr, bytes: bytes.into() });
        self
    }

    pub fn with_entry(mut self, entry: u64) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_main(mut self, main: u64) -> Self {
        self.main = Some(main);
        self
    }

    /// 最后一条语句之后的地址
    pub fn text_end(&self) -> Option<u64> {
        self.statements.iter().map(|s| s.addr + 4).max()
    }

    /// 把语句与数据写入内存（绕过 text 写保护）
    pub fn load_into(&self, memory: &mut Memory) -> Result<(), SimError> {
        for statement in &self.statements {
            memory.load_image(statement.addr, &statement.word.to_le_bytes())?;
        }
        for chunk in &self.data {
            memory.load_image(chunk.addr, &chunk.bytes)?;
        }
        Ok(())
    }
}

fn words_of(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(word)
        })
        .collect()
}

/// `[addr, addr + len)` 能否整体放进某个内存预设的某一段
fn fits_some_segment(addr: u64, len: u64) -> bool {
    MemoryConfig::ALL.into_iter().any(|config| {
        MemoryLayout::new(config)
            .segment_of(addr)
            .is_some_and(|segment| segment.contains_range(addr, len))
    })
}
