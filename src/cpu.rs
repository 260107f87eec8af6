//! 硬件线程（hart）架构状态
//!
//! `Hart` 聚合语义动作可见的全部状态：整数/浮点寄存器、CSR、浮点环境、
//! 内存、程序计数器、指令计数以及系统调用用到的控制台和堆顶。
//! 取指、解码与停止条件由 [`crate::engine`] 负责。

use std::time::Instant;

use crate::error::{Exception, MemError, RegisterNotFound};
use crate::isa::Xlen;
use crate::memory::{AccessSize, Memory};

pub mod csr_def;
pub(crate) mod exu;
pub mod fp_env;
pub mod registers;
mod builder;

pub use builder::HartBuilder;
pub use fp_env::FpEnv;
pub use registers::{CsrEntry, CsrFile, Flen, FpRegisterFile, IntRegisterFile};

use csr_def::*;
use registers::{fp_register_number, int_register_number};

/// 单个硬件线程
///
/// 设计约定：
/// - x0 永远为 0，写入时丢弃
/// - 整数寄存器与 pc 始终截断到 XLEN
/// - 语义动作执行前 pc 已指向下一条指令，`instr_pc` 为当前指令地址
pub struct Hart {
    xlen: Xlen,
    pub(crate) gpr: IntRegisterFile,
    pub(crate) fpr: FpRegisterFile,
    has_fp: bool,
    pub(crate) csr: CsrFile,
    pub(crate) fp_env: FpEnv,
    pub(crate) memory: Memory,
    pc: u64,
    instr_pc: u64,
    instret: u64,
    started: Instant,
    heap_break: u64,
    console: Vec<u8>,
}

impl std::fmt::Debug for Hart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hart")
            .field("xlen", &self.xlen)
            .field("pc", &format_args!("0x{:08x}", self.pc))
            .field("instret", &self.instret)
            .finish()
    }
}

impl Hart {
    pub(crate) fn from_parts(xlen: Xlen, flen: Option<Flen>, csr: CsrFile, memory: Memory) -> Self {
        let heap_break = memory.layout().heap.start;
        Hart {
            xlen,
            gpr: IntRegisterFile::new(xlen),
            fpr: FpRegisterFile::new(flen.unwrap_or(Flen::Single)),
            has_fp: flen.is_some(),
            csr,
            fp_env: FpEnv::new(),
            memory,
            pc: 0,
            instr_pc: 0,
            instret: 0,
            started: Instant::now(),
            heap_break,
            console: Vec::new(),
        }
    }

    /// 恢复到上电状态：清空寄存器、CSR、浮点环境、内存与计数器
    pub fn reset(&mut self) {
        self.gpr.clear();
        self.fpr.clear();
        self.csr.reset();
        self.fp_env.reset();
        self.memory.reset();
        self.pc = 0;
        self.instr_pc = 0;
        self.instret = 0;
        self.started = Instant::now();
        self.heap_break = self.memory.layout().heap.start;
        self.console.clear();
    }

    pub fn xlen(&self) -> Xlen {
        self.xlen
    }

    pub fn has_fp(&self) -> bool {
        self.has_fp
    }

    // ========== 程序计数器 ==========

    /// 下一条要执行的指令地址
    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u64) {
        self.pc = self.xlen.normalize(pc);
    }

    /// 正在执行的指令地址
    pub fn instr_pc(&self) -> u64 {
        self.instr_pc
    }

    /// 进入一条指令：记录其地址并把 pc 前进 4
    pub(crate) fn begin_instruction(&mut self, pc: u64) {
        self.instr_pc = pc;
        self.pc = self.xlen.normalize(pc.wrapping_add(4));
    }

    /// 撤销 `begin_instruction` 的 pc 前进（指令未完成时）
    pub(crate) fn abort_instruction(&mut self) {
        self.pc = self.instr_pc;
    }

    pub(crate) fn retire(&mut self) {
        self.instret = self.instret.wrapping_add(1);
    }

    /// 控制转移
    #[inline]
    pub fn jump(&mut self, target: u64) {
        self.pc = self.xlen.normalize(target);
    }

    pub fn instret(&self) -> u64 {
        self.instret
    }

    /// 会话开始（或上次复位）以来的毫秒数，即 `time` CSR
    pub fn elapsed_millis(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    // ========== 整数寄存器 ==========

    /// 编号超出 0..32 时读为 0，写入被忽略
    #[inline]
    pub fn x(&self, reg: u8) -> u64 {
        self.gpr.read(reg)
    }

    /// 以 XLEN 宽度解释为有符号数
    #[inline]
    pub fn xs(&self, reg: u8) -> i64 {
        self.gpr.read_signed(reg)
    }

    #[inline]
    pub fn set_x(&mut self, reg: u8, value: u64) {
        self.gpr.write(reg, value)
    }

    pub fn gpr(&self) -> &IntRegisterFile {
        &self.gpr
    }

    pub fn fpr(&self) -> &FpRegisterFile {
        &self.fpr
    }

    pub fn fpr_mut(&mut self) -> &mut FpRegisterFile {
        &mut self.fpr
    }

    pub fn fp_env(&self) -> &FpEnv {
        &self.fp_env
    }

    pub fn csr_file(&self) -> &CsrFile {
        &self.csr
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// 基址寄存器加偏移，按 XLEN 回绕
    #[inline]
    pub fn effective_address(&self, base: u8, offset: i64) -> u64 {
        self.xlen.normalize(self.x(base).wrapping_add(offset as u64))
    }

    // ========== CSR ==========

    /// 读 CSR；未声明的 CSR 为非法指令
    pub fn csr_read(&self, addr: u16) -> Result<u64, Exception> {
        let counter_high = |value: u64| match self.xlen {
            Xlen::Rv32 => Some(value >> 32),
            Xlen::Rv64 => None,
        };
        let value = match addr {
            CSR_FFLAGS if self.has_fp => Some(self.fp_env.flags() as u64),
            CSR_FRM if self.has_fp => Some(self.fp_env.frm() as u64),
            CSR_FCSR if self.has_fp => Some(self.fp_env.fcsr() as u64),
            CSR_CYCLE | CSR_INSTRET => Some(self.xlen.normalize(self.instret)),
            CSR_CYCLEH | CSR_INSTRETH => counter_high(self.instret),
            CSR_TIME => Some(self.xlen.normalize(self.elapsed_millis())),
            CSR_TIMEH => counter_high(self.elapsed_millis()),
            _ => self.csr.read(addr),
        };
        value.ok_or(Exception::IllegalInstruction)
    }

    /// 写 CSR；未声明或只读的 CSR 为非法指令
    pub fn csr_write(&mut self, addr: u16, value: u64) -> Result<(), Exception> {
        let entry = self.csr.entry(addr).ok_or(Exception::IllegalInstruction)?;
        if entry.read_only {
            return Err(Exception::IllegalInstruction);
        }
        match addr {
            CSR_FFLAGS => self.fp_env.set_flags(value as u8),
            CSR_FRM => self.fp_env.set_frm(value as u8),
            CSR_FCSR => self.fp_env.set_fcsr(value as u8),
            _ => {
                self.csr.write(addr, self.xlen.normalize(value));
            }
        }
        Ok(())
    }

    // ========== 运行时服务 ==========

    pub(crate) fn console_write(&mut self, bytes: &[u8]) {
        self.console.extend_from_slice(bytes);
    }

    /// 程序至今输出到控制台的内容
    pub fn console(&self) -> &[u8] {
        &self.console
    }

    pub fn take_console(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.console)
    }

    pub fn heap_break(&self) -> u64 {
        self.heap_break
    }

    /// 扩展堆顶，返回旧堆顶；新堆顶按字对齐，不得超出堆段
    pub(crate) fn sbrk(&mut self, amount: i64) -> Result<u64, Exception> {
        let old = self.heap_break;
        let heap = self.memory.layout().heap;
        let requested = old.wrapping_add(amount as u64);
        let new = requested.wrapping_add(3) & !3;
        if amount < 0 || new > heap.end {
            return Err(MemError::OutOfRange { addr: requested, access: AccessSize::Byte }.into());
        }
        self.heap_break = new;
        Ok(old)
    }

    // ========== 按名称检查 ==========

    /// 按名称读取整数寄存器（`x5`、`t0`、`fp` 等）
    pub fn int_register(&self, name: &str) -> Result<u64, RegisterNotFound> {
        int_register_number(name)
            .map(|reg| self.x(reg))
            .ok_or_else(|| RegisterNotFound(name.to_string()))
    }

    /// 按名称读取浮点寄存器原始位
    pub fn fp_register(&self, name: &str) -> Result<u64, RegisterNotFound> {
        fp_register_number(name)
            .filter(|_| self.has_fp)
            .map(|reg| self.fpr.read_bits(reg))
            .ok_or_else(|| RegisterNotFound(name.to_string()))
    }

    /// 按名称或编号读取 CSR
    pub fn csr(&self, name: &str) -> Result<u64, RegisterNotFound> {
        let addr = self.csr.lookup(name)?;
        self.csr_read(addr).map_err(|_| RegisterNotFound(name.to_string()))
    }

    /// 依次在整数、浮点、CSR 中查找；`pc` 返回程序计数器
    pub fn register_value(&self, name: &str) -> Result<u64, RegisterNotFound> {
        if name == "pc" {
            return Ok(self.pc);
        }
        self.int_register(name)
            .or_else(|_| self.fp_register(name))
            .or_else(|_| self.csr(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryConfig, MemoryLayout};

    fn hart(xlen: Xlen) -> Hart {
        HartBuilder::new(MemoryLayout::new(MemoryConfig::Default))
            .xlen(xlen)
            .with_d_extension()
            .build()
    }

    #[test]
    fn test_pc_advance_and_abort() {
        let mut hart = hart(Xlen::Rv32);
        hart.begin_instruction(0x0040_0000);
        assert_eq!(hart.pc(), 0x0040_0004);
        assert_eq!(hart.instr_pc(), 0x0040_0000);
        hart.abort_instruction();
        assert_eq!(hart.pc(), 0x0040_0000);
    }

    #[test]
    fn test_register_index_past_end() {
        let mut hart = hart(Xlen::Rv64);
        hart.set_x(32, 1);
        assert_eq!(hart.x(32), 0);
        assert_eq!(hart.xs(32), 0);
        assert!(hart.gpr().snapshot().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_rv32_pc_wraps() {
        let mut hart = hart(Xlen::Rv32);
        hart.begin_instruction(0xFFFF_FFFC);
        assert_eq!(hart.pc(), 0);
    }

    #[test]
    fn test_fp_csr_aliases() {
        let mut hart = hart(Xlen::Rv32);
        hart.csr_write(CSR_FCSR, 0b010_10001).unwrap();
        assert_eq!(hart.csr_read(CSR_FRM), Ok(0b010));
        assert_eq!(hart.csr_read(CSR_FFLAGS), Ok(0b10001));
        hart.csr_write(CSR_FFLAGS, 0).unwrap();
        assert_eq!(hart.csr_read(CSR_FCSR), Ok(0b010_00000));
    }

    #[test]
    fn test_counters_are_read_only() {
        let mut hart = hart(Xlen::Rv32);
        hart.retire();
        hart.retire();
        assert_eq!(hart.csr_read(CSR_INSTRET), Ok(2));
        assert_eq!(hart.csr_read(CSR_CYCLE), Ok(2));
        assert_eq!(hart.csr_read(CSR_INSTRETH), Ok(0));
        assert_eq!(hart.csr_write(CSR_CYCLE, 5), Err(Exception::IllegalInstruction));
    }

    #[test]
    fn test_high_counters_absent_on_rv64() {
        let hart = hart(Xlen::Rv64);
        assert_eq!(hart.csr_read(CSR_CYCLEH), Err(Exception::IllegalInstruction));
        assert!(hart.csr("cycleh").is_err());
    }

    #[test]
    fn test_unknown_csr_is_illegal() {
        let mut hart = hart(Xlen::Rv32);
        assert_eq!(hart.csr_read(0x7C0), Err(Exception::IllegalInstruction));
        assert_eq!(hart.csr_write(0x7C0, 1), Err(Exception::IllegalInstruction));
        hart.csr_write(CSR_USCRATCH, 0xABCD).unwrap();
        assert_eq!(hart.csr("uscratch"), Ok(0xABCD));
    }

    #[test]
    fn test_register_lookup_by_name() {
        let mut hart = hart(Xlen::Rv32);
        hart.set_x(10, 7);
        hart.fpr_mut().write_f64(1, 2.5);
        assert_eq!(hart.register_value("a0"), Ok(7));
        assert_eq!(hart.register_value("x10"), Ok(7));
        assert_eq!(hart.register_value("ft1"), Ok(2.5f64.to_bits()));
        assert_eq!(hart.register_value("fcsr"), Ok(0));
        assert_eq!(hart.register_value("nonsense"), Err(RegisterNotFound("nonsense".into())));
    }

    #[test]
    fn test_sbrk() {
        let mut hart = hart(Xlen::Rv32);
        let base = hart.heap_break();
        assert_eq!(hart.sbrk(5), Ok(base));
        assert_eq!(hart.heap_break(), base + 8);
        assert!(hart.sbrk(-4).is_err());
        assert!(hart.sbrk(0x7FFF_FFFF).is_err());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut hart = hart(Xlen::Rv32);
        hart.set_x(5, 1);
        hart.fp_env.raise(fp_env::fflags::NX);
        hart.console_write(b"hi");
        hart.retire();
        hart.reset();
        assert_eq!(hart.x(5), 0);
        assert_eq!(hart.fp_env().flags(), 0);
        assert!(hart.console().is_empty());
        assert_eq!(hart.instret(), 0);
    }
}
