//! Hart 配置器
//!
//! 根据 XLEN、浮点扩展与内存布局统一配置架构状态：寄存器文件宽度、
//! 需要注册的 CSR 以及内存。
//!
//! # 示例
//!
//! ```
//! use rars_sim::cpu::HartBuilder;
//! use rars_sim::isa::Xlen;
//! use rars_sim::memory::MemoryLayout;
//!
//! let hart = HartBuilder::new(MemoryLayout::default())
//!     .xlen(Xlen::Rv64)
//!     .with_d_extension()
//!     .build();
//! assert!(hart.has_fp());
//! ```

use super::csr_def;
use super::registers::{CsrFile, Flen};
use super::Hart;
use crate::isa::Xlen;
use crate::memory::{Memory, MemoryLayout};

/// Hart 构建器
pub struct HartBuilder {
    layout: MemoryLayout,
    xlen: Xlen,
    enable_f: bool,
    enable_d: bool,
    self_modifying_code: bool,
}

impl HartBuilder {
    /// 默认 RV32，无浮点，text 段写保护
    pub fn new(layout: MemoryLayout) -> Self {
        Self {
            layout,
            xlen: Xlen::Rv32,
            enable_f: false,
            enable_d: false,
            self_modifying_code: false,
        }
    }

    pub fn xlen(mut self, xlen: Xlen) -> Self {
        self.xlen = xlen;
        self
    }

    /// 启用 F 扩展（单精度浮点）
    pub fn with_f_extension(mut self) -> Self {
        self.enable_f = true;
        self
    }

    /// 启用 D 扩展（双精度浮点，隐含 F）
    pub fn with_d_extension(mut self) -> Self {
        self.enable_f = true;
        self.enable_d = true;
        self
    }

    /// 允许写 text 段并从 data 段取指
    pub fn self_modifying_code(mut self, enabled: bool) -> Self {
        self.self_modifying_code = enabled;
        self
    }

    pub fn build(self) -> Hart {
        let mut csr = CsrFile::new();
        csr.register(csr_def::USER_CSRS, self.xlen);
        csr.register(csr_def::COUNTER_CSRS, self.xlen);

        let flen = match (self.enable_f, self.enable_d) {
            (_, true) => Some(Flen::Double),
            (true, false) => Some(Flen::Single),
            (false, false) => None,
        };
        if flen.is_some() {
            csr.register(csr_def::F_CSRS, self.xlen);
        }

        let memory = Memory::new(self.layout, self.self_modifying_code);
        Hart::from_parts(self.xlen, flen, csr, memory)
    }
}

impl Default for HartBuilder {
    fn default() -> Self {
        Self::new(MemoryLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::csr_def::{CSR_FCSR, CSR_INSTRETH};

    #[test]
    fn test_base_hart_has_no_fp_csrs() {
        let hart = HartBuilder::default().build();
        assert!(!hart.has_fp());
        assert!(hart.csr_file().entry(CSR_FCSR).is_none());
        assert!(hart.csr_file().entry(CSR_INSTRETH).is_some());
    }

    #[test]
    fn test_d_extension_widens_fp_registers() {
        let hart = HartBuilder::default().with_d_extension().build();
        assert_eq!(hart.fpr().flen(), Flen::Double);
        assert!(hart.csr_file().entry(CSR_FCSR).is_some());

        let hart = HartBuilder::default().with_f_extension().build();
        assert_eq!(hart.fpr().flen(), Flen::Single);
    }

    #[test]
    fn test_rv64_skips_high_counters() {
        let hart = HartBuilder::default().xlen(Xlen::Rv64).build();
        assert!(hart.csr_file().entry(CSR_INSTRETH).is_none());
        assert_eq!(hart.memory().self_modifying_code(), false);
    }
}
