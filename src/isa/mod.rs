//! RISC-V ISA 抽象与解码
//!
//! 本模块提供表驱动的指令解码系统：
//! - `Codec`: 由格式模板编译而来的 mask/match 与操作数字段
//! - `InstrDef` / `Descriptor`: 指令的静态定义与编译后的描述符
//! - `InstrTable`: 描述符集合，注册时检测重叠，按位宽查找
//! - `IsaConfig`: 选择启用的扩展并组装指令表

pub mod codec;
pub mod fields;
mod instr_def;
mod table;
mod config;
mod rvi;
mod rvm;
mod rvf;
mod rvd;
mod zicsr;

pub use codec::{Codec, Field, Operands};
pub use instr_def::{Action, Applicability, Descriptor, ExecResult, InstrDef, Xlen};
pub use table::{DecodedInstr, InstrTable};
pub use config::{IsaConfig, IsaExtension};
pub use rvi::RVI_INSTRS;
pub use rvm::RVM_INSTRS;
pub use rvf::RVF_INSTRS;
pub use rvd::RVD_INSTRS;
pub use zicsr::ZICSR_INSTRS;

#[cfg(test)]
mod tests;
