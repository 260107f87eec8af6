//! rars_sim: RARS 兼容的 RISC-V 指令集仿真库
//!
//! 功能级（非周期精确）单 hart 仿真：表驱动解码、RV32/RV64 整数与
//! IMFD + Zicsr 扩展语义、按段划分的稀疏内存、精确的故障报告。
//!
//! # 模块结构
//!
//! - `isa`: 格式模板编解码、指令目录与指令表
//! - `cpu`: hart 架构状态（寄存器文件、CSR、浮点环境）与各扩展的语义动作
//! - `memory`: 段式稀疏内存与内存布局预设
//! - `engine`: 取指-解码-执行循环、断点、步数上限与取消
//! - `sim_env`: 会话配置与程序装载（ELF、原始映像）
//! - `error`: 构建期错误、执行期异常与故障报告

pub mod cpu;
pub mod engine;
pub mod error;
pub mod isa;
pub mod memory;
pub mod sim_env;

pub use engine::{EngineState, Simulator, StopReason};
pub use error::{Fault, FaultKind, SimError};
pub use sim_env::{Program, SimConfig};
