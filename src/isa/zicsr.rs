//! Zicsr 扩展（CSR 操作指令）目录

use super::instr_def::InstrDef;
use crate::cpu::exu::zicsr as exec;

/// Zicsr 指令定义表
///
/// CSR 指令编码格式（I-type 变体）：
/// ```text
/// 31       20 19    15 14  12 11   7 6      0
/// ┌──────────┬────────┬──────┬──────┬────────┐
/// │   csr    │rs1/uimm│funct3│  rd  │ opcode │
/// │  12-bit  │ 5-bit  │3-bit │5-bit │ 7-bit  │
/// └──────────┴────────┴──────┴──────┴────────┘
///           SYSTEM (opcode = 0x73)
/// ```
pub static ZICSR_INSTRS: &[InstrDef] = &[
    InstrDef::new("csrrw t0,fcsr,t1", "Atomic read/write CSR: read the CSR into t0 and write t1 into it",
        "cccccccccccc sssss 001 ddddd 1110011", exec::csrrw),
    InstrDef::new("csrrs t0,fcsr,t1", "Atomic read/set CSR: read the CSR into t0 and set the bits given by t1",
        "cccccccccccc sssss 010 ddddd 1110011", exec::csrrs),
    InstrDef::new("csrrc t0,fcsr,t1", "Atomic read/clear CSR: read the CSR into t0 and clear the bits given by t1",
        "cccccccccccc sssss 011 ddddd 1110011", exec::csrrc),
    InstrDef::new("csrrwi t0,fcsr,10", "Atomic read/write CSR immediate",
        "cccccccccccc iiiii 101 ddddd 1110011", exec::csrrwi),
    InstrDef::new("csrrsi t0,fcsr,10", "Atomic read/set CSR immediate",
        "cccccccccccc iiiii 110 ddddd 1110011", exec::csrrsi),
    InstrDef::new("csrrci t0,fcsr,10", "Atomic read/clear CSR immediate",
        "cccccccccccc iiiii 111 ddddd 1110011", exec::csrrci),
];
