//! M 扩展：乘除法指令目录

use super::instr_def::InstrDef;
use crate::cpu::exu::rvm as exec;

pub static RVM_INSTRS: &[InstrDef] = &[
    InstrDef::new("mul t1,t2,t3", "Multiplication: set t1 to the low bits of (t2 multiplied by t3)",
        "0000001 ttttt sssss 000 ddddd 0110011", exec::mul),
    InstrDef::new("mulh t1,t2,t3", "Multiplication: set t1 to the high bits of (t2 multiplied by t3), both signed",
        "0000001 ttttt sssss 001 ddddd 0110011", exec::mulh),
    InstrDef::new("mulhsu t1,t2,t3", "Multiplication: set t1 to the high bits of (t2 multiplied by t3), t2 signed and t3 unsigned",
        "0000001 ttttt sssss 010 ddddd 0110011", exec::mulhsu),
    InstrDef::new("mulhu t1,t2,t3", "Multiplication: set t1 to the high bits of (t2 multiplied by t3), both unsigned",
        "0000001 ttttt sssss 011 ddddd 0110011", exec::mulhu),
    InstrDef::new("div t1,t2,t3", "Division: set t1 to the result of t2/t3 (signed)",
        "0000001 ttttt sssss 100 ddddd 0110011", exec::div),
    InstrDef::new("divu t1,t2,t3", "Division: set t1 to the result of t2/t3 (unsigned)",
        "0000001 ttttt sssss 101 ddddd 0110011", exec::divu),
    InstrDef::new("rem t1,t2,t3", "Remainder: set t1 to the remainder of t2/t3 (signed)",
        "0000001 ttttt sssss 110 ddddd 0110011", exec::rem),
    InstrDef::new("remu t1,t2,t3", "Remainder: set t1 to the remainder of t2/t3 (unsigned)",
        "0000001 ttttt sssss 111 ddddd 0110011", exec::remu),

    InstrDef::new("mulw t1,t2,t3", "Multiply the low words, sign-extend the 32-bit result",
        "0000001 ttttt sssss 000 ddddd 0111011", exec::mulw).rv64_only(),
    InstrDef::new("divw t1,t2,t3", "Divide the low words (signed), sign-extend the 32-bit result",
        "0000001 ttttt sssss 100 ddddd 0111011", exec::divw).rv64_only(),
    InstrDef::new("divuw t1,t2,t3", "Divide the low words (unsigned), sign-extend the 32-bit result",
        "0000001 ttttt sssss 101 ddddd 0111011", exec::divuw).rv64_only(),
    InstrDef::new("remw t1,t2,t3", "Remainder of the low words (signed), sign-extend the 32-bit result",
        "0000001 ttttt sssss 110 ddddd 0111011", exec::remw).rv64_only(),
    InstrDef::new("remuw t1,t2,t3", "Remainder of the low words (unsigned), sign-extend the 32-bit result",
        "0000001 ttttt sssss 111 ddddd 0111011", exec::remuw).rv64_only(),
];
