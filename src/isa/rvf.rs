//! F 扩展：单精度浮点指令目录

use super::instr_def::InstrDef;
use crate::cpu::exu::rvf::{self as exec, single};

/// 融合乘加族共用一个模板，opcode 的 bit[3:2] 选择加减与取负组合
macro_rules! fused_template {
    ($select:literal, $fmt:literal) => {
        concat!("rrrrr ", $fmt, " ttttt sssss mmm ddddd 100", $select, "11")
    };
}
pub(crate) use fused_template;

pub static RVF_INSTRS: &[InstrDef] = &[
    // ========== Load/Store ==========
    InstrDef::new("flw f1,-100(t1)", "Load a single-precision value from effective memory word address",
        "iiiiiiiiiiii sssss 010 ddddd 0000111", exec::flw),
    InstrDef::new("fsw f1,-100(t1)", "Store a single-precision value to effective memory word address",
        "iiiiiii ttttt sssss 010 iiiii 0100111", exec::fsw),

    // ========== Fused ==========
    InstrDef::new("fmadd.s f1,f2,f3,f4", "Fused multiply add: f1 = f2*f3 + f4",
        fused_template!("00", "00"), single::fmadd),
    InstrDef::new("fmsub.s f1,f2,f3,f4", "Fused multiply subtract: f1 = f2*f3 - f4",
        fused_template!("01", "00"), single::fmsub),
    InstrDef::new("fnmsub.s f1,f2,f3,f4", "Fused negate multiply subtract: f1 = -(f2*f3 - f4)",
        fused_template!("10", "00"), single::fnmsub),
    InstrDef::new("fnmadd.s f1,f2,f3,f4", "Fused negate multiply add: f1 = -(f2*f3 + f4)",
        fused_template!("11", "00"), single::fnmadd),

    // ========== Arithmetic ==========
    InstrDef::new("fadd.s f1,f2,f3", "Floating add: f1 = f2 + f3",
        "0000000 ttttt sssss mmm ddddd 1010011", single::add),
    InstrDef::new("fsub.s f1,f2,f3", "Floating subtract: f1 = f2 - f3",
        "0000100 ttttt sssss mmm ddddd 1010011", single::sub),
    InstrDef::new("fmul.s f1,f2,f3", "Floating multiply: f1 = f2 * f3",
        "0001000 ttttt sssss mmm ddddd 1010011", single::mul),
    InstrDef::new("fdiv.s f1,f2,f3", "Floating divide: f1 = f2 / f3",
        "0001100 ttttt sssss mmm ddddd 1010011", single::div),
    InstrDef::new("fsqrt.s f1,f2", "Floating square root: f1 = sqrt(f2)",
        "0101100 00000 sssss mmm ddddd 1010011", single::sqrt),

    // ========== Sign injection / min-max ==========
    InstrDef::new("fsgnj.s f1,f2,f3", "f1 = f2 with the sign of f3",
        "0010000 ttttt sssss 000 ddddd 1010011", single::sgnj),
    InstrDef::new("fsgnjn.s f1,f2,f3", "f1 = f2 with the opposite sign of f3",
        "0010000 ttttt sssss 001 ddddd 1010011", single::sgnjn),
    InstrDef::new("fsgnjx.s f1,f2,f3", "f1 = f2 with its sign xor the sign of f3",
        "0010000 ttttt sssss 010 ddddd 1010011", single::sgnjx),
    InstrDef::new("fmin.s f1,f2,f3", "f1 = the smaller of f2 and f3",
        "0010100 ttttt sssss 000 ddddd 1010011", single::min),
    InstrDef::new("fmax.s f1,f2,f3", "f1 = the larger of f2 and f3",
        "0010100 ttttt sssss 001 ddddd 1010011", single::max),

    // ========== Compare / classify ==========
    InstrDef::new("feq.s t1,f1,f2", "If f1 is equal to f2, set t1 to 1, else 0",
        "1010000 ttttt sssss 010 ddddd 1010011", single::feq),
    InstrDef::new("flt.s t1,f1,f2", "If f1 is less than f2, set t1 to 1, else 0",
        "1010000 ttttt sssss 001 ddddd 1010011", single::flt),
    InstrDef::new("fle.s t1,f1,f2", "If f1 is less than or equal to f2, set t1 to 1, else 0",
        "1010000 ttttt sssss 000 ddddd 1010011", single::fle),
    InstrDef::new("fclass.s t1,f1", "Classify f1 and set one bit of t1 accordingly",
        "1110000 00000 sssss 001 ddddd 1010011", single::fclass),

    // ========== Conversion ==========
    InstrDef::new("fcvt.w.s t1,f1", "Convert float to signed 32-bit integer",
        "1100000 00000 sssss mmm ddddd 1010011", single::to_w),
    InstrDef::new("fcvt.wu.s t1,f1", "Convert float to unsigned 32-bit integer",
        "1100000 00001 sssss mmm ddddd 1010011", single::to_wu),
    InstrDef::new("fcvt.l.s t1,f1", "Convert float to signed 64-bit integer",
        "1100000 00010 sssss mmm ddddd 1010011", single::to_l).rv64_only(),
    InstrDef::new("fcvt.lu.s t1,f1", "Convert float to unsigned 64-bit integer",
        "1100000 00011 sssss mmm ddddd 1010011", single::to_lu).rv64_only(),
    InstrDef::new("fcvt.s.w f1,t1", "Convert signed 32-bit integer to float",
        "1101000 00000 sssss mmm ddddd 1010011", single::from_w),
    InstrDef::new("fcvt.s.wu f1,t1", "Convert unsigned 32-bit integer to float",
        "1101000 00001 sssss mmm ddddd 1010011", single::from_wu),
    InstrDef::new("fcvt.s.l f1,t1", "Convert signed 64-bit integer to float",
        "1101000 00010 sssss mmm ddddd 1010011", single::from_l).rv64_only(),
    InstrDef::new("fcvt.s.lu f1,t1", "Convert unsigned 64-bit integer to float",
        "1101000 00011 sssss mmm ddddd 1010011", single::from_lu).rv64_only(),

    // ========== Move ==========
    InstrDef::new("fmv.x.w t1,f1", "Move the bit pattern of f1 into t1",
        "1110000 00000 sssss 000 ddddd 1010011", exec::fmv_x_w),
    InstrDef::new("fmv.w.x f1,t1", "Move the low word of t1 into f1",
        "1111000 00000 sssss 000 ddddd 1010011", exec::fmv_w_x),
];
