//! D 扩展：双精度浮点指令目录

use super::instr_def::InstrDef;
use super::rvf::fused_template;
use crate::cpu::exu::rvf::{self as exec, double};

pub static RVD_INSTRS: &[InstrDef] = &[
    // ========== Load/Store ==========
    InstrDef::new("fld f1,-100(t1)", "Load a double-precision value from effective memory doubleword address",
        "iiiiiiiiiiii sssss 011 ddddd 0000111", exec::fld),
    InstrDef::new("fsd f1,-100(t1)", "Store a double-precision value to effective memory doubleword address",
        "iiiiiii ttttt sssss 011 iiiii 0100111", exec::fsd),

    // ========== Fused ==========
    InstrDef::new("fmadd.d f1,f2,f3,f4", "Fused multiply add: f1 = f2*f3 + f4",
        fused_template!("00", "01"), double::fmadd),
    InstrDef::new("fmsub.d f1,f2,f3,f4", "Fused multiply subtract: f1 = f2*f3 - f4",
        fused_template!("01", "01"), double::fmsub),
    InstrDef::new("fnmsub.d f1,f2,f3,f4", "Fused negate multiply subtract: f1 = -(f2*f3 - f4)",
        fused_template!("10", "01"), double::fnmsub),
    InstrDef::new("fnmadd.d f1,f2,f3,f4", "Fused negate multiply add: f1 = -(f2*f3 + f4)",
        fused_template!("11", "01"), double::fnmadd),

    // ========== Arithmetic ==========
    InstrDef::new("fadd.d f1,f2,f3", "Floating add: f1 = f2 + f3",
        "0000001 ttttt sssss mmm ddddd 1010011", double::add),
    InstrDef::new("fsub.d f1,f2,f3", "Floating subtract: f1 = f2 - f3",
        "0000101 ttttt sssss mmm ddddd 1010011", double::sub),
    InstrDef::new("fmul.d f1,f2,f3", "Floating multiply: f1 = f2 * f3",
        "0001001 ttttt sssss mmm ddddd 1010011", double::mul),
    InstrDef::new("fdiv.d f1,f2,f3", "Floating divide: f1 = f2 / f3",
        "0001101 ttttt sssss mmm ddddd 1010011", double::div),
    InstrDef::new("fsqrt.d f1,f2", "Floating square root: f1 = sqrt(f2)",
        "0101101 00000 sssss mmm ddddd 1010011", double::sqrt),

    // ========== Sign injection / min-max ==========
    InstrDef::new("fsgnj.d f1,f2,f3", "f1 = f2 with the sign of f3",
        "0010001 ttttt sssss 000 ddddd 1010011", double::sgnj),
    InstrDef::new("fsgnjn.d f1,f2,f3", "f1 = f2 with the opposite sign of f3",
        "0010001 ttttt sssss 001 ddddd 1010011", double::sgnjn),
    InstrDef::new("fsgnjx.d f1,f2,f3", "f1 = f2 with its sign xor the sign of f3",
        "0010001 ttttt sssss 010 ddddd 1010011", double::sgnjx),
    InstrDef::new("fmin.d f1,f2,f3", "f1 = the smaller of f2 and f3",
        "0010101 ttttt sssss 000 ddddd 1010011", double::min),
    InstrDef::new("fmax.d f1,f2,f3", "f1 = the larger of f2 and f3",
        "0010101 ttttt sssss 001 ddddd 1010011", double::max),

    // ========== Compare / classify ==========
    InstrDef::new("feq.d t1,f1,f2", "If f1 is equal to f2, set t1 to 1, else 0",
        "1010001 ttttt sssss 010 ddddd 1010011", double::feq),
    InstrDef::new("flt.d t1,f1,f2", "If f1 is less than f2, set t1 to 1, else 0",
        "1010001 ttttt sssss 001 ddddd 1010011", double::flt),
    InstrDef::new("fle.d t1,f1,f2", "If f1 is less than or equal to f2, set t1 to 1, else 0",
        "1010001 ttttt sssss 000 ddddd 1010011", double::fle),
    InstrDef::new("fclass.d t1,f1", "Classify f1 and set one bit of t1 accordingly",
        "1110001 00000 sssss 001 ddddd 1010011", double::fclass),

    // ========== Conversion ==========
    InstrDef::new("fcvt.s.d f1,f2", "Convert double to float",
        "0100000 00001 sssss mmm ddddd 1010011", exec::fcvt_s_d),
    InstrDef::new("fcvt.d.s f1,f2", "Convert float to double",
        "0100001 00000 sssss mmm ddddd 1010011", exec::fcvt_d_s),
    InstrDef::new("fcvt.w.d t1,f1", "Convert double to signed 32-bit integer",
        "1100001 00000 sssss mmm ddddd 1010011", double::to_w),
    InstrDef::new("fcvt.wu.d t1,f1", "Convert double to unsigned 32-bit integer",
        "1100001 00001 sssss mmm ddddd 1010011", double::to_wu),
    InstrDef::new("fcvt.l.d t1,f1", "Convert double to signed 64-bit integer",
        "1100001 00010 sssss mmm ddddd 1010011", double::to_l).rv64_only(),
    InstrDef::new("fcvt.lu.d t1,f1", "Convert double to unsigned 64-bit integer",
        "1100001 00011 sssss mmm ddddd 1010011", double::to_lu).rv64_only(),
    InstrDef::new("fcvt.d.w f1,t1", "Convert signed 32-bit integer to double",
        "1101001 00000 sssss mmm ddddd 1010011", double::from_w),
    InstrDef::new("fcvt.d.wu f1,t1", "Convert unsigned 32-bit integer to double",
        "1101001 00001 sssss mmm ddddd 1010011", double::from_wu),
    InstrDef::new("fcvt.d.l f1,t1", "Convert signed 64-bit integer to double",
        "1101001 00010 sssss mmm ddddd 1010011", double::from_l).rv64_only(),
    InstrDef::new("fcvt.d.lu f1,t1", "Convert unsigned 64-bit integer to double",
        "1101001 00011 sssss mmm ddddd 1010011", double::from_lu).rv64_only(),

    // ========== Move ==========
    InstrDef::new("fmv.x.d t1,f1", "Move the bit pattern of f1 into t1",
        "1110001 00000 sssss 000 ddddd 1010011", exec::fmv_x_d).rv64_only(),
    InstrDef::new("fmv.d.x f1,t1", "Move the bit pattern of t1 into f1",
        "1111001 00000 sssss 000 ddddd 1010011", exec::fmv_d_x).rv64_only(),
];
