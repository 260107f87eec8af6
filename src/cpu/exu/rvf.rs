//! F/D 扩展（单/双精度浮点）执行单元
//!
//! 运算交给 `simple_soft_float`，每次运算产生的状态标志累积到 fflags。
//! 单精度与双精度的语义相同，只差位宽，由 `fp_unit!` 宏为两种格式分别生成
//! `single` 与 `double` 两组动作。
//!
//! 约定：
//! - 算术结果为 NaN 时写入规范 NaN
//! - 符号注入与搬移指令按位操作，不做规范化
//! - 单精度值在浮点寄存器中以 NaN-boxing 形式保存

use std::cmp::Ordering;

use simple_soft_float::{F32Traits, F64Traits, FPState, RoundingMode, F32, F64};

use crate::cpu::fp_env::fflags;
use crate::cpu::registers::{F32_CANONICAL_NAN, F64_CANONICAL_NAN};
use crate::cpu::Hart;
use crate::isa::fields::imm12;
use crate::isa::{ExecResult, Operands};
use crate::memory::AccessSize;

/// 整数转换的目标/来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntKind {
    W,
    WU,
    L,
    LU,
}

impl IntKind {
    /// 越界或 NaN 时的饱和值（已符号扩展到 64 位）
    fn saturate(self, negative: bool) -> u64 {
        match (self, negative) {
            (IntKind::W, false) => i32::MAX as i64 as u64,
            (IntKind::W, true) => i32::MIN as i64 as u64,
            (IntKind::WU, false) => u64::MAX,
            (IntKind::WU, true) => 0,
            (IntKind::L, false) => i64::MAX as u64,
            (IntKind::L, true) => i64::MIN as u64,
            (IntKind::LU, false) => u64::MAX,
            (IntKind::LU, true) => 0,
        }
    }
}

macro_rules! fp_unit {
    (
        $name:ident, $float:ty, $bits:ty, $frac_bits:expr, $canonical:expr,
        read = $read:ident, write = $write:ident
    ) => {
        pub mod $name {
            use super::*;

            type Float = $float;
            type Bits = $bits;

            const SIGN: Bits = 1 << (Bits::BITS - 1);
            const FRAC: Bits = (1 << $frac_bits) - 1;
            const EXP: Bits = !(SIGN | FRAC);
            const QUIET: Bits = 1 << ($frac_bits - 1);
            const CANONICAL_NAN: Bits = $canonical;

            #[inline]
            fn is_nan(bits: Bits) -> bool {
                bits & EXP == EXP && bits & FRAC != 0
            }

            #[inline]
            fn is_signaling(bits: Bits) -> bool {
                is_nan(bits) && bits & QUIET == 0
            }

            #[inline]
            fn read_bits(hart: &Hart, reg: u8) -> Bits {
                hart.fpr.$read(reg)
            }

            #[inline]
            fn write_bits(hart: &mut Hart, reg: u8, bits: Bits) {
                hart.fpr.$write(reg, bits)
            }

            #[inline]
            pub(super) fn read(hart: &Hart, reg: u8) -> Float {
                Float::from_bits(read_bits(hart, reg))
            }

            /// 写回运算结果，NaN 统一为规范 NaN
            #[inline]
            pub(super) fn write(hart: &mut Hart, reg: u8, value: Float) {
                let bits = value.into_bits();
                write_bits(hart, reg, if is_nan(bits) { CANONICAL_NAN } else { bits });
            }

            // ========== Arithmetic ==========

            #[inline]
            fn arith(
                hart: &mut Hart,
                ops: &Operands,
                f: impl FnOnce(&Float, &Float, Option<RoundingMode>, Option<&mut FPState>) -> Float,
            ) -> ExecResult {
                let rm = hart.fp_env.rounding_mode(ops.rm())?;
                let a = read(hart, ops.rs1());
                let b = read(hart, ops.rs2());
                let mut state = FPState::default();
                let result = f(&a, &b, Some(rm), Some(&mut state));
                hart.fp_env.accrue(&state);
                write(hart, ops.rd(), result);
                Ok(())
            }

            pub fn add(hart: &mut Hart, ops: &Operands) -> ExecResult {
                arith(hart, ops, |a, b, rm, st| a.add(b, rm, st))
            }

            pub fn sub(hart: &mut Hart, ops: &Operands) -> ExecResult {
                arith(hart, ops, |a, b, rm, st| a.sub(b, rm, st))
            }

            pub fn mul(hart: &mut Hart, ops: &Operands) -> ExecResult {
                arith(hart, ops, |a, b, rm, st| a.mul(b, rm, st))
            }

            pub fn div(hart: &mut Hart, ops: &Operands) -> ExecResult {
                arith(hart, ops, |a, b, rm, st| a.div(b, rm, st))
            }

            pub fn sqrt(hart: &mut Hart, ops: &Operands) -> ExecResult {
                let rm = hart.fp_env.rounding_mode(ops.rm())?;
                let a = read(hart, ops.rs1());
                let mut state = FPState::default();
                let result = a.sqrt(Some(rm), Some(&mut state));
                hart.fp_env.accrue(&state);
                write(hart, ops.rd(), result);
                Ok(())
            }

            // ========== Fused Multiply-Add ==========

            /// `(±rs1) * rs2 + (±rs3)`，只舍入一次
            fn fused(hart: &mut Hart, ops: &Operands, negate_product: bool, negate_addend: bool) -> ExecResult {
                let rm = hart.fp_env.rounding_mode(ops.rm())?;
                let mut a = read(hart, ops.rs1());
                let b = read(hart, ops.rs2());
                let mut c = read(hart, ops.rs3());
                if negate_product {
                    a.toggle_sign();
                }
                if negate_addend {
                    c.toggle_sign();
                }
                let mut state = FPState::default();
                let result = a.fused_mul_add(&b, &c, Some(rm), Some(&mut state));
                hart.fp_env.accrue(&state);
                write(hart, ops.rd(), result);
                Ok(())
            }

            pub fn fmadd(hart: &mut Hart, ops: &Operands) -> ExecResult {
                fused(hart, ops, false, false)
            }

            pub fn fmsub(hart: &mut Hart, ops: &Operands) -> ExecResult {
                fused(hart, ops, false, true)
            }

            pub fn fnmsub(hart: &mut Hart, ops: &Operands) -> ExecResult {
                fused(hart, ops, true, false)
            }

            pub fn fnmadd(hart: &mut Hart, ops: &Operands) -> ExecResult {
                fused(hart, ops, true, true)
            }

            // ========== Sign Injection ==========

            #[inline]
            fn sign_inject(hart: &mut Hart, ops: &Operands, sign: impl FnOnce(Bits, Bits) -> Bits) -> ExecResult {
                let a = read_bits(hart, ops.rs1());
                let b = read_bits(hart, ops.rs2());
                write_bits(hart, ops.rd(), (a & !SIGN) | (sign(a, b) & SIGN));
                Ok(())
            }

            pub fn sgnj(hart: &mut Hart, ops: &Operands) -> ExecResult {
                sign_inject(hart, ops, |_, b| b)
            }

            pub fn sgnjn(hart: &mut Hart, ops: &Operands) -> ExecResult {
                sign_inject(hart, ops, |_, b| !b)
            }

            pub fn sgnjx(hart: &mut Hart, ops: &Operands) -> ExecResult {
                sign_inject(hart, ops, |a, b| a ^ b)
            }

            // ========== Min/Max ==========

            fn min_max(hart: &mut Hart, ops: &Operands, is_min: bool) -> ExecResult {
                let a = read_bits(hart, ops.rs1());
                let b = read_bits(hart, ops.rs2());
                if is_signaling(a) || is_signaling(b) {
                    hart.fp_env.raise(fflags::NV);
                }
                let result = match (is_nan(a), is_nan(b)) {
                    (true, true) => CANONICAL_NAN,
                    (true, false) => b,
                    (false, true) => a,
                    (false, false) => match Float::from_bits(a).compare_quiet(&Float::from_bits(b), None) {
                        Some(Ordering::Less) => if is_min { a } else { b },
                        Some(Ordering::Greater) => if is_min { b } else { a },
                        // 相等：只可能是同一位模式或 ±0，min 取 -0，max 取 +0
                        _ => if is_min { a | b } else { a & b },
                    },
                };
                write_bits(hart, ops.rd(), result);
                Ok(())
            }

            pub fn min(hart: &mut Hart, ops: &Operands) -> ExecResult {
                min_max(hart, ops, true)
            }

            pub fn max(hart: &mut Hart, ops: &Operands) -> ExecResult {
                min_max(hart, ops, false)
            }

            // ========== Compare ==========

            fn compare(hart: &mut Hart, ops: &Operands, signaling: bool, test: impl FnOnce(Ordering) -> bool) -> ExecResult {
                let a = read(hart, ops.rs1());
                let b = read(hart, ops.rs2());
                let mut state = FPState::default();
                let ordering = if signaling {
                    a.compare_signaling(&b, Some(&mut state))
                } else {
                    a.compare_quiet(&b, Some(&mut state))
                };
                hart.fp_env.accrue(&state);
                hart.set_x(ops.rd(), ordering.is_some_and(test) as u64);
                Ok(())
            }

            // 仅 sNaN 置 NV
            pub fn feq(hart: &mut Hart, ops: &Operands) -> ExecResult {
                compare(hart, ops, false, |o| o == Ordering::Equal)
            }

            // 任意 NaN 置 NV
            pub fn flt(hart: &mut Hart, ops: &Operands) -> ExecResult {
                compare(hart, ops, true, |o| o == Ordering::Less)
            }

            pub fn fle(hart: &mut Hart, ops: &Operands) -> ExecResult {
                compare(hart, ops, true, |o| o != Ordering::Greater)
            }

            // ========== Classification ==========

            pub fn fclass(hart: &mut Hart, ops: &Operands) -> ExecResult {
                let bits = read_bits(hart, ops.rs1());
                let negative = bits & SIGN != 0;
                let exp = bits & EXP;
                let frac = bits & FRAC;
                let class = if exp == EXP {
                    match (frac, negative) {
                        (0, true) => 0,
                        (0, false) => 7,
                        _ if bits & QUIET != 0 => 9,
                        _ => 8,
                    }
                } else if exp == 0 {
                    match (frac, negative) {
                        (0, true) => 3,
                        (0, false) => 4,
                        (_, true) => 2,
                        (_, false) => 5,
                    }
                } else if negative {
                    1
                } else {
                    6
                };
                hart.set_x(ops.rd(), 1 << class);
                Ok(())
            }

            // ========== Conversion: Float -> Integer ==========

            fn to_int(hart: &mut Hart, ops: &Operands, kind: IntKind) -> ExecResult {
                let rm = hart.fp_env.rounding_mode(ops.rm())?;
                let bits = read_bits(hart, ops.rs1());
                let value = Float::from_bits(bits);
                let mut state = FPState::default();
                let converted = match kind {
                    IntKind::W => value.to_i32(true, Some(rm), Some(&mut state)).map(|v| v as i64 as u64),
                    IntKind::WU => value.to_u32(true, Some(rm), Some(&mut state)).map(|v| v as i32 as i64 as u64),
                    IntKind::L => value.to_i64(true, Some(rm), Some(&mut state)).map(|v| v as u64),
                    IntKind::LU => value.to_u64(true, Some(rm), Some(&mut state)),
                };
                let result = match converted {
                    Some(v) => {
                        hart.fp_env.accrue(&state);
                        v
                    }
                    None => {
                        // NaN 按正数饱和
                        hart.fp_env.raise(fflags::NV);
                        kind.saturate(bits & SIGN != 0 && !is_nan(bits))
                    }
                };
                hart.set_x(ops.rd(), result);
                Ok(())
            }

            pub fn to_w(hart: &mut Hart, ops: &Operands) -> ExecResult {
                to_int(hart, ops, IntKind::W)
            }

            pub fn to_wu(hart: &mut Hart, ops: &Operands) -> ExecResult {
                to_int(hart, ops, IntKind::WU)
            }

            pub fn to_l(hart: &mut Hart, ops: &Operands) -> ExecResult {
                to_int(hart, ops, IntKind::L)
            }

            pub fn to_lu(hart: &mut Hart, ops: &Operands) -> ExecResult {
                to_int(hart, ops, IntKind::LU)
            }

            // ========== Conversion: Integer -> Float ==========

            fn from_int(hart: &mut Hart, ops: &Operands, kind: IntKind) -> ExecResult {
                let rm = hart.fp_env.rounding_mode(ops.rm())?;
                let x = hart.x(ops.rs1());
                let mut state = FPState::default();
                let result = match kind {
                    IntKind::W => Float::from_i32(x as i32, Some(rm), Some(&mut state)),
                    IntKind::WU => Float::from_u32(x as u32, Some(rm), Some(&mut state)),
                    IntKind::L => Float::from_i64(x as i64, Some(rm), Some(&mut state)),
                    IntKind::LU => Float::from_u64(x, Some(rm), Some(&mut state)),
                };
                hart.fp_env.accrue(&state);
                write(hart, ops.rd(), result);
                Ok(())
            }

            pub fn from_w(hart: &mut Hart, ops: &Operands) -> ExecResult {
                from_int(hart, ops, IntKind::W)
            }

            pub fn from_wu(hart: &mut Hart, ops: &Operands) -> ExecResult {
                from_int(hart, ops, IntKind::WU)
            }

            pub fn from_l(hart: &mut Hart, ops: &Operands) -> ExecResult {
                from_int(hart, ops, IntKind::L)
            }

            pub fn from_lu(hart: &mut Hart, ops: &Operands) -> ExecResult {
                from_int(hart, ops, IntKind::LU)
            }
        }
    };
}

fp_unit!(single, F32, u32, 23, F32_CANONICAL_NAN, read = read_single_bits, write = write_single_bits);
fp_unit!(double, F64, u64, 52, F64_CANONICAL_NAN, read = read_double_bits, write = write_double_bits);

// ========== Load/Store ==========

#[inline]
fn address(hart: &Hart, ops: &Operands) -> u64 {
    hart.effective_address(ops.rs1(), imm12(ops.imm()))
}

pub fn flw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load32(address(hart, ops))?;
    hart.fpr.write_single_bits(ops.rd(), value);
    Ok(())
}

/// 存储寄存器低 32 位，不检查 NaN-boxing
pub fn fsw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let addr = address(hart, ops);
    let value = hart.fpr.read_bits(ops.rs2()) as u32;
    hart.memory.store32(addr, value)?;
    Ok(())
}

/// 由两次字访问组成，只要求字对齐；先失败的一半决定报告的地址
pub fn fld(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let addr = address(hart, ops);
    let high_addr = hart.xlen().normalize(addr.wrapping_add(4));
    let low = hart.memory.load32(addr)?;
    let high = hart.memory.load32(high_addr)?;
    hart.fpr.write_double_bits(ops.rd(), ((high as u64) << 32) | low as u64);
    Ok(())
}

/// 两个字都检查通过后才写入
pub fn fsd(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let addr = address(hart, ops);
    let high_addr = hart.xlen().normalize(addr.wrapping_add(4));
    let value = hart.fpr.read_double_bits(ops.rs2());
    hart.memory.check_store(addr, AccessSize::Word)?;
    hart.memory.check_store(high_addr, AccessSize::Word)?;
    hart.memory.store32(addr, value as u32)?;
    hart.memory.store32(high_addr, (value >> 32) as u32)?;
    Ok(())
}

// ========== Move ==========

/// 低 32 位原样搬到整数寄存器，符号扩展到 XLEN
pub fn fmv_x_w(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let bits = hart.fpr.read_bits(ops.rs1()) as u32;
    hart.set_x(ops.rd(), bits as i32 as i64 as u64);
    Ok(())
}

pub fn fmv_w_x(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let bits = hart.x(ops.rs1()) as u32;
    hart.fpr.write_single_bits(ops.rd(), bits);
    Ok(())
}

pub fn fmv_x_d(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let bits = hart.fpr.read_double_bits(ops.rs1());
    hart.set_x(ops.rd(), bits);
    Ok(())
}

pub fn fmv_d_x(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let bits = hart.x(ops.rs1());
    hart.fpr.write_double_bits(ops.rd(), bits);
    Ok(())
}

// ========== Conversion: Float <-> Float ==========

pub fn fcvt_s_d(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let rm = hart.fp_env.rounding_mode(ops.rm())?;
    let value = double::read(hart, ops.rs1());
    let mut state = FPState::default();
    let result = value.convert_to_float::<F32Traits>(Some(rm), Some(&mut state));
    hart.fp_env.accrue(&state);
    single::write(hart, ops.rd(), result);
    Ok(())
}

/// 扩宽转换总是精确的，rm 仍需合法
pub fn fcvt_d_s(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let rm = hart.fp_env.rounding_mode(ops.rm())?;
    let value = single::read(hart, ops.rs1());
    let mut state = FPState::default();
    let result = value.convert_to_float::<F64Traits>(Some(rm), Some(&mut state));
    hart.fp_env.accrue(&state);
    double::write(hart, ops.rd(), result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::exu::test_util::{hart, ops, DATA};
    use crate::error::{Exception, MemError};
    use crate::isa::Xlen;

    fn binary(f: fn(&mut Hart, &Operands) -> ExecResult) -> impl Fn(&mut Hart) -> ExecResult {
        move |hart| f(hart, &ops(&[('d', 3), ('s', 1), ('t', 2), ('m', 0)]))
    }

    #[test]
    fn test_single_arithmetic() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f32(1, 1.5);
        hart.fpr.write_f32(2, 2.25);
        binary(single::add)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_f32(3), 3.75);
        binary(single::mul)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_f32(3), 3.375);
        assert_eq!(hart.fp_env.flags(), 0);
    }

    #[test]
    fn test_divide_by_zero_sets_flag() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f64(1, 1.0);
        hart.fpr.write_f64(2, 0.0);
        binary(double::div)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_f64(3), f64::INFINITY);
        assert_eq!(hart.fp_env.flags(), fflags::DZ);
    }

    #[test]
    fn test_inexact_is_sticky() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f32(1, 1.0);
        hart.fpr.write_f32(2, 3.0);
        binary(single::div)(&mut hart).unwrap();
        assert_eq!(hart.fp_env.flags(), fflags::NX);
        hart.fpr.write_f32(2, 1.0);
        binary(single::div)(&mut hart).unwrap();
        assert_eq!(hart.fp_env.flags(), fflags::NX);
    }

    #[test]
    fn test_invalid_produces_canonical_nan() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f32(1, f32::INFINITY);
        hart.fpr.write_f32(2, f32::INFINITY);
        binary(single::sub)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), F32_CANONICAL_NAN);
        assert_eq!(hart.fp_env.flags() & fflags::NV, fflags::NV);
    }

    #[test]
    fn test_reserved_rounding_mode_is_illegal() {
        let mut hart = hart(Xlen::Rv32);
        let err = single::add(&mut hart, &ops(&[('d', 3), ('s', 1), ('t', 2), ('m', 5)])).unwrap_err();
        assert_eq!(err, Exception::IllegalInstruction);
    }

    #[test]
    fn test_fused_variants() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f64(1, 2.0);
        hart.fpr.write_f64(2, 3.0);
        hart.fpr.write_f64(3, 1.0);
        let fused_ops = ops(&[('r', 3), ('t', 2), ('s', 1), ('m', 0), ('d', 4)]);
        let cases: [(fn(&mut Hart, &Operands) -> ExecResult, f64); 4] = [
            (double::fmadd, 7.0),
            (double::fmsub, 5.0),
            (double::fnmsub, -5.0),
            (double::fnmadd, -7.0),
        ];
        for (action, expected) in cases {
            action(&mut hart, &fused_ops).unwrap();
            assert_eq!(hart.fpr.read_f64(4), expected);
        }
    }

    #[test]
    fn test_negated_fused_exact_zero_sign() {
        // 取负发生在唯一一次舍入之前：-(1*1) + 1 在 RNE 下得到 +0.0
        let mut hart = hart(Xlen::Rv32);
        for reg in 1..=3 {
            hart.fpr.write_f64(reg, 1.0);
        }
        let fused_ops = ops(&[('r', 3), ('t', 2), ('s', 1), ('m', 0), ('d', 4)]);
        double::fnmsub(&mut hart, &fused_ops).unwrap();
        assert_eq!(hart.fpr.read_f64(4).to_bits(), 0.0f64.to_bits());

        hart.fpr.write_f64(3, -1.0);
        double::fnmadd(&mut hart, &fused_ops).unwrap();
        assert_eq!(hart.fpr.read_f64(4).to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn test_sign_injection_keeps_payload() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f32(1, 3.0);
        hart.fpr.write_f32(2, -5.0);
        let three = 3.0f32.to_bits();
        binary(single::sgnj)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), three | 0x8000_0000);
        binary(single::sgnjn)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), three);
        binary(single::sgnjx)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), three | 0x8000_0000);
    }

    #[test]
    fn test_min_max_nan_and_zero() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f32(1, 0.0);
        hart.fpr.write_f32(2, -0.0);
        binary(single::min)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), 0x8000_0000);
        binary(single::max)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), 0);

        hart.fpr.write_single_bits(2, 0x7F80_0001); // sNaN
        binary(single::min)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), 0);
        assert_eq!(hart.fp_env.flags(), fflags::NV);

        hart.fpr.write_single_bits(1, F32_CANONICAL_NAN);
        binary(single::max)(&mut hart).unwrap();
        assert_eq!(hart.fpr.read_single_bits(3), F32_CANONICAL_NAN);
    }

    #[test]
    fn test_compare_nan_flags() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f64(1, f64::NAN);
        hart.fpr.write_f64(2, 1.0);
        binary(double::feq)(&mut hart).unwrap();
        assert_eq!(hart.x(3), 0);
        assert_eq!(hart.fp_env.flags(), 0);
        binary(double::flt)(&mut hart).unwrap();
        assert_eq!(hart.x(3), 0);
        assert_eq!(hart.fp_env.flags(), fflags::NV);

        hart.fpr.write_f64(1, 1.0);
        binary(double::fle)(&mut hart).unwrap();
        assert_eq!(hart.x(3), 1);
    }

    #[test]
    fn test_fclass() {
        let mut hart = hart(Xlen::Rv32);
        let classify = |hart: &mut Hart, bits: u32| {
            hart.fpr.write_single_bits(1, bits);
            single::fclass(hart, &ops(&[('d', 5), ('s', 1)])).unwrap();
            hart.x(5)
        };
        assert_eq!(classify(&mut hart, f32::NEG_INFINITY.to_bits()), 1 << 0);
        assert_eq!(classify(&mut hart, (-1.0f32).to_bits()), 1 << 1);
        assert_eq!(classify(&mut hart, 0x8000_0001), 1 << 2);
        assert_eq!(classify(&mut hart, 0x8000_0000), 1 << 3);
        assert_eq!(classify(&mut hart, 0), 1 << 4);
        assert_eq!(classify(&mut hart, 1), 1 << 5);
        assert_eq!(classify(&mut hart, 1.0f32.to_bits()), 1 << 6);
        assert_eq!(classify(&mut hart, f32::INFINITY.to_bits()), 1 << 7);
        assert_eq!(classify(&mut hart, 0x7F80_0001), 1 << 8);
        assert_eq!(classify(&mut hart, F32_CANONICAL_NAN), 1 << 9);
    }

    #[test]
    fn test_float_to_int_rounding_and_saturation() {
        let mut hart = hart(Xlen::Rv32);
        let convert = |hart: &mut Hart, f: fn(&mut Hart, &Operands) -> ExecResult, value: f32, rm: u32| {
            hart.fpr.write_f32(1, value);
            f(hart, &ops(&[('d', 5), ('s', 1), ('m', rm)])).unwrap();
            hart.x(5)
        };
        assert_eq!(convert(&mut hart, single::to_w, 42.7, 0), 43);
        assert_eq!(convert(&mut hart, single::to_w, 42.7, 1), 42);
        assert_eq!(convert(&mut hart, single::to_w, -2.5, 2), (-3i32) as u32 as u64);
        assert_eq!(hart.fp_env.flags(), fflags::NX);

        hart.fp_env.set_flags(0);
        assert_eq!(convert(&mut hart, single::to_w, 3.0e10, 0), i32::MAX as u64);
        assert_eq!(convert(&mut hart, single::to_w, f32::NAN, 0), i32::MAX as u64);
        assert_eq!(convert(&mut hart, single::to_wu, -3.0e10, 0), 0);
        assert_eq!(convert(&mut hart, single::to_wu, 3.0e10, 0), 0xFFFF_FFFF);
        assert_eq!(hart.fp_env.flags(), fflags::NV);
    }

    #[test]
    fn test_unsigned_word_result_is_sign_extended_on_rv64() {
        let mut hart = hart(Xlen::Rv64);
        hart.fpr.write_f64(1, 4_000_000_000.0);
        double::to_wu(&mut hart, &ops(&[('d', 5), ('s', 1), ('m', 0)])).unwrap();
        assert_eq!(hart.x(5), 4_000_000_000u32 as i32 as i64 as u64);
    }

    #[test]
    fn test_int_to_float() {
        let mut hart = hart(Xlen::Rv64);
        hart.set_x(1, -7i64 as u64);
        single::from_w(&mut hart, &ops(&[('d', 2), ('s', 1), ('m', 0)])).unwrap();
        assert_eq!(hart.fpr.read_f32(2), -7.0);
        double::from_lu(&mut hart, &ops(&[('d', 2), ('s', 1), ('m', 0)])).unwrap();
        assert_eq!(hart.fpr.read_f64(2), 18446744073709551609.0);
    }

    #[test]
    fn test_single_values_are_nan_boxed() {
        let mut hart = hart(Xlen::Rv32);
        hart.set_x(1, 0x3F80_0000);
        fmv_w_x(&mut hart, &ops(&[('d', 2), ('s', 1)])).unwrap();
        assert_eq!(hart.fpr.read_bits(2), 0xFFFF_FFFF_3F80_0000);

        // 未正确装箱的单精度值读作规范 NaN
        hart.fpr.write_double_bits(3, 1.0f64.to_bits());
        fmv_x_w(&mut hart, &ops(&[('d', 4), ('s', 2)])).unwrap();
        assert_eq!(hart.x(4), 0x3F80_0000);
        let classify = ops(&[('d', 5), ('s', 3)]);
        single::fclass(&mut hart, &classify).unwrap();
        assert_eq!(hart.x(5), 1 << 9);
    }

    #[test]
    fn test_fmv_x_w_sign_extends() {
        let mut hart = hart(Xlen::Rv64);
        hart.fpr.write_f32(1, -1.0);
        fmv_x_w(&mut hart, &ops(&[('d', 2), ('s', 1)])).unwrap();
        assert_eq!(hart.x(2), 0xFFFF_FFFF_BF80_0000);
    }

    #[test]
    fn test_float_double_conversion() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f64(1, 0.1);
        fcvt_s_d(&mut hart, &ops(&[('d', 2), ('s', 1), ('m', 0)])).unwrap();
        assert_eq!(hart.fpr.read_f32(2), 0.1f32);
        assert_eq!(hart.fp_env.flags(), fflags::NX);
        fcvt_d_s(&mut hart, &ops(&[('d', 3), ('s', 2), ('m', 0)])).unwrap();
        assert_eq!(hart.fpr.read_f64(3), 0.1f32 as f64);
    }

    #[test]
    fn test_double_load_store_word_aligned() {
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f64(1, std::f64::consts::PI);
        hart.set_x(5, DATA + 4);
        fsd(&mut hart, &ops(&[('t', 1), ('s', 5), ('i', 0)])).unwrap();
        fld(&mut hart, &ops(&[('d', 2), ('s', 5), ('i', 0)])).unwrap();
        assert_eq!(hart.fpr.read_f64(2), std::f64::consts::PI);
        assert_eq!(hart.memory.load32(DATA + 4).unwrap(), std::f64::consts::PI.to_bits() as u32);
    }

    #[test]
    fn test_fsd_checks_both_halves_first() {
        // 低字位于地址空间顶端，高字回绕到未映射的 0 地址
        let mut hart = hart(Xlen::Rv32);
        hart.fpr.write_f64(1, 1.0);
        hart.set_x(5, 0xFFFF_FFFC);
        let err = fsd(&mut hart, &ops(&[('t', 1), ('s', 5), ('i', 0)])).unwrap_err();
        assert!(matches!(err, Exception::Memory(MemError::OutOfRange { addr: 0, .. })));
        assert_eq!(hart.memory.raw_word(0xFFFF_FFFC), None);
    }

    #[test]
    fn test_fsd_across_stack_and_text_boundary() {
        use crate::cpu::HartBuilder;
        use crate::memory::{MemoryConfig, MemoryLayout};

        let layout = MemoryLayout::new(MemoryConfig::CompactDataAtZero);
        let mut hart = HartBuilder::new(layout).with_d_extension().build();
        let addr = layout.stack.end - 4;
        hart.fpr.write_f64(1, 1.0);
        hart.set_x(5, addr);
        let err = fsd(&mut hart, &ops(&[('t', 1), ('s', 5), ('i', 0)])).unwrap_err();
        assert!(matches!(err, Exception::Memory(MemError::WriteProtected { addr: a, .. }) if a == layout.text.start));
        assert_eq!(hart.memory.raw_word(addr), None);
    }

    #[test]
    fn test_flw_fsw() {
        let mut hart = hart(Xlen::Rv32);
        let pi_bits = std::f32::consts::PI.to_bits();
        hart.memory.store32(DATA, pi_bits).unwrap();
        hart.set_x(1, DATA);
        flw(&mut hart, &ops(&[('d', 1), ('s', 1), ('i', 0)])).unwrap();
        assert_eq!(hart.fpr.read_single_bits(1), pi_bits);
        fsw(&mut hart, &ops(&[('t', 1), ('s', 1), ('i', 8)])).unwrap();
        assert_eq!(hart.memory.load32(DATA + 8).unwrap(), pi_bits);
    }
}
