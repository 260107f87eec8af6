//! M 扩展（乘除法）的语义动作
//!
//! 除零与溢出不产生异常，结果按 RISC-V 约定给出。

use crate::cpu::Hart;
use crate::isa::{ExecResult, Operands};

#[inline]
fn sext32(value: u64) -> u64 {
    value as u32 as i32 as i64 as u64
}

/// 以 XLEN 有符号/无符号解释两个源操作数后计算，结果写回 rd
#[inline]
fn signed_op(hart: &mut Hart, ops: &Operands, f: impl FnOnce(i64, i64, u32) -> u64) -> ExecResult {
    let bits = hart.xlen().bits();
    let result = f(hart.xs(ops.rs1()), hart.xs(ops.rs2()), bits);
    hart.set_x(ops.rd(), result);
    Ok(())
}

#[inline]
fn unsigned_op(hart: &mut Hart, ops: &Operands, f: impl FnOnce(u64, u64, u32) -> u64) -> ExecResult {
    let bits = hart.xlen().bits();
    let result = f(hart.x(ops.rs1()), hart.x(ops.rs2()), bits);
    hart.set_x(ops.rd(), result);
    Ok(())
}

pub fn mul(hart: &mut Hart, ops: &Operands) -> ExecResult {
    unsigned_op(hart, ops, |a, b, _| a.wrapping_mul(b))
}

pub fn mulh(hart: &mut Hart, ops: &Operands) -> ExecResult {
    signed_op(hart, ops, |a, b, bits| ((a as i128 * b as i128) >> bits) as u64)
}

pub fn mulhsu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let bits = hart.xlen().bits();
    let a = hart.xs(ops.rs1()) as i128;
    let b = hart.x(ops.rs2()) as i128;
    hart.set_x(ops.rd(), ((a * b) >> bits) as u64);
    Ok(())
}

pub fn mulhu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    unsigned_op(hart, ops, |a, b, bits| ((a as u128 * b as u128) >> bits) as u64)
}

/// 有符号除法：除零得 -1，最小值除以 -1 得被除数
#[inline]
fn div_signed(a: i64, b: i64, min: i64) -> i64 {
    match (a, b) {
        (_, 0) => -1,
        (a, -1) if a == min => a,
        (a, b) => a / b,
    }
}

/// 有符号取余：除零得被除数，最小值除以 -1 得 0
#[inline]
fn rem_signed(a: i64, b: i64, min: i64) -> i64 {
    match (a, b) {
        (a, 0) => a,
        (a, -1) if a == min => 0,
        (a, b) => a % b,
    }
}

#[inline]
fn min_signed(bits: u32) -> i64 {
    i64::MIN >> (64 - bits)
}

pub fn div(hart: &mut Hart, ops: &Operands) -> ExecResult {
    signed_op(hart, ops, |a, b, bits| div_signed(a, b, min_signed(bits)) as u64)
}

pub fn divu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    unsigned_op(hart, ops, |a, b, _| a.checked_div(b).unwrap_or(u64::MAX))
}

pub fn rem(hart: &mut Hart, ops: &Operands) -> ExecResult {
    signed_op(hart, ops, |a, b, bits| rem_signed(a, b, min_signed(bits)) as u64)
}

pub fn remu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    unsigned_op(hart, ops, |a, b, _| a.checked_rem(b).unwrap_or(a))
}

// ========== RV64 字操作 ==========

pub fn mulw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    unsigned_op(hart, ops, |a, b, _| sext32((a as u32).wrapping_mul(b as u32) as u64))
}

pub fn divw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    signed_op(hart, ops, |a, b, _| {
        div_signed(a as i32 as i64, b as i32 as i64, i32::MIN as i64) as i32 as i64 as u64
    })
}

pub fn divuw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    unsigned_op(hart, ops, |a, b, _| {
        let q = (a as u32).checked_div(b as u32).unwrap_or(u32::MAX);
        sext32(q as u64)
    })
}

pub fn remw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    signed_op(hart, ops, |a, b, _| {
        rem_signed(a as i32 as i64, b as i32 as i64, i32::MIN as i64) as i32 as i64 as u64
    })
}

pub fn remuw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    unsigned_op(hart, ops, |a, b, _| {
        let r = (a as u32).checked_rem(b as u32).unwrap_or(a as u32);
        sext32(r as u64)
    })
}
