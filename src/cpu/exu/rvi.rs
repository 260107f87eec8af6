//! RV32I / RV64I 基础整数指令的语义动作

use crate::cpu::Hart;
use crate::isa::fields::{branch_offset, imm12, jump_offset, upper_imm};
use crate::isa::{ExecResult, Operands};

/// 32 位结果符号扩展到 64 位（*W 指令）
#[inline]
fn sext32(value: u64) -> u64 {
    value as u32 as i32 as i64 as u64
}

// ========== U/J-type ==========

pub fn lui(hart: &mut Hart, ops: &Operands) -> ExecResult {
    hart.set_x(ops.rd(), upper_imm(ops.imm()) as u64);
    Ok(())
}

pub fn auipc(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.instr_pc().wrapping_add(upper_imm(ops.imm()) as u64);
    hart.set_x(ops.rd(), value);
    Ok(())
}

pub fn jal(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let link = hart.pc();
    let target = hart.instr_pc().wrapping_add(jump_offset(ops.imm()) as u64);
    hart.set_x(ops.rd(), link);
    hart.jump(target);
    Ok(())
}

pub fn jalr(hart: &mut Hart, ops: &Operands) -> ExecResult {
    // rd 可能与 rs1 相同，先算目标
    let link = hart.pc();
    let target = hart.effective_address(ops.rs1(), imm12(ops.imm())) & !1;
    hart.set_x(ops.rd(), link);
    hart.jump(target);
    Ok(())
}

// ========== Branch ==========

#[inline]
fn branch(hart: &mut Hart, ops: &Operands, taken: bool) -> ExecResult {
    if taken {
        let target = hart.instr_pc().wrapping_add(branch_offset(ops.imm()) as u64);
        hart.jump(target);
    }
    Ok(())
}

pub fn beq(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let taken = hart.x(ops.rs1()) == hart.x(ops.rs2());
    branch(hart, ops, taken)
}

pub fn bne(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let taken = hart.x(ops.rs1()) != hart.x(ops.rs2());
    branch(hart, ops, taken)
}

pub fn blt(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let taken = hart.xs(ops.rs1()) < hart.xs(ops.rs2());
    branch(hart, ops, taken)
}

pub fn bge(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let taken = hart.xs(ops.rs1()) >= hart.xs(ops.rs2());
    branch(hart, ops, taken)
}

pub fn bltu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let taken = hart.x(ops.rs1()) < hart.x(ops.rs2());
    branch(hart, ops, taken)
}

pub fn bgeu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let taken = hart.x(ops.rs1()) >= hart.x(ops.rs2());
    branch(hart, ops, taken)
}

// ========== Load ==========

#[inline]
fn load_address(hart: &Hart, ops: &Operands) -> u64 {
    hart.effective_address(ops.rs1(), imm12(ops.imm()))
}

pub fn lb(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load8(load_address(hart, ops))?;
    hart.set_x(ops.rd(), value as i8 as i64 as u64);
    Ok(())
}

pub fn lh(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load16(load_address(hart, ops))?;
    hart.set_x(ops.rd(), value as i16 as i64 as u64);
    Ok(())
}

pub fn lw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load32(load_address(hart, ops))?;
    hart.set_x(ops.rd(), value as i32 as i64 as u64);
    Ok(())
}

pub fn ld(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load64(load_address(hart, ops))?;
    hart.set_x(ops.rd(), value);
    Ok(())
}

pub fn lbu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load8(load_address(hart, ops))?;
    hart.set_x(ops.rd(), value as u64);
    Ok(())
}

pub fn lhu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load16(load_address(hart, ops))?;
    hart.set_x(ops.rd(), value as u64);
    Ok(())
}

pub fn lwu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let value = hart.memory.load32(load_address(hart, ops))?;
    hart.set_x(ops.rd(), value as u64);
    Ok(())
}

// ========== Store ==========

pub fn sb(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let addr = load_address(hart, ops);
    let value = hart.x(ops.rs2()) as u8;
    hart.memory.store8(addr, value)?;
    Ok(())
}

pub fn sh(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let addr = load_address(hart, ops);
    let value = hart.x(ops.rs2()) as u16;
    hart.memory.store16(addr, value)?;
    Ok(())
}

pub fn sw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let addr = load_address(hart, ops);
    let value = hart.x(ops.rs2()) as u32;
    hart.memory.store32(addr, value)?;
    Ok(())
}

pub fn sd(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let addr = load_address(hart, ops);
    let value = hart.x(ops.rs2());
    hart.memory.store64(addr, value)?;
    Ok(())
}

// ========== I-type 立即数算术/逻辑指令 ==========

#[inline]
fn op_imm(hart: &mut Hart, ops: &Operands, f: impl FnOnce(u64, u64) -> u64) -> ExecResult {
    let result = f(hart.x(ops.rs1()), imm12(ops.imm()) as u64);
    hart.set_x(ops.rd(), result);
    Ok(())
}

pub fn addi(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_imm(hart, ops, u64::wrapping_add)
}

pub fn slti(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let result = hart.xs(ops.rs1()) < imm12(ops.imm());
    hart.set_x(ops.rd(), result as u64);
    Ok(())
}

pub fn sltiu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    // 立即数先符号扩展再按无符号比较
    let xlen = hart.xlen();
    let result = hart.x(ops.rs1()) < xlen.normalize(imm12(ops.imm()) as u64);
    hart.set_x(ops.rd(), result as u64);
    Ok(())
}

pub fn xori(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_imm(hart, ops, |a, b| a ^ b)
}

pub fn ori(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_imm(hart, ops, |a, b| a | b)
}

pub fn andi(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_imm(hart, ops, |a, b| a & b)
}

pub fn slli(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let shamt = ops.shamt() & hart.xlen().shamt_mask();
    let result = hart.x(ops.rs1()) << shamt;
    hart.set_x(ops.rd(), result);
    Ok(())
}

pub fn srli(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let shamt = ops.shamt() & hart.xlen().shamt_mask();
    let result = hart.x(ops.rs1()) >> shamt;
    hart.set_x(ops.rd(), result);
    Ok(())
}

pub fn srai(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let shamt = ops.shamt() & hart.xlen().shamt_mask();
    let result = hart.xs(ops.rs1()) >> shamt;
    hart.set_x(ops.rd(), result as u64);
    Ok(())
}

// ========== R-type 算术/逻辑指令 ==========

#[inline]
fn op_reg(hart: &mut Hart, ops: &Operands, f: impl FnOnce(u64, u64) -> u64) -> ExecResult {
    let result = f(hart.x(ops.rs1()), hart.x(ops.rs2()));
    hart.set_x(ops.rd(), result);
    Ok(())
}

/// 寄存器移位量只取低 log2(XLEN) 位
#[inline]
fn reg_shamt(hart: &Hart, reg: u8) -> u32 {
    hart.x(reg) as u32 & hart.xlen().shamt_mask()
}

pub fn add(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, u64::wrapping_add)
}

pub fn sub(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, u64::wrapping_sub)
}

pub fn sll(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let shamt = reg_shamt(hart, ops.rs2());
    let result = hart.x(ops.rs1()) << shamt;
    hart.set_x(ops.rd(), result);
    Ok(())
}

pub fn slt(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let result = hart.xs(ops.rs1()) < hart.xs(ops.rs2());
    hart.set_x(ops.rd(), result as u64);
    Ok(())
}

pub fn sltu(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| (a < b) as u64)
}

pub fn xor(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| a ^ b)
}

pub fn srl(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let shamt = reg_shamt(hart, ops.rs2());
    let result = hart.x(ops.rs1()) >> shamt;
    hart.set_x(ops.rd(), result);
    Ok(())
}

pub fn sra(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let shamt = reg_shamt(hart, ops.rs2());
    let result = hart.xs(ops.rs1()) >> shamt;
    hart.set_x(ops.rd(), result as u64);
    Ok(())
}

pub fn or(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| a | b)
}

pub fn and(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| a & b)
}

// ========== RV64 字操作 ==========

pub fn addiw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_imm(hart, ops, |a, b| sext32(a.wrapping_add(b)))
}

pub fn slliw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let result = (hart.x(ops.rs1()) as u32) << (ops.shamt() & 0x1F);
    hart.set_x(ops.rd(), sext32(result as u64));
    Ok(())
}

pub fn srliw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let result = (hart.x(ops.rs1()) as u32) >> (ops.shamt() & 0x1F);
    hart.set_x(ops.rd(), sext32(result as u64));
    Ok(())
}

pub fn sraiw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let result = (hart.x(ops.rs1()) as i32) >> (ops.shamt() & 0x1F);
    hart.set_x(ops.rd(), result as i64 as u64);
    Ok(())
}

pub fn addw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| sext32(a.wrapping_add(b)))
}

pub fn subw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| sext32(a.wrapping_sub(b)))
}

pub fn sllw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| sext32(((a as u32) << (b & 0x1F)) as u64))
}

pub fn srlw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| sext32(((a as u32) >> (b & 0x1F)) as u64))
}

pub fn sraw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    op_reg(hart, ops, |a, b| ((a as i32) >> (b & 0x1F)) as i64 as u64)
}

// ========== 同步 ==========

/// 单 hart、无缓存模型下 fence 与 fence.i 都不产生效果
pub fn fence(_hart: &mut Hart, _ops: &Operands) -> ExecResult {
    Ok(())
}
