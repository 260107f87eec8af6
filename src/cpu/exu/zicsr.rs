//! Zicsr 扩展执行单元
//!
//! 读出旧值在先，写回在后，最后才写 rd；任何一步失败时架构状态保持不变。

use crate::cpu::Hart;
use crate::isa::{ExecResult, Operands};

/// 读-改-写的公共流程。`modify` 返回 None 表示不写 CSR
#[inline]
fn csr_rmw(hart: &mut Hart, ops: &Operands, modify: impl FnOnce(u64) -> Option<u64>) -> ExecResult {
    let csr = ops.csr();
    let old = hart.csr_read(csr)?;
    if let Some(new) = modify(old) {
        hart.csr_write(csr, new)?;
    }
    hart.set_x(ops.rd(), old);
    Ok(())
}

// CSRRW: t = CSR[csr]; CSR[csr] = rs1; rd = t
pub fn csrrw(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let src = hart.x(ops.rs1());
    csr_rmw(hart, ops, |_| Some(src))
}

// CSRRS: rs1 = x0 时为纯读取
pub fn csrrs(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let (reg, src) = (ops.rs1(), hart.x(ops.rs1()));
    csr_rmw(hart, ops, |old| (reg != 0).then_some(old | src))
}

// CSRRC: rs1 = x0 时为纯读取
pub fn csrrc(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let (reg, src) = (ops.rs1(), hart.x(ops.rs1()));
    csr_rmw(hart, ops, |old| (reg != 0).then_some(old & !src))
}

pub fn csrrwi(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let zimm = ops.imm() as u64;
    csr_rmw(hart, ops, |_| Some(zimm))
}

pub fn csrrsi(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let zimm = ops.imm() as u64;
    csr_rmw(hart, ops, |old| (zimm != 0).then_some(old | zimm))
}

pub fn csrrci(hart: &mut Hart, ops: &Operands) -> ExecResult {
    let zimm = ops.imm() as u64;
    csr_rmw(hart, ops, |old| (zimm != 0).then_some(old & !zimm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::csr_def::{CSR_CYCLE, CSR_FCSR, CSR_FFLAGS, CSR_FRM, CSR_USCRATCH};
    use crate::cpu::exu::test_util::{hart, ops};
    use crate::error::Exception;
    use crate::isa::Xlen;

    #[test]
    fn test_csrrw_swaps() {
        let mut hart = hart(Xlen::Rv32);
        hart.csr_write(CSR_USCRATCH, 0x11).unwrap();
        hart.set_x(5, 0x22);
        csrrw(&mut hart, &ops(&[('c', CSR_USCRATCH as u32), ('s', 5), ('d', 5)])).unwrap();
        assert_eq!(hart.x(5), 0x11);
        assert_eq!(hart.csr_read(CSR_USCRATCH), Ok(0x22));
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut hart = hart(Xlen::Rv32);
        csrrsi(&mut hart, &ops(&[('c', CSR_FFLAGS as u32), ('i', 0b101), ('d', 1)])).unwrap();
        assert_eq!(hart.x(1), 0);
        assert_eq!(hart.fp_env().flags(), 0b101);
        csrrci(&mut hart, &ops(&[('c', CSR_FFLAGS as u32), ('i', 0b001), ('d', 1)])).unwrap();
        assert_eq!(hart.x(1), 0b101);
        assert_eq!(hart.csr_read(CSR_FCSR), Ok(0b100));
    }

    #[test]
    fn test_frm_write_through_csrrwi() {
        let mut hart = hart(Xlen::Rv32);
        csrrwi(&mut hart, &ops(&[('c', CSR_FRM as u32), ('i', 0b001), ('d', 0)])).unwrap();
        assert_eq!(hart.fp_env().frm(), 0b001);
    }

    #[test]
    fn test_read_only_counter() {
        let mut hart = hart(Xlen::Rv32);
        hart.retire();
        // rs1 = x0：纯读取，允许
        csrrs(&mut hart, &ops(&[('c', CSR_CYCLE as u32), ('s', 0), ('d', 6)])).unwrap();
        assert_eq!(hart.x(6), 1);
        hart.set_x(7, 1);
        let err = csrrw(&mut hart, &ops(&[('c', CSR_CYCLE as u32), ('s', 7), ('d', 7)])).unwrap_err();
        assert_eq!(err, Exception::IllegalInstruction);
        assert_eq!(hart.x(7), 1);
    }

    #[test]
    fn test_unknown_csr() {
        let mut hart = hart(Xlen::Rv32);
        let err = csrrs(&mut hart, &ops(&[('c', 0x7FF), ('s', 0), ('d', 1)])).unwrap_err();
        assert_eq!(err, Exception::IllegalInstruction);
    }
}
