//! ISA 模块测试

use super::*;
use crate::error::Exception;
use crate::isa::fields::{branch_offset, imm12, jump_offset};

fn full_table() -> InstrTable {
    IsaConfig::full().build().unwrap()
}

fn mnemonic_of(table: &InstrTable, word: u32, xlen: Xlen) -> &'static str {
    let index = table.lookup(word, xlen).unwrap();
    table.descriptor(index).unwrap().mnemonic()
}

#[test]
fn test_decode_addi() {
    let table = full_table();
    let decoded = table.decode(0x02A0_0093, 0, Xlen::Rv32).unwrap(); // addi x1, x0, 42
    assert_eq!(table.descriptor(decoded.index).unwrap().mnemonic(), "addi");
    assert_eq!(decoded.operands.rd(), 1);
    assert_eq!(decoded.operands.rs1(), 0);
    assert_eq!(imm12(decoded.operands.imm()), 42);
}

#[test]
fn test_decode_addi_negative() {
    let table = full_table();
    let decoded = table.decode(0xFFF0_0113, 0, Xlen::Rv32).unwrap(); // addi x2, x0, -1
    assert_eq!(decoded.operands.rd(), 2);
    assert_eq!(imm12(decoded.operands.imm()), -1);
}

#[test]
fn test_decode_r_type() {
    let table = full_table();
    assert_eq!(mnemonic_of(&table, 0x0020_81B3, Xlen::Rv32), "add");
    assert_eq!(mnemonic_of(&table, 0x4020_81B3, Xlen::Rv32), "sub");
    assert_eq!(mnemonic_of(&table, 0x0220_81B3, Xlen::Rv32), "mul");
    assert_eq!(mnemonic_of(&table, 0x0220_C1B3, Xlen::Rv32), "div");
}

#[test]
fn test_decode_branch_and_jump() {
    let table = full_table();
    let beq = table.decode(0x0020_8463, 0, Xlen::Rv32).unwrap(); // beq x1, x2, 8
    assert_eq!(table.descriptor(beq.index).unwrap().mnemonic(), "beq");
    assert_eq!(branch_offset(beq.operands.imm()), 8);

    let jal = table.decode(0x0000_006F, 0, Xlen::Rv32).unwrap(); // jal x0, 0
    assert_eq!(table.descriptor(jal.index).unwrap().mnemonic(), "jal");
    assert_eq!(jump_offset(jal.operands.imm()), 0);
}

#[test]
fn test_decode_system() {
    let table = full_table();
    assert_eq!(mnemonic_of(&table, 0x0000_0073, Xlen::Rv32), "ecall");
    assert_eq!(mnemonic_of(&table, 0x0010_0073, Xlen::Rv32), "ebreak");
    // csrrs x5, fcsr, x0
    let csr = table.decode(0x0030_22F3, 0, Xlen::Rv32).unwrap();
    assert_eq!(table.descriptor(csr.index).unwrap().mnemonic(), "csrrs");
    assert_eq!(csr.operands.csr(), 0x003);
}

#[test]
fn test_shift_immediate_width() {
    let table = full_table();
    // slli x1, x1, 32：RV32 保留，RV64 合法
    let word = 0x0200_9093;
    assert_eq!(table.lookup(word, Xlen::Rv32), Err(Exception::ReservedInstruction));
    assert_eq!(mnemonic_of(&table, word, Xlen::Rv64), "slli");
    // slli x1, x1, 3 两种位宽都合法
    assert_eq!(mnemonic_of(&table, 0x0030_9093, Xlen::Rv32), "slli");
    assert_eq!(mnemonic_of(&table, 0x0030_9093, Xlen::Rv64), "slli");
}

#[test]
fn test_rv64_only_instructions() {
    let table = full_table();
    // addw x3, x1, x2
    assert_eq!(table.lookup(0x0020_81BB, Xlen::Rv32), Err(Exception::ReservedInstruction));
    assert_eq!(mnemonic_of(&table, 0x0020_81BB, Xlen::Rv64), "addw");
    // fmv.x.d x5, f1
    assert_eq!(table.lookup(0xE200_82D3, Xlen::Rv32), Err(Exception::ReservedInstruction));
    assert_eq!(mnemonic_of(&table, 0xE200_82D3, Xlen::Rv64), "fmv.x.d");
}

#[test]
fn test_fused_siblings() {
    let table = full_table();
    // fmadd.d / fmsub.d / fnmsub.d / fnmadd.d f1, f2, f3, f4 (rm = dyn)
    let base = (4 << 27) | (1 << 25) | (3 << 20) | (2 << 15) | (0b111 << 12) | (1 << 7);
    assert_eq!(mnemonic_of(&table, base | 0b1000011, Xlen::Rv32), "fmadd.d");
    assert_eq!(mnemonic_of(&table, base | 0b1000111, Xlen::Rv32), "fmsub.d");
    assert_eq!(mnemonic_of(&table, base | 0b1001011, Xlen::Rv32), "fnmsub.d");
    assert_eq!(mnemonic_of(&table, base | 0b1001111, Xlen::Rv32), "fnmadd.d");
    let ops = table.decode(base | 0b1001011, 0, Xlen::Rv32).unwrap().operands;
    assert_eq!((ops.rs1(), ops.rs2(), ops.rs3(), ops.rd(), ops.rm()), (2, 3, 4, 1, 0b111));
}

#[test]
fn test_illegal_word() {
    let table = full_table();
    assert_eq!(table.lookup(0x0000_0000, Xlen::Rv32), Err(Exception::IllegalInstruction));
    assert_eq!(table.lookup(0xFFFF_FFFF, Xlen::Rv64), Err(Exception::IllegalInstruction));
}

#[test]
fn test_base_only_config_rejects_extensions() {
    let table = IsaConfig::new().build().unwrap();
    // mul x3, x1, x2 未启用 M 扩展
    assert_eq!(table.lookup(0x0220_81B3, Xlen::Rv32), Err(Exception::IllegalInstruction));
}

#[test]
fn test_every_template_is_word_wide() {
    let catalogs = [RVI_INSTRS, RVM_INSTRS, RVF_INSTRS, RVD_INSTRS, ZICSR_INSTRS];
    for def in catalogs.iter().flat_map(|c| c.iter()) {
        let descriptor = match Descriptor::compile(def) {
            Ok(descriptor) => descriptor,
            Err(err) => panic!("{}: {err}", def.usage),
        };
        let codec = descriptor.codec();
        let field_bits = codec.fields().iter().fold(0u32, |acc, f| acc | f.mask());
        assert_eq!(codec.mask() | field_bits, u32::MAX, "{}", def.usage);
        assert_eq!(codec.mask() & field_bits, 0, "{}", def.usage);
    }
}

#[test]
fn test_fused_family_opcodes() {
    let table = full_table();
    // fmadd.s f1, f2, f3, f4 / fmsub.s / fnmsub.s / fnmadd.s, rm=dyn
    assert_eq!(mnemonic_of(&table, 0x2031_70C3, Xlen::Rv32), "fmadd.s");
    assert_eq!(mnemonic_of(&table, 0x2031_70C7, Xlen::Rv32), "fmsub.s");
    assert_eq!(mnemonic_of(&table, 0x2031_70CB, Xlen::Rv32), "fnmsub.s");
    assert_eq!(mnemonic_of(&table, 0x2031_70CF, Xlen::Rv32), "fnmadd.s");
    assert_eq!(mnemonic_of(&table, 0x2231_70CB, Xlen::Rv32), "fnmsub.d");
}

#[test]
fn test_literal_bits_round_trip() {
    let table = full_table();
    for descriptor in table.iter() {
        let codec = descriptor.codec();
        let literal = codec.match_val();
        assert!(codec.matches(literal), "{}", descriptor.mnemonic());
        for bit in (0..32).map(|i| 1u32 << i).filter(|b| codec.mask() & b != 0) {
            assert!(!codec.matches(literal ^ bit), "{} accepts 0x{:08x}", descriptor.mnemonic(), literal ^ bit);
        }
    }
}
