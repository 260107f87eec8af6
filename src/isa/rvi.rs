//! RV32I / RV64I 基础整数指令目录

use super::instr_def::InstrDef;
use crate::cpu::exu::{rvi as exec, system};

pub static RVI_INSTRS: &[InstrDef] = &[
    // ========== U/J-type ==========
    InstrDef::new("lui t1,100000", "Load upper immediate: set t1 to 20-bit immediate shifted left 12 bits",
        "iiiiiiiiiiiiiiiiiiii ddddd 0110111", exec::lui),
    InstrDef::new("auipc t1,10000", "Add upper immediate to pc: set t1 to pc plus the immediate shifted left 12 bits",
        "iiiiiiiiiiiiiiiiiiii ddddd 0010111", exec::auipc),
    InstrDef::new("jal t1,target", "Jump and link: set t1 to pc+4, then jump to target",
        "iiiiiiiiiiiiiiiiiiii ddddd 1101111", exec::jal),
    InstrDef::new("jalr t1,t2,-100", "Jump and link register: set t1 to pc+4, then jump to t2 plus the offset with bit 0 cleared",
        "iiiiiiiiiiii sssss 000 ddddd 1100111", exec::jalr),

    // ========== Branch ==========
    InstrDef::new("beq t1,t2,label", "Branch if equal",
        "iiiiiii ttttt sssss 000 iiiii 1100011", exec::beq),
    InstrDef::new("bne t1,t2,label", "Branch if not equal",
        "iiiiiii ttttt sssss 001 iiiii 1100011", exec::bne),
    InstrDef::new("blt t1,t2,label", "Branch if less than (signed)",
        "iiiiiii ttttt sssss 100 iiiii 1100011", exec::blt),
    InstrDef::new("bge t1,t2,label", "Branch if greater than or equal (signed)",
        "iiiiiii ttttt sssss 101 iiiii 1100011", exec::bge),
    InstrDef::new("bltu t1,t2,label", "Branch if less than (unsigned)",
        "iiiiiii ttttt sssss 110 iiiii 1100011", exec::bltu),
    InstrDef::new("bgeu t1,t2,label", "Branch if greater than or equal (unsigned)",
        "iiiiiii ttttt sssss 111 iiiii 1100011", exec::bgeu),

    // ========== Load ==========
    InstrDef::new("lb t1,-100(t2)", "Set t1 to sign-extended 8-bit value from effective memory byte address",
        "iiiiiiiiiiii sssss 000 ddddd 0000011", exec::lb),
    InstrDef::new("lh t1,-100(t2)", "Set t1 to sign-extended 16-bit value from effective memory halfword address",
        "iiiiiiiiiiii sssss 001 ddddd 0000011", exec::lh),
    InstrDef::new("lw t1,-100(t2)", "Set t1 to sign-extended 32-bit value from effective memory word address",
        "iiiiiiiiiiii sssss 010 ddddd 0000011", exec::lw),
    InstrDef::new("ld t1,-100(t2)", "Set t1 to 64-bit value from effective memory doubleword address",
        "iiiiiiiiiiii sssss 011 ddddd 0000011", exec::ld).rv64_only(),
    InstrDef::new("lbu t1,-100(t2)", "Set t1 to zero-extended 8-bit value from effective memory byte address",
        "iiiiiiiiiiii sssss 100 ddddd 0000011", exec::lbu),
    InstrDef::new("lhu t1,-100(t2)", "Set t1 to zero-extended 16-bit value from effective memory halfword address",
        "iiiiiiiiiiii sssss 101 ddddd 0000011", exec::lhu),
    InstrDef::new("lwu t1,-100(t2)", "Set t1 to zero-extended 32-bit value from effective memory word address",
        "iiiiiiiiiiii sssss 110 ddddd 0000011", exec::lwu).rv64_only(),

    // ========== Store ==========
    InstrDef::new("sb t1,-100(t2)", "Store the low byte of t1 into effective memory byte address",
        "iiiiiii ttttt sssss 000 iiiii 0100011", exec::sb),
    InstrDef::new("sh t1,-100(t2)", "Store the low halfword of t1 into effective memory halfword address",
        "iiiiiii ttttt sssss 001 iiiii 0100011", exec::sh),
    InstrDef::new("sw t1,-100(t2)", "Store the low word of t1 into effective memory word address",
        "iiiiiii ttttt sssss 010 iiiii 0100011", exec::sw),
    InstrDef::new("sd t1,-100(t2)", "Store t1 into effective memory doubleword address",
        "iiiiiii ttttt sssss 011 iiiii 0100011", exec::sd).rv64_only(),

    // ========== I-type ALU ==========
    InstrDef::new("addi t1,t2,-100", "Addition immediate: set t1 to (t2 plus signed 12-bit immediate)",
        "iiiiiiiiiiii sssss 000 ddddd 0010011", exec::addi),
    InstrDef::new("slti t1,t2,-100", "Set less than immediate: if t2 is less than the immediate, set t1 to 1, else 0",
        "iiiiiiiiiiii sssss 010 ddddd 0010011", exec::slti),
    InstrDef::new("sltiu t1,t2,-100", "Set less than immediate unsigned",
        "iiiiiiiiiiii sssss 011 ddddd 0010011", exec::sltiu),
    InstrDef::new("xori t1,t2,-100", "Bitwise XOR immediate",
        "iiiiiiiiiiii sssss 100 ddddd 0010011", exec::xori),
    InstrDef::new("ori t1,t2,-100", "Bitwise OR immediate",
        "iiiiiiiiiiii sssss 110 ddddd 0010011", exec::ori),
    InstrDef::new("andi t1,t2,-100", "Bitwise AND immediate",
        "iiiiiiiiiiii sssss 111 ddddd 0010011", exec::andi),
    InstrDef::new("slli t1,t2,10", "Shift left logical: set t1 to t2 shifted left by the immediate",
        "0000000 hhhhh sssss 001 ddddd 0010011", exec::slli).rv32_only(),
    InstrDef::new("srli t1,t2,10", "Shift right logical: set t1 to t2 shifted right by the immediate, zero-filled",
        "0000000 hhhhh sssss 101 ddddd 0010011", exec::srli).rv32_only(),
    InstrDef::new("srai t1,t2,10", "Shift right arithmetic: set t1 to t2 shifted right by the immediate, sign-filled",
        "0100000 hhhhh sssss 101 ddddd 0010011", exec::srai).rv32_only(),
    // RV64 的移位量多一位
    InstrDef::new("slli t1,t2,33", "Shift left logical: set t1 to t2 shifted left by the immediate",
        "000000 hhhhhh sssss 001 ddddd 0010011", exec::slli).rv64_only(),
    InstrDef::new("srli t1,t2,33", "Shift right logical: set t1 to t2 shifted right by the immediate, zero-filled",
        "000000 hhhhhh sssss 101 ddddd 0010011", exec::srli).rv64_only(),
    InstrDef::new("srai t1,t2,33", "Shift right arithmetic: set t1 to t2 shifted right by the immediate, sign-filled",
        "010000 hhhhhh sssss 101 ddddd 0010011", exec::srai).rv64_only(),

    // ========== R-type ALU ==========
    InstrDef::new("add t1,t2,t3", "Addition: set t1 to (t2 plus t3)",
        "0000000 ttttt sssss 000 ddddd 0110011", exec::add),
    InstrDef::new("sub t1,t2,t3", "Subtraction: set t1 to (t2 minus t3)",
        "0100000 ttttt sssss 000 ddddd 0110011", exec::sub),
    InstrDef::new("sll t1,t2,t3", "Shift left logical by the low bits of t3",
        "0000000 ttttt sssss 001 ddddd 0110011", exec::sll),
    InstrDef::new("slt t1,t2,t3", "Set less than: if t2 is less than t3 (signed), set t1 to 1, else 0",
        "0000000 ttttt sssss 010 ddddd 0110011", exec::slt),
    InstrDef::new("sltu t1,t2,t3", "Set less than unsigned",
        "0000000 ttttt sssss 011 ddddd 0110011", exec::sltu),
    InstrDef::new("xor t1,t2,t3", "Bitwise XOR",
        "0000000 ttttt sssss 100 ddddd 0110011", exec::xor),
    InstrDef::new("srl t1,t2,t3", "Shift right logical by the low bits of t3",
        "0000000 ttttt sssss 101 ddddd 0110011", exec::srl),
    InstrDef::new("sra t1,t2,t3", "Shift right arithmetic by the low bits of t3",
        "0100000 ttttt sssss 101 ddddd 0110011", exec::sra),
    InstrDef::new("or t1,t2,t3", "Bitwise OR",
        "0000000 ttttt sssss 110 ddddd 0110011", exec::or),
    InstrDef::new("and t1,t2,t3", "Bitwise AND",
        "0000000 ttttt sssss 111 ddddd 0110011", exec::and),

    // ========== RV64 word ops ==========
    InstrDef::new("addiw t1,t2,-100", "Add immediate on the low word, sign-extend the 32-bit result",
        "iiiiiiiiiiii sssss 000 ddddd 0011011", exec::addiw).rv64_only(),
    InstrDef::new("slliw t1,t2,10", "Shift left logical word by the immediate",
        "0000000 hhhhh sssss 001 ddddd 0011011", exec::slliw).rv64_only(),
    InstrDef::new("srliw t1,t2,10", "Shift right logical word by the immediate",
        "0000000 hhhhh sssss 101 ddddd 0011011", exec::srliw).rv64_only(),
    InstrDef::new("sraiw t1,t2,10", "Shift right arithmetic word by the immediate",
        "0100000 hhhhh sssss 101 ddddd 0011011", exec::sraiw).rv64_only(),
    InstrDef::new("addw t1,t2,t3", "Add the low words, sign-extend the 32-bit result",
        "0000000 ttttt sssss 000 ddddd 0111011", exec::addw).rv64_only(),
    InstrDef::new("subw t1,t2,t3", "Subtract the low words, sign-extend the 32-bit result",
        "0100000 ttttt sssss 000 ddddd 0111011", exec::subw).rv64_only(),
    InstrDef::new("sllw t1,t2,t3", "Shift left logical word",
        "0000000 ttttt sssss 001 ddddd 0111011", exec::sllw).rv64_only(),
    InstrDef::new("srlw t1,t2,t3", "Shift right logical word",
        "0000000 ttttt sssss 101 ddddd 0111011", exec::srlw).rv64_only(),
    InstrDef::new("sraw t1,t2,t3", "Shift right arithmetic word",
        "0100000 ttttt sssss 101 ddddd 0111011", exec::sraw).rv64_only(),

    // ========== System ==========
    InstrDef::new("fence 1,1", "Order memory accesses (no effect in this simulator)",
        "ffff pppp qqqq sssss 000 ddddd 0001111", exec::fence),
    InstrDef::new("fence.i", "Synchronize the instruction stream with prior stores",
        "iiiiiiiiiiii sssss 001 ddddd 0001111", exec::fence),
    InstrDef::new("ecall", "Issue a system call: service number in a7, arguments in a0..a6",
        "000000000000 00000 000 00000 1110011", system::ecall),
    InstrDef::new("ebreak", "Pause execution",
        "000000000001 00000 000 00000 1110011", system::ebreak),
];
