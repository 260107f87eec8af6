//! 指令表
//!
//! 注册时检测编码重叠；查找按 opcode 分桶，只遍历可能匹配的描述符。

use log::trace;

use super::codec::Operands;
use super::instr_def::{Descriptor, InstrDef, Xlen};
use crate::error::{BuildError, Exception};

const OPCODE_MASK: u32 = 0x7F;
const BUCKETS: usize = 128;

/// 解码后的指令实例
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstr {
    pub addr: u64,
    pub word: u32,
    /// 指令表中的描述符下标
    pub index: usize,
    pub operands: Operands,
}

/// 指令描述符集合
#[derive(Debug, Clone)]
pub struct InstrTable {
    descriptors: Vec<Descriptor>,
    /// opcode -> 描述符下标
    opcode_map: Vec<Vec<usize>>,
}

impl Default for InstrTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrTable {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            opcode_map: vec![Vec::new(); BUCKETS],
        }
    }

    /// 注册一条指令；与已注册描述符重叠时返回错误且不修改表
    pub fn register(&mut self, def: &'static InstrDef) -> Result<(), BuildError> {
        let descriptor = Descriptor::compile(def)?;

        if let Some(existing) = self.descriptors.iter().find(|d| d.conflicts_with(&descriptor)) {
            return Err(BuildError::Overlap {
                existing: existing.mnemonic(),
                new: descriptor.mnemonic(),
                example: existing.codec().common_example(descriptor.codec()),
            });
        }

        let index = self.descriptors.len();
        let codec = descriptor.codec();
        if codec.mask() & OPCODE_MASK == OPCODE_MASK {
            self.opcode_map[(codec.match_val() & OPCODE_MASK) as usize].push(index);
        } else {
            // opcode 位不完全固定的描述符放入所有桶
            for (opcode, bucket) in self.opcode_map.iter_mut().enumerate() {
                if (opcode as u32) & codec.mask() & OPCODE_MASK == codec.match_val() & OPCODE_MASK {
                    bucket.push(index);
                }
            }
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// 批量注册
    pub fn register_all(&mut self, defs: &'static [InstrDef]) -> Result<(), BuildError> {
        defs.iter().try_for_each(|def| self.register(def))
    }

    /// 查找适用于 `xlen` 的描述符下标
    ///
    /// 有描述符匹配但都不适用当前位宽时返回 `ReservedInstruction`，
    /// 无任何匹配时返回 `IllegalInstruction`。
    pub fn lookup(&self, word: u32, xlen: Xlen) -> Result<usize, Exception> {
        let mut matched_other_width = false;
        for &index in &self.opcode_map[(word & OPCODE_MASK) as usize] {
            let descriptor = &self.descriptors[index];
            if descriptor.matches(word) {
                if descriptor.applicability().includes(xlen) {
                    return Ok(index);
                }
                matched_other_width = true;
            }
        }
        if matched_other_width {
            Err(Exception::ReservedInstruction)
        } else {
            Err(Exception::IllegalInstruction)
        }
    }

    /// 查找并抽取操作数
    pub fn decode(&self, word: u32, addr: u64, xlen: Xlen) -> Result<DecodedInstr, Exception> {
        let index = self.lookup(word, xlen)?;
        let operands = self.descriptors[index].codec().decode(word);
        trace!("decoded 0x{word:08x} at 0x{addr:08x} as {}", self.descriptors[index].mnemonic());
        Ok(DecodedInstr { addr, word, index, operands })
    }

    pub fn descriptor(&self, index: usize) -> Option<&Descriptor> {
        self.descriptors.get(index)
    }

    /// 按助记符查找（用于诊断与测试）
    pub fn find(&self, mnemonic: &str) -> impl Iterator<Item = &Descriptor> + '_ {
        let mnemonic = mnemonic.to_string();
        self.descriptors.iter().filter(move |d| d.mnemonic() == mnemonic)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Hart;
    use crate::isa::instr_def::ExecResult;

    fn nop(_: &mut Hart, _: &Operands) -> ExecResult {
        Ok(())
    }

    static ADDI: InstrDef = InstrDef::new("addi t1,t2,-100", "", "iiiiiiiiiiii sssss 000 ddddd 0010011", nop);
    static ADDI_AGAIN: InstrDef = InstrDef::new("li t1,5", "", "iiiiiiiiiiii 00000 000 ddddd 0010011", nop);
    static LD: InstrDef = InstrDef::new("ld t1,8(t2)", "", "iiiiiiiiiiii sssss 011 ddddd 0000011", nop).rv64_only();
    static ANY_OPCODE: InstrDef = InstrDef::new("custom t1", "", "000000000000 00000 111 ddddd 11110ii", nop);

    #[test]
    fn test_register_rejects_overlap() {
        let mut table = InstrTable::new();
        table.register(&ADDI).unwrap();
        let err = table.register(&ADDI_AGAIN).unwrap_err();
        assert!(matches!(err, BuildError::Overlap { existing: "addi", new: "li", .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup_illegal_and_reserved() {
        let mut table = InstrTable::new();
        table.register_all(std::slice::from_ref(&ADDI)).unwrap();
        table.register(&LD).unwrap();

        // ld x5, 8(x6)
        let ld = 0x0083_3283;
        assert_eq!(table.lookup(ld, Xlen::Rv64), Ok(1));
        assert_eq!(table.lookup(ld, Xlen::Rv32), Err(Exception::ReservedInstruction));
        assert_eq!(table.lookup(0xFFFF_FFFF, Xlen::Rv32), Err(Exception::IllegalInstruction));

        let decoded = table.decode(0x0000_0013, 0x0040_0000, Xlen::Rv32).unwrap();
        assert_eq!(decoded.index, 0);
        assert_eq!(decoded.operands.rd(), 0);
    }

    #[test]
    fn test_partial_opcode_goes_to_matching_buckets() {
        let mut table = InstrTable::new();
        table.register(&ANY_OPCODE).unwrap();
        for low in 0..4u32 {
            let word = (0b111 << 12) | (5 << 7) | 0b1111000 | low;
            assert_eq!(table.lookup(word, Xlen::Rv32), Ok(0));
        }
    }
}
