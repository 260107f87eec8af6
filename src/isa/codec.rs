//! 位域编解码器
//!
//! 将格式模板编译为 mask/match 对与操作数字段列表。模板规则：
//! - `0`/`1` 为固定位，最左侧字符对应 bit 31
//! - 小写字母标记操作数字段；同一字母出现在不连续位置时，按模板顺序拼接
//!   （用于 B/J 型等拆分立即数）
//! - 空格与 `_` 只作分隔，不占位宽
//!
//! 本模块的字母约定：`d` rd，`s` rs1，`t` rs2，`r` rs3，`i` 立即数，
//! `h` 移位量，`m` 舍入模式，`c` CSR 编号，`f`/`p`/`q` fence 模式与前驱、后继集合。

use crate::error::TemplateError;

/// 指令字宽
pub const WORD_BITS: usize = 32;

/// 一段连续字段位（`lsb` 起，宽 `width`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BitRun {
    lsb: u32,
    width: u32,
}

/// 一个操作数字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    letter: char,
    runs: Vec<BitRun>,
}

impl Field {
    pub fn letter(&self) -> char {
        self.letter
    }

    /// 字段总宽度
    pub fn width(&self) -> u32 {
        self.runs.iter().map(|run| run.width).sum()
    }

    /// 字段在指令字中占据的位
    pub fn mask(&self) -> u32 {
        self.runs.iter().fold(0, |acc, run| acc | (low_bits(run.width) << run.lsb))
    }

    /// 从指令字中抽取字段值，各段按模板顺序拼接（先出现的段在高位）
    pub fn extract(&self, word: u32) -> u32 {
        self.runs.iter().fold(0u32, |acc, run| {
            let bits = (word >> run.lsb) & low_bits(run.width);
            // width 为 32 时左移会溢出
            acc.checked_shl(run.width).unwrap_or(0) | bits
        })
    }
}

fn low_bits(width: u32) -> u32 {
    if width >= 32 { u32::MAX } else { (1u32 << width) - 1 }
}

/// 编译后的格式模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    mask: u32,
    match_val: u32,
    fields: Vec<Field>,
}

impl Codec {
    /// 编译模板字符串
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let bits: Vec<char> = template.chars().filter(|c| *c != ' ' && *c != '_').collect();
        if bits.len() != WORD_BITS {
            return Err(TemplateError::Width { found: bits.len() });
        }

        let mut mask = 0u32;
        let mut match_val = 0u32;
        let mut fields: Vec<Field> = Vec::new();

        for (i, ch) in bits.into_iter().enumerate() {
            let bit = (WORD_BITS - 1 - i) as u32;
            match ch {
                '0' => mask |= 1 << bit,
                '1' => {
                    mask |= 1 << bit;
                    match_val |= 1 << bit;
                }
                'a'..='z' => match fields.iter_mut().find(|f| f.letter == ch) {
                    Some(field) => match field.runs.last_mut() {
                        // 紧邻上一段：扩展该段
                        Some(run) if run.lsb == bit + 1 => {
                            run.lsb = bit;
                            run.width += 1;
                        }
                        _ => field.runs.push(BitRun { lsb: bit, width: 1 }),
                    },
                    None => fields.push(Field {
                        letter: ch,
                        runs: vec![BitRun { lsb: bit, width: 1 }],
                    }),
                },
                other => return Err(TemplateError::InvalidChar(other)),
            }
        }

        Ok(Codec { mask, match_val, fields })
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn match_val(&self) -> u32 {
        self.match_val
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// 指令字是否匹配所有固定位
    #[inline]
    pub fn matches(&self, word: u32) -> bool {
        word & self.mask == self.match_val
    }

    /// 按模板顺序抽取全部操作数
    pub fn decode(&self, word: u32) -> Operands {
        Operands {
            values: self.fields.iter().map(|f| (f.letter, f.extract(word))).collect(),
        }
    }

    /// 两个编码是否存在同时匹配的指令字
    ///
    /// 在双方都固定的位上 match 值一致即可构造出共同匹配的字。
    pub fn conflicts_with(&self, other: &Codec) -> bool {
        let common_mask = self.mask & other.mask;
        (self.match_val & common_mask) == (other.match_val & common_mask)
    }

    /// 一个同时匹配两者的指令字（仅在 `conflicts_with` 为真时有意义）
    pub fn common_example(&self, other: &Codec) -> u32 {
        self.match_val | other.match_val
    }
}

/// 解码得到的操作数，按模板顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operands {
    values: Vec<(char, u32)>,
}

impl Operands {
    pub fn new(values: Vec<(char, u32)>) -> Self {
        Operands { values }
    }

    /// 按字母取字段值；模板中不存在的字段视为 0
    pub fn get(&self, letter: char) -> u32 {
        self.values
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn rd(&self) -> u8 {
        self.get('d') as u8
    }

    #[inline]
    pub fn rs1(&self) -> u8 {
        self.get('s') as u8
    }

    #[inline]
    pub fn rs2(&self) -> u8 {
        self.get('t') as u8
    }

    #[inline]
    pub fn rs3(&self) -> u8 {
        self.get('r') as u8
    }

    /// 未做符号扩展的原始立即数
    #[inline]
    pub fn imm(&self) -> u32 {
        self.get('i')
    }

    #[inline]
    pub fn shamt(&self) -> u32 {
        self.get('h')
    }

    #[inline]
    pub fn rm(&self) -> u8 {
        self.get('m') as u8
    }

    #[inline]
    pub fn csr(&self) -> u16 {
        self.get('c') as u16
    }
}
