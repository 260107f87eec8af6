//! 内存抽象层
//!
//! 按段组织的稀疏小端内存：
//! - 地址空间按 [`MemoryLayout`] 划分为 text/data/heap/stack/kernel 段，段外访问越界
//! - 存储以 4 KiB 块为单位按需分配，未写过的字节读出为 0
//! - 每个字记录"是否写过"，供原始探测接口区分"写过 0"与"从未写过"
//! - 未开启自修改代码时 text 段只读；开启后对 text 的写入会登记，供引擎失效解码缓存

use std::collections::HashMap;
use std::fmt;

use bitvec::array::BitArray;
use bitvec::BitArr;
use bitvec::order::Lsb0;
use log::trace;

use crate::error::MemError;

pub mod layout;

pub use layout::{MemoryConfig, MemoryLayout, Segment, SegmentKind};

/// 访存粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Half,
    Word,
    Double,
}

impl AccessSize {
    pub fn bytes(self) -> u64 {
        match self {
            AccessSize::Byte => 1,
            AccessSize::Half => 2,
            AccessSize::Word => 4,
            AccessSize::Double => 8,
        }
    }
}

impl fmt::Display for AccessSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessSize::Byte => "byte",
            AccessSize::Half => "halfword",
            AccessSize::Word => "word",
            AccessSize::Double => "doubleword",
        };
        f.write_str(name)
    }
}

pub type MemResult<T> = Result<T, MemError>;

pub const BLOCK_SIZE: u64 = 4096;
const WORDS_PER_BLOCK: usize = (BLOCK_SIZE / 4) as usize;

/// 一个 4 KiB 存储块
struct Block {
    bytes: Box<[u8; BLOCK_SIZE as usize]>,
    written: BitArr!(for WORDS_PER_BLOCK, in u64, Lsb0),
}

impl Block {
    fn new() -> Self {
        Self {
            bytes: Box::new([0; BLOCK_SIZE as usize]),
            written: BitArray::ZERO,
        }
    }
}

/// 段式稀疏内存
pub struct Memory {
    layout: MemoryLayout,
    self_modifying_code: bool,
    blocks: HashMap<u64, Block>,
    /// 自上次取走以来被写入的 text 字地址
    text_writes: Vec<u64>,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("config", &self.layout.config)
            .field("self_modifying_code", &self.self_modifying_code)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

impl Memory {
    /// 创建空内存
    ///
    /// ```
    /// use rars_sim::memory::{Memory, MemoryConfig, MemoryLayout};
    ///
    /// let mut mem = Memory::new(MemoryLayout::new(MemoryConfig::Default), false);
    /// mem.store32(0x1001_0000, 0xDEAD_BEEF).unwrap();
    /// assert_eq!(mem.load8(0x1001_0000).unwrap(), 0xEF);
    /// ```
    pub fn new(layout: MemoryLayout, self_modifying_code: bool) -> Self {
        Self {
            layout,
            self_modifying_code,
            blocks: HashMap::new(),
            text_writes: Vec::new(),
        }
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    pub fn self_modifying_code(&self) -> bool {
        self.self_modifying_code
    }

    /// 清空所有内容
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.text_writes.clear();
    }

    pub fn segment_of(&self, addr: u64) -> Option<Segment> {
        self.layout.segment_of(addr)
    }

    fn ensure_aligned(addr: u64, access: AccessSize) -> MemResult<()> {
        if addr.is_multiple_of(access.bytes()) {
            Ok(())
        } else {
            Err(MemError::Unaligned { addr, access })
        }
    }

    /// 对齐检查在先，越界检查在后
    fn check(&self, addr: u64, access: AccessSize) -> MemResult<Segment> {
        Self::ensure_aligned(addr, access)?;
        self.layout
            .segment_of(addr)
            .filter(|s| s.contains_range(addr, access.bytes()))
            .ok_or(MemError::OutOfRange { addr, access })
    }

    /// 检查一次写入是否会成功，不修改内存
    pub fn check_store(&self, addr: u64, access: AccessSize) -> MemResult<()> {
        let segment = self.check(addr, access)?;
        if segment.kind == SegmentKind::Text && !self.self_modifying_code {
            return Err(MemError::WriteProtected { addr, access });
        }
        Ok(())
    }

    fn read_raw(&self, addr: u64, len: u64) -> u64 {
        let offset = (addr % BLOCK_SIZE) as usize;
        match self.blocks.get(&(addr / BLOCK_SIZE)) {
            Some(block) => block.bytes[offset..offset + len as usize]
                .iter()
                .rev()
                .fold(0u64, |acc, b| (acc << 8) | *b as u64),
            None => 0,
        }
    }

    /// 写入不跨块的一段字节，并标记所在字为已写
    fn write_raw(&mut self, addr: u64, bytes: &[u8]) {
        let offset = (addr % BLOCK_SIZE) as usize;
        let block = self.blocks.entry(addr / BLOCK_SIZE).or_insert_with(Block::new);
        block.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
        let first_word = offset / 4;
        let last_word = (offset + bytes.len() - 1) / 4;
        for word in first_word..=last_word {
            block.written.set(word, true);
        }
    }

    fn load(&self, addr: u64, access: AccessSize) -> MemResult<u64> {
        self.check(addr, access)?;
        Ok(self.read_raw(addr, access.bytes()))
    }

    fn store(&mut self, addr: u64, value: u64, access: AccessSize) -> MemResult<()> {
        self.check_store(addr, access)?;
        let bytes = value.to_le_bytes();
        self.write_raw(addr, &bytes[..access.bytes() as usize]);
        if self.layout.text.contains(addr) {
            trace!("self-modifying write at 0x{addr:08x}");
            self.text_writes.push(addr & !3);
        }
        Ok(())
    }

    pub fn load8(&self, addr: u64) -> MemResult<u8> {
        self.load(addr, AccessSize::Byte).map(|v| v as u8)
    }

    pub fn load16(&self, addr: u64) -> MemResult<u16> {
        self.load(addr, AccessSize::Half).map(|v| v as u16)
    }

    pub fn load32(&self, addr: u64) -> MemResult<u32> {
        self.load(addr, AccessSize::Word).map(|v| v as u32)
    }

    /// 由两次字访问组成：低字在 `addr`，高字在 `addr + 4`
    pub fn load64(&self, addr: u64) -> MemResult<u64> {
        Self::ensure_aligned(addr, AccessSize::Double)?;
        let low = self.load32(addr)?;
        let high = self.load32(addr.wrapping_add(4))?;
        Ok(((high as u64) << 32) | low as u64)
    }

    pub fn store8(&mut self, addr: u64, value: u8) -> MemResult<()> {
        self.store(addr, value as u64, AccessSize::Byte)
    }

    pub fn store16(&mut self, addr: u64, value: u16) -> MemResult<()> {
        self.store(addr, value as u64, AccessSize::Half)
    }

    pub fn store32(&mut self, addr: u64, value: u32) -> MemResult<()> {
        self.store(addr, value as u64, AccessSize::Word)
    }

    /// 高低两个字都检查通过后才写入
    pub fn store64(&mut self, addr: u64, value: u64) -> MemResult<()> {
        Self::ensure_aligned(addr, AccessSize::Double)?;
        self.check_store(addr, AccessSize::Word)?;
        self.check_store(addr.wrapping_add(4), AccessSize::Word)?;
        self.store32(addr, value as u32)?;
        self.store32(addr.wrapping_add(4), (value >> 32) as u32)
    }

    /// 原始探测：返回写过的字，对未写过、未对齐或段外的地址返回 None
    pub fn raw_word(&self, addr: u64) -> Option<u32> {
        if !addr.is_multiple_of(4) || self.layout.segment_of(addr).is_none() {
            return None;
        }
        let block = self.blocks.get(&(addr / BLOCK_SIZE))?;
        let word = ((addr % BLOCK_SIZE) / 4) as usize;
        if block.written[word] {
            Some(self.read_raw(addr, 4) as u32)
        } else {
            None
        }
    }

    /// 批量装载（程序加载用），绕过 text 写保护；写到 text 的字照常登记
    pub fn load_image(&mut self, addr: u64, data: &[u8]) -> MemResult<()> {
        let mut cursor = addr;
        let mut rest = data;
        while !rest.is_empty() {
            let segment = self
                .layout
                .segment_of(cursor)
                .ok_or(MemError::OutOfRange { addr: cursor, access: AccessSize::Byte })?;
            let block_left = BLOCK_SIZE - cursor % BLOCK_SIZE;
            let chunk = (rest.len() as u64).min(block_left).min(segment.end - cursor) as usize;
            self.write_raw(cursor, &rest[..chunk]);
            if segment.kind == SegmentKind::Text {
                self.text_writes.extend((cursor & !3..cursor + chunk as u64).step_by(4));
            }
            cursor += chunk as u64;
            rest = &rest[chunk..];
        }
        Ok(())
    }

    /// 逐字节读取一段内存（用于转储）
    pub fn read_bytes(&self, addr: u64, len: u64) -> MemResult<Vec<u8>> {
        (0..len).map(|i| self.load8(addr.wrapping_add(i))).collect()
    }

    /// 取走自上次调用以来的 text 写入地址
    pub fn take_text_writes(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.text_writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: u64 = 0x1001_0000;
    const TEXT: u64 = 0x0040_0000;

    const WIDTHS: [AccessSize; 4] = [AccessSize::Byte, AccessSize::Half, AccessSize::Word, AccessSize::Double];

    fn memory(smc: bool) -> Memory {
        Memory::new(MemoryLayout::new(MemoryConfig::Default), smc)
    }

    fn store(mem: &mut Memory, addr: u64, access: AccessSize, value: u64) -> MemResult<()> {
        match access {
            AccessSize::Byte => mem.store8(addr, value as u8),
            AccessSize::Half => mem.store16(addr, value as u16),
            AccessSize::Word => mem.store32(addr, value as u32),
            AccessSize::Double => mem.store64(addr, value),
        }
    }

    fn load(mem: &Memory, addr: u64, access: AccessSize) -> MemResult<u64> {
        match access {
            AccessSize::Byte => mem.load8(addr).map(u64::from),
            AccessSize::Half => mem.load16(addr).map(u64::from),
            AccessSize::Word => mem.load32(addr).map(u64::from),
            AccessSize::Double => mem.load64(addr),
        }
    }

    /// 截断到访问宽度
    fn truncate(value: u64, access: AccessSize) -> u64 {
        match access {
            AccessSize::Double => value,
            _ => value & ((1u64 << (access.bytes() * 8)) - 1),
        }
    }

    #[test]
    fn test_every_width_in_every_segment() {
        const VALUE: u64 = 0x8877_6655_4433_2211;
        for config in MemoryConfig::ALL {
            let layout = MemoryLayout::new(config);
            let mut mem = Memory::new(layout, true);
            for segment in layout.segments() {
                for access in WIDTHS {
                    for addr in [segment.start, segment.end - access.bytes()] {
                        let what = format!("{config:?} {} {access:?} at 0x{addr:x}", segment.kind);
                        store(&mut mem, addr, access, VALUE).unwrap_or_else(|e| panic!("{what}: {e}"));
                        assert_eq!(load(&mem, addr, access), Ok(truncate(VALUE, access)), "{what}");
                        assert!(mem.raw_word(addr & !3).is_some(), "{what}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_every_misalignment_is_rejected() {
        for config in MemoryConfig::ALL {
            let layout = MemoryLayout::new(config);
            let mut mem = Memory::new(layout, true);
            for segment in layout.segments() {
                for access in WIDTHS.into_iter().filter(|a| a.bytes() > 1) {
                    for offset in 1..access.bytes() {
                        let addr = segment.start + offset;
                        let expected: MemResult<u64> = Err(MemError::Unaligned { addr, access });
                        assert_eq!(load(&mem, addr, access), expected, "{config:?} load {access:?} at 0x{addr:x}");
                        assert_eq!(
                            store(&mut mem, addr, access, u64::MAX).map(|_| 0),
                            expected,
                            "{config:?} store {access:?} at 0x{addr:x}"
                        );
                    }
                }
                assert_eq!(mem.raw_word(segment.start), None, "{config:?} {}", segment.kind);
            }
        }
    }

    #[test]
    fn test_doubleword_needs_eight_byte_alignment() {
        for config in MemoryConfig::ALL {
            let layout = MemoryLayout::new(config);
            let mut mem = Memory::new(layout, false);
            let addr = layout.data.start + 4;
            mem.store32(addr, 1).unwrap();
            mem.store32(addr + 4, 2).unwrap();
            assert_eq!(mem.load64(addr), Err(MemError::Unaligned { addr, access: AccessSize::Double }));
            assert_eq!(mem.store64(addr, 0), Err(MemError::Unaligned { addr, access: AccessSize::Double }));
            assert_eq!(mem.load32(addr).unwrap(), 1);
            assert_eq!(mem.load64(addr - 4).unwrap(), 1 << 32);
        }
    }

    #[test]
    fn test_doubleword_at_segment_ends_leaves_memory_unchanged() {
        for config in MemoryConfig::ALL {
            let layout = MemoryLayout::new(config);
            let mut mem = Memory::new(layout, false);
            for segment in layout.segments() {
                let last = segment.end - 4;
                let next = layout.segment_of(segment.end);
                // 跨出段尾的双字要么未对齐，要么高字落在段外或受写保护的 text 中
                assert!(store(&mut mem, last, AccessSize::Double, u64::MAX).is_err());
                assert_eq!(mem.raw_word(last), None, "{config:?} {} at 0x{last:x}", segment.kind);
                if next.is_none() {
                    assert_eq!(
                        mem.store64(segment.end, 0),
                        Err(MemError::OutOfRange { addr: segment.end, access: AccessSize::Word })
                    );
                    assert_eq!(
                        mem.load64(segment.end),
                        Err(MemError::OutOfRange { addr: segment.end, access: AccessSize::Word })
                    );
                }
            }
        }
    }

    #[test]
    fn test_raw_word_written_zero_versus_untouched() {
        for config in MemoryConfig::ALL {
            let layout = MemoryLayout::new(config);
            let mut mem = Memory::new(layout, true);
            for segment in layout.segments() {
                let addr = segment.start;
                assert_eq!(mem.raw_word(addr), None);
                assert_eq!(mem.load32(addr).unwrap(), 0);
                mem.store8(addr + 3, 0).unwrap();
                assert_eq!(mem.raw_word(addr), Some(0), "{config:?} {}", segment.kind);
                assert_eq!(mem.raw_word(addr + 4), None);
            }
        }
    }

    #[test]
    fn test_little_endian() {
        let mut mem = memory(false);
        mem.store32(DATA, 0x1234_5678).unwrap();
        assert_eq!(mem.load8(DATA).unwrap(), 0x78);
        assert_eq!(mem.load8(DATA + 3).unwrap(), 0x12);
        assert_eq!(mem.load16(DATA + 2).unwrap(), 0x1234);
        assert_eq!(mem.load32(DATA).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_never_written_reads_zero() {
        let mem = memory(false);
        assert_eq!(mem.load32(DATA + 0x100).unwrap(), 0);
    }

    #[test]
    fn test_misaligned_accesses() {
        let mut mem = memory(false);
        assert!(matches!(mem.load16(DATA + 1), Err(MemError::Unaligned { access: AccessSize::Half, .. })));
        assert!(matches!(mem.load32(DATA + 2), Err(MemError::Unaligned { .. })));
        assert!(matches!(mem.store32(DATA + 1, 0), Err(MemError::Unaligned { .. })));
        assert!(matches!(mem.load64(DATA + 4), Err(MemError::Unaligned { access: AccessSize::Double, .. })));
        // 段外且未对齐：对齐错误优先
        assert!(matches!(mem.load32(0x1), Err(MemError::Unaligned { .. })));
    }

    #[test]
    fn test_out_of_range() {
        let mut mem = memory(false);
        assert_eq!(mem.load32(0x1000), Err(MemError::OutOfRange { addr: 0x1000, access: AccessSize::Word }));
        assert!(matches!(mem.store8(0x0, 1), Err(MemError::OutOfRange { .. })));
    }

    #[test]
    fn test_text_write_protection() {
        let mut mem = memory(false);
        mem.load_image(TEXT, &0x0000_0013u32.to_le_bytes()).unwrap();
        assert_eq!(mem.take_text_writes(), vec![TEXT]);
        assert_eq!(
            mem.store32(TEXT, 0xFFFF_FFFF),
            Err(MemError::WriteProtected { addr: TEXT, access: AccessSize::Word })
        );
        assert_eq!(mem.load32(TEXT).unwrap(), 0x0000_0013);
        assert!(mem.take_text_writes().is_empty());
    }

    #[test]
    fn test_self_modifying_code_logs_text_writes() {
        let mut mem = memory(true);
        mem.store16(TEXT + 6, 0xABCD).unwrap();
        mem.store32(DATA, 1).unwrap();
        assert_eq!(mem.take_text_writes(), vec![TEXT + 4]);
        assert!(mem.take_text_writes().is_empty());
    }

    #[test]
    fn test_raw_word_tracks_written_words() {
        let mut mem = memory(false);
        mem.store32(DATA, 0).unwrap();
        assert_eq!(mem.raw_word(DATA), Some(0));
        assert_eq!(mem.raw_word(DATA + 4), None);
        assert_eq!(mem.raw_word(DATA + 2), None);
        mem.store8(DATA + 9, 0xAA).unwrap();
        assert_eq!(mem.raw_word(DATA + 8), Some(0x0000_AA00));
        assert_eq!(mem.raw_word(0x1000), None);
    }

    #[test]
    fn test_doubleword() {
        let mut mem = memory(false);
        mem.store64(DATA + 8, 0x1122_3344_5566_7788).unwrap();
        assert_eq!(mem.load32(DATA + 8).unwrap(), 0x5566_7788);
        assert_eq!(mem.load32(DATA + 12).unwrap(), 0x1122_3344);
        assert_eq!(mem.load64(DATA + 8).unwrap(), 0x1122_3344_5566_7788);
    }

    #[test]
    fn test_doubleword_store_checks_before_writing() {
        let mut mem = memory(false);
        assert!(matches!(mem.store64(TEXT, u64::MAX), Err(MemError::WriteProtected { .. })));
        assert_eq!(mem.raw_word(TEXT), None);
        // 地址空间最高的双字
        mem.store64(0xFFFF_FFF8, 1).unwrap();
        assert_eq!(mem.load64(0xFFFF_FFF8).unwrap(), 1);
    }

    #[test]
    fn test_load_image_spans_blocks() {
        let mut mem = memory(false);
        let data: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
        mem.load_image(DATA + 4090, &data).unwrap();
        assert_eq!(mem.read_bytes(DATA + 4090, 5000).unwrap(), data);
        assert!(mem.load_image(0x1000, &[1]).is_err());
    }

    #[test]
    fn test_reset_clears_contents() {
        let mut mem = memory(false);
        mem.store32(DATA, 5).unwrap();
        mem.reset();
        assert_eq!(mem.load32(DATA).unwrap(), 0);
        assert_eq!(mem.raw_word(DATA), None);
    }
}
