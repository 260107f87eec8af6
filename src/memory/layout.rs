//! 内存布局预设
//!
//! 地址取自 RARS 的三种内存配置。堆与栈之间没有固定边界，
//! 这里按固定分界点切开，使每个地址都唯一归属一个段。

use std::fmt;
use std::str::FromStr;

/// 内存配置预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryConfig {
    /// 32 位地址空间，text 从 0x0040_0000 开始
    #[default]
    Default,
    /// 紧凑布局，data 位于地址 0
    CompactDataAtZero,
    /// 紧凑布局，text 位于地址 0
    CompactTextAtZero,
}

impl MemoryConfig {
    pub const ALL: [MemoryConfig; 3] = [
        MemoryConfig::Default,
        MemoryConfig::CompactDataAtZero,
        MemoryConfig::CompactTextAtZero,
    ];
}

impl FromStr for MemoryConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "default" => Ok(MemoryConfig::Default),
            "compact-data-at-zero" | "compactdataatzero" => Ok(MemoryConfig::CompactDataAtZero),
            "compact-text-at-zero" | "compacttextatzero" => Ok(MemoryConfig::CompactTextAtZero),
            other => Err(format!("unknown memory configuration `{other}`")),
        }
    }
}

/// 段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Text,
    Data,
    Heap,
    Stack,
    Kernel,
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentKind::Text => "text",
            SegmentKind::Data => "data",
            SegmentKind::Heap => "heap",
            SegmentKind::Stack => "stack",
            SegmentKind::Kernel => "kernel",
        };
        f.write_str(name)
    }
}

/// 地址区间 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: u64,
    pub end: u64,
}

impl Segment {
    const fn new(kind: SegmentKind, start: u64, end: u64) -> Self {
        Self { kind, start, end }
    }

    #[inline]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    /// `[addr, addr + len)` 是否整体落在本段
    #[inline]
    pub fn contains_range(&self, addr: u64, len: u64) -> bool {
        self.contains(addr) && addr.checked_add(len).is_some_and(|end| end <= self.end)
    }
}

/// 一个预设展开后的布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    pub config: MemoryConfig,
    pub text: Segment,
    pub data: Segment,
    pub heap: Segment,
    pub stack: Segment,
    pub kernel: Segment,
    /// `.data` 段起始地址
    pub data_base: u64,
    /// gp 初值
    pub global_pointer: u64,
    /// sp 初值
    pub stack_pointer: u64,
}

impl MemoryLayout {
    pub fn new(config: MemoryConfig) -> Self {
        use SegmentKind::*;
        match config {
            MemoryConfig::Default => Self {
                config,
                text: Segment::new(Text, 0x0040_0000, 0x1000_0000),
                data: Segment::new(Data, 0x1000_0000, 0x1004_0000),
                heap: Segment::new(Heap, 0x1004_0000, 0x4000_0000),
                stack: Segment::new(Stack, 0x4000_0000, 0x8000_0000),
                kernel: Segment::new(Kernel, 0x8000_0000, 0x1_0000_0000),
                data_base: 0x1001_0000,
                global_pointer: 0x1000_8000,
                stack_pointer: 0x7FFF_EFFC,
            },
            MemoryConfig::CompactDataAtZero => Self {
                config,
                text: Segment::new(Text, 0x3000, 0x4000),
                data: Segment::new(Data, 0x0000, 0x2000),
                heap: Segment::new(Heap, 0x2000, 0x2800),
                stack: Segment::new(Stack, 0x2800, 0x3000),
                kernel: Segment::new(Kernel, 0x4000, 0x8000),
                data_base: 0x0000,
                global_pointer: 0x1800,
                stack_pointer: 0x2FFC,
            },
            MemoryConfig::CompactTextAtZero => Self {
                config,
                text: Segment::new(Text, 0x0000, 0x1000),
                data: Segment::new(Data, 0x1000, 0x3000),
                heap: Segment::new(Heap, 0x3000, 0x3800),
                stack: Segment::new(Stack, 0x3800, 0x4000),
                kernel: Segment::new(Kernel, 0x4000, 0x8000),
                data_base: 0x2000,
                global_pointer: 0x1800,
                stack_pointer: 0x3FFC,
            },
        }
    }

    pub fn segments(&self) -> [Segment; 5] {
        [self.text, self.data, self.heap, self.stack, self.kernel]
    }

    pub fn segment_of(&self, addr: u64) -> Option<Segment> {
        self.segments().into_iter().find(|s| s.contains(addr))
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self::new(MemoryConfig::Default)
    }
}
