//! CSR definitions for each supported extension.
//!
//! Each group provides a static array of CsrEntry for registration.
//!
//! 设计原则：
//! - 每个 CSR 先定义地址常量 `CSR_XXX`
//! - CsrEntry 使用这些常量，避免重复硬编码地址
//! - 常量用于代码中快速引用（如浮点环境、计数器的别名访问）
//! - CsrEntry 用于 CSR 注册和按名称查找

use super::registers::CsrEntry;

// ============================================================================
// User Trap Setup / Handling CSR Addresses
// ============================================================================

pub const CSR_USTATUS: u16 = 0x000;
pub const CSR_UIE: u16 = 0x004;
pub const CSR_UTVEC: u16 = 0x005;
pub const CSR_USCRATCH: u16 = 0x040;
pub const CSR_UEPC: u16 = 0x041;
pub const CSR_UCAUSE: u16 = 0x042;
pub const CSR_UTVAL: u16 = 0x043;
pub const CSR_UIP: u16 = 0x044;

/// User-level trap CSRs. Stored only; no trap delivery uses them.
pub const USER_CSRS: &[CsrEntry] = &[
    CsrEntry::rw("ustatus", CSR_USTATUS),
    CsrEntry::rw("uie", CSR_UIE),
    CsrEntry::rw("utvec", CSR_UTVEC),
    CsrEntry::rw("uscratch", CSR_USCRATCH),
    CsrEntry::rw("uepc", CSR_UEPC),
    CsrEntry::rw("ucause", CSR_UCAUSE),
    CsrEntry::rw("utval", CSR_UTVAL),
    CsrEntry::rw("uip", CSR_UIP),
];

// ============================================================================
// Base Unprivileged CSR Addresses
// ============================================================================

pub const CSR_CYCLE: u16 = 0xC00;
pub const CSR_TIME: u16 = 0xC01;
pub const CSR_INSTRET: u16 = 0xC02;
pub const CSR_CYCLEH: u16 = 0xC80;
pub const CSR_TIMEH: u16 = 0xC81;
pub const CSR_INSTRETH: u16 = 0xC82;

/// Unprivileged counter/timer CSRs. Values are computed on read.
pub const COUNTER_CSRS: &[CsrEntry] = &[
    CsrEntry::ro("cycle", CSR_CYCLE),
    CsrEntry::ro("time", CSR_TIME),
    CsrEntry::ro("instret", CSR_INSTRET),
    CsrEntry::ro("cycleh", CSR_CYCLEH).rv32_only(),
    CsrEntry::ro("timeh", CSR_TIMEH).rv32_only(),
    CsrEntry::ro("instreth", CSR_INSTRETH).rv32_only(),
];

// ============================================================================
// F/D Extension CSR Addresses (Floating-point)
// ============================================================================

pub const CSR_FFLAGS: u16 = 0x001;
pub const CSR_FRM: u16 = 0x002;
pub const CSR_FCSR: u16 = 0x003;

/// Floating-point CSRs for F/D extensions. Views of the floating-point environment.
pub const F_CSRS: &[CsrEntry] = &[
    CsrEntry::rw("fflags", CSR_FFLAGS),
    CsrEntry::rw("frm", CSR_FRM),
    CsrEntry::rw("fcsr", CSR_FCSR),
];
