//! Floating-point environment: dynamic rounding mode and accrued exception flags.
//!
//! `fflags`, `frm` and `fcsr` are views of this state.

use simple_soft_float::{FPState, RoundingMode, StatusFlags};

use crate::error::Exception;

/// 浮点异常标志位
pub mod fflags {
    pub const NX: u8 = 1 << 0; // 不精确
    pub const UF: u8 = 1 << 1; // 下溢
    pub const OF: u8 = 1 << 2; // 上溢
    pub const DZ: u8 = 1 << 3; // 除以零
    pub const NV: u8 = 1 << 4; // 无效操作

    pub const MASK: u8 = 0x1F;
}

/// 指令 rm 字段取该值时使用 frm
pub const RM_DYNAMIC: u8 = 0b111;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FpEnv {
    frm: u8,
    flags: u8,
}

impl FpEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn frm(&self) -> u8 {
        self.frm
    }

    pub fn set_frm(&mut self, frm: u8) {
        self.frm = frm & 0b111;
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags & fflags::MASK;
    }

    /// Sticky: flags are only ever OR-ed in.
    #[inline]
    pub fn raise(&mut self, flags: u8) {
        self.flags |= flags & fflags::MASK;
    }

    pub fn fcsr(&self) -> u8 {
        (self.frm << 5) | self.flags
    }

    pub fn set_fcsr(&mut self, value: u8) {
        self.set_frm(value >> 5);
        self.set_flags(value);
    }

    /// Resolve an instruction's rm field. Reserved encodings, in the instruction
    /// or in frm when rm is dynamic, are illegal instructions.
    #[inline]
    pub fn rounding_mode(&self, rm: u8) -> Result<RoundingMode, Exception> {
        let rm = if rm == RM_DYNAMIC { self.frm } else { rm };
        match rm {
            0b000 => Ok(RoundingMode::TiesToEven),
            0b001 => Ok(RoundingMode::TowardZero),
            0b010 => Ok(RoundingMode::TowardNegative),
            0b011 => Ok(RoundingMode::TowardPositive),
            0b100 => Ok(RoundingMode::TiesToAway),
            _ => Err(Exception::IllegalInstruction),
        }
    }

    /// Accrue the status flags raised by one soft-float operation.
    #[inline]
    pub fn accrue(&mut self, fp_state: &FPState) {
        let flags = fp_state.status_flags;
        let mut bits = 0;
        if flags.contains(StatusFlags::INVALID_OPERATION) {
            bits |= fflags::NV;
        }
        if flags.contains(StatusFlags::DIVISION_BY_ZERO) {
            bits |= fflags::DZ;
        }
        if flags.contains(StatusFlags::OVERFLOW) {
            bits |= fflags::OF;
        }
        if flags.contains(StatusFlags::UNDERFLOW) {
            bits |= fflags::UF;
        }
        if flags.contains(StatusFlags::INEXACT) {
            bits |= fflags::NX;
        }
        self.raise(bits);
    }
}
