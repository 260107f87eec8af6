//! 环境调用与断点
//!
//! `ecall` 按 a7 中的服务号分派到一小组 RARS 兼容的运行时服务，
//! 参数与返回值使用 a0。

use log::debug;

use crate::cpu::registers::abi::{A0, A7};
use crate::cpu::Hart;
use crate::error::Exception;
use crate::isa::{ExecResult, Operands, Xlen};

/// 支持的运行时服务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    PrintInt,
    PrintString,
    Sbrk,
    Exit,
    PrintChar,
    PrintIntHex,
    ExitWithCode,
}

impl Syscall {
    pub fn from_number(number: u64) -> Option<Self> {
        match number {
            1 => Some(Syscall::PrintInt),
            4 => Some(Syscall::PrintString),
            9 => Some(Syscall::Sbrk),
            10 => Some(Syscall::Exit),
            11 => Some(Syscall::PrintChar),
            34 => Some(Syscall::PrintIntHex),
            93 => Some(Syscall::ExitWithCode),
            _ => None,
        }
    }
}

pub fn ecall(hart: &mut Hart, _ops: &Operands) -> ExecResult {
    let number = hart.x(A7);
    let service = Syscall::from_number(number).ok_or(Exception::UnknownSyscall(number))?;
    debug!("ecall {service:?} at 0x{:08x}", hart.instr_pc());

    match service {
        Syscall::PrintInt => {
            let text = hart.xs(A0).to_string();
            hart.console_write(text.as_bytes());
        }
        Syscall::PrintString => {
            let bytes = read_c_string(hart, hart.x(A0))?;
            hart.console_write(&bytes);
        }
        Syscall::Sbrk => {
            let old = hart.sbrk(hart.xs(A0))?;
            hart.set_x(A0, old);
        }
        Syscall::Exit => return Err(Exception::Exit(0)),
        Syscall::PrintChar => {
            let byte = hart.x(A0) as u8;
            hart.console_write(&[byte]);
        }
        Syscall::PrintIntHex => {
            let value = hart.x(A0);
            let text = match hart.xlen() {
                Xlen::Rv32 => format!("0x{value:08x}"),
                Xlen::Rv64 => format!("0x{value:016x}"),
            };
            hart.console_write(text.as_bytes());
        }
        Syscall::ExitWithCode => return Err(Exception::Exit(hart.xs(A0) as i32)),
    }
    Ok(())
}

pub fn ebreak(_hart: &mut Hart, _ops: &Operands) -> ExecResult {
    Err(Exception::Breakpoint)
}

/// 读取以 NUL 结尾的字符串（不含终止符）
fn read_c_string(hart: &Hart, mut addr: u64) -> Result<Vec<u8>, Exception> {
    let mut bytes = Vec::new();
    loop {
        match hart.memory.load8(addr)? {
            0 => return Ok(bytes),
            b => bytes.push(b),
        }
        addr = hart.xlen().normalize(addr.wrapping_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::exu::test_util::{hart, DATA};
    use crate::error::MemError;

    fn call(hart: &mut Hart, number: u64, a0: u64) -> ExecResult {
        hart.set_x(A7, number);
        hart.set_x(A0, a0);
        ecall(hart, &Operands::default())
    }

    #[test]
    fn test_print_services() {
        let mut hart = hart(Xlen::Rv32);
        call(&mut hart, 1, -42i64 as u64).unwrap();
        call(&mut hart, 11, b'!' as u64).unwrap();
        call(&mut hart, 34, 0xBEEF).unwrap();
        assert_eq!(hart.console(), b"-42!0x0000beef");
    }

    #[test]
    fn test_print_string() {
        let mut hart = hart(Xlen::Rv32);
        hart.memory.load_image(DATA, b"hello\0world").unwrap();
        call(&mut hart, 4, DATA).unwrap();
        assert_eq!(hart.take_console(), b"hello".to_vec());
    }

    #[test]
    fn test_exit_services() {
        let mut hart = hart(Xlen::Rv32);
        assert_eq!(call(&mut hart, 10, 7), Err(Exception::Exit(0)));
        assert_eq!(call(&mut hart, 93, 3), Err(Exception::Exit(3)));
    }

    #[test]
    fn test_sbrk_returns_old_break() {
        let mut hart = hart(Xlen::Rv32);
        let base = hart.heap_break();
        call(&mut hart, 9, 16).unwrap();
        assert_eq!(hart.x(A0), base);
        assert_eq!(hart.heap_break(), base + 16);
        let err = call(&mut hart, 9, -16i64 as u64).unwrap_err();
        assert!(matches!(err, Exception::Memory(MemError::OutOfRange { .. })));
    }

    #[test]
    fn test_unknown_service() {
        let mut hart = hart(Xlen::Rv64);
        assert_eq!(call(&mut hart, 999, 0), Err(Exception::UnknownSyscall(999)));
        assert!(hart.console().is_empty());
    }

    #[test]
    fn test_ebreak() {
        let mut hart = hart(Xlen::Rv32);
        assert_eq!(ebreak(&mut hart, &Operands::default()), Err(Exception::Breakpoint));
    }
}
