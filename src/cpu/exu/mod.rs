//! Execution units split by ISA modules
//!
//! 每个函数都是一条（或一组共用语义的）指令的语义动作，签名为
//! [`crate::isa::Action`]。进入动作时 pc 已指向下一条指令。
pub mod rvi;
pub mod rvm;
pub mod rvf;
pub mod zicsr;
pub mod system;
