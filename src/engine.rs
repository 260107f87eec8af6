//! 仿真引擎
//!
//! [`Simulator`] 是一次仿真会话：持有指令表、hart 架构状态、程序映像与
//! 冻结的配置，驱动取指、解码、执行循环。
//!
//! 状态机：
//!
//! ```text
//! Ready --run/step--> Running --> Paused(MaxSteps | Breakpoint | Stopped)  (可继续 run)
//!                             --> Terminated(NormalTermination | CliffTermination)
//!                             --> Faulted(fault)                           (直到 reset)
//! ```
//!
//! 每条指令执行前依次检查：取消标志、步数上限、断点。断点命中时不执行该指令，
//! 下一次调用从该地址继续。text 段的解码结果缓存在按地址索引的表中，
//! 自修改代码写入 text 后对应条目失效，下次取指时重新解码。
//!
//! # 示例
//!
//! ```
//! use rars_sim::engine::{Simulator, StopReason};
//! use rars_sim::sim_env::{Program, SimConfig};
//!
//! // addi a7, x0, 10; ecall
//! let program = Program::from_words(0x0040_0000, &[0x00A0_0893, 0x0000_0073]);
//! let mut sim = Simulator::new(SimConfig::new(), program).expect("session");
//! assert_eq!(sim.run(), Ok(StopReason::NormalTermination(0)));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, trace, warn};

use crate::cpu::registers::abi::{GP, SP};
use crate::cpu::{Hart, HartBuilder};
use crate::error::{Exception, Fault, FaultKind, MemError, SimError};
use crate::isa::{DecodedInstr, InstrTable};
use crate::memory::{AccessSize, MemoryLayout, SegmentKind};
use crate::sim_env::{Program, SimConfig};

/// 一次 `run`/`step` 调用停止的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 达到步数上限，pc 指向下一条未执行的指令
    MaxSteps,
    /// pc 命中断点或执行了 `ebreak`
    Breakpoint,
    /// 程序通过退出系统调用结束
    NormalTermination(i32),
    /// 执行越过了最后一条程序指令
    CliffTermination,
    /// 外部设置了取消标志
    Stopped,
}

impl StopReason {
    /// 会话是否还能继续运行
    pub fn is_resumable(self) -> bool {
        matches!(self, StopReason::MaxSteps | StopReason::Breakpoint | StopReason::Stopped)
    }
}

/// 会话状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Running,
    Paused(StopReason),
    Terminated(StopReason),
    Faulted(Fault),
}

/// 单条指令的执行结果
enum Outcome {
    Continue,
    Stop(StopReason),
}

/// 仿真会话
pub struct Simulator {
    table: InstrTable,
    config: SimConfig,
    program: Program,
    hart: Hart,
    /// text 段地址 -> 解码结果
    cache: HashMap<u64, DecodedInstr>,
    breakpoints: BTreeSet<u64>,
    /// 上次在此地址因断点停下，下次调用跳过该断点一次
    resume_from: Option<u64>,
    state: EngineState,
    stop: Arc<AtomicBool>,
    steps: u64,
    text_end: u64,
    started_at_main: bool,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("hart", &self.hart)
            .field("state", &self.state)
            .field("steps", &self.steps)
            .finish()
    }
}

impl Simulator {
    /// 组装指令表、构建 hart 并装载程序
    ///
    /// 指令表冲突、ELF 位宽与配置不符或程序超出内存布局时返回错误，会话不会开始。
    pub fn new(config: SimConfig, program: Program) -> Result<Self, SimError> {
        if let Some(class) = program.class.filter(|&class| class != config.xlen) {
            return Err(SimError::Config(format!(
                "ELF{} program cannot run on an RV{} hart",
                class.bits(),
                config.xlen.bits()
            )));
        }
        let table = config.extensions.isa_config().build()?;

        let mut builder = HartBuilder::new(MemoryLayout::new(config.memory_config))
            .xlen(config.xlen)
            .self_modifying_code(config.self_modifying_code);
        if config.extensions.d {
            builder = builder.with_d_extension();
        } else if config.extensions.f {
            builder = builder.with_f_extension();
        }
        let hart = builder.build();

        let mut sim = Simulator {
            table,
            breakpoints: config.breakpoints.clone(),
            config,
            program,
            hart,
            cache: HashMap::new(),
            resume_from: None,
            state: EngineState::Ready,
            stop: Arc::new(AtomicBool::new(false)),
            steps: 0,
            text_end: 0,
            started_at_main: false,
        };
        sim.reset()?;
        Ok(sim)
    }

    /// 恢复到 Ready：清空寄存器与内存，重新装载程序并设置 pc、sp、gp
    ///
    /// 运行中添加的断点保留。
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.hart.reset();
        self.program.load_into(self.hart.memory_mut())?;
        self.hart.memory_mut().take_text_writes();
        self.cache.clear();
        self.resume_from = None;
        self.steps = 0;
        self.stop.store(false, Ordering::Relaxed);

        let layout = *self.hart.memory().layout();
        self.hart.set_x(SP, layout.stack_pointer);
        self.hart.set_x(GP, layout.global_pointer);

        let main = self.program.main.filter(|_| self.config.start_at_main);
        self.started_at_main = main.is_some();
        let start = main.or(self.program.entry).unwrap_or(layout.text.start);
        self.hart.set_pc(start);
        self.text_end = self.program.text_end().unwrap_or(layout.text.start);

        self.state = EngineState::Ready;
        debug!(
            "session reset: pc 0x{start:08x}, text end 0x{:08x}, {} statements",
            self.text_end,
            self.program.statements.len()
        );
        Ok(())
    }

    /// 运行直到停止条件；步数上限按每次调用计
    pub fn run(&mut self) -> Result<StopReason, Fault> {
        self.execute(self.config.step_budget())
    }

    /// 执行一条指令
    ///
    /// 正常执行后返回 `MaxSteps`；pc 正处于断点时先返回 `Breakpoint`，
    /// 再次调用才执行该指令。
    pub fn step(&mut self) -> Result<StopReason, Fault> {
        self.execute(Some(1))
    }

    fn execute(&mut self, budget: Option<u64>) -> Result<StopReason, Fault> {
        match &self.state {
            EngineState::Faulted(fault) => return Err(fault.clone()),
            EngineState::Terminated(reason) => return Ok(*reason),
            _ => {}
        }
        self.state = EngineState::Running;

        let mut executed = 0u64;
        loop {
            if self.stop.swap(false, Ordering::Relaxed) {
                return Ok(self.pause(StopReason::Stopped));
            }
            if budget.is_some_and(|max| executed >= max) {
                return Ok(self.pause(StopReason::MaxSteps));
            }

            let pc = self.hart.pc();
            let resuming = self.resume_from.take() == Some(pc);
            if !resuming && self.breakpoints.contains(&pc) {
                self.resume_from = Some(pc);
                info!("breakpoint at 0x{pc:08x}");
                return Ok(self.pause(StopReason::Breakpoint));
            }

            match self.execute_one(pc) {
                Ok(Outcome::Continue) => executed += 1,
                Ok(Outcome::Stop(reason)) => return Ok(self.finish(reason)),
                Err(fault) => {
                    warn!("{fault}");
                    self.state = EngineState::Faulted(fault.clone());
                    return Err(fault);
                }
            }
        }
    }

    fn pause(&mut self, reason: StopReason) -> StopReason {
        self.state = EngineState::Paused(reason);
        reason
    }

    fn finish(&mut self, reason: StopReason) -> StopReason {
        match reason {
            StopReason::NormalTermination(code) => info!("program exited with code {code}"),
            StopReason::CliffTermination => info!("execution fell off the end of the program at 0x{:08x}", self.hart.pc()),
            StopReason::Breakpoint => info!("ebreak at 0x{:08x}", self.hart.instr_pc()),
            _ => {}
        }
        if reason.is_resumable() {
            self.pause(reason)
        } else {
            self.state = EngineState::Terminated(reason);
            reason
        }
    }

    fn execute_one(&mut self, pc: u64) -> Result<Outcome, Fault> {
        let decoded = match self.fetch(pc) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => return Ok(Outcome::Stop(StopReason::CliffTermination)),
            Err(exception) => {
                let word = self.hart.memory().raw_word(pc);
                return Err(self.fault(&exception, pc, word, None));
            }
        };

        let Some(descriptor) = self.table.descriptor(decoded.index) else {
            return Err(self.fault(&Exception::IllegalInstruction, pc, Some(decoded.word), None));
        };
        let mnemonic = descriptor.mnemonic();
        let action = descriptor.action();
        trace!("0x{pc:08x}: {mnemonic} (0x{:08x})", decoded.word);

        self.hart.begin_instruction(pc);
        let result = action(&mut self.hart, &decoded.operands);

        match result {
            Ok(()) => {
                self.retire();
                Ok(Outcome::Continue)
            }
            Err(Exception::Exit(code)) => {
                self.retire();
                Ok(Outcome::Stop(StopReason::NormalTermination(code)))
            }
            Err(Exception::Breakpoint) => {
                self.retire();
                Ok(Outcome::Stop(StopReason::Breakpoint))
            }
            Err(exception) => {
                self.hart.abort_instruction();
                Err(self.fault(&exception, pc, Some(decoded.word), Some(mnemonic)))
            }
        }
    }

    fn retire(&mut self) {
        self.hart.retire();
        self.steps += 1;
    }

    /// 取指并解码；返回 None 表示越过了程序末尾
    ///
    /// 先丢弃被改写过的 text 字的缓存，包括两次调用之间由宿主写入的。
    fn fetch(&mut self, pc: u64) -> Result<Option<DecodedInstr>, Exception> {
        self.invalidate_text_writes();
        if !pc.is_multiple_of(4) {
            return Err(MemError::Unaligned { addr: pc, access: AccessSize::Word }.into());
        }
        let memory = self.hart.memory();
        let in_text = match memory.segment_of(pc).map(|s| s.kind) {
            Some(SegmentKind::Text) => true,
            Some(SegmentKind::Data | SegmentKind::Heap | SegmentKind::Stack) if memory.self_modifying_code() => false,
            _ => return Err(MemError::OutOfRange { addr: pc, access: AccessSize::Word }.into()),
        };

        if let Some(decoded) = self.cache.get(&pc) {
            return Ok(Some(decoded.clone()));
        }

        let Some(word) = memory.raw_word(pc) else {
            if pc == self.text_end {
                return Ok(None);
            }
            return Err(Exception::IllegalInstruction);
        };

        let decoded = self.table.decode(word, pc, self.hart.xlen())?;
        if in_text {
            self.cache.insert(pc, decoded.clone());
        }
        Ok(Some(decoded))
    }

    /// 让被自修改代码改写过的 text 字重新解码
    fn invalidate_text_writes(&mut self) {
        for addr in self.hart.memory_mut().take_text_writes() {
            if self.cache.remove(&addr).is_some() {
                debug!("text word 0x{addr:08x} rewritten, dropping cached decode");
            }
        }
    }

    fn fault(&self, exception: &Exception, pc: u64, word: Option<u32>, mnemonic: Option<&'static str>) -> Fault {
        Fault::from_exception(exception, pc, word, mnemonic).unwrap_or(Fault {
            kind: FaultKind::IllegalInstruction,
            address: None,
            pc,
            word,
            mnemonic,
        })
    }

    // ========== 调用方接口 ==========

    /// 取消标志；置位后当前运行在下一条指令边界返回 `Stopped`
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn add_breakpoint(&mut self, addr: u64) {
        self.breakpoints.insert(addr);
    }

    pub fn remove_breakpoint(&mut self, addr: u64) -> bool {
        self.breakpoints.remove(&addr)
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u64> + '_ {
        self.breakpoints.iter().copied()
    }

    /// 自上次复位以来执行完成的指令数
    pub fn steps_executed(&self) -> u64 {
        self.steps
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 是否从 `main` 符号处开始执行
    pub fn started_at_main(&self) -> bool {
        self.started_at_main
    }

    pub fn table(&self) -> &InstrTable {
        &self.table
    }

    pub fn hart(&self) -> &Hart {
        &self.hart
    }

    /// 可变访问架构状态，只应在两次运行之间使用
    pub fn hart_mut(&mut self) -> &mut Hart {
        &mut self.hart
    }
}
