//! Cooperative round-robin scheduler.
//!
//! One tick walks the task list in order. The CPU task contributes the
//! cycle cost of the instruction it ran; every later task is fed the total
//! accumulated so far in the tick so the whole machine observes the same
//! passage of time. A fault in any task pauses the clock instead of
//! unwinding the host, and breakpoints pause it with enough state to
//! resume from the same instruction.

use crate::cpu::Cpu;
use crate::diagnostics::DebugConfig;
use crate::errors::CoreError;
use crate::mmu::Mmu;
use crate::ppu::DisplaySink;

/// Cycles per frame at 59.7 Hz: 154 lines of 456 cycles.
pub const FRAME_CYCLES: u32 = 70224;

/// The time-stepped subsystems, in the order they run within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Cpu,
    Timer,
    Display,
    Sound,
}

/// Why the clock stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseReason {
    /// A debug breakpoint matched; resumable.
    Breakpoint { pc: u16, opcode: u8 },
    /// A task faulted; the machine state is intact up to the faulting
    /// instruction but execution cannot continue past it.
    Fault(CoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Paused(PauseReason),
}

pub struct Clock {
    tasks: [Task; 4],
    state: ClockState,
    debug: DebugConfig,
    /// Address to step through once after resuming from a breakpoint, so
    /// the same breakpoint does not re-trigger before any progress.
    resume_pc: Option<u16>,
}

impl Clock {
    pub fn new(debug: DebugConfig) -> Self {
        Self {
            tasks: [Task::Cpu, Task::Timer, Task::Display, Task::Sound],
            state: ClockState::Running,
            debug,
            resume_pc: None,
        }
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, ClockState::Paused(_))
    }

    /// Resume after a breakpoint pause. A fault pause is not resumable; the
    /// clock stays stopped.
    pub fn resume(&mut self) {
        match &self.state {
            ClockState::Paused(PauseReason::Breakpoint { pc, .. }) => {
                self.resume_pc = Some(*pc);
                self.state = ClockState::Running;
            }
            ClockState::Paused(PauseReason::Fault(err)) => {
                log::warn!("cannot resume past fault: {err}");
            }
            ClockState::Running => {}
        }
    }

    /// One round-robin pass over the task list. Returns the cycles the pass
    /// consumed; zero when the clock is (or becomes) paused.
    pub fn tick(&mut self, cpu: &mut Cpu, mmu: &mut Mmu, sink: &mut dyn DisplaySink) -> u32 {
        if self.is_paused() {
            return 0;
        }
        let mut elapsed = 0u32;
        for i in 0..self.tasks.len() {
            match self.tasks[i] {
                Task::Cpu => {
                    let pc = cpu.regs.pc;
                    if self.resume_pc == Some(pc) {
                        self.resume_pc = None;
                    } else if !cpu.halted && !self.debug.breakpoints.is_empty() {
                        // Sniffing the fetch byte costs an extra bus read,
                        // which a mapper with read side effects would see;
                        // only do it when a breakpoint could match.
                        let opcode = mmu.read_byte(pc);
                        if let Some(bp) = self.debug.hit(pc, opcode) {
                            log::debug!("breakpoint {bp:?} hit at {pc:#06X}");
                            self.state = ClockState::Paused(PauseReason::Breakpoint { pc, opcode });
                            return 0;
                        }
                    }
                    match cpu.step(mmu) {
                        Ok(cost) => elapsed += cost,
                        Err(err) => {
                            log::error!("cpu fault: {err}");
                            self.state = ClockState::Paused(PauseReason::Fault(err));
                            return elapsed;
                        }
                    }
                }
                Task::Timer => mmu.timer.step(elapsed, &mut mmu.if_reg),
                Task::Display => mmu.ppu.step(elapsed, &mut mmu.if_reg, sink),
                Task::Sound => mmu.apu.step(elapsed),
            }
        }
        elapsed
    }

    /// Tick until the per-frame cycle budget is met or the clock pauses.
    /// Returns the cycles actually consumed.
    pub fn run_frame(&mut self, cpu: &mut Cpu, mmu: &mut Mmu, sink: &mut dyn DisplaySink) -> u32 {
        let mut total = 0u32;
        while total < FRAME_CYCLES {
            let consumed = self.tick(cpu, mmu, sink);
            if consumed == 0 && self.is_paused() {
                break;
            }
            total += consumed;
        }
        total
    }
}
