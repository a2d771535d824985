//! Host side of a formula node.
//!
//! The [`Evaluator`] lives on the control thread: it owns the source text,
//! recompiles it on every edit and hands each new [`Program`] to its voices.
//! A [`Voice`] lives on the render thread and runs one [`Cpu`]. Programs
//! travel through a one-slot channel and are only picked up between two
//! blocks, so a block always runs to completion with the program it started
//! with. A newer program replaces one that is still waiting in the slot.

use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::compiler::{CompilationError, CompilationState, SymbolTable, compile_source};
use crate::vm::{Cpu, Program, Register};
use crate::{log_debug, log_error, log_info};

pub const DEFAULT_SOURCE: &str = "output = input";

#[derive(Debug, Default)]
pub struct Evaluator {
    source: String,
    state: CompilationState,
    /// Last program that compiled, with the symbols used to print it
    current: Option<(Program, SymbolTable)>,
    voices: Vec<VoiceLink>,
}

/// Control side end of a voice's program slot.
#[derive(Debug)]
struct VoiceLink {
    programs: Sender<Program>,
    /// Lets the control side empty the slot; dead once the voice is dropped
    pending: Weak<Receiver<Program>>,
}

impl VoiceLink {
    /// Puts `program` in the slot, dropping whatever was still waiting
    /// there. Returns false when the voice is gone.
    fn offer(&self, program: Program) -> bool {
        let Some(pending) = self.pending.upgrade() else {
            return false;
        };
        let _ = pending.try_recv();
        self.programs.try_send(program).is_ok()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with `source` already compiled. A faulty source is kept
    /// and reported through [`Evaluator::state`].
    pub fn with_source(source: &str) -> Self {
        let mut evaluator = Self::new();
        let _ = evaluator.set_source(source);
        evaluator
    }

    /// Replaces the formula and recompiles it.
    ///
    /// On success every voice receives the new program. On failure voices
    /// keep running whatever they had, and the error is both returned and
    /// recorded in the compilation state.
    pub fn set_source(&mut self, source: &str) -> Result<(), CompilationError> {
        self.source = source.to_owned();
        match compile_source(source) {
            Ok(compilation) => {
                log_info!(
                    "[+] Formula compiled: {} instructions, {} registers",
                    compilation.program.len(),
                    compilation.program.register_count()
                );
                self.state = CompilationState::Compiled;
                self.install(&compilation.program);
                self.current = Some((compilation.program, compilation.symbols));
                Ok(())
            }
            Err(err) => {
                log_error!("[!] Formula error ({}..{}): {}", err.from, err.to, err);
                self.state = CompilationState::Error(err.clone());
                Err(err)
            }
        }
    }

    fn install(&mut self, program: &Program) {
        let before = self.voices.len();
        self.voices.retain(|voice| voice.offer(program.clone()));
        let dropped = before - self.voices.len();
        if dropped > 0 {
            log_debug!("[-] Forgot {} disconnected voice(s)", dropped);
        }
    }

    /// Creates a renderer fed with this evaluator's programs, starting with
    /// the current one if there is any.
    pub fn create_voice(&mut self) -> Voice {
        let (tx, rx) = bounded(1);
        let rx = Arc::new(rx);
        let link = VoiceLink {
            programs: tx,
            pending: Arc::downgrade(&rx),
        };
        if let Some((program, _)) = &self.current {
            link.offer(program.clone());
        }
        self.voices.push(link);
        Voice::new(rx)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> &CompilationState {
        &self.state
    }

    pub fn status(&self) -> String {
        self.state.status()
    }

    /// Program currently handed to the voices.
    pub fn program(&self) -> Option<&Program> {
        self.current.as_ref().map(|(program, _)| program)
    }

    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.current.as_ref().map(|(_, symbols)| symbols)
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }
}

/// Per-voice renderer, owned by the render thread.
#[derive(Debug)]
pub struct Voice {
    cpu: Cpu,
    input: Register,
    output: Register,
    programs: Arc<Receiver<Program>>,
}

impl Voice {
    fn new(programs: Arc<Receiver<Program>>) -> Self {
        Voice {
            cpu: Cpu::new(),
            input: 0,
            output: 1,
            programs,
        }
    }

    /// Installs the pending program, if any.
    fn poll_program(&mut self) {
        if let Ok(program) = self.programs.try_recv() {
            let (instructions, input, output) = program.into_parts();
            self.cpu.set_program(instructions);
            self.input = input;
            self.output = output;
        }
    }

    /// Renders one block. Without a program the output is silence.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        self.poll_program();
        self.cpu.execute_1_1_block(self.input, self.output, input, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(voice: &mut Voice, input: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0; input.len()];
        voice.process_block(input, &mut output);
        output
    }

    #[test]
    fn voice_without_program_is_silent() {
        let mut evaluator = Evaluator::new();
        let mut voice = evaluator.create_voice();
        assert_eq!(render(&mut voice, &[1.0, 2.0]), vec![0.0, 0.0]);
        assert_eq!(evaluator.status(), "not compiled");
    }

    #[test]
    fn new_voice_starts_with_current_program() {
        let mut evaluator = Evaluator::with_source(DEFAULT_SOURCE);
        let mut voice = evaluator.create_voice();
        assert_eq!(render(&mut voice, &[0.25, -0.5]), vec![0.25, -0.5]);
        assert_eq!(evaluator.status(), "ok");
        assert!(evaluator.state().is_compiled());
    }

    #[test]
    fn recompilation_reaches_live_voices_and_resets_state() {
        let mut evaluator = Evaluator::with_source("acc = acc + input; output = acc");
        let mut voice = evaluator.create_voice();
        assert_eq!(render(&mut voice, &[1.0, 1.0]), vec![1.0, 2.0]);

        evaluator.set_source("acc = acc + input * 2; output = acc").unwrap();
        assert_eq!(render(&mut voice, &[1.0, 1.0]), vec![2.0, 4.0]);
    }

    #[test]
    fn failed_compilation_keeps_previous_program() {
        let mut evaluator = Evaluator::with_source("acc = acc + input; output = acc");
        let mut voice = evaluator.create_voice();
        assert_eq!(render(&mut voice, &[1.0]), vec![1.0]);

        let err = evaluator.set_source("output = input # 2").unwrap_err();
        assert_eq!(err.to_string(), "can't interpret '#'");
        assert_eq!(evaluator.source(), "output = input # 2");
        assert_eq!(evaluator.status(), "can't interpret '#'");
        assert!(!evaluator.state().is_compiled());
        assert!(evaluator.state().error().is_some());

        // same program, same accumulated state
        assert_eq!(render(&mut voice, &[1.0]), vec![2.0]);
        assert_eq!(
            evaluator.program().map(|p| p.len()),
            compile_source("acc = acc + input; output = acc").ok().map(|c| c.program.len())
        );
    }

    #[test]
    fn only_newest_pending_program_is_installed() {
        let mut evaluator = Evaluator::new();
        let mut voice = evaluator.create_voice();
        evaluator.set_source("output = 1").unwrap();
        evaluator.set_source("output = 2").unwrap();
        evaluator.set_source("output = 3").unwrap();
        assert_eq!(voice.programs.len(), 1);
        assert_eq!(render(&mut voice, &[0.0]), vec![3.0]);
        assert!(voice.programs.is_empty());
    }

    #[test]
    fn idle_voice_holds_a_single_program() {
        let mut evaluator = Evaluator::with_source(DEFAULT_SOURCE);
        let mut voice = evaluator.create_voice();
        for i in 0..100 {
            evaluator.set_source(&format!("output = {}", i)).unwrap();
            assert_eq!(voice.programs.len(), 1);
        }
        assert_eq!(evaluator.voice_count(), 1);
        assert_eq!(render(&mut voice, &[0.0]), vec![99.0]);
    }

    #[test]
    fn dropped_voices_are_forgotten() {
        let mut evaluator = Evaluator::with_source(DEFAULT_SOURCE);
        let voice = evaluator.create_voice();
        let _kept = evaluator.create_voice();
        assert_eq!(evaluator.voice_count(), 2);
        drop(voice);
        evaluator.set_source("output = input * 2").unwrap();
        assert_eq!(evaluator.voice_count(), 1);
    }

    #[test]
    fn voices_render_on_another_thread() {
        let mut evaluator = Evaluator::with_source("output = input * 3");
        let mut voice = evaluator.create_voice();
        let handle = std::thread::spawn(move || render(&mut voice, &[1.0, 2.0]));
        assert_eq!(handle.join().unwrap(), vec![3.0, 6.0]);
    }

    #[test]
    fn symbols_describe_current_program() {
        let evaluator = Evaluator::with_source("gain = 0.5; output = input * gain");
        let symbols = evaluator.symbols().unwrap();
        assert_eq!(symbols.lookup("gain"), Some(2));
        let dump = evaluator.program().unwrap().dump(symbols);
        assert!(dump.contains("move gain, R03"));
    }
}
