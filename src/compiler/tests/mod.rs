use crate::compiler::compile_source;
use crate::vm::Cpu;

mod statements;

/// Compiles `source`, runs it once and returns the value of its last
/// statement.
pub fn evaluate(source: &str) -> f64 {
    let compilation = compile_source(source).expect("compilation failed");
    let mut cpu = Cpu::new();
    cpu.set_program(compilation.program.instructions().to_vec());
    cpu.execute();
    cpu.register(compilation.result)
}

/// Compiles `source` and streams `input` through it as one block.
pub fn compile_and_run(source: &str, input: &[f32]) -> Vec<f32> {
    let program = compile_source(source).expect("compilation failed").program;
    let mut cpu = Cpu::new();
    let (instructions, src, dst) = program.into_parts();
    cpu.set_program(instructions);
    let mut output = vec![0.0; input.len()];
    cpu.execute_1_1_block(src, dst, input, &mut output);
    output
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
