use super::{compile_and_run, evaluate};
use crate::compiler::{OUTPUT_NAME, compile_source};
use crate::vm::Cpu;

#[test]
fn assignment_and_sequencing() {
    let output = compile_and_run("a = 3; output = a + input", &[1.0, 2.0, 3.0]);
    assert_eq!(output, vec![4.0, 5.0, 6.0]);
}

#[test]
fn sequence_value_is_last_statement() {
    assert_eq!(evaluate("1; 2; 3"), 3.0);
}

#[test]
fn state_persists_across_blocks() {
    let program = compile_source("acc = acc + input; output = acc").unwrap().program;
    let mut cpu = Cpu::new();
    cpu.set_program(program.instructions().to_vec());

    let mut outputs = Vec::new();
    for _ in 0..3 {
        let mut out = [0.0f32];
        cpu.execute_1_1_block(
            program.input_register(),
            program.output_register(),
            &[1.0],
            &mut out,
        );
        outputs.push(out[0]);
    }
    assert_eq!(outputs, vec![1.0, 2.0, 3.0]);

    // installing a program again starts over from zero
    cpu.set_program(program.instructions().to_vec());
    let mut out = [0.0f32];
    cpu.execute_1_1_block(0, 1, &[1.0], &mut out);
    assert_eq!(out, [1.0]);
}

#[test]
fn state_accumulates_within_a_block() {
    let output = compile_and_run("acc = acc + input; output = acc", &[1.0, 1.0, 1.0, 1.0]);
    assert_eq!(output, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn one_sample_delay() {
    // output lags input by one sample
    let output = compile_and_run("output = prev; prev = input", &[1.0, 2.0, 3.0]);
    assert_eq!(output, vec![0.0, 1.0, 2.0]);
}

#[test]
fn streaming_registers_are_fixed() {
    for source in ["1", "x = 2", "output = input", "y = input; z = y * 2"] {
        let compilation = compile_source(source).unwrap();
        assert_eq!(compilation.program.input_register(), 0);
        assert_eq!(compilation.program.output_register(), 1);
        assert_eq!(compilation.symbols.name(0), "input");
        assert_eq!(compilation.symbols.name(1), OUTPUT_NAME);
    }
}

#[test]
fn formula_without_output_is_silent() {
    let output = compile_and_run("x = input * 2", &[1.0, 2.0]);
    assert_eq!(output, vec![0.0, 0.0]);
}

#[test]
fn compilation_is_deterministic() {
    let source = "acc = acc * 0.5 + input; output = sin(acc * 2) + 1";
    let first = compile_source(source).unwrap();
    let second = compile_source(source).unwrap();
    assert_eq!(first.program.instructions(), second.program.instructions());
    assert_eq!(first.program, second.program);
}

#[test]
fn program_dump_lists_every_instruction() {
    let compilation = compile_source("output = input").unwrap();
    assert_eq!(
        compilation.program.dump(&compilation.symbols),
        "  0: move R02, input\n  1: move output, R02\n"
    );
}
