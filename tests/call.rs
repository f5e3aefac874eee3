use ls8::{
    bytecode,
    symbolic,
    emulator::{Emulator, Exit, TestIo},
};

fn compile_program(source: &str) -> bytecode::Program {
    symbolic::Program::parse(source)
        .expect("could not parse the source code")
        .compile()
        .expect("could not assemble the source code")
}

#[test]
fn test_call() {
    let program = bytecode::Program::parse(include_str!("call.ls8")).unwrap();

    let mut emulator = Emulator::new(program.to_memory(), TestIo::new());

    assert_eq!(emulator.run(), Ok(Exit::Halted));
    assert_eq!(emulator.io.output(), "20\n30\n36\n60\n");
}

#[test]
fn test_call_assembled_matches_machine_code() {
    let assembled = compile_program(include_str!("call.asm"));
    let expected = bytecode::Program::parse(include_str!("call.ls8")).unwrap();

    assert_eq!(assembled, expected);
    assert_eq!(bytecode::Program::parse(&assembled.to_source()).unwrap(), expected);
}

#[test]
fn test_conditional_jumps() {
    let program = compile_program(include_str!("jumps.asm"));

    let mut emulator = Emulator::new(program.to_memory(), TestIo::new());

    assert_eq!(emulator.run_with_limit(1000), Ok(Exit::Halted));
    assert_eq!(emulator.io.output(), "20\n5\n");
}

#[test]
fn test_print_string_from_data() {
    let program = compile_program(include_str!("hello.asm"));

    let mut emulator = Emulator::new(program.to_memory(), TestIo::new());

    assert_eq!(emulator.run_with_limit(1000), Ok(Exit::Halted));
    assert_eq!(emulator.io.output(), "Hi\n");
}

#[test]
fn test_division_by_zero_stops_the_run() {
    let program = compile_program("
        LDI R0, 10
        LDI R1, 0
        DIV R0, R1
        PRN R0
        HLT
    ");

    let mut emulator = Emulator::new(program.to_memory(), TestIo::new());

    assert_eq!(emulator.run(), Ok(Exit::DivisionByZero { pc: 6 }));
    assert_eq!(emulator.context.r[0], 10);
    assert_eq!(emulator.io.output(), "");
}
