use std::fmt;
use std::process::exit;

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use ls8::{
    bytecode,
    symbolic,
    emulator::{EmulationError, Emulator, Exit, InputOutput, StdIo},
};

enum Error {
    IO(std::io::Error),
    Bytecode(bytecode::ParseError),
    Symbolic {
        error: symbolic::ParseError,
        location: Option<(usize, usize)>,
    },
    Emulation(EmulationError),
    InvalidArgument(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<bytecode::ParseError> for Error {
    fn from(e: bytecode::ParseError) -> Error {
        Error::Bytecode(e)
    }
}

impl From<EmulationError> for Error {
    fn from(e: EmulationError) -> Error {
        Error::Emulation(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IO(io) => write!(f, "IO error: {}", io),
            Error::Bytecode(err) => write!(f, "parse error {}", err),
            Error::Symbolic { error, location: Some((line, column)) } => {
                write!(f, "assembly error at line {} col {}: {}", line, column, error)
            }
            Error::Symbolic { error, location: None } => write!(f, "assembly error: {}", error),
            Error::Emulation(err) => write!(f, "execution error: {}", err),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("ls8run")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mitja Karhusaari <mitja@karhusaari.me>")
        .about("Utility for assembling and executing LS-8 programs")
        .arg(Arg::with_name("source")
             .help("File containing assembly source (.asm) or machine code (.ls8)")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("verbose")
             .help("Log emulation to the standard error")
             .short("v")
             .long("verbose"))
        .arg(Arg::with_name("trace")
             .help("Print a trace line to the standard error before every instruction")
             .short("t")
             .long("trace"))
        .arg(Arg::with_name("max-steps")
             .help("Abort if the program has not halted after this many instructions")
             .long("max-steps")
             .value_name("N")
             .takes_value(true))
        .get_matches()
}

fn main() {
    let args = parse_arguments();

    match run(&args) {
        Ok(Exit::Halted) => (),
        Ok(Exit::DivisionByZero { pc }) => {
            eprintln!("division by zero at address 0x{:02x}", pc);
            exit(1);
        }
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    }
}

fn build_logger(verbose: bool) -> Logger {
    if !verbose {
        return Logger::root(Discard, o!());
    }

    let decorator = TermDecorator::new().stderr().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain, o!())
}

fn run(args: &ArgMatches) -> Result<Exit, Error> {
    let file_path = args.value_of("source")
        .ok_or_else(|| Error::InvalidArgument("missing source file".to_string()))?;

    let max_steps = args.value_of("max-steps")
        .map(|n| n.parse::<u64>())
        .transpose()
        .map_err(|_| Error::InvalidArgument("--max-steps expects a positive integer".to_string()))?;

    let logger = build_logger(args.is_present("verbose"));

    let file = std::fs::read_to_string(file_path)?;
    let program;

    if file_path.ends_with(".asm") {
        program = symbolic::Program::parse(&*file)
            .and_then(|sym_prog| sym_prog.compile_with_logger(logger.clone()))
            .map_err(|error| Error::Symbolic {
                location: error.location(&file),
                error,
            })?;
    } else {
        program = bytecode::Program::parse(&*file)?;
    }

    let mut emulator = Emulator::with_logger(program.to_memory(), StdIo, logger);

    let exit = if args.is_present("trace") {
        run_traced(&mut emulator, max_steps)?
    } else if let Some(limit) = max_steps {
        emulator.run_with_limit(limit)?
    } else {
        emulator.run()?
    };

    Ok(exit)
}

fn run_traced<IO: InputOutput>(
    emulator: &mut Emulator<IO>,
    max_steps: Option<u64>,
) -> Result<Exit, EmulationError> {
    while !emulator.halted {
        if let Some(limit) = max_steps {
            if emulator.steps() >= limit {
                return Err(EmulationError::StepLimitExceeded { limit });
            }
        }

        eprintln!("{}", emulator.trace());
        emulator.step()?;
    }

    Ok(emulator.exit().unwrap_or(Exit::Halted))
}
