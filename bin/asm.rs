use std::fmt;
use std::process::exit;

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use ls8::symbolic;

enum Error {
    IO(std::io::Error),
    Assembly {
        path: String,
        error: symbolic::ParseError,
        location: Option<(usize, usize)>,
    },
    InvalidArgument(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IO(io) => write!(f, "IO error: {}", io),
            Error::Assembly { path, error, location: Some((line, column)) } => {
                write!(f, "{}:{}:{}: {}", path, line, column, error)
            }
            Error::Assembly { path, error, location: None } => write!(f, "{}: {}", path, error),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("ls8asm")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mitja Karhusaari <mitja@karhusaari.me>")
        .about("Assembles symbolic LS-8 assembly into the .ls8 machine code format")
        .arg(Arg::with_name("source")
             .help("File containing assembly source")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("output")
             .help("Write the machine code to this file instead of the standard output")
             .short("o")
             .long("output")
             .value_name("OUTPUT")
             .takes_value(true))
        .arg(Arg::with_name("verbose")
             .help("Log every emitted instruction to the standard error")
             .short("v")
             .long("verbose"))
        .get_matches()
}

fn main() {
    let args = parse_arguments();

    if let Err(err) = assemble(&args) {
        eprintln!("{}", err);
        exit(1);
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

fn assemble(args: &ArgMatches) -> Result<(), Error> {
    let file_path = args.value_of("source")
        .ok_or_else(|| Error::InvalidArgument("missing source file".to_string()))?;

    let logger = build_logger(args.is_present("verbose"));
    let source = std::fs::read_to_string(file_path)?;

    let program = symbolic::Program::parse(&*source)
        .and_then(|sym_prog| sym_prog.compile_with_logger(logger))
        .map_err(|error| Error::Assembly {
            path: file_path.to_string(),
            location: error.location(&source),
            error,
        })?;

    let output = program.to_source();

    match args.value_of("output") {
        Some(output_path) => std::fs::write(output_path, output)?,
        None => print!("{}", output),
    }

    Ok(())
}
