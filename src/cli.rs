use std::ffi::OsString;
use std::io::{self, Write};

use tracing::debug;

use crate::pipeline::{Invocation, Pipeline};
use crate::stack::Stack;

/// Entry point of the `restack` binary. Returns the process exit
/// code: 0 on success, 1 on a fatal error, 2 on a usage error.
pub fn run<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let invocation = match parse(args) {
        Ok(invocation) => invocation,
        Err(code) => return code,
    };

    let stack = match Stack::from_env() {
        Ok(stack) => stack,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    execute(&Pipeline::new(stack), &invocation, &mut io::stdout().lock())
}

/// Parse `args` and run them through an already configured
/// pipeline.
pub fn run_with<I, T>(args: I, pipeline: &Pipeline, out: &mut dyn Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match parse(args) {
        Ok(invocation) => execute(pipeline, &invocation, out),
        Err(code) => code,
    }
}

/// Run a parsed invocation and map the outcome to an exit code.
/// Warnings never change the code.
pub fn execute(pipeline: &Pipeline, invocation: &Invocation, out: &mut dyn Write) -> u8 {
    match pipeline.run(invocation, out) {
        Ok(report) => {
            debug!(?report, "run complete");
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

/// Help goes to stdout with code 0; usage errors go to stderr
/// with code 2.
fn parse<I, T>(args: I) -> Result<Invocation, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Invocation::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        u8::try_from(err.exit_code()).unwrap_or(2)
    })
}
