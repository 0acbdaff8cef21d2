//! Long‑lived host state.  One [`Session`] owns one interpreter (and so one
//! global scope) for its whole life: a script run, or every line typed at the
//! REPL.  Each `run` reports its own diagnostics; nothing but the globals
//! carries over from one input to the next.

use std::io::Write;

use log::{debug, info};

use crate::error::{LoxError, Result, RuntimeError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::value::Value;

/// Result of running one input.
#[derive(Debug)]
pub enum Outcome {
    Success,

    /// Lexical, syntax or resolution errors.  Nothing was executed.
    StaticErrors(Vec<LoxError>),

    /// Execution started and stopped at this error.
    RuntimeError(RuntimeError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Conventional process exit status (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticErrors(_) => 65,
            Outcome::RuntimeError(_) => 70,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session printing to standard output.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// A session whose `print` statements go to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Scan, parse, resolve and execute `source` against the session globals.
    pub fn run(&mut self, source: &str) -> Outcome {
        info!("Running {} bytes of source", source.len());

        let scanned = Scanner::scan_all(source);
        let mut errors = scanned.errors;

        let parsed = Parser::new(scanned.tokens).parse();
        errors.extend(parsed.errors);

        if !errors.is_empty() {
            debug!("Stopping before resolution: {} static error(s)", errors.len());
            return Outcome::StaticErrors(errors);
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&parsed.statements) {
            return Outcome::StaticErrors(errors);
        }

        match self.interpreter.interpret(&parsed.statements) {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::RuntimeError(e),
        }
    }

    /// Evaluate a single expression and return its value.
    pub fn evaluate(&mut self, source: &str) -> Result<Value> {
        let scanned = Scanner::scan_all(source);

        if let Some(e) = scanned.errors.into_iter().next() {
            return Err(e);
        }

        let expr = Parser::new(scanned.tokens).parse_expression()?;
        debug!("Parsed expression: {:?}", expr);

        Ok(self.interpreter.evaluate(&expr)?)
    }
}
