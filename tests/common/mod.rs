#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::session::{Outcome, Session};

/// In-memory sink shared between the test and the interpreter it feeds.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session() -> (Session, SharedBuffer) {
    let out = SharedBuffer::default();
    (Session::with_output(Box::new(out.clone())), out)
}

/// Run `source` in a fresh session; returns the outcome and printed lines.
pub fn run(source: &str) -> (Outcome, Vec<String>) {
    let (mut session, out) = session();
    let outcome = session.run(source);
    (outcome, out.lines())
}

/// Run a program that must succeed and return what it printed.
pub fn output_of(source: &str) -> Vec<String> {
    let (outcome, lines) = run(source);
    assert!(
        outcome.is_success(),
        "program failed: {:?}\noutput so far: {:?}",
        outcome,
        lines
    );
    lines
}

/// Messages of the static errors a program produces (panics if it ran).
pub fn static_errors(source: &str) -> Vec<String> {
    match run(source).0 {
        Outcome::StaticErrors(errors) => errors.iter().map(|e| e.to_string()).collect(),
        other => panic!("expected static errors, got {:?}", other),
    }
}

/// The runtime error a program stops with, rendered, plus its prior output.
pub fn runtime_error(source: &str) -> (String, Vec<String>) {
    match run(source) {
        (Outcome::RuntimeError(e), lines) => (e.to_string(), lines),
        (other, _) => panic!("expected a runtime error, got {:?}", other),
    }
}
