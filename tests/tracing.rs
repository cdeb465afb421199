use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

use esenv::interpreter::new_declarative_environment;
use esenv::{Interpreter, JsFunction, JsValue, PartialDescriptor};

#[derive(Clone, Default)]
struct SharedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
    fn contents(&self) -> String {
        String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
    }
}

struct SharedWriterGuard<'a> {
    buffer: &'a Arc<Mutex<Vec<u8>>>,
}

impl io::Write for SharedWriterGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriterGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SharedWriterGuard { buffer: &self.buffer }
    }
}

fn capture(level: tracing::Level, f: impl FnOnce()) -> String {
    let writer = SharedWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    writer.contents()
}

#[test]
fn rejected_definitions_are_logged() {
    let output = capture(tracing::Level::DEBUG, || {
        let mut interp = Interpreter::new();
        let obj = interp.create_object(None, false);
        let accepted = interp
            .define_own_property(obj, "x", PartialDescriptor::value_only(JsValue::Null), false)
            .unwrap();
        assert!(!accepted);
    });
    assert!(
        output.contains("object is not extensible"),
        "expected a rejection event, got: {output}"
    );
}

#[test]
fn function_entry_and_exit_are_logged() {
    let output = capture(tracing::Level::DEBUG, || {
        let mut interp = Interpreter::new();
        let scope = interp.global_environment();
        let body = JsFunction::user(None, vec![], scope, false, |_| Ok(JsValue::Undefined));
        let f = interp.create_function(body).unwrap();
        interp.call(&JsValue::Object(f), JsValue::Undefined, &[]).unwrap();
    });
    assert!(output.contains("entered function scope"), "got: {output}");
    assert!(output.contains("exited function scope"), "got: {output}");
}

#[test]
fn identifier_resolution_is_traced() {
    let output = capture(tracing::Level::TRACE, || {
        let mut interp = Interpreter::new();
        let env = new_declarative_environment(None);
        interp.create_mutable_binding(&env, "seen", false).unwrap();
        interp.get_identifier_reference(Some(&env), "seen", false).unwrap();
        interp.get_identifier_reference(Some(&env), "unseen", false).unwrap();
    });
    assert!(output.contains("identifier resolved"), "got: {output}");
    assert!(output.contains("identifier unresolvable"), "got: {output}");
    assert!(!capture(tracing::Level::INFO, || {
        let interp = Interpreter::new();
        let env = new_declarative_environment(None);
        interp.get_identifier_reference(Some(&env), "quiet", false).unwrap();
    })
    .contains("identifier"));
}
