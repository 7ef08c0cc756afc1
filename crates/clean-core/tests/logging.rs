//! Logging goes through the installed subscriber and never leaks cell values.

use std::io;
use std::sync::{Arc, Mutex};

use clean_core::entities::transport;
use clean_core::logging::{LogConfig, LogFormat, init_logging_with_writer};
use clean_core::{Frame, Pipeline, Value, row};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn pipeline_events_reach_the_writer() {
    let capture = Capture::default();
    let config = LogConfig::default()
        .with_level(Level::DEBUG)
        .with_ansi(false)
        .with_format(LogFormat::Compact);
    init_logging_with_writer(&config, capture.clone()).unwrap();

    let input = Frame::from_records(vec![row([
        ("tra_id", Value::from(1)),
        ("tra_denomination", Value::from("Secret Carrier")),
    ])]);
    Pipeline::default()
        .run_entity(&transport::descriptor(), &input)
        .unwrap();

    let logs = capture.contents();
    assert!(logs.contains("pipeline complete"), "{logs}");
    assert!(!logs.contains("Secret Carrier"));
}
