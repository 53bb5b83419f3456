use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event1 {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event2 {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent(pub usize);

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
