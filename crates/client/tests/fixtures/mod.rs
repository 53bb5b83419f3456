#![allow(dead_code)]

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use warren_client::{
    Channel, ChannelDispatchOptions, ChannelFault, ChannelOpener, ChannelOptions,
    DefaultPersistentChannelFactory, ExponentialBackoff, PersistentChannel,
    PersistentChannelFactory, RetryPolicy,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeError {
    pub message: String,
    pub connection: bool,
}

impl FakeError {
    pub fn connection(message: &str) -> Self {
        Self { message: message.to_owned(), connection: true }
    }

    pub fn app(message: &str) -> Self {
        Self { message: message.to_owned(), connection: false }
    }
}

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FakeError {}

impl ChannelFault for FakeError {
    fn is_connection_failure(&self) -> bool {
        self.connection
    }
}

/// Broker-side bookkeeping shared by every channel of one opener.
#[derive(Debug, Default)]
pub struct Broker {
    open_attempts: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
    failing_opens: AtomicUsize,
    stalled: AtomicBool,
    running: AtomicUsize,
    max_running: AtomicUsize,
    channels: Mutex<Vec<Arc<AtomicBool>>>,
    confirms: Mutex<Vec<bool>>,
}

impl Broker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next `count` open attempts fail with a connection error.
    pub fn fail_next_opens(&self, count: usize) {
        self.failing_opens.store(count, Ordering::SeqCst);
    }

    /// Makes every later open attempt hang until its caller gives up.
    pub fn stall_opens(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Closes every channel from the broker side.
    pub fn kill_channels(&self) {
        for alive in self.channels.lock().iter() {
            alive.store(false, Ordering::SeqCst);
        }
    }

    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn confirms(&self) -> Vec<bool> {
        self.confirms.lock().clone()
    }
}

#[derive(Debug, Clone)]
pub struct FakeOpener {
    pub broker: Arc<Broker>,
}

impl FakeOpener {
    pub fn new(broker: &Arc<Broker>) -> Self {
        Self { broker: Arc::clone(broker) }
    }
}

impl ChannelOpener for FakeOpener {
    type Channel = FakeChannel;

    async fn open(&self, options: &ChannelOptions) -> Result<FakeChannel, FakeError> {
        self.broker.open_attempts.fetch_add(1, Ordering::SeqCst);
        if self.broker.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        tokio::task::yield_now().await;

        let refused =
            self.broker.failing_opens.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if refused.is_ok() {
            return Err(FakeError::connection("connection refused"));
        }

        let alive = Arc::new(AtomicBool::new(true));
        self.broker.channels.lock().push(Arc::clone(&alive));
        self.broker.confirms.lock().push(options.publisher_confirms);
        let id = self.broker.opens.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(FakeChannel { id, alive, broker: Arc::clone(&self.broker), published: Vec::new() })
    }
}

#[derive(Debug)]
pub struct FakeChannel {
    pub id: usize,
    alive: Arc<AtomicBool>,
    broker: Arc<Broker>,
    pub published: Vec<String>,
}

impl FakeChannel {
    pub fn publish(&mut self, message: &str) -> Result<usize, FakeError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(FakeError::connection("channel closed"));
        }
        self.published.push(message.to_owned());
        Ok(self.published.len())
    }

    /// Occupies the channel for `work`, recording how many commands overlap.
    pub fn busy(&mut self, work: Duration) -> Result<(), FakeError> {
        let running = self.broker.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.broker.max_running.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(work);
        self.broker.running.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Channel for FakeChannel {
    type Error = FakeError;

    fn is_open(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn close(self) {
        self.alive.store(false, Ordering::SeqCst);
        self.broker.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn fast_retry() -> Arc<dyn RetryPolicy> {
    Arc::new(ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(10)))
}

pub fn persistent_channel(broker: &Arc<Broker>, options: &ChannelDispatchOptions) -> PersistentChannel<FakeOpener> {
    PersistentChannel::new(options.name(), options.channel_options(), FakeOpener::new(broker), fast_retry())
}

/// Factory counting how many channels it was asked for.
#[derive(Debug)]
pub struct CountingFactory {
    inner: DefaultPersistentChannelFactory<FakeOpener>,
    pub created: Arc<AtomicUsize>,
}

impl CountingFactory {
    pub fn new(broker: &Arc<Broker>) -> Self {
        Self {
            inner: DefaultPersistentChannelFactory::with_policy(FakeOpener::new(broker), fast_retry()),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl PersistentChannelFactory for CountingFactory {
    type Opener = Arc<FakeOpener>;

    fn create(&self, options: &ChannelDispatchOptions) -> PersistentChannel<Arc<FakeOpener>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(1));
        self.inner.create(options)
    }
}

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

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
