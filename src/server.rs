//! The read loop.
//!
//! A [`ScanReader`] owns one opened endpoint, the decoder for its profile and the
//! assembler holding the scan in progress. It can hand out a single scan
//! ([`ScanReader::read_scan`]) or run forever pushing every scan into a channel
//! ([`ScanReader::run`], usually through [`spawn_reader`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use async_channel::{Receiver, Sender};
use tracing::{debug, error, info, trace, warn};

use crate::constants::REPORT_LEN;
use crate::decoder::{Assembler, ReportCodec};
use crate::device::{ReportSource, ScannerHandle, UsbTransport};
use crate::error::{Error, Result};
use crate::profile::ScannerProfile;
use crate::retry::{classify, FailureClass, RetryPolicy, Sleeper, ThreadSleeper};

/// Creates the channel scans are delivered on.
///
/// It holds a single scan, so a reader stops reading until its last scan is taken.
pub fn scan_channel() -> (Sender<String>, Receiver<String>) {
    async_channel::bounded(1)
}

/// Asks a running read loop to stop before its next read.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ScanReader<S> {
    source: S,
    codec: ReportCodec,
    assembler: Assembler,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    label: String,
}

impl<S: ReportSource> ScanReader<S> {
    pub fn new(source: S, profile: Arc<ScannerProfile>, policy: RetryPolicy) -> Self {
        let assembler = Assembler::new(profile.blank);
        ScanReader {
            source,
            codec: ReportCodec::new(profile),
            assembler,
            policy,
            sleeper: Box::new(ThreadSleeper),
            label: String::from("scanner"),
        }
    }

    /// Opens the endpoint bound to `handle` and wraps it in a reader.
    #[tracing::instrument(skip(transport, handle, profile), fields(device = %handle.summary))]
    pub fn open<T>(
        transport: &T,
        handle: &ScannerHandle<T::Device>,
        profile: Arc<ScannerProfile>,
        policy: RetryPolicy,
    ) -> Result<Self>
    where
        T: UsbTransport<Endpoint = S>,
    {
        let source = transport.open_endpoint(&handle.device, &handle.binding)?;
        info!("Barcode scanner is ready: {}.", handle.binding);
        Ok(ScanReader::new(source, profile, policy).with_label(handle.summary.to_string()))
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Blocks until one complete scan has been read.
    ///
    /// A short read is returned as [`Error::IncompleteRead`]. Undecodable reports are
    /// skipped and transport errors retried according to the policy.
    pub fn read_scan(&mut self) -> Result<String> {
        self.assembler.reset();
        let mut buf = [0u8; REPORT_LEN];
        let mut failures = 0;

        loop {
            match self.step(&mut buf, &mut failures) {
                Ok(Some(scan)) => return Ok(scan),
                Ok(None) => {}
                Err(e @ Error::IncompleteRead { .. }) => return Err(e),
                Err(e) => self.recover(e, &mut failures)?,
            }
        }
    }

    /// Reads scans until `shutdown` is triggered or every receiver of `tx` is gone.
    ///
    /// Only fatal transport errors and an exhausted retry policy end the loop early.
    #[tracing::instrument(skip(self, tx, shutdown), fields(scanner = %self.label))]
    pub fn run(&mut self, tx: &Sender<String>, shutdown: &ShutdownSignal) -> Result<()> {
        info!("Entering read loop.");
        self.assembler.reset();
        let mut buf = [0u8; REPORT_LEN];
        let mut failures = 0;

        while !shutdown.is_triggered() {
            match self.step(&mut buf, &mut failures) {
                Ok(Some(scan)) => {
                    if tx.send_blocking(scan).is_err() {
                        info!("No one is listening for scans anymore.");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => self.recover(e, &mut failures)?,
            }
        }

        info!("Leaving read loop.");
        Ok(())
    }

    /// Reads and decodes one report, returning a scan if it completed one.
    fn step(&mut self, buf: &mut [u8; REPORT_LEN], failures: &mut u32) -> Result<Option<String>> {
        let read_len = self.source.read(buf)?;
        if read_len != REPORT_LEN {
            return Err(Error::IncompleteRead { actual: read_len });
        }
        *failures = 0;

        debug!("Received {} bytes: {:02x?}", read_len, buf);
        let token = self.codec.decode(&buf[..])?;
        trace!("Decoded {:?}.", token);

        let scan = self.assembler.feed(token);
        if let Some(scan) = &scan {
            info!("Scanned {:?}.", scan);
        }
        Ok(scan)
    }

    /// Logs a failure and waits out the backoff, or gives up.
    fn recover(&mut self, error: Error, failures: &mut u32) -> Result<()> {
        let class = match &error {
            Error::Usb(e) => classify(e),
            Error::Decode(_) => FailureClass::Skipped,
            _ => FailureClass::Transient,
        };

        match class {
            FailureClass::Fatal => {
                error!("Reading from {} failed for good: {}", self.label, error);
                return Err(error);
            }
            FailureClass::Benign => {
                trace!("Idle: {}", error);
            }
            FailureClass::Skipped => {
                warn!("Skipping report: {}. Retrying in {:?}.", error, self.policy.backoff);
            }
            FailureClass::Transient => {
                *failures += 1;
                warn!("Error reading data: {}. Retrying in {:?}.", error, self.policy.backoff);
                if !self.policy.allows(*failures) {
                    error!(
                        "Failed to read from {} {} times in a row.",
                        self.label, failures
                    );
                    return Err(Error::RetriesExhausted {
                        attempts: *failures,
                        last: Box::new(error),
                    });
                }
            }
        }

        self.sleeper.sleep(self.policy.backoff);
        Ok(())
    }
}

/// A read loop running on its own thread.
#[derive(Debug)]
pub struct ReaderTask {
    shutdown: ShutdownSignal,
    handle: JoinHandle<Result<()>>,
}

impl ReaderTask {
    /// Stops the loop before its next read. A read already in flight is not interrupted.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    pub fn join(self) -> Result<()> {
        self.handle.join().map_err(|_| Error::ReaderPanicked)?
    }
}

/// Runs `reader` on a dedicated thread, sending every scan into `tx`.
pub fn spawn_reader<S>(reader: ScanReader<S>, tx: Sender<String>) -> Result<ReaderTask>
where
    S: ReportSource + Send + 'static,
{
    let shutdown = ShutdownSignal::new();
    let signal = shutdown.clone();
    let mut reader = reader;

    let handle = std::thread::Builder::new()
        .name(format!("scanner {}", reader.label()))
        .spawn(move || reader.run(&tx, &signal))?;

    Ok(ReaderTask { shutdown, handle })
}
