//! DomainWorker - domain scans on a supervised background thread
//!
//! Requests carry the project root, replies carry the scan result by value.
//! A worker thread announces itself ready once; the first request waits for
//! that. A panicking worker counts as a crash: the supervisor logs it,
//! bumps the restart counter and starts a fresh worker. The request that was
//! being served is lost (its reply channel is dropped), it is not retried.

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::errors::{AnalyzerError, DomainError, Result};
use crate::features::domain_model::{DomainExtractor, EntityDict};

pub type ScanResult = std::result::Result<EntityDict, DomainError>;

type ScanFn = dyn Fn(&Path) -> ScanResult + Send + Sync;

enum Request {
    Scan { root: PathBuf, reply: Sender<ScanResult> },
    Shutdown,
}

struct Shared {
    requests: Mutex<Receiver<Request>>,
    scan: Box<ScanFn>,
    ready: Mutex<bool>,
    ready_changed: Condvar,
    alive: AtomicBool,
    restarts: AtomicU64,
}

pub struct DomainWorker {
    requests: Sender<Request>,
    shared: Arc<Shared>,
    supervisor: Option<JoinHandle<()>>,
}

/// Reply handle of one submitted scan
pub struct PendingScan {
    reply: Receiver<ScanResult>,
}

impl PendingScan {
    /// Block until the reply arrives. Fails when the worker crashed while
    /// serving the request.
    pub fn wait(self) -> Result<ScanResult> {
        self.reply
            .recv()
            .map_err(|_| AnalyzerError::Worker("domain scan request lost".to_string()))
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<ScanResult>> {
        match self.reply.recv_timeout(timeout) {
            Ok(result) => Ok(Some(result)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AnalyzerError::Worker("domain scan request lost".to_string()))
            }
        }
    }
}

impl DomainWorker {
    /// Worker running `extractor`
    pub fn spawn(extractor: Arc<DomainExtractor>) -> Result<Self> {
        Self::with_scan(move |root| extractor.analyze(root))
    }

    /// Worker running an arbitrary scan function
    pub fn with_scan<F>(scan: F) -> Result<Self>
    where
        F: Fn(&Path) -> ScanResult + Send + Sync + 'static,
    {
        let (requests, receiver) = channel();
        let shared = Arc::new(Shared {
            requests: Mutex::new(receiver),
            scan: Box::new(scan),
            ready: Mutex::new(false),
            ready_changed: Condvar::new(),
            alive: AtomicBool::new(true),
            restarts: AtomicU64::new(0),
        });

        let supervisor = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("oak-domain-supervisor".to_string())
                .spawn(move || shared.supervise())?
        };

        Ok(Self {
            requests,
            shared,
            supervisor: Some(supervisor),
        })
    }

    /// Queue a scan of `root`
    pub fn submit(&self, root: &Path) -> Result<PendingScan> {
        self.wait_ready()?;
        let (reply, receiver) = channel();
        self.requests
            .send(Request::Scan {
                root: root.to_path_buf(),
                reply,
            })
            .map_err(|_| AnalyzerError::Worker("domain worker stopped".to_string()))?;
        Ok(PendingScan { reply: receiver })
    }

    /// Scan `root` and wait for the result
    pub fn scan(&self, root: &Path) -> Result<ScanResult> {
        self.submit(root)?.wait()
    }

    /// Number of times the worker thread was restarted after a crash
    pub fn restarts(&self) -> u64 {
        self.shared.restarts.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        *self.shared.ready.lock()
    }

    fn wait_ready(&self) -> Result<()> {
        let mut ready = self.shared.ready.lock();
        while !*ready {
            if !self.shared.alive.load(Ordering::Acquire) {
                return Err(AnalyzerError::Worker("domain worker stopped".to_string()));
            }
            self.shared.ready_changed.wait(&mut ready);
        }
        Ok(())
    }
}

impl Drop for DomainWorker {
    fn drop(&mut self) {
        let _ = self.requests.send(Request::Shutdown);
        if let Some(supervisor) = self.supervisor.take() {
            let _ = supervisor.join();
        }
    }
}

impl std::fmt::Debug for DomainWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainWorker")
            .field("ready", &self.is_ready())
            .field("restarts", &self.restarts())
            .finish()
    }
}

impl Shared {
    fn supervise(self: Arc<Self>) {
        let mut generation = 0u64;
        loop {
            generation += 1;
            *self.ready.lock() = false;

            let spawned = {
                let shared = Arc::clone(&self);
                thread::Builder::new()
                    .name(format!("oak-domain-worker-{}", generation))
                    .spawn(move || shared.work())
            };
            let worker = match spawned {
                Ok(worker) => worker,
                Err(err) => {
                    tracing::error!("cannot start domain worker: {}", err);
                    break;
                }
            };

            match worker.join() {
                Ok(()) => {
                    tracing::debug!("domain worker {} exited", generation);
                    break;
                }
                Err(panic) => {
                    let restarts = self.restarts.fetch_add(1, Ordering::AcqRel) + 1;
                    tracing::error!(
                        "domain worker {} crashed ({}), restart #{}",
                        generation,
                        panic_message(panic.as_ref()),
                        restarts
                    );
                }
            }
        }

        self.alive.store(false, Ordering::Release);
        let mut ready = self.ready.lock();
        *ready = false;
        self.ready_changed.notify_all();
    }

    fn work(&self) {
        {
            let mut ready = self.ready.lock();
            *ready = true;
            self.ready_changed.notify_all();
        }
        tracing::debug!("domain worker ready");

        loop {
            let request = self.requests.lock().recv();
            match request {
                Ok(Request::Scan { root, reply }) => {
                    let result = (self.scan)(&root);
                    if reply.send(result).is_err() {
                        tracing::debug!(
                            "scan of {} finished after its caller left",
                            root.display()
                        );
                    }
                }
                Ok(Request::Shutdown) | Err(_) => return,
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic".to_string()
    }
}
