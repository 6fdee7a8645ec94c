//! One dedicated OS thread owns the accessibility provider.
//!
//! Platform accessibility APIs are bound to the thread that created their
//! objects. Every provider call is shipped to this thread as a job; async
//! callers await the reply on a oneshot channel.

use crate::errors::DiscoveryError;
use crate::platforms::{AccessibilityProvider, InputSynthesizer};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, error};

/// State living on the UI thread.
pub struct UiContext<P> {
    pub provider: P,
    pub input: Box<dyn InputSynthesizer>,
}

type Job<P> = Box<dyn FnOnce(&UiContext<P>) + Send>;

pub struct UiThread<P> {
    sender: Option<mpsc::Sender<Job<P>>>,
    handle: Option<JoinHandle<()>>,
}

fn stopped() -> DiscoveryError {
    DiscoveryError::EngineStopped("the UI thread is no longer running".to_string())
}

impl<P: AccessibilityProvider + 'static> UiThread<P> {
    /// Starts the thread. `init` runs on it and builds the context, so the
    /// provider itself never crosses threads.
    pub fn spawn<F>(name: &str, init: F) -> Result<Self, DiscoveryError>
    where
        F: FnOnce() -> UiContext<P> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<Job<P>>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let context = init();
                debug!("UI thread started");
                while let Ok(job) = receiver.recv() {
                    job(&context);
                }
                debug!("UI thread stopping");
            })
            .map_err(|e| {
                error!("failed to start UI thread: {}", e);
                DiscoveryError::EngineStopped(e.to_string())
            })?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    fn submit(&self, job: Job<P>) -> Result<(), DiscoveryError> {
        let sender = self.sender.as_ref().ok_or_else(stopped)?;
        sender.send(job).map_err(|_| {
            error!("UI thread job queue is closed");
            stopped()
        })
    }

    /// Runs `job` on the UI thread and awaits its result.
    pub async fn run<R, F>(&self, job: F) -> Result<R, DiscoveryError>
    where
        R: Send + 'static,
        F: FnOnce(&UiContext<P>) -> R + Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.submit(Box::new(move |context| {
            let _ = reply.send(job(context));
        }))?;
        response.await.map_err(|_| stopped())
    }

    /// Blocking form of [`UiThread::run`] for callers outside a runtime.
    /// Must not be called from the UI thread itself.
    pub fn run_blocking<R, F>(&self, job: F) -> Result<R, DiscoveryError>
    where
        R: Send + 'static,
        F: FnOnce(&UiContext<P>) -> R + Send + 'static,
    {
        let (reply, response) = mpsc::sync_channel(1);
        self.submit(Box::new(move |context| {
            let _ = reply.send(job(context));
        }))?;
        response.recv().map_err(|_| stopped())
    }

    /// Queues `job` without waiting for it.
    pub fn spawn_job<F>(&self, job: F) -> Result<(), DiscoveryError>
    where
        F: FnOnce(&UiContext<P>) + Send + 'static,
    {
        self.submit(Box::new(job))
    }
}

impl<P> Drop for UiThread<P> {
    fn drop(&mut self) {
        // Closing the queue ends the receive loop.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!("UI thread panicked");
            }
        }
    }
}
