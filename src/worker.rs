use crate::error::PanelError;
use crate::transport::{available_services, Transport};
use crate::widget::RefreshTicket;
use crate::SharedStateFlag;
use std::{
    io,
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Condvar, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

const WORKER_POLL_MS: u64 = 100; // How often an idle worker rechecks the run flag

// A request the UI wants made
#[derive(Debug)]
pub enum Job {
    Post {
        service: usize,
        path: String,
    },
    Fetch {
        service: usize,
        ticket: RefreshTicket,
        path: String,
    },
    Discover,
}

// What came back, addressed to the widget that asked
#[derive(Debug)]
pub enum Outcome {
    Posted {
        service: usize,
        path: String,
        result: Result<(), PanelError>,
    },
    Fetched {
        service: usize,
        ticket: RefreshTicket,
        result: Result<String, PanelError>,
    },
    Discovered(Result<Vec<String>, PanelError>),
}

/// Background thread that owns the transport and runs requests one at a time
/// so the UI never blocks on the network.
pub struct RequestWorker {
    jobs: Sender<Job>,
    outcomes: Receiver<Outcome>,
    run_state: SharedStateFlag,
    handle: Option<JoinHandle<()>>,
}

impl RequestWorker {
    /// Spawns the worker thread.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be created.
    pub fn spawn(transport: Arc<dyn Transport>) -> io::Result<Self> {
        log::info!("Spawning request worker thread...");

        let (job_tx, job_rx) = mpsc::channel();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let run_state: SharedStateFlag = Arc::new((Mutex::new(true), Condvar::new()));
        let thread_run_state = run_state.clone();

        let handle = thread::Builder::new()
            .name("request-worker".to_string())
            .spawn(move || run_worker_loop(transport, job_rx, outcome_tx, thread_run_state))?;

        Ok(Self {
            jobs: job_tx,
            outcomes: outcome_rx,
            run_state,
            handle: Some(handle),
        })
    }

    /// Queues a job.
    ///
    /// # Errors
    /// Returns [`PanelError::WorkerStopped`] once the worker has exited.
    pub fn submit(&self, job: Job) -> Result<(), PanelError> {
        self.jobs.send(job).map_err(|_| PanelError::WorkerStopped)
    }

    /// Everything that finished since the last call, without waiting.
    pub fn drain(&self) -> Vec<Outcome> {
        self.outcomes.try_iter().collect()
    }

    pub fn is_running(&self) -> bool {
        let &(ref lock, _) = &*self.run_state;
        match lock.lock() {
            Ok(guard) => *guard,
            Err(_) => false, // Return false if the mutex is poisoned
        }
    }

    /// Signals the thread to stop and waits for it. A request already in
    /// flight finishes first.
    pub fn shutdown(&mut self) {
        {
            let &(ref lock, ref cvar) = &*self.run_state;
            match lock.lock() {
                Ok(mut running) => {
                    *running = false;
                    log::info!("Signaling request worker to stop.");
                }
                Err(_) => {
                    log::error!("Worker run state mutex poisoned during shutdown!");
                }
            }
            cvar.notify_all();
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Request worker panicked.");
            }
        }
    }
}

impl Drop for RequestWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown();
        }
    }
}

// The core worker loop
fn run_worker_loop(
    transport: Arc<dyn Transport>,
    jobs: Receiver<Job>,
    outcomes: Sender<Outcome>,
    run_state: SharedStateFlag,
) {
    log::info!("Request worker loop starting.");
    let &(ref run_lock, _) = &*run_state;

    loop {
        let should_run = match run_lock.lock() {
            Ok(guard) => *guard,
            Err(_) => {
                log::error!("Run state mutex poisoned in worker loop!");
                false
            }
        };
        if !should_run {
            log::info!("Stop signal received, exiting worker loop.");
            break;
        }

        let job = match jobs.recv_timeout(Duration::from_millis(WORKER_POLL_MS)) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("Job channel closed, exiting worker loop.");
                break;
            }
        };

        let outcome = run_job(transport.as_ref(), job);
        if outcomes.send(outcome).is_err() {
            log::warn!("Outcome receiver dropped, exiting worker loop.");
            break;
        }
    }

    log::info!("Request worker finished.");
}

fn run_job(transport: &dyn Transport, job: Job) -> Outcome {
    match job {
        Job::Post { service, path } => {
            log::debug!("Worker: POST {} for service {}", path, service);
            let result = transport.send_post(&path);
            Outcome::Posted { service, path, result }
        }
        Job::Fetch { service, ticket, path } => {
            log::debug!("Worker: GET {} for service {} ({:?})", path, service, ticket);
            let result = transport.get_text(&path);
            Outcome::Fetched { service, ticket, result }
        }
        Job::Discover => Outcome::Discovered(available_services(transport)),
    }
}
