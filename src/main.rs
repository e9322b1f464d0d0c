use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use count_down_latch::{log_init, CountDownLatch};
use crossbeam_deque::{Injector, Steal};
use tracing::{debug, info, instrument, trace, warn};

const WORKER_NUMS: usize = 4;
const JOB_NUMS: usize = 32;
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
struct Job {
    id: usize,
    weight: usize,
}

impl Job {
    fn run(&self) {
        thread::sleep(Duration::from_millis(self.weight as u64));
    }
}

fn worker_loop(index: usize, queue: &Injector<Job>, gate: &CountDownLatch, done: &CountDownLatch) {
    gate.wait();

    loop {
        match queue.steal() {
            Steal::Success(job) => {
                trace!("worker {} take job {}", index, job.id);
                job.run();

                if let Err(err) = done.weighted_count_down(job.weight) {
                    warn!("worker {} job {}: {}", index, job.id, err);
                }
            }
            Steal::Retry => thread::yield_now(),
            Steal::Empty => break,
        }
    }

    debug!("worker {} exit", index);
}

/// Spreads `jobs` over `workers` threads and waits up to `timeout` for their
/// combined weight to be counted down. Returns whether the count down
/// completed in time.
#[instrument(skip(jobs))]
fn run_jobs(jobs: Vec<Job>, workers: usize, timeout: Duration) -> bool {
    let total = jobs.iter().map(|job| job.weight).sum();

    let queue = Arc::new(Injector::new());
    for job in jobs {
        queue.push(job);
    }

    let gate = Arc::new(CountDownLatch::new(1));
    let done = Arc::new(CountDownLatch::new(total));

    let handles: Vec<_> = (0..workers)
        .map(|index| {
            let queue = queue.clone();
            let gate = gate.clone();
            let done = done.clone();
            thread::spawn(move || worker_loop(index, &queue, &gate, &done))
        })
        .collect();

    if let Err(err) = gate.complete() {
        warn!("start gate: {}", err);
    }

    let deadline = Instant::now() + timeout;
    let completed = loop {
        if done.wait_timeout(POLL_INTERVAL) {
            break true;
        }

        debug!("remaining weight: {}", done.count());

        if Instant::now() >= deadline {
            break false;
        }
    };

    for handle in handles {
        if handle.join().is_err() {
            warn!("worker panicked");
        }
    }

    completed
}

fn main() {
    if let Err(err) = log_init() {
        eprintln!("failed to install tracing subscriber: {}", err);
    }

    let jobs = (0..JOB_NUMS)
        .map(|id| Job {
            id,
            weight: id % 3 + 1,
        })
        .collect();

    if run_jobs(jobs, WORKER_NUMS, WAIT_TIMEOUT) {
        info!("count down complete");
    } else {
        info!("count down not complete");
    }
}
