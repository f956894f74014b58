//! Traffic Controller - keeps the work queue topped up to a target rate
//!
//! Once per tick the feeder reads the target rate `R` and pushes single-hop
//! work items until the queue holds `R` of them. Items already waiting count
//! towards the target, so a backlog is never grown past it.

use crossbeam_channel::Sender;
use log::{debug, error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{PoolError, Result};
use crate::worker::WorkItem;

/// Rate value telling the feeder loop to exit
pub const SENTINEL_STOP: i64 = -1;

/// Path length of the items the feeder pushes
const TRAFFIC_ITEM: WorkItem = 1;

/// Background feeder for one pool's work queue
pub struct TrafficController {
    queue: Sender<WorkItem>,
    rate: Arc<AtomicI64>,
    enqueued: Arc<AtomicU64>,
    tick: Duration,
    handle: Option<JoinHandle<()>>,
}

impl TrafficController {
    pub fn new(queue: Sender<WorkItem>, tick: Duration) -> Self {
        Self {
            queue,
            rate: Arc::new(AtomicI64::new(0)),
            enqueued: Arc::new(AtomicU64::new(0)),
            tick,
            handle: None,
        }
    }

    /// Set the target rate, starting the feeder if it is not running
    pub fn start(&mut self, tps: u32) -> Result<()> {
        self.rate.store(i64::from(tps), Ordering::SeqCst);
        if self.handle.is_some() {
            debug!("Traffic rate changed to {} tps", tps);
            return Ok(());
        }

        let queue = self.queue.clone();
        let rate = Arc::clone(&self.rate);
        let enqueued = Arc::clone(&self.enqueued);
        let tick = self.tick;
        let handle = thread::Builder::new()
            .name("traffic".to_string())
            .spawn(move || feed(queue, rate, enqueued, tick))
            .map_err(PoolError::TrafficSpawnFailed)?;
        self.handle = Some(handle);
        info!("Traffic started at {} tps", tps);
        Ok(())
    }

    /// Stop the feeder and wait for it to exit; blocks for up to one tick
    pub fn stop(&mut self) {
        self.rate.store(SENTINEL_STOP, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Traffic thread panicked");
            }
            info!("Traffic stopped");
        }
    }

    /// Current target rate, [`SENTINEL_STOP`] once stopped
    pub fn rate(&self) -> i64 {
        self.rate.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Items pushed since construction
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::SeqCst)
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }
}

impl Drop for TrafficController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn feed(queue: Sender<WorkItem>, rate: Arc<AtomicI64>, enqueued: Arc<AtomicU64>, tick: Duration) {
    loop {
        let begin = Instant::now();
        let target = rate.load(Ordering::SeqCst);
        if target == SENTINEL_STOP {
            return;
        }

        let deficit = (target - queue.len() as i64).max(0);
        for _ in 0..deficit {
            if queue.send(TRAFFIC_ITEM).is_err() {
                return;
            }
            enqueued.fetch_add(1, Ordering::SeqCst);
        }

        thread::sleep(tick.saturating_sub(begin.elapsed()));
    }
}
