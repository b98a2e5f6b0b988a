//! Per-vehicle ingestion dispatch.
//!
//! Position reports for one vehicle are processed strictly in order by
//! a dedicated worker task, while different vehicles proceed in
//! parallel. Each vehicle has a small bounded queue; when a burst
//! outpaces processing, the oldest unprocessed report is dropped in
//! favor of the newer one, since only the latest position matters for
//! membership state.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use metrics::counter;
use tokio::sync::Notify;
use uuid::Uuid;

use domain::VehiclePosition;

/// Consumer of serialized position reports. Processing failures are
/// handled internally; the dispatcher never sees them.
#[async_trait::async_trait]
pub trait PositionProcessor: Send + Sync {
    async fn process(&self, position: VehiclePosition);
}

struct VehicleQueue {
    pending: Mutex<VecDeque<VehiclePosition>>,
    notify: Notify,
}

impl VehicleQueue {
    fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Enqueues a report, dropping the oldest pending one when full.
    /// Returns the number of reports dropped (0 or 1).
    fn push(&self, position: VehiclePosition, capacity: usize) -> usize {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut dropped = 0;
        if pending.len() >= capacity {
            pending.pop_front();
            dropped = 1;
        }
        pending.push_back(position);
        drop(pending);
        self.notify.notify_one();
        dropped
    }

    fn pop(&self) -> Option<VehiclePosition> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

/// Routes position reports to per-vehicle worker tasks.
pub struct IngestionDispatcher {
    processor: Arc<dyn PositionProcessor>,
    queues: DashMap<Uuid, Arc<VehicleQueue>>,
    queue_capacity: usize,
}

impl IngestionDispatcher {
    pub fn new(processor: Arc<dyn PositionProcessor>, queue_capacity: usize) -> Self {
        Self {
            processor,
            queues: DashMap::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Hands a report to the vehicle's worker, spawning the worker on
    /// first contact. Returns true when an older pending report was
    /// dropped to make room.
    pub fn submit(&self, position: VehiclePosition) -> bool {
        let queue = self
            .queues
            .entry(position.vehicle_id)
            .or_insert_with(|| {
                let queue = Arc::new(VehicleQueue::new());
                self.spawn_worker(position.vehicle_id, queue.clone());
                queue
            })
            .clone();

        let dropped = queue.push(position, self.queue_capacity);
        if dropped > 0 {
            counter!("fleetguard_positions_coalesced_total").increment(dropped as u64);
        }
        dropped > 0
    }

    /// Number of vehicles with an active worker.
    pub fn worker_count(&self) -> usize {
        self.queues.len()
    }

    fn spawn_worker(&self, vehicle_id: Uuid, queue: Arc<VehicleQueue>) {
        let processor = self.processor.clone();
        tokio::spawn(async move {
            tracing::debug!(vehicle_id = %vehicle_id, "Starting position worker");
            loop {
                match queue.pop() {
                    Some(position) => processor.process(position).await,
                    None => queue.notify.notified().await,
                }
            }
        });
    }
}
