use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::frame::Frame;

pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Bounded FIFO handing frames from the read loop to the poller.
///
/// `push` never blocks the producer: at capacity the oldest frame is
/// evicted to make room, which caps how stale the consumer can run.
/// Order out equals order in.
pub struct FrameQueue {
    frames: Mutex<VecDeque<Frame>>,
    capacity: usize,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Insert a frame, evicting and returning the oldest one when at
    /// capacity.
    pub fn push(&self, frame: Frame) -> Option<Frame> {
        let mut frames = self.lock();
        let evicted = if frames.len() >= self.capacity {
            frames.pop_front()
        } else {
            None
        };
        frames.push_back(frame);
        evicted
    }

    /// Remove and return the oldest frame, if any. Never blocks.
    pub fn try_pop(&self) -> Option<Frame> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
