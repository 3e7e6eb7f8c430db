use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Two buffers: the logic side fills the back one while readers hold the
/// front one. `swap` publishes the back buffer.
///
/// A writer that wants the buffer a slow reader still holds waits for that
/// reader, so a reader never observes a half-written value.
pub struct DoubleBuffer<T> {
    buffers: [RwLock<T>; 2],
    front: AtomicUsize,
}

impl<T: Default> Default for DoubleBuffer<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default())
    }
}

impl<T> DoubleBuffer<T> {
    pub fn new(front: T, back: T) -> Self {
        Self {
            buffers: [RwLock::new(front), RwLock::new(back)],
            front: AtomicUsize::new(0),
        }
    }

    fn front_index(&self) -> usize {
        self.front.load(Ordering::Acquire)
    }

    /// Mutate the back buffer.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let back = 1 - self.front_index();
        f(&mut self.buffers[back].write())
    }

    /// Make the back buffer the front one.
    pub fn swap(&self) {
        self.front.fetch_xor(1, Ordering::AcqRel);
    }

    /// The last published value.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.buffers[self.front_index()].read()
    }
}

/// Logic-side end of a frame handoff.
pub struct FramePublisher<T> {
    buffer: Arc<DoubleBuffer<T>>,
    ready: Sender<u64>,
}

/// Presentation-side end of a frame handoff.
pub struct FrameSubscriber<T> {
    buffer: Arc<DoubleBuffer<T>>,
    ready: Receiver<u64>,
}

/// A double buffer plus a notification channel of published steps.
///
/// Notifications never block the publisher: if the subscriber has not
/// consumed the last one, the new one is dropped and the subscriber simply
/// reads the newest frame.
pub fn frame_channel<T: Default>() -> (FramePublisher<T>, FrameSubscriber<T>) {
    let buffer = Arc::new(DoubleBuffer::default());
    let (tx, rx) = bounded(1);
    (
        FramePublisher {
            buffer: Arc::clone(&buffer),
            ready: tx,
        },
        FrameSubscriber { buffer, ready: rx },
    )
}

impl<T> FramePublisher<T> {
    /// Fill the back buffer, swap, and notify the subscriber.
    pub fn publish(&self, step: u64, fill: impl FnOnce(&mut T)) {
        self.buffer.write(fill);
        self.present(step);
    }

    /// Swap an already filled back buffer and notify the subscriber.
    pub fn present(&self, step: u64) {
        self.buffer.swap();
        match self.ready.try_send(step) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                tracing::trace!(step, "frame subscriber gone");
            }
        }
    }

    pub fn buffer(&self) -> &DoubleBuffer<T> {
        &self.buffer
    }
}

impl<T> FrameSubscriber<T> {
    /// Wait for the next published step. `None` on timeout or once the
    /// publisher is gone.
    pub fn wait_next(&self, timeout: Duration) -> Option<u64> {
        match self.ready.recv_timeout(timeout) {
            Ok(step) => Some(step),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn latest(&self) -> RwLockReadGuard<'_, T> {
        self.buffer.read()
    }
}
