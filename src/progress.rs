//! Progress reporting for multi-file loads.
//!
//! Loaders report progress through a [`ProgressSink`], which is implemented
//! for plain closures, for [`NoProgress`] and for [`TracingProgress`].
use tracing::info;

/// Progress of a multi-slice load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceProgress {
    /// Number of slices parsed so far.
    pub completed: usize,
    /// Total number of slices of the load.
    pub total: usize,
}

impl SliceProgress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.
        } else {
            self.completed as f32 / self.total as f32
        }
    }

    /// Completed percentage in `[0, 100]`.
    pub fn percent(&self) -> f32 {
        self.fraction() * 100.
    }

    /// Whether every slice was parsed.
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Receiver of progress notifications.
///
/// Notifications may come from worker threads, but are never delivered
/// concurrently and `completed` never decreases.
pub trait ProgressSink: Sync {
    /// Called after each slice is parsed.
    fn on_progress(&self, progress: SliceProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(SliceProgress) + Sync,
{
    fn on_progress(&self, progress: SliceProgress) {
        self(progress)
    }
}

/// A sink discarding every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _: SliceProgress) {}
}

/// A sink logging each notification as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_progress(&self, progress: SliceProgress) {
        info!(
            completed = progress.completed,
            total = progress.total,
            "loaded {:.0}%",
            progress.percent()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fractions() {
        let p = SliceProgress { completed: 1, total: 4 };
        assert_eq!(p.fraction(), 0.25);
        assert_eq!(p.percent(), 25.);
        assert!(!p.is_complete());
        assert!(SliceProgress { completed: 4, total: 4 }.is_complete());
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: SliceProgress| seen.lock().unwrap().push(p.completed);
        sink.on_progress(SliceProgress { completed: 1, total: 2 });
        sink.on_progress(SliceProgress { completed: 2, total: 2 });
        NoProgress.on_progress(SliceProgress { completed: 2, total: 2 });
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
