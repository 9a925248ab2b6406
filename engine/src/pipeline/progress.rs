//! Progress side-channel
//!
//! Reporters are called synchronously between units of work and cannot
//! influence the run.

/// Receives percentage/message notifications during a run
pub trait ProgressReporter {
    fn report(&self, percent: u8, message: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(u8, &str),
{
    fn report(&self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Map `done` of `total` units onto the `start..=end` percentage band
pub(crate) fn band(start: u8, end: u8, done: usize, total: usize) -> u8 {
    if total == 0 || end <= start {
        return start;
    }
    let span = (end - start) as usize;
    start + (span * done.min(total) / total) as u8
}
