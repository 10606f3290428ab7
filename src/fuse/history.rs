/// Sliding window of melt timestamps, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MeltHistory {
    melts: Vec<u64>,
}

impl MeltHistory {
    pub(crate) fn new(melts: Vec<u64>) -> Self {
        Self { melts }
    }

    /// Append a melt and drop everything that fell out of the window
    ///
    /// A melt at `ts` stays while `now - ts < window_ms`. Timestamps from the
    /// future (clock skew between writers) are kept.
    pub(crate) fn record(&mut self, now: u64, window_ms: u64) {
        self.melts.push(now);
        self.melts
            .retain(|&ts| now.saturating_sub(ts) < window_ms);
    }

    pub(crate) fn len(&self) -> usize {
        self.melts.len()
    }

    pub(crate) fn as_slice(&self) -> &[u64] {
        &self.melts
    }
}
