//! Cursor over a metadata log.

/// Read position in a metadata log, optionally bounded by a stop offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    position: u64,
    limit: Option<u64>,
}

impl Cursor {
    /// Cursor at the start, unbounded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at `position`, unbounded
    #[must_use]
    pub fn at(position: u64) -> Self {
        Self {
            position,
            limit: None,
        }
    }

    /// Stop reading at `limit`
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Advance by `count` bytes
    pub fn move_forward(&mut self, count: u64) {
        self.position = self.position.saturating_add(count);
    }

    /// Current offset
    #[must_use]
    pub const fn pos(&self) -> u64 {
        self.position
    }

    /// Stop offset, if any
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Last readable offset for data of length `len`
    #[must_use]
    pub fn bound(&self, len: u64) -> u64 {
        self.limit.map_or(len, |limit| limit.min(len))
    }

    /// Whether nothing is left to read in data of length `len`
    #[must_use]
    pub fn is_exhausted(&self, len: u64) -> bool {
        self.position >= self.bound(len)
    }
}
