//! Per-resource lifecycle states.

/// Lifecycle state of one song resource.
///
/// `Downloading` and `Deleting` are in-flight markers held in the manager's
/// state arena and act as the per-song mutex; `Present`/`NotPresent` are
/// derived from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    NotPresent,
    Downloading,
    Present,
    Deleting,
}

impl ResourceState {
    /// Whether an operation is currently in flight for the resource.
    pub fn is_busy(&self) -> bool {
        matches!(self, ResourceState::Downloading | ResourceState::Deleting)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ResourceState::Present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_states() {
        assert!(ResourceState::Downloading.is_busy());
        assert!(ResourceState::Deleting.is_busy());
        assert!(!ResourceState::Present.is_busy());
        assert!(!ResourceState::NotPresent.is_busy());

        assert!(ResourceState::Present.is_present());
        assert!(!ResourceState::Downloading.is_present());
    }
}
