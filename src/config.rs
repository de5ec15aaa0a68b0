//! Scan options

/// Options for a directory scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Number of matcher workers (at least 1)
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
        }
    }
}

impl ScanOptions {
    /// Creates options with the default worker count
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count; zero is raised to one
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Capacity of the path queue between the walker and the workers
    pub fn queue_capacity(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_available_cpus() {
        let options = ScanOptions::default();
        assert_eq!(options.workers, num_cpus::get().max(1));
        assert_eq!(options.queue_capacity(), options.workers);
    }

    #[test]
    fn test_with_workers_clamps_zero() {
        assert_eq!(ScanOptions::new().with_workers(0).workers, 1);
        assert_eq!(ScanOptions::new().with_workers(4).queue_capacity(), 4);
    }
}
