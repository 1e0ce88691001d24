use tracing::debug;

/// Read-once cache for data fetched from an external collaborator.
///
/// The block is read a single time per processing run and shared read-only
/// afterwards; a failed load leaves the cache empty so the next call retries.
#[derive(Debug)]
pub struct ReadCache<T> {
    label: &'static str,
    value: Option<T>,
    loads: usize,
}

impl<T> ReadCache<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: None,
            loads: 0,
        }
    }

    /// Returns the cached value, loading it with `load` on first use
    pub fn get_or_try_load<E, F>(&mut self, load: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let value = match self.value.take() {
            Some(value) => value,
            None => {
                debug!(cache = self.label, "cache miss, loading");
                let value = load()?;
                self.loads += 1;
                value
            }
        };
        Ok(self.value.insert(value))
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Drops the cached value, e.g. after the epoch names changed
    pub fn invalidate(&mut self) {
        if self.value.take().is_some() {
            debug!(cache = self.label, "cache invalidated");
        }
    }

    /// Number of successful loads since construction
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_once() {
        let mut cache = ReadCache::new("test");
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_try_load(|| {
                    calls += 1;
                    Ok::<_, ()>(42)
                })
                .unwrap();
            assert_eq!(*v, 42);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn failed_load_is_retried() {
        let mut cache: ReadCache<u32> = ReadCache::new("test");
        assert!(cache.get_or_try_load(|| Err("boom")).is_err());
        assert!(cache.get().is_none());
        assert_eq!(*cache.get_or_try_load(|| Ok::<_, &str>(7)).unwrap(), 7);
    }

    #[test]
    fn invalidate_forces_reload() {
        let mut cache = ReadCache::new("test");
        cache.get_or_try_load(|| Ok::<_, ()>(1)).unwrap();
        cache.invalidate();
        assert_eq!(*cache.get_or_try_load(|| Ok::<_, ()>(2)).unwrap(), 2);
        assert_eq!(cache.load_count(), 2);
    }
}
