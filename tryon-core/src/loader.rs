//! Load-once cache for heavyweight resources such as the landmark model.

use std::{
    collections::HashMap,
    error::Error as StdError,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use log::{debug, warn};
use thiserror::Error;
use tryon_utils::timing_guard;

type LoadFn<T> = dyn Fn(&str) -> anyhow::Result<T> + Send + Sync;
type Slot<T> = Arc<Mutex<Option<Arc<T>>>>;

/// Failure raised by [`ResourceLoader::ensure`].
#[derive(Debug, Error)]
#[error("failed to load resource: {source_id}")]
pub struct LoadError {
    pub source_id: String,
    #[source]
    cause: Box<dyn StdError + Send + Sync + 'static>,
}

/// Loads each resource once per exact source identifier and shares it afterwards.
///
/// Failed loads are not remembered (their slot is dropped), so the next `ensure` for that source
/// tries again. Concurrent callers asking for the same source wait for the one load in progress.
pub struct ResourceLoader<T> {
    load: Box<LoadFn<T>>,
    slots: Mutex<HashMap<String, Slot<T>>>,
    loads: AtomicUsize,
}

impl<T> ResourceLoader<T> {
    pub fn new<F>(load: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            load: Box::new(load),
            slots: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the resource for `source`, loading it if no earlier call succeeded.
    pub fn ensure(&self, source: &str) -> Result<Arc<T>, LoadError> {
        let slot = self
            .lock_slots()
            .entry(source.to_string())
            .or_default()
            .clone();

        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(resource) = guard.as_ref() {
            return Ok(resource.clone());
        }

        let _timer = timing_guard(format!("tryon_core::load {source}"), log::Level::Debug);
        self.loads.fetch_add(1, Ordering::SeqCst);
        debug!("Loading resource {source}");
        match (self.load)(source) {
            Ok(resource) => {
                let resource = Arc::new(resource);
                *guard = Some(resource.clone());
                // A waiter may be filling a slot already dropped after an earlier failure.
                self.lock_slots()
                    .entry(source.to_string())
                    .or_insert_with(|| slot.clone());
                Ok(resource)
            }
            Err(err) => {
                warn!("Loading resource {source} failed: {err:#}");
                let mut slots = self.lock_slots();
                if slots.get(source).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                    slots.remove(source);
                }
                Err(LoadError {
                    source_id: source.to_string(),
                    cause: err.into(),
                })
            }
        }
    }

    /// Whether `source` has been loaded successfully.
    pub fn is_loaded(&self, source: &str) -> bool {
        let slot = self.lock_slots().get(source).cloned();
        slot.is_some_and(|slot| {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
        })
    }

    /// Number of load attempts actually performed, successful or not.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Never held while waiting on a slot.
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for ResourceLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("load_count", &self.load_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};

    #[test]
    fn same_source_loads_once() {
        let loader = ResourceLoader::new(|source: &str| Ok(source.len()));

        let first = loader.ensure("models/a.onnx").expect("first");
        let second = loader.ensure("models/a.onnx").expect("second");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.load_count(), 1);
        assert!(loader.is_loaded("models/a.onnx"));
    }

    #[test]
    fn sources_are_keyed_exactly() {
        let loader = ResourceLoader::new(|source: &str| Ok(source.to_string()));
        loader.ensure("models/a.onnx").expect("a");
        loader.ensure("./models/a.onnx").expect("dot a");
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let loader = ResourceLoader::<u8>::new(|_| anyhow::bail!("disk on fire"));

        let err = loader.ensure("broken.onnx").unwrap_err();
        assert_eq!(err.to_string(), "failed to load resource: broken.onnx");
        assert_eq!(err.source_id, "broken.onnx");
        assert!(StdError::source(&err).is_some());
        assert!(!loader.is_loaded("broken.onnx"));

        assert!(loader.ensure("broken.onnx").is_err());
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn failed_sources_leave_no_slot_behind() {
        let loader = ResourceLoader::new(|source: &str| -> anyhow::Result<usize> {
            anyhow::ensure!(source.ends_with(".onnx"), "not a model");
            Ok(source.len())
        });

        assert!(loader.ensure("notes.txt").is_err());
        assert!(loader.ensure("face.onnx").is_ok());
        let slots = loader.lock_slots();
        assert_eq!(slots.len(), 1);
        assert!(slots.contains_key("face.onnx"));
    }

    #[test]
    fn concurrent_callers_share_one_load() {
        let loader = Arc::new(ResourceLoader::new(|_: &str| {
            thread::sleep(Duration::from_millis(50));
            Ok(7u32)
        }));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let loader = loader.clone();
                thread::spawn(move || *loader.ensure("shared").expect("load"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("join"), 7);
        }
        assert_eq!(loader.load_count(), 1);
    }
}
