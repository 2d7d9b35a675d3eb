//! Cache of asynchronously loaded resources
//!
//! A resource is requested with a callback. The first request for a key tells the
//! caller to start the load; later requests made while it runs only queue their
//! callback. When the load completes every queued callback runs with the value and
//! the value is kept, so further requests are answered at once.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Callback receiving a loaded value
pub type LoadCallback<V> = Box<dyn FnOnce(&V)>;

/// What the caller has to do after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    /// Nothing was cached: the caller must start loading the resource
    StartLoad,
    /// A load is already running; the callback runs when it completes
    Pending,
    /// The value was cached and the callback has already run
    Served,
}

enum Entry<V> {
    Loading(Vec<LoadCallback<V>>),
    Loaded(V),
}

/// Resources by key, with the callbacks waiting for the ones still loading
pub struct LoadCache<K, V> {
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> Default for LoadCache<K, V> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for LoadCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, entry) in &self.entries {
            match entry {
                Entry::Loading(waiters) => map.entry(key, &format!("loading ({} waiting)", waiters.len())),
                Entry::Loaded(_) => map.entry(key, &"loaded"),
            };
        }
        map.finish()
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug, V> LoadCache<K, V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the value of `key`
    ///
    /// # Arguments
    /// * `key` - Identifies the resource
    /// * `callback` - Receives the value, at once if it is cached
    ///
    /// # Returns
    /// Whether the caller has to start the load
    pub fn request(&mut self, key: K, callback: impl FnOnce(&V) + 'static) -> LoadRequest {
        match self.entries.get_mut(&key) {
            Some(Entry::Loaded(value)) => {
                callback(value);
                LoadRequest::Served
            }
            Some(Entry::Loading(waiters)) => {
                waiters.push(Box::new(callback));
                LoadRequest::Pending
            }
            None => {
                log::debug!("Loading resource {key:?}");
                self.entries.insert(key, Entry::Loading(vec![Box::new(callback)]));
                LoadRequest::StartLoad
            }
        }
    }

    /// Store the loaded value of `key` and run the callbacks waiting for it
    ///
    /// # Returns
    /// The number of callbacks that ran
    pub fn complete(&mut self, key: K, value: V) -> usize {
        let waiters = match self.entries.remove(&key) {
            Some(Entry::Loading(waiters)) => waiters,
            Some(Entry::Loaded(_)) => {
                log::warn!("Resource {key:?} was loaded twice; keeping the newer value");
                Vec::new()
            }
            None => Vec::new(),
        };
        let count = waiters.len();
        for waiter in waiters {
            waiter(&value);
        }
        log::debug!("Resource {key:?} loaded, {count} waiting callbacks served");
        self.entries.insert(key, Entry::Loaded(value));
        count
    }

    /// Give up a running load; the queued callbacks are dropped without running
    ///
    /// A later request starts a new load.
    pub fn fail(&mut self, key: &K) -> usize {
        match self.entries.get(key) {
            Some(Entry::Loading(waiters)) => {
                let count = waiters.len();
                self.entries.remove(key);
                log::warn!("Loading resource {key:?} failed, {count} callbacks dropped");
                count
            }
            _ => 0,
        }
    }

    /// The cached value of `key`
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.entries.get(key) {
            Some(Entry::Loaded(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether a load of `key` is running
    pub fn is_loading(&self, key: &K) -> bool {
        matches!(self.entries.get(key), Some(Entry::Loading(_)))
    }

    /// Forget a cached value; running loads are not affected
    pub fn evict(&mut self, key: &K) -> Option<V> {
        match self.entries.remove(key) {
            Some(Entry::Loaded(value)) => Some(value),
            Some(loading) => {
                self.entries.insert(key.clone(), loading);
                None
            }
            None => None,
        }
    }

    /// Number of cached values
    pub fn len(&self) -> usize {
        self.entries.values().filter(|entry| matches!(entry, Entry::Loaded(_))).count()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn FnOnce(&String)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let shared = log.clone();
        let make = move |tag: &'static str| {
            let log = shared.clone();
            Box::new(move |value: &String| log.borrow_mut().push(format!("{tag}:{value}"))) as Box<dyn FnOnce(&String)>
        };
        (log, make)
    }

    #[test]
    fn test_concurrent_requests_share_one_load() {
        let (log, callback) = recorder();
        let mut cache: LoadCache<&str, String> = LoadCache::new();

        assert_eq!(cache.request("ship.obj", callback("a")), LoadRequest::StartLoad);
        assert_eq!(cache.request("ship.obj", callback("b")), LoadRequest::Pending);
        assert!(cache.is_loading(&"ship.obj"));
        assert!(log.borrow().is_empty());

        assert_eq!(cache.complete("ship.obj", "mesh".to_string()), 2);
        assert_eq!(*log.borrow(), vec!["a:mesh", "b:mesh"]);
        assert_eq!(cache.get(&"ship.obj").map(String::as_str), Some("mesh"));
    }

    #[test]
    fn test_cached_value_is_served_immediately() {
        let (log, callback) = recorder();
        let mut cache: LoadCache<&str, String> = LoadCache::new();
        cache.request("sky.png", callback("first"));
        cache.complete("sky.png", "texture".to_string());

        assert_eq!(cache.request("sky.png", callback("late")), LoadRequest::Served);
        assert_eq!(log.borrow().last().map(String::as_str), Some("late:texture"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let (log, callback) = recorder();
        let mut cache: LoadCache<&str, String> = LoadCache::new();
        cache.request("missing.obj", callback("a"));
        assert_eq!(cache.fail(&"missing.obj"), 1);
        assert!(!cache.is_loading(&"missing.obj"));

        assert_eq!(cache.request("missing.obj", callback("b")), LoadRequest::StartLoad);
        cache.complete("missing.obj", "found".to_string());
        assert_eq!(*log.borrow(), vec!["b:found"]);
    }

    #[test]
    fn test_evict_keeps_running_loads() {
        let (_log, callback) = recorder();
        let mut cache: LoadCache<&str, String> = LoadCache::new();
        cache.request("a", callback("a"));
        assert_eq!(cache.evict(&"a"), None);
        assert!(cache.is_loading(&"a"));

        cache.complete("a", "value".to_string());
        assert_eq!(cache.evict(&"a"), Some("value".to_string()));
        assert!(cache.is_empty());
    }
}
