use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Coarse, time-boxed cache for rendered home-feed pages. Readers may see
/// a response up to `ttl` old; writes do not invalidate it. The TTL comes
/// from configuration, never from a process-wide mutable global.
#[derive(Clone)]
pub struct PageCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, CachedPage>>>,
}

struct CachedPage {
    stored_at: Instant,
    body: String,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, body: String) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
            entries.insert(
                key.to_string(),
                CachedPage {
                    stored_at: Instant::now(),
                    body,
                },
            );
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entries_are_served() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.put("home:1", "payload".into());
        assert_eq!(cache.get("home:1").as_deref(), Some("payload"));
        assert_eq!(cache.get("home:2"), None);
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = PageCache::new(Duration::ZERO);
        cache.put("home:1", "payload".into());
        assert_eq!(cache.get("home:1"), None);
    }

    #[test]
    fn put_evicts_expired_entries() {
        let cache = PageCache::new(Duration::from_millis(1));
        for n in 0..1000 {
            cache.put(&format!("home:{n}"), "payload".into());
        }
        std::thread::sleep(Duration::from_millis(20));
        cache.put("home:fresh", "payload".into());
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.get("home:fresh").as_deref(), Some("payload"));
    }

    #[test]
    fn clear_drops_everything() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.put("home:1", "payload".into());
        cache.clear();
        assert_eq!(cache.get("home:1"), None);
    }
}
