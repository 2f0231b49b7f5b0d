// Keyed content store with lazy TTL expiry

use crate::config::CacheSettings;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// One remembered piece of content.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// First 100 chars of the original content, for diagnostics.
    preview: String,
    created_at: DateTime<Utc>,
    expire_at: DateTime<Utc>,
    hit_count: u64,
}

/// Cache statistics snapshot for monitoring.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub active_entries: usize,
    pub total_hits: u64,
}

/// Process-wide content cache.
///
/// All read-modify-write sequences (expire check, hit-count bump, store) run
/// under one lock; no cross-request transaction spans them.
pub struct ContentCache {
    settings: CacheSettings,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ContentCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Whether this content is worth caching at all.
    pub fn should_cache(&self, content: &str) -> bool {
        self.settings.enabled && content.len() > self.settings.min_chars
    }

    /// Stable key for a piece of content under a given model.
    pub fn key_for(content: &str, model: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        let hash = hex_prefix(&digest, 16);
        format!("cache_{}_{}", model, hash)
    }

    /// Look the content up. A live entry bumps its hit count and returns its
    /// key; an expired entry is purged on the spot.
    pub fn lookup(&self, content: &str, model: &str) -> Option<String> {
        let key = Self::key_for(content, model);
        let now = Utc::now();
        let mut entries = self.entries.lock();

        let live = match entries.get_mut(&key) {
            Some(entry) if now < entry.expire_at => {
                entry.hit_count += 1;
                debug!(key = %key, hits = entry.hit_count, "content cache hit");
                true
            }
            Some(_) => false,
            None => return None,
        };

        if live {
            Some(key)
        } else {
            let entry = entries.remove(&key);
            if let Some(entry) = entry {
                let age = now - entry.created_at;
                debug!(key = %key, age_hours = age.num_hours(), preview = %entry.preview, "content cache entry expired");
            }
            None
        }
    }

    /// Remember this content, returning its key.
    pub fn store(&self, content: &str, model: &str) -> String {
        let key = Self::key_for(content, model);
        let now = Utc::now();
        let preview: String = content.chars().take(100).collect();

        self.entries.lock().insert(
            key.clone(),
            CacheEntry {
                preview,
                created_at: now,
                expire_at: now + Duration::hours(self.settings.ttl_hours as i64),
                hit_count: 1,
            },
        );
        debug!(key = %key, chars = content.len(), "content cache stored");
        key
    }

    /// Counts for monitoring; prunes expired entries as a side effect.
    pub fn stats(&self) -> CacheStats {
        let mut entries = self.entries.lock();
        let now = Utc::now();
        entries.retain(|_, entry| now < entry.expire_at);
        CacheStats {
            active_entries: entries.len(),
            total_hits: entries.values().map(|entry| entry.hit_count).sum(),
        }
    }
}

/// Collapsed placeholder for content the backend already saw: the last few
/// lines keep recency context while dropping the bulk.
pub(crate) fn collapse_cached_content(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let tail = if lines.len() > 5 {
        lines[lines.len() - 5..].join("\n")
    } else {
        content.to_string()
    };
    format!("[Previous context cached] {}", tail)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut out = String::with_capacity(chars);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
        if out.len() >= chars {
            break;
        }
    }
    out.truncate(chars);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_settings() -> CacheSettings {
        CacheSettings {
            enabled: true,
            min_chars: 10,
            ttl_hours: 24,
        }
    }

    #[test]
    fn test_key_is_stable_and_model_scoped() {
        let a = ContentCache::key_for("some long content", "gemini-2.5-pro");
        let b = ContentCache::key_for("some long content", "gemini-2.5-pro");
        let c = ContentCache::key_for("some long content", "gemini-2.5-flash");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("cache_gemini-2.5-pro_"));
        // 16 hex chars of the digest
        assert_eq!(a.len(), "cache_gemini-2.5-pro_".len() + 16);
    }

    #[test]
    fn test_store_then_lookup_hits() {
        let cache = ContentCache::new(enabled_settings());
        let key = cache.store("a rather long piece of content", "gemini-2.5-pro");

        let hit = cache.lookup("a rather long piece of content", "gemini-2.5-pro");
        assert_eq!(hit, Some(key));
        assert!(cache
            .lookup("different content entirely here", "gemini-2.5-pro")
            .is_none());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let settings = CacheSettings {
            ttl_hours: 0,
            ..enabled_settings()
        };
        let cache = ContentCache::new(settings);
        cache.store("a rather long piece of content", "gemini-2.5-pro");

        assert!(cache
            .lookup("a rather long piece of content", "gemini-2.5-pro")
            .is_none());
        // purged, not just masked
        assert_eq!(cache.stats().active_entries, 0);
    }

    #[test]
    fn test_should_cache_threshold() {
        let cache = ContentCache::new(enabled_settings());
        assert!(!cache.should_cache("short"));
        assert!(cache.should_cache("definitely above the threshold"));

        let disabled = ContentCache::new(CacheSettings {
            enabled: false,
            ..enabled_settings()
        });
        assert!(!disabled.should_cache("definitely above the threshold"));
    }

    #[test]
    fn test_collapse_keeps_last_five_lines() {
        let content = "l1\nl2\nl3\nl4\nl5\nl6\nl7";
        let collapsed = collapse_cached_content(content);
        assert_eq!(collapsed, "[Previous context cached] l3\nl4\nl5\nl6\nl7");

        let short = collapse_cached_content("a\nb");
        assert_eq!(short, "[Previous context cached] a\nb");
    }

    #[test]
    fn test_stats_count_hits() {
        let cache = ContentCache::new(enabled_settings());
        cache.store("a rather long piece of content", "gemini-2.5-pro");
        cache.lookup("a rather long piece of content", "gemini-2.5-pro");
        cache.lookup("a rather long piece of content", "gemini-2.5-pro");

        let stats = cache.stats();
        assert_eq!(stats.active_entries, 1);
        assert_eq!(stats.total_hits, 3);
    }
}
