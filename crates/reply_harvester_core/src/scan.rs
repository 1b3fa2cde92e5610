use harvest_logging::{harvest_debug, harvest_trace};
use serde_json::Value;

/// Key under which the source nests arrays of reply fragments.
pub const DEFAULT_CONTAINER_KEY: &str = "thread_items";
const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub container_key: String,
    /// Nodes deeper than this are not visited.
    pub max_depth: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            container_key: DEFAULT_CONTAINER_KEY.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Counters for one or more scans; only used for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub blobs_seen: usize,
    pub blobs_in_scope: usize,
    pub blobs_malformed: usize,
    pub fragments: usize,
}

impl std::ops::AddAssign for ScanStats {
    fn add_assign(&mut self, other: Self) {
        self.blobs_seen += other.blobs_seen;
        self.blobs_in_scope += other.blobs_in_scope;
        self.blobs_malformed += other.blobs_malformed;
        self.fragments += other.fragments;
    }
}

/// Finds candidate post fragments inside captured payload blobs.
#[derive(Debug, Clone)]
pub struct PayloadScanner {
    root_code: String,
    settings: ScanSettings,
}

impl PayloadScanner {
    pub fn new(root_code: impl Into<String>, settings: ScanSettings) -> Self {
        Self {
            root_code: root_code.into(),
            settings,
        }
    }

    /// Cheap substring pre-filter run before any JSON parsing.
    pub fn is_in_scope(&self, blob: &str) -> bool {
        blob.contains(self.root_code.as_str()) && blob.contains(self.settings.container_key.as_str())
    }

    /// Lazily yields every element of every container array found in the
    /// in-scope blobs. Blobs that are out of scope or not valid JSON are skipped.
    pub fn scan<'a>(
        &'a self,
        blobs: &'a [String],
        stats: &'a mut ScanStats,
    ) -> impl Iterator<Item = Value> + 'a {
        blobs
            .iter()
            .filter_map(move |blob| {
                stats.blobs_seen += 1;
                if !self.is_in_scope(blob) {
                    harvest_trace!("Skipping out-of-scope blob ({} bytes)", blob.len());
                    return None;
                }
                stats.blobs_in_scope += 1;
                match serde_json::from_str::<Value>(blob) {
                    Ok(value) => {
                        let fragments = self.fragments_in(value);
                        stats.fragments += fragments.len();
                        Some(fragments)
                    }
                    Err(err) => {
                        stats.blobs_malformed += 1;
                        harvest_debug!("Skipping malformed blob ({} bytes): {}", blob.len(), err);
                        None
                    }
                }
            })
            .flatten()
    }

    /// All elements of all container arrays within one parsed payload.
    pub fn fragments_in(&self, value: Value) -> Vec<Value> {
        let mut containers = Vec::new();
        collect_containers(
            &value,
            &self.settings.container_key,
            0,
            self.settings.max_depth,
            &mut containers,
        );
        containers
            .into_iter()
            .filter_map(|container| match container {
                Value::Array(items) => Some(items.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

/// Depth-first walk collecting every value stored under `key`, including
/// containers nested inside other containers.
fn collect_containers<'v>(
    value: &'v Value,
    key: &str,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<&'v Value>,
) {
    if depth > max_depth {
        harvest_trace!("Depth limit {} reached, not descending further", max_depth);
        return;
    }
    match value {
        Value::Object(map) => {
            for (k, child) in map {
                if k == key {
                    out.push(child);
                }
                collect_containers(child, key, depth + 1, max_depth, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_containers(child, key, depth + 1, max_depth, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{PayloadScanner, ScanSettings, ScanStats};
    use serde_json::json;

    fn scanner() -> PayloadScanner {
        PayloadScanner::new("abc123", ScanSettings::default())
    }

    #[test]
    fn prefilter_needs_code_and_marker() {
        let s = scanner();
        assert!(s.is_in_scope(r#"{"code":"abc123","thread_items":[]}"#));
        assert!(!s.is_in_scope(r#"{"code":"abc123"}"#));
        assert!(!s.is_in_scope(r#"{"thread_items":[]}"#));
    }

    #[test]
    fn nested_containers_are_all_found() {
        let value = json!({
            "data": {
                "thread_items": [
                    {"post": {"id": "1"}, "thread_items": [{"post": {"id": "2"}}]}
                ],
                "deeper": [{"x": {"thread_items": [{"post": {"id": "3"}}]}}]
            }
        });
        let fragments = scanner().fragments_in(value);
        let ids: Vec<_> = fragments
            .iter()
            .filter_map(|f| f.pointer("/post/id").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn non_array_container_yields_nothing() {
        let value = json!({"thread_items": {"post": {"id": "1"}}});
        assert!(scanner().fragments_in(value).is_empty());
    }

    #[test]
    fn depth_limit_stops_descent() {
        let settings = ScanSettings {
            max_depth: 2,
            ..ScanSettings::default()
        };
        let value = json!({"a": {"b": {"c": {"thread_items": [1]}}}});
        assert!(PayloadScanner::new("x", settings).fragments_in(value).is_empty());
    }

    #[test]
    fn malformed_blob_is_skipped_and_scan_continues() {
        let blobs = vec![
            r#"{"code":"abc123","thread_items":[{"post":"#.to_string(),
            "telemetry ping".to_string(),
            r#"{"code":"abc123","thread_items":[{"n":1},{"n":2}]}"#.to_string(),
        ];
        let s = scanner();
        let mut stats = ScanStats::default();
        let found: Vec<_> = s.scan(&blobs, &mut stats).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(
            stats,
            ScanStats {
                blobs_seen: 3,
                blobs_in_scope: 2,
                blobs_malformed: 1,
                fragments: 2,
            }
        );
    }
}
