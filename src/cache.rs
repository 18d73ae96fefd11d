use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Namespaced key for the last calibrated star count.
pub const STAR_COUNT_KEY: &str = "tui_starfield.optimal_star_count";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    Io(String),
    Parse { line: usize, message: String },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
        }
    }
}

impl std::error::Error for CacheError {}

/// Key/value store for calibrated counts. Callers treat every error as a
/// cache miss.
pub trait CountCache {
    fn load(&self, key: &str) -> Result<Option<u32>, CacheError>;
    fn save(&mut self, key: &str, value: u32) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCountCache {
    values: HashMap<String, u32>,
}

impl MemoryCountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.values.get(key).copied()
    }
}

impl CountCache for MemoryCountCache {
    fn load(&self, key: &str) -> Result<Option<u32>, CacheError> {
        Ok(self.get(key))
    }

    fn save(&mut self, key: &str, value: u32) -> Result<(), CacheError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// `key=value` text file, rewritten atomically on every save.
#[derive(Debug, Clone)]
pub struct FileCountCache {
    path: PathBuf,
}

impl FileCountCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file under the user's config directory, if one can be resolved.
    pub fn open_default() -> Option<Self> {
        cache_storage_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<(String, u32)>, CacheError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CacheError::Io(err.to_string())),
        };

        let mut entries = Vec::new();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(CacheError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let value = value.trim().parse::<u32>().map_err(|_| CacheError::Parse {
                line: line_no,
                message: format!("'{}' is not an unsigned integer", value.trim()),
            })?;
            entries.push((key.trim().to_string(), value));
        }
        Ok(entries)
    }
}

impl CountCache for FileCountCache {
    fn load(&self, key: &str) -> Result<Option<u32>, CacheError> {
        Ok(self
            .read_all()?
            .into_iter()
            .rev()
            .find_map(|(k, v)| (k == key).then_some(v)))
    }

    fn save(&mut self, key: &str, value: u32) -> Result<(), CacheError> {
        // An unreadable file is replaced rather than blocking the save.
        let mut entries = self.read_all().unwrap_or_default();
        entries.retain(|(k, _)| k != key);
        entries.push((key.to_string(), value));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io(e.to_string()))?;
        }
        let mut body = String::from("# tui_starfield cache v1\n");
        for (k, v) in &entries {
            body.push_str(&format!("{k}={v}\n"));
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &body).map_err(|e| CacheError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| CacheError::Io(e.to_string()))
    }
}

pub fn cache_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("tui_starfield").join("cache.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("tui_starfield")
            .join("cache.txt"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(name: &str) -> FileCountCache {
        let dir = std::env::temp_dir().join(format!(
            "tui_starfield_cache_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        FileCountCache::new(dir.join("cache.txt"))
    }

    #[test]
    fn missing_file_is_a_miss() {
        let cache = temp_cache("missing");
        assert_eq!(cache.load(STAR_COUNT_KEY), Ok(None));
    }

    #[test]
    fn save_then_load() {
        let mut cache = temp_cache("roundtrip");
        cache.save(STAR_COUNT_KEY, 1234).expect("save");
        cache.save("other.key", 7).expect("save");
        cache.save(STAR_COUNT_KEY, 900).expect("overwrite");
        assert_eq!(cache.load(STAR_COUNT_KEY), Ok(Some(900)));
        assert_eq!(cache.load("other.key"), Ok(Some(7)));
        let _ = std::fs::remove_dir_all(cache.path().parent().unwrap());
    }

    #[test]
    fn garbage_reports_parse_error() {
        let cache = temp_cache("garbage");
        std::fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        std::fs::write(cache.path(), "tui_starfield.optimal_star_count=lots\n").unwrap();
        let err = cache.load(STAR_COUNT_KEY).expect_err("should fail");
        assert!(matches!(err, CacheError::Parse { line: 1, .. }));
        let _ = std::fs::remove_dir_all(cache.path().parent().unwrap());
    }
}
