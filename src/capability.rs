use crate::cache::{CountCache, STAR_COUNT_KEY};
use crate::config::{StarCount, StarfieldConfig};
use crate::controller::MIN_STAR_COUNT;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

/// Where the starting star count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    Configured,
    Cached,
    Device(DeviceClass),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialCount {
    pub count: usize,
    pub source: CountSource,
}

impl InitialCount {
    pub fn status_label(&self) -> String {
        match self.source {
            CountSource::Configured => format!("{} (configured)", self.count),
            CountSource::Cached => format!("{} (cached)", self.count),
            CountSource::Device(class) => format!("{} ({} default)", self.count, class.label()),
        }
    }
}

/// Coarse hardware class used only when no calibrated count is cached.
pub fn probe_device() -> DeviceClass {
    if let Ok(v) = std::env::var("STARFIELD_DEVICE") {
        match v.trim().to_ascii_lowercase().as_str() {
            "mobile" | "low" => return DeviceClass::Mobile,
            "desktop" | "high" => return DeviceClass::Desktop,
            _ => {}
        }
    }

    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if cores <= 4 {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

/// Starting count: the configured value capped at `max`, else the cached calibration result
/// clamped to `[100, max]`, else the device default.
pub fn resolve_initial_count(
    cfg: &StarfieldConfig,
    cache: Option<&dyn CountCache>,
    device: DeviceClass,
) -> InitialCount {
    let max = cfg.max_star_count as usize;
    if let StarCount::Fixed(n) = cfg.star_count {
        return InitialCount {
            count: (n as usize).min(max),
            source: CountSource::Configured,
        };
    }

    if let Some(cache) = cache {
        match cache.load(STAR_COUNT_KEY) {
            Ok(Some(v)) => {
                return InitialCount {
                    count: (v as usize).max(MIN_STAR_COUNT).min(max),
                    source: CountSource::Cached,
                };
            }
            Ok(None) => {}
            Err(err) => debug!("cached star count unavailable: {err}"),
        }
    }

    let fallback = match device {
        DeviceClass::Mobile => cfg.device_detection.mobile,
        DeviceClass::Desktop => cfg.device_detection.desktop,
    };
    InitialCount {
        count: (fallback as usize).clamp(1, max.max(1)),
        source: CountSource::Device(device),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCountCache};

    struct FailingCache;

    impl CountCache for FailingCache {
        fn load(&self, _key: &str) -> Result<Option<u32>, CacheError> {
            Err(CacheError::Io("denied".into()))
        }

        fn save(&mut self, _key: &str, _value: u32) -> Result<(), CacheError> {
            Err(CacheError::Io("denied".into()))
        }
    }

    #[test]
    fn fixed_count_wins() {
        let cfg = StarfieldConfig {
            star_count: StarCount::Fixed(42),
            ..StarfieldConfig::default()
        };
        let got = resolve_initial_count(&cfg, None, DeviceClass::Desktop);
        assert_eq!(got.count, 42);
        assert_eq!(got.source, CountSource::Configured);

        let cfg = StarfieldConfig {
            star_count: StarCount::Fixed(10_000),
            max_star_count: 500,
            ..StarfieldConfig::default()
        };
        let got = resolve_initial_count(&cfg, None, DeviceClass::Desktop);
        assert_eq!(got.count, 500);
        assert_eq!(got.source, CountSource::Configured);
    }

    #[test]
    fn cached_value_is_clamped() {
        let cfg = StarfieldConfig {
            max_star_count: 800,
            ..StarfieldConfig::default()
        };
        let mut cache = MemoryCountCache::new();
        cache.save(STAR_COUNT_KEY, 20_000).unwrap();
        let got = resolve_initial_count(&cfg, Some(&cache), DeviceClass::Mobile);
        assert_eq!(got.count, 800);
        assert_eq!(got.source, CountSource::Cached);

        cache.save(STAR_COUNT_KEY, 5).unwrap();
        let got = resolve_initial_count(&cfg, Some(&cache), DeviceClass::Mobile);
        assert_eq!(got.count, MIN_STAR_COUNT);
    }

    #[test]
    fn cache_errors_fall_back_to_device() {
        let cfg = StarfieldConfig::default();
        let got = resolve_initial_count(&cfg, Some(&FailingCache), DeviceClass::Mobile);
        assert_eq!(got.count, cfg.device_detection.mobile as usize);
        assert_eq!(got.source, CountSource::Device(DeviceClass::Mobile));

        let got = resolve_initial_count(&cfg, None, DeviceClass::Desktop);
        assert_eq!(got.count, cfg.device_detection.desktop as usize);
        assert_eq!(got.status_label(), "1000 (desktop default)");
    }
}
