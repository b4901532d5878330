use std::path::{Path, PathBuf};

pub const FIXTURE_FILTER_ENV: &str = "HTML5_TREE_FIXTURE";
pub const MARKERS_ENV: &str = "HTML5_TREE_MARKERS";
pub const FIXTURE_ROOT_ENV: &str = "HTML5_TREE_FIXTURE_ROOT";
pub const SHOW_SKIPS_ENV: &str = "HTML5_TREE_SHOW_SKIPS";

/// Selection and reporting knobs for a conformance run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Only items whose id contains this substring run.
    pub fixture_filter: Option<String>,
    /// Every listed marker must be present on an item for it to run.
    pub markers: Vec<String>,
    pub fixture_root: Option<PathBuf>,
    pub show_skips: bool,
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            fixture_filter: non_empty(FIXTURE_FILTER_ENV),
            markers: non_empty(MARKERS_ENV)
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|marker| !marker.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            fixture_root: non_empty(FIXTURE_ROOT_ENV).map(PathBuf::from),
            show_skips: parse_bool(SHOW_SKIPS_ENV, lookup(SHOW_SKIPS_ENV).as_deref()),
        }
    }

    pub fn corpus_root(&self, default: &Path) -> PathBuf {
        self.fixture_root
            .clone()
            .unwrap_or_else(|| default.to_path_buf())
    }

    pub fn selects(&self, id: &str, markers: &[&str]) -> bool {
        if let Some(filter) = &self.fixture_filter
            && !id.contains(filter.as_str())
        {
            return false;
        }
        self.markers
            .iter()
            .all(|wanted| markers.contains(&wanted.as_str()))
    }
}

fn parse_bool(key: &str, value: Option<&str>) -> bool {
    match value {
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        Some("0") | Some("false") | Some("no") | Some("off") | Some("") | None => false,
        Some(other) => panic!("unsupported {key} value '{other}'; use 1/0 or true/false"),
    }
}
