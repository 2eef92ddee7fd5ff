// src/config.rs
//! Run configuration, built once at startup and passed by value.
//!
//! Resolution order: $TENDER_CONFIG_PATH (TOML or JSON) ->
//! config/tender_watch.toml -> config/tender_watch.json -> compiled defaults.
//! `TENDER_KEYWORDS` and `TENDER_WINDOW_MINUTES` override single values.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "TENDER_CONFIG_PATH";
const ENV_KEYWORDS: &str = "TENDER_KEYWORDS";
const ENV_WINDOW: &str = "TENDER_WINDOW_MINUTES";

pub const DEFAULT_WINDOW_MINUTES: i64 = 90;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct WatchConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_window")]
    pub window_minutes: i64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            keywords: default_keywords(),
            window_minutes: default_window(),
        }
    }
}

fn default_window() -> i64 {
    DEFAULT_WINDOW_MINUTES
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            id: "ted".into(),
            url: "https://ted.europa.eu/en/search/result/rss".into(),
        },
        SourceConfig {
            id: "sam".into(),
            url: "https://api.sam.gov/opportunities/v2/search".into(),
        },
    ]
}

fn default_keywords() -> Vec<String> {
    ["namiot", "kontener", "klimatyzacja", "tent", "container", "hvac"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl WatchConfig {
    /// Load from the env-pointed path or the config/ fallbacks; missing files
    /// mean compiled defaults, not an error.
    pub fn load_default() -> Result<Self> {
        let mut cfg = match resolve_path()? {
            Some(p) => Self::load_from(&p)?,
            None => Self::default(),
        };
        cfg.apply_env_overrides()?;
        cfg.keywords = clean_keywords(cfg.keywords);
        Ok(cfg)
    }

    /// Load from an explicit path. Format chosen by extension, JSON for
    /// `.json`, TOML otherwise.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if ext == "json" {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing json config {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("parsing toml config {}", path.display()))
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(kw) = std::env::var(ENV_KEYWORDS) {
            self.keywords = kw.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(w) = std::env::var(ENV_WINDOW) {
            self.window_minutes = w
                .trim()
                .parse()
                .map_err(|_| anyhow!("{ENV_WINDOW} is not a number: {w:?}"))?;
        }
        Ok(())
    }
}

fn resolve_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_PATH} points to a non-existent path"));
    }
    for p in ["config/tender_watch.toml", "config/tender_watch.json"] {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
    }
    Ok(None)
}

/// Trim, drop empties, drop repeats; keeps the configured order.
fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_string();
        if !t.is_empty() && seen.insert(t.clone()) {
            out.push(t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn keywords_are_trimmed_deduped_and_ordered() {
        let got = clean_keywords(vec![
            " namiot ".into(),
            "".into(),
            "hvac".into(),
            "namiot".into(),
        ]);
        assert_eq!(got, vec!["namiot".to_string(), "hvac".to_string()]);
    }

    #[test]
    fn toml_and_json_configs_parse() {
        let toml_cfg: WatchConfig = toml::from_str(
            r#"
            window_minutes = 120
            keywords = ["tent"]
            [[sources]]
            id = "a"
            url = "https://a.test/rss"
            "#,
        )
        .unwrap();
        assert_eq!(toml_cfg.window_minutes, 120);
        assert_eq!(toml_cfg.sources.len(), 1);

        let json_cfg: WatchConfig = serde_json::from_str(
            r#"{"sources":[{"id":"b","url":"https://b.test/api"}]}"#,
        )
        .unwrap();
        assert_eq!(json_cfg.window_minutes, DEFAULT_WINDOW_MINUTES);
        assert_eq!(json_cfg.sources[0].id, "b");
    }

    #[serial_test::serial]
    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_PATH);
        env::remove_var(ENV_KEYWORDS);
        env::remove_var(ENV_WINDOW);

        let cfg = WatchConfig::load_default().unwrap();
        assert_eq!(cfg.window_minutes, DEFAULT_WINDOW_MINUTES);
        assert!(!cfg.sources.is_empty());
        assert!(!cfg.keywords.is_empty());

        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_take_precedence() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_PATH);
        env::set_var(ENV_KEYWORDS, "agregat, wiata ,agregat");
        env::set_var(ENV_WINDOW, "30");

        let cfg = WatchConfig::load_default().unwrap();
        assert_eq!(cfg.keywords, vec!["agregat".to_string(), "wiata".to_string()]);
        assert_eq!(cfg.window_minutes, 30);

        env::remove_var(ENV_KEYWORDS);
        env::remove_var(ENV_WINDOW);
        env::set_current_dir(&old).unwrap();
    }
}
