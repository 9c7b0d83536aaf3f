use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub(crate) const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) port: u16,
    pub(crate) static_dir: PathBuf,
    pub(crate) log_filter: String,
    /// Fixed seed for challenge and message picks; entropy when unset.
    pub(crate) seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("public"),
            log_filter: "info".to_string(),
            seed: None,
        }
    }
}

pub(crate) struct Paths {
    pub(crate) save_path: PathBuf,
    pub(crate) lock_path: PathBuf,
    pub(crate) config_path: PathBuf,
}

impl Paths {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            save_path: dir.join("save.json"),
            lock_path: dir.join("save.json.lock"),
            config_path: dir.join("config.json"),
        }
    }
}

pub(crate) fn project_paths(data_dir: Option<&Path>) -> Result<Paths> {
    let dir = match data_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "victory-road", "VictoryRoad")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data directory {}", dir.display()))?;
    Ok(Paths::in_dir(&dir))
}

pub(crate) fn load_config(path: &Path) -> AppConfig {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<AppConfig>(&s) {
            return v;
        }
    }
    AppConfig::default()
}

pub(crate) fn save_config_atomic(path: &Path, c: &AppConfig) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(c)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

/// `--port` wins over `PORT`, which wins over the config file.
pub(crate) fn resolve_port(flag: Option<u16>, env: Option<&str>, config: &AppConfig) -> u16 {
    flag.or_else(|| env.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(config.port)
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    // rename-over-existing fails on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_or_broken_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(load_config(&path), AppConfig::default());
        fs::write(&path, "port = 3000").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "port": 8080, "seed": 9 }"#).unwrap();
        let c = load_config(&path);
        assert_eq!(c.port, 8080);
        assert_eq!(c.seed, Some(9));
        assert_eq!(c.log_filter, "info");
    }

    #[test]
    fn saved_config_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let c = AppConfig {
            port: 4100,
            ..AppConfig::default()
        };
        save_config_atomic(&path, &c).unwrap();
        assert_eq!(load_config(&path), c);
    }

    #[test]
    fn port_precedence() {
        let c = AppConfig {
            port: 5000,
            ..AppConfig::default()
        };
        assert_eq!(resolve_port(Some(1), Some("2"), &c), 1);
        assert_eq!(resolve_port(None, Some("2"), &c), 2);
        assert_eq!(resolve_port(None, Some("nope"), &c), 5000);
        assert_eq!(resolve_port(None, None, &AppConfig::default()), DEFAULT_PORT);
    }

    #[test]
    fn explicit_data_dir_is_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let paths = project_paths(Some(&nested)).unwrap();
        assert!(nested.is_dir());
        assert_eq!(paths.save_path, nested.join("save.json"));
    }
}
