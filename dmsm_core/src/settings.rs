use std::path::{Path, PathBuf};
use std::time::Duration;

use getset::{CopyGetters, Getters};

use crate::prelude::*;

pub const DEFAULT_NAMESPACE: &str = "dmsm";
pub const DEFAULT_CONFIG_FILE_NAME: &str = "dmsm.toml";
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Host supplied knobs for the sign marker plugin.
///
/// Insert before the [MarkerService] shows up; the values are read once at
/// activation.
#[derive(Clone, Debug, CopyGetters, Getters, Resource)]
pub struct DmsmSettings {
    #[getset(get = "pub")]
    config_path: PathBuf,
    /// Prefix of every permission node, `<namespace>.<marker type id>`
    #[getset(get = "pub")]
    namespace: String,
    #[getset(get_copy = "pub")]
    sweep_interval: Duration,
    #[getset(get_copy = "pub")]
    persistent_markers: bool,
}

impl Default for DmsmSettings {
    fn default() -> Self {
        let config_path = default_config_path().unwrap_or_else(|e| {
            log::warn!("Could not work out config directory, using working directory: {e}");
            PathBuf::from(DEFAULT_CONFIG_FILE_NAME)
        });
        DmsmSettings {
            config_path,
            namespace: DEFAULT_NAMESPACE.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            persistent_markers: false,
        }
    }
}

impl DmsmSettings {
    pub fn with_config_path<P: Into<PathBuf>>(mut self, config_path: P) -> Self {
        self.config_path = config_path.into();
        self
    }

    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    pub fn with_persistent_markers(mut self, persistent_markers: bool) -> Self {
        self.persistent_markers = persistent_markers;
        self
    }

    pub fn permission_for(&self, marker_type_id: &str) -> String {
        format!("{}.{}", self.namespace, marker_type_id)
    }
}

/// `$XDG_CONFIG_HOME/dmsm/dmsm.toml`, falling back to `~/.config/dmsm/dmsm.toml`
pub fn default_config_path() -> std::io::Result<PathBuf> {
    let mut path = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            let home = homedir::get_my_home()
                .ok()
                .flatten()
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "No home directory"))?;
            Ok::<_, std::io::Error>(home.join(".config"))
        })?;
    path.push(DEFAULT_NAMESPACE);
    path.push(DEFAULT_CONFIG_FILE_NAME);
    Ok(path)
}

/// Ensures `path` has a parent directory to write into.
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            log::info!("Creating config directory {parent:?}");
            std::fs::create_dir_all(parent)
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn permission_nodes_use_namespace() {
        let settings = DmsmSettings::default().with_namespace("maps");
        assert_eq!(settings.permission_for("plots"), "maps.plots");
        assert_eq!(DmsmSettings::default().permission_for("shops"), "dmsm.shops");
    }

    #[test]
    fn defaults_sweep_every_five_minutes() {
        let settings = DmsmSettings::default();
        assert_eq!(settings.sweep_interval(), Duration::from_secs(300));
        assert!(!settings.persistent_markers());
    }

    #[test]
    fn parent_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("dmsm.toml");
        ensure_parent_dir(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        ensure_parent_dir(Path::new("dmsm.toml")).unwrap();
    }
}
