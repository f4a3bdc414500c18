use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{env_subst::substitute_env, schema::HeraldConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["herald.toml", "herald.yaml", "herald.yml", "herald.json"];

/// Database file name inside the data directory.
const DATABASE_FILENAME: &str = "herald.db";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<HeraldConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load the config at `path`, or discover one in the standard locations.
///
/// Search order:
/// 1. `./herald.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/herald/herald.{toml,yaml,yml,json}` (user-global)
///
/// Unlike a long-running service there are no usable defaults without a bot
/// token and a channel mapping, so a missing file is an error.
pub fn load_or_discover(path: Option<&Path>) -> anyhow::Result<(HeraldConfig, PathBuf)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => find_config_file().ok_or_else(|| {
            anyhow::anyhow!(
                "no config file found (looked for {} in ./ and {})",
                CONFIG_FILENAMES.join(", "),
                config_dir()
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|| "the user config directory".into())
            )
        })?,
    };
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((config, path))
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/herald/
    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/herald/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "herald").map(|d| d.config_dir().to_path_buf())
}

/// Returns the user data directory (`~/.local/share/herald/` on Linux).
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "herald")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Database file for `config`: the configured path, else `<data_dir>/herald.db`.
pub fn database_path(config: &HeraldConfig) -> PathBuf {
    config
        .database
        .path
        .clone()
        .unwrap_or_else(|| data_dir().join(DATABASE_FILENAME))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<HeraldConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.yaml");
        std::fs::write(
            &path,
            "bot:\n  token: \"123:ABC\"\ngroup_chat_id: -1001\nforward_mapping:\n  alpha: 10\n  \"@beta\": 20\nforward:\n  send_delay_ms: 250\n",
        )
        .unwrap();

        let (cfg, loaded_from) = load_or_discover(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(cfg.bot.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.group_chat_id, -1001);
        assert_eq!(cfg.forward.send_delay_ms, 250);
        assert_eq!(cfg.thread_map().get("beta"), Some(&20));
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(
            &path,
            r#"
group_chat_id = -1002

[bot]
token = "t"

[forward_mapping]
alpha = 10

[database]
path = "/tmp/herald-test.db"
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.group_chat_id, -1002);
        assert_eq!(
            database_path(&cfg),
            PathBuf::from("/tmp/herald-test.db")
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.ini");
        std::fs::write(&path, "x").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_or_discover(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn default_database_path_is_in_data_dir() {
        let cfg = HeraldConfig::default();
        assert_eq!(database_path(&cfg), data_dir().join("herald.db"));
    }
}
