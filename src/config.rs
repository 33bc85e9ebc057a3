//! Saved default flags.
//!
//! Flags can be persisted as whitespace-separated tokens in a global
//! config file and a local `.alignsyncrc` override; the CLI merges
//! file flags under its own (`--save` writes, `--clear` removes).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Flags that can come from the CLI or a config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub json: bool,
    pub check: bool,
    pub debounce_ms: Option<u64>,
    pub recheck_ms: Option<u64>,
}

impl ConfigFlags {
    /// Merge two flag sets; `other` wins where both set a value.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            json: self.json || other.json,
            check: self.check || other.check,
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            recheck_ms: other.recheck_ms.or(self.recheck_ms),
        }
    }
}

/// Path of the global config file.
pub fn global_config_path() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("alignsync").join("config");
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("alignsync")
            .join("config");
    }
    PathBuf::from(".alignsyncrc")
}

/// Path of the per-directory override file.
pub fn local_override_path() -> PathBuf {
    PathBuf::from(".alignsyncrc")
}

/// Load flags from a config file; a missing file is an empty flag set.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Save flags as defaults.
///
/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# alignsync defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.json {
        lines.push("--json".to_string());
    }
    if flags.check {
        lines.push("--check".to_string());
    }
    if let Some(ms) = flags.debounce_ms {
        lines.push(format!("--debounce-ms {ms}"));
    }
    if let Some(ms) = flags.recheck_ms {
        lines.push(format!("--recheck-ms {ms}"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove saved defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from raw tokens, ignoring everything else.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--watch" {
            flags.watch = true;
        } else if token == "--json" {
            flags.json = true;
        } else if token == "--check" {
            flags.check = true;
        } else if token == "--debounce-ms" {
            if let Some(next) = tokens.get(i + 1) {
                flags.debounce_ms = next.parse().ok();
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--debounce-ms=") {
            flags.debounce_ms = value.parse().ok();
        } else if token == "--recheck-ms" {
            if let Some(next) = tokens.get(i + 1) {
                flags.recheck_ms = next.parse().ok();
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--recheck-ms=") {
            flags.recheck_ms = value.parse().ok();
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "alignsync",
            "--watch",
            "--json",
            "--debounce-ms",
            "80",
            "--recheck-ms=250",
            "page.html",
        ]));
        assert!(flags.watch);
        assert!(flags.json);
        assert!(!flags.check);
        assert_eq!(flags.debounce_ms, Some(80));
        assert_eq!(flags.recheck_ms, Some(250));
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_values() {
        let flags = parse_flag_tokens(&tokens(&["--debounce-ms", "soon"]));
        assert_eq!(flags.debounce_ms, None);
    }

    #[test]
    fn test_union_cli_wins_for_options() {
        let file = ConfigFlags {
            watch: true,
            debounce_ms: Some(100),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            json: true,
            debounce_ms: Some(25),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.watch);
        assert!(merged.json);
        assert_eq!(merged.debounce_ms, Some(25));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".alignsyncrc");
        let flags = ConfigFlags {
            watch: true,
            json: true,
            check: true,
            debounce_ms: Some(75),
            recheck_ms: Some(300),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }

    #[test]
    fn test_load_skips_comment_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".alignsyncrc");
        std::fs::write(&path, "# defaults\n--watch\n").unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert!(loaded.watch);
    }
}
