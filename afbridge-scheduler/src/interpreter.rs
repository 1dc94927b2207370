//! Interpreter locations per platform
//!
//! `__PDG_PYTHON__` and `__PDG_HYTHON__` resolve through a static strategy
//! table keyed by platform. `PDG_PYTHON` / `PDG_HYTHON` in the environment
//! override the table.

use std::collections::HashMap;

use afbridge_core::tokens;

/// Platform family of the host a command will be resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    /// Parses a platform identifier (`linux*`, `darwin`, `mac*`, `win*`)
    pub fn parse(identifier: &str) -> Self {
        let identifier = identifier.to_ascii_lowercase();
        if identifier.starts_with("win") {
            Platform::Windows
        } else if identifier.starts_with("darwin") || identifier.starts_with("mac") {
            Platform::MacOs
        } else if identifier.starts_with("linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Platform this process runs on
    pub fn current() -> Self {
        Self::parse(std::env::consts::OS)
    }
}

/// Variables interpreter paths are expanded against
#[derive(Debug, Clone, Default)]
pub struct InterpreterEnv {
    hfs: Option<String>,
    vars: HashMap<String, String>,
}

impl InterpreterEnv {
    /// # Arguments
    /// * `hfs` - Configured HFS location; takes precedence over `$HFS` in `vars`
    /// * `vars` - Environment variables
    pub fn new(hfs: Option<String>, vars: HashMap<String, String>) -> Self {
        Self { hfs, vars }
    }

    /// Snapshot of the process environment
    pub fn from_process(hfs: Option<String>) -> Self {
        Self::new(hfs, std::env::vars().collect())
    }

    pub fn var(&self, name: &str) -> Option<String> {
        if name == tokens::env::HFS {
            if let Some(hfs) = &self.hfs {
                return Some(hfs.clone());
            }
        }
        self.vars.get(name).cloned()
    }

    /// Expands `$VAR` / `${VAR}`, leaving unknown variables untouched
    pub fn expand(&self, template: &str) -> String {
        shellexpand::env_with_context_no_errors(template, |name: &str| self.var(name))
            .into_owned()
    }
}

type Resolver = fn(&InterpreterEnv) -> String;

struct Strategy {
    python: Resolver,
    hython: Resolver,
}

const STRATEGIES: [(Platform, Strategy); 4] = [
    (
        Platform::Windows,
        Strategy {
            python: |env| env.expand("$HFS/python27/python.exe"),
            hython: |env| env.expand("$HFS/bin/hython.exe"),
        },
    ),
    (
        Platform::Linux,
        Strategy {
            python: |env| env.expand("$HFS/python/bin/python"),
            hython: |env| env.expand("$HFS/bin/hython"),
        },
    ),
    (
        Platform::MacOs,
        Strategy {
            python: |_| "python".to_string(),
            hython: |env| env.expand("$HFS/bin/hython"),
        },
    ),
    (
        Platform::Other,
        Strategy {
            python: |_| "python".to_string(),
            hython: |_| "hython".to_string(),
        },
    ),
];

fn strategy(platform: Platform) -> &'static Strategy {
    STRATEGIES
        .iter()
        .find(|(p, _)| *p == platform)
        .map(|(_, strategy)| strategy)
        .unwrap_or(&STRATEGIES[3].1)
}

fn override_var(env: &InterpreterEnv, name: &str) -> Option<String> {
    env.var(name).filter(|value| !value.is_empty())
}

/// Python executable for `platform`
pub fn python_bin(platform: Platform, env: &InterpreterEnv) -> String {
    override_var(env, tokens::env::PYTHON).unwrap_or_else(|| (strategy(platform).python)(env))
}

/// Hython executable for `platform`
pub fn hython_bin(platform: Platform, env: &InterpreterEnv) -> String {
    override_var(env, tokens::env::HYTHON).unwrap_or_else(|| (strategy(platform).hython)(env))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(hfs: Option<&str>, vars: &[(&str, &str)]) -> InterpreterEnv {
        InterpreterEnv::new(
            hfs.map(str::to_string),
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(Platform::parse("linux2"), Platform::Linux);
        assert_eq!(Platform::parse("darwin"), Platform::MacOs);
        assert_eq!(Platform::parse("macos"), Platform::MacOs);
        assert_eq!(Platform::parse("win32"), Platform::Windows);
        assert_eq!(Platform::parse("windows"), Platform::Windows);
        assert_eq!(Platform::parse("freebsd"), Platform::Other);
    }

    #[test]
    fn test_strategy_table() {
        let env = env(Some("/opt/hfs"), &[]);

        assert_eq!(python_bin(Platform::Linux, &env), "/opt/hfs/python/bin/python");
        assert_eq!(hython_bin(Platform::Linux, &env), "/opt/hfs/bin/hython");
        assert_eq!(python_bin(Platform::Windows, &env), "/opt/hfs/python27/python.exe");
        assert_eq!(hython_bin(Platform::Windows, &env), "/opt/hfs/bin/hython.exe");
        assert_eq!(python_bin(Platform::MacOs, &env), "python");
        assert_eq!(hython_bin(Platform::MacOs, &env), "/opt/hfs/bin/hython");
        assert_eq!(python_bin(Platform::Other, &env), "python");
        assert_eq!(hython_bin(Platform::Other, &env), "hython");
    }

    #[test]
    fn test_hfs_falls_back_to_environment() {
        let env = env(None, &[("HFS", "/usr/hfs")]);
        assert_eq!(hython_bin(Platform::Linux, &env), "/usr/hfs/bin/hython");
    }

    #[test]
    fn test_unknown_hfs_left_unexpanded() {
        let env = env(None, &[]);
        assert_eq!(hython_bin(Platform::Linux, &env), "$HFS/bin/hython");
    }

    #[test]
    fn test_environment_overrides() {
        let env = env(
            Some("/opt/hfs"),
            &[("PDG_PYTHON", "/usr/bin/python3"), ("PDG_HYTHON", "")],
        );
        assert_eq!(python_bin(Platform::Linux, &env), "/usr/bin/python3");
        assert_eq!(hython_bin(Platform::Linux, &env), "/opt/hfs/bin/hython");
    }
}
