use std::path::{Path, PathBuf};

use crate::endpoints::{Database, Program};
use crate::error::{Result, WqpError};

/// Resolved connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Selected database.
    pub database: Database,
    /// Selected program.
    pub program: Program,
    /// Base URL override; `None` uses [`Database::base_url`].
    pub url: Option<String>,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

#[derive(Debug, Default)]
struct RcConfig {
    database: Option<String>,
    program: Option<String>,
    url: Option<String>,
    verify: Option<bool>,
}

/// Explicit settings; anything left `None` falls back to the environment and rc file.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfigArgs {
    pub(crate) database: Option<String>,
    pub(crate) program: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) verify: Option<bool>,
}

pub(crate) fn load_config(args: ConfigArgs) -> Result<ConnectionConfig> {
    load_config_with(args, |k| std::env::var(k).ok(), rc_candidates)
}

/// Precedence: explicit args, then `env`, then the first existing rc file.
pub(crate) fn load_config_with(
    args: ConfigArgs,
    env: impl Fn(&str) -> Option<String>,
    candidates: impl FnOnce(Option<String>) -> Vec<PathBuf>,
) -> Result<ConnectionConfig> {
    let mut database = args.database.or_else(|| env("WQP_DATABASE"));
    let mut program = args.program.or_else(|| env("WQP_PROGRAM"));
    let mut url = args.url.or_else(|| env("WQP_URL"));
    let env_verify = env("WQP_VERIFY").map(|v| v.trim() != "0");

    let rc_candidates = candidates(env("WQP_RC"));
    let mut file_verify: Option<bool> = None;

    if database.is_none() || program.is_none() || url.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path)?;
                database = database.or(cfg.database);
                program = program.or(cfg.program);
                url = url.or(cfg.url);
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let database = database.ok_or_else(|| missing("database", "WQP_DATABASE", &rc_candidates))?;
    let program = program.ok_or_else(|| missing("program", "WQP_PROGRAM", &rc_candidates))?;

    Ok(ConnectionConfig {
        database: database.parse()?,
        program: program.parse()?,
        url,
        verify: args.verify.or(env_verify).or(file_verify).unwrap_or(true),
    })
}

fn missing(what: &str, var: &str, rc_candidates: &[PathBuf]) -> WqpError {
    if rc_candidates.is_empty() {
        return WqpError::Config(format!(
            "Missing configuration: {} (set {} or create .wqprc)",
            what, var
        ));
    }
    WqpError::Config(format!(
        "Missing configuration: {} (set {} or put `{}:` in one of: {})",
        what,
        var,
        what,
        rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        WqpError::Config(format!(
            "failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // A key with an empty value takes the next colon-free line as its value.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') {
                cfg.set(pk, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                cfg.set(k, v);
            }
        }
    }

    cfg
}

impl RcConfig {
    fn set(&mut self, key: &str, value: &str) {
        match key {
            "database" => self.database = Some(value.to_string()),
            "program" => self.program = Some(value.to_string()),
            "url" => self.url = Some(value.to_string()),
            "verify" => self.verify = Some(value != "0"),
            _ => {}
        }
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates(explicit: Option<String>) -> Vec<PathBuf> {
    // WQP_RC wins outright; otherwise ./.wqprc then ~/.wqprc.
    if let Some(p) = explicit {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".wqprc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".wqprc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn explicit_args_win() {
        let cfg = load_config_with(
            ConfigArgs {
                database: Some("production".into()),
                program: Some("emp".into()),
                ..Default::default()
            },
            env_of(&[("WQP_DATABASE", "test"), ("WQP_PROGRAM", "marsh")]),
            |_| Vec::new(),
        )
        .unwrap();
        assert_eq!(cfg.database, Database::Production);
        assert_eq!(cfg.program, Program::Emp);
        assert!(cfg.verify);
        assert!(cfg.url.is_none());
    }

    #[test]
    fn env_fills_gaps() {
        let cfg = load_config_with(
            ConfigArgs::default(),
            env_of(&[
                ("WQP_DATABASE", "TEST"),
                ("WQP_PROGRAM", "Marsh"),
                ("WQP_URL", "http://localhost:9000"),
                ("WQP_VERIFY", "0"),
            ]),
            |_| Vec::new(),
        )
        .unwrap();
        assert_eq!(cfg.database, Database::Test);
        assert_eq!(cfg.program, Program::Marsh);
        assert_eq!(cfg.url.as_deref(), Some("http://localhost:9000"));
        assert!(!cfg.verify);
    }

    #[test]
    fn rc_file_is_read() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "# comment\ndatabase: 'production'\nprogram:\n  \"marsh\"\nverify: 0"
        )
        .unwrap();
        let path = f.path().to_string_lossy().to_string();

        let cfg = load_config_with(
            ConfigArgs::default(),
            env_of(&[("WQP_RC", path.as_str())]),
            rc_candidates,
        )
        .unwrap();
        assert_eq!(cfg.database, Database::Production);
        assert_eq!(cfg.program, Program::Marsh);
        assert!(!cfg.verify);
    }

    #[test]
    fn missing_program_names_sources() {
        let err = load_config_with(
            ConfigArgs {
                database: Some("test".into()),
                ..Default::default()
            },
            env_of(&[]),
            |_| vec![PathBuf::from("/nonexistent/.wqprc")],
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Missing configuration: program"));
        assert!(msg.contains("WQP_PROGRAM"));
        assert!(msg.contains("/nonexistent/.wqprc"));
    }

    #[test]
    fn unknown_database_from_env_fails() {
        let err = load_config_with(
            ConfigArgs::default(),
            env_of(&[("WQP_DATABASE", "staging"), ("WQP_PROGRAM", "emp")]),
            |_| Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, WqpError::Config(_)));
    }

    #[test]
    fn strip_quotes_handles_both_kinds() {
        assert_eq!(strip_quotes("'a'"), "a");
        assert_eq!(strip_quotes("\"b\""), "b");
        assert_eq!(strip_quotes("'"), "'");
    }
}
