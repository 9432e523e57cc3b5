use crate::utils::config::{Config, LOOKBACK_DAYS_RANGE};
use std::path::PathBuf;

const USAGE: &str =
    "usage: fork-risk [--manifest <path>] [--output <path>] [--lookback-days <1-60>] [--explain-config]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeArgs {
    pub manifest: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub lookback_days: Option<u64>,
    pub explain_config: bool,
}

impl RuntimeArgs {
    /// Flags win over the environment-derived configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.manifest {
            config.manifest_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
    }
}

fn parse_bool_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_lookback(raw: &str) -> anyhow::Result<u64> {
    let days = raw.trim().parse::<u64>().map_err(|err| {
        anyhow::anyhow!("invalid --lookback-days '{}': {}", raw.trim(), err)
    })?;
    if !LOOKBACK_DAYS_RANGE.contains(&days) {
        return Err(anyhow::anyhow!(
            "--lookback-days must be within {}..={}, got {}",
            LOOKBACK_DAYS_RANGE.start(),
            LOOKBACK_DAYS_RANGE.end(),
            days
        ));
    }
    Ok(days)
}

fn non_empty_path(flag: &str, raw: &str) -> anyhow::Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("{} requires a non-empty path", flag));
    }
    Ok(PathBuf::from(trimmed))
}

pub(crate) fn parse_runtime_args_from_iter<I, S, F>(args: I, lookup: F) -> anyhow::Result<RuntimeArgs>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    let mut parsed = RuntimeArgs {
        explain_config: lookup("EXPLAIN_CONFIG")
            .and_then(|raw| parse_bool_flag(&raw))
            .unwrap_or(false),
        ..RuntimeArgs::default()
    };

    let mut args = args.into_iter().map(|arg| arg.as_ref().to_string());
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        if flag == "--explain-config" {
            if inline.is_some() {
                return Err(anyhow::anyhow!("--explain-config takes no value"));
            }
            parsed.explain_config = true;
            continue;
        }
        if !matches!(flag.as_str(), "--manifest" | "--output" | "--lookback-days") {
            return Err(anyhow::anyhow!("unrecognized argument '{}'\n{}", arg, USAGE));
        }
        let value = match inline.or_else(|| args.next()) {
            Some(value) => value,
            None => return Err(anyhow::anyhow!("{} requires a value\n{}", flag, USAGE)),
        };
        match flag.as_str() {
            "--manifest" => parsed.manifest = Some(non_empty_path(&flag, &value)?),
            "--output" => parsed.output = Some(non_empty_path(&flag, &value)?),
            _ => parsed.lookback_days = Some(parse_lookback(&value)?),
        }
    }

    Ok(parsed)
}

pub fn parse_runtime_args() -> anyhow::Result<RuntimeArgs> {
    parse_runtime_args_from_iter(std::env::args().skip(1), |key| std::env::var(key).ok())
}
