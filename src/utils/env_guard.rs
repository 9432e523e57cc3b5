use std::fs;
use std::path::Path;

const PLACEHOLDER_MARKERS: &[&str] = &["change_me", "your_", "your-api-key", "<", "xxx"];

/// True when a configured value is still the unedited template text.
pub fn is_placeholder_value(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered.is_empty() || PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m))
}

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim();
    let unquoted = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value.split(" #").next().unwrap_or("").trim()
    };
    Some((key, unquoted))
}

fn load_dot_env(path: &Path) {
    if !path.exists() {
        return;
    }
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ENV] Failed to read {}: {}", path.display(), e);
            return;
        }
    };

    for (key, value) in content.lines().filter_map(parse_env_line) {
        // Scheduler-provided environment always wins over the file.
        if std::env::var_os(key).is_some() {
            continue;
        }
        std::env::set_var(key, value);
    }
}

pub fn harden_env_setup() {
    load_dot_env(Path::new(".env"));
    match std::env::var("ETH_RPC_URL") {
        Ok(url) if is_placeholder_value(&url) => {
            eprintln!("[ENV] WARN: ETH_RPC_URL looks like a placeholder; public fallbacks only")
        }
        Ok(_) => {}
        Err(_) => eprintln!("[ENV] ETH_RPC_URL is not set; public fallbacks only"),
    }
}
