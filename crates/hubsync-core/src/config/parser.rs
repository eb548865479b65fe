//! TOML parser with line context in error messages

use std::path::Path;

use super::ConfigError;
use super::schema::ConfigFile;

/// Parse a hubsync.toml file.
pub fn parse_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&content).map_err(|err| match err {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: Some(path.to_path_buf()),
            message,
        },
        other => other,
    })
}

/// Parse hubsync.toml content from a string.
pub fn parse_config_str(content: &str) -> Result<ConfigFile, ConfigError> {
    let config: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: None,
        message: describe_toml_error(&e, content),
    })?;
    config.validate()?;
    Ok(config)
}

pub fn to_toml(config: &ConfigFile) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))
}

fn describe_toml_error(error: &toml::de::Error, content: &str) -> String {
    let message = error.message().to_string();
    let Some(span) = error.span() else {
        return message;
    };
    let line_num = content[..span.start.min(content.len())].matches('\n').count() + 1;
    format!(
        "line {line_num}: {message}\n{}",
        line_context(content, line_num)
    )
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{marker} {num:4} | {line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
