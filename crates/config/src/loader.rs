use crate::{CodegenConfig, ConfigError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load a codegen config from the specified path.
/// Automatically detects the format based on file extension.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<CodegenConfig> {
    tracing::debug!("Reading config file");
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents, path)?;
    tracing::info!(
        fragment_mode = ?config.fragment_mode,
        external_fragments = config.external_fragments.len(),
        "Config loaded successfully"
    );
    Ok(config)
}

/// Load a codegen config from a string.
/// The path is used for error messages and format detection.
#[tracing::instrument(skip(contents), fields(path = %path.display(), size = contents.len()))]
pub fn load_config_from_str(contents: &str, path: &Path) -> Result<CodegenConfig> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    tracing::debug!(extension, "Detecting config format");

    let config = match extension {
        "yml" | "yaml" => {
            tracing::trace!("Parsing as YAML");
            parse_yaml(contents, path)?
        }
        "json" => {
            tracing::trace!("Parsing as JSON");
            parse_json(contents, path)?
        }
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    tracing::debug!("Validating config");
    validate_config(&config, path)?;

    Ok(config)
}

/// Parse YAML configuration
fn parse_yaml(contents: &str, path: &Path) -> Result<CodegenConfig> {
    serde_saphyr::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("YAML parse error: {e}"),
    })
}

/// Parse JSON configuration
fn parse_json(contents: &str, path: &Path) -> Result<CodegenConfig> {
    serde_json::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {e}"),
    })
}

/// Validate the loaded configuration
#[tracing::instrument(skip(config, path), fields(path = %path.display()))]
fn validate_config(config: &CodegenConfig, path: &Path) -> Result<()> {
    let invalid = |message: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    };

    if config.max_depth == 0 {
        return Err(invalid("maxDepth must be at least 1".to_string()));
    }

    let mut seen = HashSet::new();
    for (index, fragment) in config.external_fragments.iter().enumerate() {
        tracing::trace!(fragment = %fragment.name, "Validating external fragment");

        if fragment.name.trim().is_empty() {
            return Err(invalid(format!(
                "External fragment #{index} has an empty name"
            )));
        }
        if fragment.on_type.trim().is_empty() {
            return Err(invalid(format!(
                "External fragment '{}' has an empty onType",
                fragment.name
            )));
        }
        if !seen.insert(fragment.name.as_str()) {
            return Err(invalid(format!(
                "External fragment '{}' is declared more than once",
                fragment.name
            )));
        }
    }

    tracing::debug!("Config validation passed");
    Ok(())
}
