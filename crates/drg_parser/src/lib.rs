//! Contract loader for Data Reliability Guardrails (YAML/TOML formats).
//!
//! This module turns a contract document into the strongly-typed `Contract`
//! structure, failing with a [`ContractLoadError`] before any check runs when the
//! document is missing, unparseable or structurally unusable.
//!
//! # Example
//!
//! ```rust
//! use drg_parser::parse_yaml;
//!
//! let yaml = r#"
//! dataset_id: nyc_taxi_rides
//! schema:
//!   - name: vendor_id
//!     type: integer
//!     required: true
//! checks:
//!   volume:
//!     min_rows: 100
//! "#;
//!
//! let contract = parse_yaml(yaml).expect("Failed to parse contract");
//! assert_eq!(contract.dataset_id, "nyc_taxi_rides");
//! assert_eq!(contract.owner, "unknown");
//! ```

use drg_core::{Contract, ContractError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading a contract.
#[derive(Debug, Error)]
pub enum ContractLoadError {
    /// The contract file does not exist
    #[error("Contract file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// The document parsed but describes an unusable contract
    #[error("Invalid contract: {0}")]
    Invalid(#[from] ContractError),
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, ContractLoadError>;

/// Supported contract file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse a contract from a YAML string.
///
/// # Example
///
/// ```rust
/// use drg_parser::parse_yaml;
///
/// let contract = parse_yaml("dataset_id: rides\nowner: data-team\n").unwrap();
/// assert_eq!(contract.owner, "data-team");
/// assert!(contract.schema.is_empty());
/// ```
pub fn parse_yaml(content: &str) -> Result<Contract> {
    let contract: Contract = serde_yaml_ng::from_str(content)?;
    finish(contract)
}

/// Parse a contract from a TOML string.
///
/// # Example
///
/// ```rust
/// use drg_parser::parse_toml;
///
/// let toml = r#"
/// dataset_id = "rides"
///
/// [[schema]]
/// name = "vendor_id"
/// type = "integer"
/// required = true
/// "#;
///
/// let contract = parse_toml(toml).unwrap();
/// assert_eq!(contract.schema.len(), 1);
/// ```
pub fn parse_toml(content: &str) -> Result<Contract> {
    let contract: Contract =
        toml::from_str(content).map_err(|e| ContractLoadError::TomlError(e.to_string()))?;
    finish(contract)
}

fn finish(contract: Contract) -> Result<Contract> {
    contract.validate_definition()?;
    debug!(
        dataset_id = %contract.dataset_id,
        fields = contract.schema.len(),
        checks = ?contract.checks.kinds(),
        "Contract parsed"
    );
    Ok(contract)
}

/// Detect the contract format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `ContractFormat::Yaml`
/// * `.toml` → `ContractFormat::Toml`
///
/// # Errors
///
/// Returns `ContractLoadError::InvalidExtension` if the file has no extension.
/// Returns `ContractLoadError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<ContractFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ContractLoadError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(ContractFormat::Yaml),
        "toml" => Ok(ContractFormat::Toml),
        other => Err(ContractLoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a contract from a file with automatic format detection.
///
/// The format is determined by the file extension:
/// - `.yaml`, `.yml` → parsed as YAML
/// - `.toml` → parsed as TOML
///
/// # Example
///
/// ```no_run
/// use drg_parser::load_contract;
/// use std::path::Path;
///
/// let contract = load_contract(Path::new("config/contract.yaml")).unwrap();
/// println!("Loaded contract for {}", contract.dataset_id);
/// ```
pub fn load_contract(path: &Path) -> Result<Contract> {
    if !path.exists() {
        return Err(ContractLoadError::NotFound(path.to_path_buf()));
    }

    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        ContractFormat::Yaml => parse_yaml(&content),
        ContractFormat::Toml => parse_toml(&content),
    }
}
