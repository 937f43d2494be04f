use super::render;
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use serde::Serialize;
use std::env;
use tracing::instrument;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub target: String,
    pub rustc_version: String,
    pub build_date: String,
    pub correlation_id: String,
}

#[instrument]
pub fn get_version_info() -> VersionInfo {
    let info = VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        target: env::var("TARGET").unwrap_or_else(|_| "unknown".to_string()),
        rustc_version: env::var("RUSTC_VERSION").unwrap_or_else(|_| "unknown".to_string()),
        build_date: env::var("BUILD_DATE").unwrap_or_else(|_| "unknown".to_string()),
        correlation_id: crate::tracing::correlation_id().to_string(),
    };

    tracing::debug!(
        package_name = info.name,
        package_version = info.version,
        target = %info.target,
        "Gathered version information"
    );

    info
}

pub fn execute(format: OutputFormat) -> CliResult<String> {
    render(format, &get_version_info(), |info| {
        format!(
            "{} {} - {}\n\
            Target: {}\n\
            Rust Compiler: {}\n\
            Build Date: {}\n\
            Correlation ID: {}\n",
            info.name,
            info.version,
            info.description,
            info.target,
            info.rustc_version,
            info.build_date,
            info.correlation_id
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_text_format() {
        let version_info = execute(OutputFormat::Text).unwrap();

        assert!(version_info.starts_with("frcpm-cli "));
        assert!(version_info.contains(env!("CARGO_PKG_VERSION")));
        assert!(version_info.contains("Target:"));
        assert!(version_info.contains("Rust Compiler:"));
        assert!(version_info.contains("Build Date:"));
    }

    #[test]
    fn test_correlation_id_format() {
        let version_info = execute(OutputFormat::Text).unwrap();
        let correlation_line = version_info
            .lines()
            .find(|line| line.contains("Correlation ID:"))
            .expect("Should contain correlation ID");

        let parts: Vec<&str> = correlation_line.split(':').collect();
        assert_eq!(parts.len(), 2);
        let uuid_part = parts[1].trim();
        assert_eq!(uuid_part.len(), 36);
        assert!(uuid_part.contains('-'));
    }

    #[test]
    fn test_json_version() {
        let output = execute(OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["name"], "frcpm-cli");
        assert_eq!(
            json["correlationId"],
            crate::tracing::correlation_id().to_string()
        );
    }
}
