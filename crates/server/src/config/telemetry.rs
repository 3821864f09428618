use serde::Deserialize;

/// Log output configuration.
///
/// ```toml
/// [telemetry]
/// json = true
/// filter = "info,mailwire_gateway=debug"
/// ```
#[derive(Debug, Deserialize)]
pub struct TelemetryConfig {
    /// Emit one JSON object per event instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
    /// Filter directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_owned()
}
