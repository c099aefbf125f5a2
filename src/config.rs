use std::path::PathBuf;

// defaults for the gateway
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_DETECT_UPSTREAM: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CAMERA_HOST: &str = "192.168.100.50";
pub const CAMERA_RELAY_PORT: u16 = 3001;

/// Where the gateway serves files from and which services it forwards to.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayConfig {
    pub static_dir: PathBuf,
    /// Base URL that `/api/*` is forwarded to.
    pub detect_upstream: String,
    /// Base URL that `/pi/*` is forwarded to.
    pub camera_upstream: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            detect_upstream: DEFAULT_DETECT_UPSTREAM.to_string(),
            camera_upstream: camera_upstream_for(DEFAULT_CAMERA_HOST),
        }
    }
}

/// Port from `PORT`, falling back to [`DEFAULT_PORT`].
pub fn default_port() -> u16 {
    match std::env::var("PORT") {
        Ok(value) => parse_port(&value).unwrap_or_else(|| {
            log::warn!("Ignoring invalid PORT value `{value}`");
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    }
}

/// Camera relay URL built from `PI_HOST`, falling back to [`DEFAULT_CAMERA_HOST`].
pub fn default_camera_upstream() -> String {
    let host = std::env::var("PI_HOST").unwrap_or_else(|_| DEFAULT_CAMERA_HOST.to_string());
    camera_upstream_for(&host)
}

/// Camera relay URL for `host` on [`CAMERA_RELAY_PORT`].
pub fn camera_upstream_for(host: &str) -> String {
    format!("http://{host}:{CAMERA_RELAY_PORT}")
}

fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse().ok()
}
