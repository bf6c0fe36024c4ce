use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 1920;
pub const DOWNSCALE_JPEG_QUALITY: u8 = 85;
pub const ACCEPTED_FORMATS: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

pub const MAX_PROMPT_LENGTH: usize = 500;
pub const HISTORY_LIMIT: usize = 5;
pub const GENERATION_DELAY_MS: u64 = 1_500;
pub const ERROR_SIMULATION_RATE: f64 = 0.2;

pub const GENERATE_PATH: &str = "/api/generate";
pub const INTAKE_PATH: &str = "/api/intake";
pub const HISTORY_STORAGE_KEY: &str = "ai-studio-history";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Runtime settings resolved from the environment.
///
/// Only the mock backend's latency and fault rate are tunable; the intake
/// limits and history capacity above are fixed.
#[derive(Clone, Debug)]
pub struct StudioConfig {
    pub host: String,
    pub port: u16,
    pub endpoint: String,
    pub history_dir: PathBuf,
    pub generation_delay: Duration,
    pub fault_rate: f64,
}

impl StudioConfig {
    pub fn from_env() -> Self {
        let port = env_value("STUDIO_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let host = env_value("STUDIO_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let endpoint = env_value("STUDIO_ENDPOINT")
            .map(|value| normalize_endpoint(&value))
            .unwrap_or_else(|| format!("http://127.0.0.1:{port}"));
        let generation_delay = env_value("GENERATION_DELAY_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(GENERATION_DELAY_MS));
        let fault_rate = env_value("FAULT_RATE")
            .and_then(|value| value.parse::<f64>().ok())
            .map(clamp_fault_rate)
            .unwrap_or(ERROR_SIMULATION_RATE);
        Self {
            host,
            port,
            endpoint,
            history_dir: resolve_history_dir(),
            generation_delay,
            fault_rate,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Keeps a fault rate usable as a probability. NaN falls back to zero.
pub fn clamp_fault_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 0.0;
    }
    rate.clamp(0.0, 1.0)
}

pub fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_history_dir() -> PathBuf {
    if let Some(dir) = env_value("HISTORY_DIR") {
        return PathBuf::from(dir);
    }
    let mut base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("ai-studio");
    base
}
