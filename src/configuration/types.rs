use serde::Deserialize;
use std::path::PathBuf;

/// Sensor identity and telemetry destinations.
#[derive(Debug, Clone, Deserialize)]
pub struct HoneypotSection {
    /// Name identifying this sensor in every log record.
    #[serde(default = "default_sensor_name")]
    pub sensor_name: String,

    /// Destination file for the structured record stream, one JSON object
    /// per line.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Destination file for commands the oracle could not score, kept for
    /// later human review.
    #[serde(default = "default_anomaly_file")]
    pub anomaly_file: PathBuf,

    /// Optional GeoIP2 City database. Lookups are skipped when absent.
    #[serde(default)]
    pub geoip_database: Option<PathBuf>,
}

impl Default for HoneypotSection {
    fn default() -> Self {
        Self {
            sensor_name: default_sensor_name(),
            log_file: default_log_file(),
            anomaly_file: default_anomaly_file(),
            geoip_database: None,
        }
    }
}

/// SSH listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SshSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Private host key presented to clients. Missing key is fatal at
    /// startup; no connections are accepted without one.
    #[serde(default = "default_host_key")]
    pub host_key: PathBuf,

    /// Version banner sent during the SSH handshake.
    #[serde(default = "default_server_version")]
    pub server_version: String,

    /// Seconds an interactive session may sit idle before it is closed
    /// through the normal finalization path. `0` disables the bound.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for SshSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            host_key: default_host_key(),
            server_version: default_server_version(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

/// Text-generation collaborator settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Base URL of an OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Conversation-history token budget; oldest complete exchanges are
    /// dropped first when it is exceeded.
    #[serde(default = "default_trimmer_max_tokens")]
    pub trimmer_max_tokens: usize,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_name: default_model_name(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            trimmer_max_tokens: default_trimmer_max_tokens(),
            timeout_secs: default_llm_timeout(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Scoring oracle settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierSection {
    /// Optional lexicon file, one `token weight_benign weight_suspicious
    /// weight_malicious` entry per line. The built-in lexicon is used when
    /// absent.
    #[serde(default)]
    pub lexicon_file: Option<PathBuf>,
}

fn default_sensor_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("nectar"))
}

fn default_log_file() -> PathBuf {
    PathBuf::from("ssh_log.jsonl")
}

fn default_anomaly_file() -> PathBuf {
    PathBuf::from("anomalies.jsonl")
}

fn default_bind_address() -> String {
    String::from("0.0.0.0")
}

fn default_port() -> u16 {
    8022
}

fn default_host_key() -> PathBuf {
    PathBuf::from("ssh_host_key")
}

fn default_server_version() -> String {
    String::from("SSH-2.0-OpenSSH_8.2p1 Ubuntu-4ubuntu0.3")
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_provider() -> String {
    String::from("openai")
}

fn default_model_name() -> String {
    String::from("gpt-4o-mini")
}

fn default_base_url() -> String {
    String::from("https://api.openai.com/v1")
}

fn default_api_key_env() -> String {
    String::from("OPENAI_API_KEY")
}

fn default_trimmer_max_tokens() -> usize {
    64000
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_system_prompt() -> String {
    String::from("Simulate a realistic Linux system.")
}
