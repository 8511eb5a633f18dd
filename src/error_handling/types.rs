use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    AccountsEmpty(String),
    HostKeyMissing(String),
    BadPort(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::AccountsEmpty(e) => write!(f, "Account table error: {}", e),
            ConfigError::HostKeyMissing(e) => write!(f, "Host key error: {}", e),
            ConfigError::BadPort(e) => write!(f, "Port error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum LoggingError {
    OpenFailed(std::io::Error),
    WriteFailed(std::io::Error),
    EncodeFailed(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::OpenFailed(e) => write!(f, "Log file open failed: {}", e),
            LoggingError::WriteFailed(e) => write!(f, "Log write failed: {}", e),
            LoggingError::EncodeFailed(e) => write!(f, "Log record encoding failed: {}", e),
        }
    }
}

impl std::error::Error for LoggingError {}

#[derive(Debug)]
pub enum ClassifierError {
    OracleUnavailable(String),
    ScoringFailed(String),
    LexiconError(std::io::Error),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::OracleUnavailable(e) => write!(f, "Oracle unavailable: {}", e),
            ClassifierError::ScoringFailed(e) => write!(f, "Scoring failed: {}", e),
            ClassifierError::LexiconError(e) => write!(f, "Lexicon error: {}", e),
        }
    }
}

impl std::error::Error for ClassifierError {}

#[derive(Debug)]
pub enum GenerationError {
    Connection(String),
    Timeout(u64),
    InvalidResponse(String),
    Authentication(String),
    Internal(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Connection(e) => write!(f, "Generation connection error: {}", e),
            GenerationError::Timeout(secs) => write!(f, "Generation timed out after {}s", secs),
            GenerationError::InvalidResponse(e) => write!(f, "Invalid generation response: {}", e),
            GenerationError::Authentication(e) => write!(f, "Generation auth error: {}", e),
            GenerationError::Internal(e) => write!(f, "Generation error: {}", e),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout(0)
        } else if err.is_connect() {
            GenerationError::Connection(err.to_string())
        } else {
            GenerationError::Internal(err.to_string())
        }
    }
}

#[derive(Debug)]
pub enum NetworkError {
    BindError(std::io::Error),
    KeyError(String),
    SshError(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::BindError(e) => write!(f, "Network bind error: {}", e),
            NetworkError::KeyError(e) => write!(f, "Host key error: {}", e),
            NetworkError::SshError(e) => write!(f, "SSH server error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    LoggingError(LoggingError),
    ClassifierError(ClassifierError),
    NetworkError(NetworkError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::LoggingError(e) => write!(f, "Logging error: {}", e),
            ControllerError::ClassifierError(e) => write!(f, "Classifier error: {}", e),
            ControllerError::NetworkError(e) => write!(f, "Network error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<LoggingError> for ControllerError {
    fn from(err: LoggingError) -> Self {
        ControllerError::LoggingError(err)
    }
}

impl From<ClassifierError> for ControllerError {
    fn from(err: ClassifierError) -> Self {
        ControllerError::ClassifierError(err)
    }
}

impl From<NetworkError> for ControllerError {
    fn from(err: NetworkError) -> Self {
        ControllerError::NetworkError(err)
    }
}
