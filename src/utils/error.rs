use crate::domain::model::SessionStatus;
use thiserror::Error;

/// 開局參數錯誤，使用者可自行修正
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Question cannot be empty or whitespace-only")]
    InvalidQuestion,

    #[error("Draw count must be between {min} and {max}, got {count}")]
    InvalidCount { count: usize, min: usize, max: usize },
}

/// 抽牌流程誤用；失敗時不改動狀態
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session is not active (status: {status:?})")]
    NotActive { status: SessionStatus },

    #[error("Card {card_id} has already been drawn")]
    AlreadyDrawn { card_id: String },

    #[error("Card {card_id} is not part of the current deck")]
    UnknownCard { card_id: String },

    #[error("Session is not complete ({drawn}/{target} cards drawn)")]
    Incomplete { drawn: usize, target: usize },
}

/// 量子亂數來源失敗；一律以本地洗牌補救
#[derive(Error, Debug)]
pub enum EntropyError {
    #[error("Entropy transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Entropy provider returned HTTP {0}")]
    Status(u16),

    #[error("Entropy payload malformed: {0}")]
    Malformed(String),

    #[error("Insufficient entropy: requested {requested}, received {received}")]
    Insufficient { requested: usize, received: usize },
}

#[derive(Error, Debug)]
pub enum TarotError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Entropy(#[from] EntropyError),

    #[error("Interpretation failed: {message}")]
    Interpretation { message: String },

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Server error: {message}")]
    Server { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UserInput,
    SessionProtocol,
    ExternalService,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TarotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TarotError::Validation(_) => ErrorCategory::UserInput,
            TarotError::Session(_) => ErrorCategory::SessionProtocol,
            TarotError::Entropy(_) | TarotError::Interpretation { .. } | TarotError::Http(_) => {
                ErrorCategory::ExternalService
            }
            TarotError::Config { .. } | TarotError::InvalidConfigValue { .. } => {
                ErrorCategory::Configuration
            }
            TarotError::Io(_) | TarotError::Serialization(_) | TarotError::Server { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::UserInput | ErrorCategory::SessionProtocol => ErrorSeverity::Low,
            ErrorCategory::ExternalService => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TarotError::Validation(ValidationError::InvalidQuestion) => {
                "请先在心中默念你的问题，并输入在文本框中。".to_string()
            }
            TarotError::Validation(ValidationError::InvalidCount { min, max, .. }) => {
                format!("请输入{}到{}之间的数量", min, max)
            }
            TarotError::Interpretation { message } => {
                format!("星灵的连接似乎受到了干扰，请稍后再试。(错误信息: {})", message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::UserInput => "Enter a question and a draw count between 1 and 10",
            ErrorCategory::SessionProtocol => "Reset the session and start a new reading",
            ErrorCategory::ExternalService => {
                "Check network connectivity and the provider endpoint, then retry"
            }
            ErrorCategory::Configuration => {
                "Check the configuration file and environment variables"
            }
            ErrorCategory::System => "Check file permissions and that the port is free",
        }
    }
}

pub type Result<T> = std::result::Result<T, TarotError>;
