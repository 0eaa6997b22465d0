use crate::domain::model::Locale;
use crate::utils::error::{Result, TarotError};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_path, validate_positive_number,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PORT: u16 = 7009;
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TarotConfig {
    pub server: ServerConfig,
    pub entropy: EntropyConfig,
    pub interpretation: InterpretationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            static_dir: "./public".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropyConfig {
    pub endpoint: String,
    pub value_type: String,
    pub timeout_seconds: u64,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://qrng.anu.edu.au/API/jsonI.php".to_string(),
            value_type: "uint16".to_string(),
            timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpretationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub timeout_seconds: u64,
    pub locale: Locale,
}

impl Default for InterpretationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepseek.com/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: std::env::var(API_KEY_ENV).ok(),
            system_prompt: "你是一位专业的塔罗牌占卜师。".to_string(),
            timeout_seconds: 60,
            locale: Locale::Zh,
        }
    }
}

impl InterpretationConfig {
    /// The configured key, ignoring blanks and placeholders whose variable was not set.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }
}

impl TarotConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        toml::from_str(&processed_content).map_err(|e| TarotError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DEEPSEEK_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TarotError::Config {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Port precedence: command line, then `PORT`, then the config file.
    pub fn effective_port(&self, cli_port: Option<u16>) -> u16 {
        cli_port
            .or_else(|| {
                std::env::var("PORT")
                    .ok()
                    .and_then(|value| value.trim().parse().ok())
            })
            .unwrap_or(self.server.port)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_positive_number("server.port", u64::from(self.server.port), 1)?;
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_path("server.static_dir", &self.server.static_dir)?;

        validate_url("entropy.endpoint", &self.entropy.endpoint)?;
        validate_one_of("entropy.value_type", &self.entropy.value_type, &["uint8", "uint16"])?;
        validate_positive_number("entropy.timeout_seconds", self.entropy.timeout_seconds, 1)?;

        validate_url("interpretation.endpoint", &self.interpretation.endpoint)?;
        validate_non_empty_string("interpretation.model", &self.interpretation.model)?;
        validate_positive_number(
            "interpretation.timeout_seconds",
            self.interpretation.timeout_seconds,
            1,
        )?;

        Ok(())
    }
}

impl Validate for TarotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
