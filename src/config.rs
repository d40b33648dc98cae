//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `AULA__*` 覆盖（双下划线表示嵌套，
//! 如 `AULA__APP__REVIEW_INTERVAL_SECS=86400`）。
//! 凭据类（门户账号、Telegram token、API key）不进 TOML，进程启动时从
//! 环境变量读取一次，运行中不再重读。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub portal: PortalSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub telegram: TelegramSection,
}

/// [app] 段：存储文件路径与巡查间隔
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// 已处理任务的 JSON 存储文件
    pub store_path: PathBuf,
    /// 两轮巡查之间的间隔（从上一轮结束起算）
    pub review_interval_secs: u64,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("workspace/tareas_resueltas.json"),
            review_interval_secs: 3600,
        }
    }
}

/// [portal] 段：Classroom 地址与页面等待参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortalSection {
    pub base_url: String,
    pub home_url: String,
    /// 页面加载上限（秒）
    pub page_load_timeout_secs: u64,
    /// 页面内容稳定等待（毫秒）
    pub settle_wait_ms: u64,
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            base_url: "https://classroom.google.com".to_string(),
            home_url: "https://classroom.google.com/u/3/h".to_string(),
            page_load_timeout_secs: 60,
            settle_wait_ms: 4000,
        }
    }
}

/// [llm] 段：生成参数与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    /// 生成时的系统提示
    pub system_prompt: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.7,
            max_tokens: 1024,
            request_timeout_secs: 60,
            system_prompt: "Eres un asistente que ayuda a completar tareas de clase.".to_string(),
        }
    }
}

/// [telegram] 段：API 地址（token / chat_id 走环境变量）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub api_base: String,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            portal: PortalSection::default(),
            llm: LlmSection::default(),
            telegram: TelegramSection::default(),
        }
    }
}

/// 启动时读取一次的环境凭据
#[derive(Debug, Clone)]
pub struct Secrets {
    pub gc_email: String,
    pub gc_password: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub openai_api_key: Option<String>,
}

impl Secrets {
    /// 从环境变量加载；缺失必填项时报错并指明变量名
    pub fn from_env() -> anyhow::Result<Self> {
        fn required(name: &str) -> anyhow::Result<String> {
            std::env::var(name).map_err(|_| anyhow::anyhow!("Missing env var {}", name))
        }
        Ok(Self {
            gc_email: required("GC_EMAIL")?,
            gc_password: required("GC_PASSWORD")?,
            telegram_token: required("TELEGRAM_TOKEN")?,
            telegram_chat_id: required("TELEGRAM_CHAT_ID")?,
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
        })
    }
}

/// 从 config 目录加载配置，环境变量 AULA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 AULA__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("AULA")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
