//! LLM API 客户端
//!
//! 封装所有与 LLM API 相关的调用逻辑，兼容 OpenAI API 的服务（如 Codestral）

use std::env::VarError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::LlmSettings;
use crate::error::{ClientError, LlmError};
use crate::utils::logging::truncate_text;

const SYSTEM_PROMPT: &str =
    "You are an expert in designing heuristics for combinatorial optimization. \
     Reply with a single complete Python function inside one ```python code block.";

/// API 凭证
///
/// `Debug` 和 `Display` 都不会输出凭证内容。
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 从环境变量读取，变量不存在时返回 `None`
    ///
    /// 变量存在但不是合法 Unicode 时返回 `MalformedCredential`。
    pub fn from_env(var_name: &str) -> Result<Option<Self>, ClientError> {
        match std::env::var(var_name) {
            Ok(value) => Ok(Some(Self(value))),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ClientError::MalformedCredential {
                reason: "凭证不是合法的 Unicode",
            }),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.0.trim().is_empty() {
            return Err(ClientError::MalformedCredential { reason: "凭证为空" });
        }
        if self.0.chars().any(char::is_whitespace) {
            return Err(ClientError::MalformedCredential {
                reason: "凭证包含空白字符",
            });
        }
        if self.0.chars().any(char::is_control) {
            return Err(ClientError::MalformedCredential {
                reason: "凭证包含控制字符",
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// LLM 客户端配置
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub credential: Option<Credential>,
    /// 凭证来源的环境变量名（用于错误信息）
    pub credential_env: String,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmClientConfig {
    pub fn new(settings: &LlmSettings, credential: Option<Credential>) -> Self {
        Self {
            credential,
            credential_env: settings.credential_env.clone(),
            api_base: settings.api_base.clone(),
            model: settings.model.clone(),
            timeout: settings.timeout(),
        }
    }

    /// 从配置中指定的环境变量读取凭证
    pub fn from_env(settings: &LlmSettings) -> Result<Self, ClientError> {
        let credential = Credential::from_env(&settings.credential_env)?;
        Ok(Self::new(settings, credential))
    }
}

/// LLM 采样能力
///
/// 同一个实例会被方法的所有采样任务共享。
#[async_trait]
pub trait LlmSampler: Send + Sync {
    fn model_name(&self) -> &str;

    /// 发送提示词，返回 LLM 的文本响应
    async fn draw_sample(&self, prompt: &str) -> Result<String, LlmError>;
}

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    ///
    /// 凭证缺失或格式错误时立即失败，而不是等到第一次请求。
    pub fn new(config: &LlmClientConfig) -> Result<Self, ClientError> {
        let credential = config
            .credential
            .as_ref()
            .ok_or_else(|| ClientError::MissingCredential {
                env_var: config.credential_env.clone(),
            })?;
        credential.check()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(credential.expose())
            .with_api_base(&config.api_base);

        let client = Client::with_config(openai_config).with_http_client(http_client);

        Ok(Self {
            client,
            model_name: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmSampler for LlmClient {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn draw_sample(&self, prompt: &str) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.len());

        let api_failed = |source| LlmError::ApiCallFailed {
            model: self.model_name.clone(),
            source,
        };

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(api_failed)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(api_failed)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(1.0)
            .build()
            .map_err(api_failed)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            api_failed(e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        debug!("LLM 响应: {}", truncate_text(&content, 80));

        Ok(content.trim().to_string())
    }
}

/// LLM 客户端工厂
pub trait LlmClientFactory: Send + Sync {
    fn create(&self, config: &LlmClientConfig) -> Result<Arc<dyn LlmSampler>, ClientError>;
}

/// 构造 `LlmClient` 的默认工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiClientFactory;

impl LlmClientFactory for OpenAiClientFactory {
    fn create(&self, config: &LlmClientConfig) -> Result<Arc<dyn LlmSampler>, ClientError> {
        Ok(Arc::new(LlmClient::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(credential: Option<&str>) -> LlmClientConfig {
        LlmClientConfig::new(&LlmSettings::default(), credential.map(Credential::new))
    }

    #[test]
    fn test_missing_credential_detected_at_construction() {
        let result = OpenAiClientFactory.create(&config(None));
        match result {
            Err(ClientError::MissingCredential { env_var }) => assert_eq!(env_var, "API_KEY3"),
            Err(other) => panic!("意外的错误: {other}"),
            Ok(_) => panic!("缺少凭证时不应构造成功"),
        }
    }

    #[test]
    fn test_malformed_credentials_rejected() {
        for bad in ["", "   ", "abc def", "abc\n"] {
            let result = LlmClient::new(&config(Some(bad)));
            assert!(
                matches!(result, Err(ClientError::MalformedCredential { .. })),
                "凭证 {bad:?} 应该被拒绝"
            );
        }
    }

    #[test]
    fn test_valid_credential_builds_client() {
        let client = LlmClient::new(&config(Some("sk-test-1234"))).unwrap();
        assert_eq!(client.model_name(), "codestral-latest");
    }

    #[test]
    fn test_credential_never_printed() {
        let cfg = config(Some("sk-secret-value"));
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("sk-secret-value"));
        assert_eq!(Credential::new("sk-secret-value").to_string(), "***");
    }

    #[test]
    fn test_credential_read_from_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "HEURISTIC_RUNNER_DOTENV_KEY=sk-from-dotenv\n").unwrap();
        dotenvy::from_path(&path).unwrap();

        let settings = LlmSettings {
            credential_env: "HEURISTIC_RUNNER_DOTENV_KEY".to_string(),
            ..Default::default()
        };
        let config = LlmClientConfig::from_env(&settings).unwrap();
        assert_eq!(
            config.credential.as_ref().map(Credential::expose),
            Some("sk-from-dotenv")
        );
    }

    #[test]
    fn test_unset_credential_is_absent() {
        let credential = Credential::from_env("HEURISTIC_RUNNER_UNSET_KEY").unwrap();
        assert!(credential.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_credential_is_malformed() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let var_name = "HEURISTIC_RUNNER_NON_UNICODE_KEY";
        std::env::set_var(var_name, OsStr::from_bytes(&[b's', b'k', 0xff]));

        assert!(matches!(
            Credential::from_env(var_name),
            Err(ClientError::MalformedCredential { .. })
        ));
    }

    /// 测试 LLM API 连接性
    #[tokio::test]
    #[ignore] // 需要真实凭证：API_KEY3=... cargo test -- --ignored
    async fn test_draw_sample_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = LlmClientConfig::from_env(&LlmSettings::default()).expect("凭证格式错误");
        let client = LlmClient::new(&config).expect("缺少 API 凭证");
        let response = client
            .draw_sample("Write a Python function `score(x)` that returns x * 2.")
            .await
            .expect("LLM 调用失败");

        println!("LLM 响应: {}", response);
        assert!(!response.is_empty());
    }
}
