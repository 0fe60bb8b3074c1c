use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
///
/// 配置解析类错误（未知算法、未知问题、缺少边界、重复运行标签）
/// 一定在任何有副作用的协作者（LLM 客户端、Profiler、采样线程）构造之前返回。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 注册表之间不一致（启动时检查）
    #[error("注册表错误: {0}")]
    Registry(#[from] RegistryError),

    /// 算法标识符不存在
    #[error("未知算法 '{id}'，可选: {known:?}")]
    UnknownAlgorithm { id: String, known: Vec<String> },

    /// 问题标识符不存在
    #[error("未知问题 '{id}'，可选: {known:?}")]
    UnknownProblem { id: String, known: Vec<String> },

    /// 问题已注册，但没有对应的边界
    #[error("问题 '{problem}' 没有注册目标边界")]
    MissingBounds { problem: String },

    /// 同一 (算法, 问题) 下运行标签已被使用
    #[error("运行标签 '{label}' 已存在: {}", path.display())]
    DuplicateRunLabel { label: String, path: PathBuf },

    /// LLM 客户端构造失败
    #[error("LLM 客户端构造失败: {0}")]
    ClientConstruction(#[from] ClientError),

    /// Profiler 构造失败
    #[error("Profiler 错误: {0}")]
    Profiler(ProfilerError),

    /// 方法构造或运行失败，原样上抛
    #[error("方法 {method} 执行失败: {source}")]
    MethodExecution {
        method: String,
        #[source]
        source: MethodError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置文件读取失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({}): {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 数值字段必须为正整数
    #[error("字段 {field} 必须为正整数")]
    NonPositive { field: &'static str },

    /// 字段取值不合法
    #[error("字段 {field} 不合法: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// 边界定义不合法
    #[error("问题 '{problem}' 的边界不合法: {source}")]
    InvalidBounds {
        problem: String,
        #[source]
        source: BoundError,
    },
}

/// 注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    /// 标识符重复
    #[error("{registry} 注册表中标识符 '{id}' 重复")]
    DuplicateIdentifier { registry: &'static str, id: String },

    /// 标识符为空
    #[error("{registry} 注册表中存在空标识符")]
    EmptyIdentifier { registry: &'static str },

    /// 标识符不存在
    #[error("{registry} 注册表中不存在 '{id}'")]
    UnknownIdentifier {
        registry: &'static str,
        id: String,
        known: Vec<String>,
    },

    /// 存在没有对应任务的边界
    #[error("以下边界没有对应的任务: {ids:?}")]
    OrphanBounds { ids: Vec<String> },
}

/// 边界错误
#[derive(Debug, Error, PartialEq)]
pub enum BoundError {
    /// 存在非有限数值
    #[error("边界包含非有限数值: lower={lower:?}, upper={upper:?}")]
    NonFinite { lower: [f64; 2], upper: [f64; 2] },

    /// lower[i] > upper[i]
    #[error("第 {objective} 个目标的下界 {lower} 大于上界 {upper}")]
    Inverted {
        objective: usize,
        lower: f64,
        upper: f64,
    },
}

/// LLM 客户端构造错误
#[derive(Debug, Error)]
pub enum ClientError {
    /// 凭证不存在
    #[error("环境变量 {env_var} 中没有 API 凭证")]
    MissingCredential { env_var: String },

    /// 凭证格式不合法
    #[error("API 凭证格式不合法: {reason}")]
    MalformedCredential { reason: &'static str },

    /// HTTP 客户端构造失败
    #[error("HTTP 客户端构造失败: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// LLM 调用错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },

    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// Profiler 错误
#[derive(Debug, Error)]
pub enum ProfilerError {
    /// 输出目录已存在
    #[error("输出目录已存在: {}", path.display())]
    OutputExists { path: PathBuf },

    /// 文件写入失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 序列化失败
    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 候选程序评估错误
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// 评估进程启动失败
    #[error("评估进程启动失败 ({command}): {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// 与评估进程的管道读写失败
    #[error("评估进程管道读写失败: {source}")]
    PipeFailed {
        #[source]
        source: std::io::Error,
    },

    /// 评估超时
    #[error("评估超时 ({seconds} 秒)")]
    Timeout { seconds: u64 },

    /// 评估脚本非零退出
    #[error("评估脚本退出码 {code:?}: {stderr}")]
    ScriptFailed { code: Option<i32>, stderr: String },

    /// 评估输出无法解析
    #[error("无法解析评估输出 '{output}'")]
    BadOutput { output: String },
}

/// 方法执行错误
#[derive(Debug, Error)]
pub enum MethodError {
    /// Profiler 写入失败
    #[error("Profiler 写入失败: {0}")]
    Profiler(#[from] ProfilerError),

    /// 方法参数不合法
    #[error("方法参数不合法: {0}")]
    InvalidParameters(String),

    /// 工作任务异常退出
    #[error("工作任务异常退出: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建方法执行错误
    pub fn method_failed(method: impl Into<String>, source: MethodError) -> Self {
        AppError::MethodExecution {
            method: method.into(),
            source,
        }
    }

    /// 创建重复运行标签错误
    pub fn duplicate_run_label(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        AppError::DuplicateRunLabel {
            label: label.into(),
            path: path.into(),
        }
    }

    /// 是否为配置解析阶段的错误（发生在任何采样之前）
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Registry(_)
                | AppError::UnknownAlgorithm { .. }
                | AppError::UnknownProblem { .. }
                | AppError::MissingBounds { .. }
                | AppError::DuplicateRunLabel { .. }
        )
    }
}

impl From<ProfilerError> for AppError {
    fn from(err: ProfilerError) -> Self {
        match err {
            ProfilerError::OutputExists { path } => {
                let label = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                AppError::DuplicateRunLabel { label, path }
            }
            other => AppError::Profiler(other),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
