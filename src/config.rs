use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::BoundPairSpec;
use crate::services::LogStyle;

/// 配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "RUN_CONFIG_FILE";
/// 未设置环境变量时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "run_config.toml";

/// 程序配置
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub run: RunConfig,
    pub llm: LlmSettings,
    pub evaluator: EvaluatorSettings,
    /// 额外的或覆盖内置值的问题边界
    pub bounds: BTreeMap<String, BoundPairSpec>,
}

/// 单次实验运行的配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// 算法标识符
    pub algorithm: String,
    /// 问题标识符
    pub problem: String,
    /// 运行标签，每次运行必须唯一
    pub run_label: String,
    /// 最多生成的候选程序数
    pub max_sample_nums: usize,
    /// 最多迭代代数
    pub max_generations: usize,
    /// 种群大小
    pub pop_size: usize,
    /// 同时进行的 LLM 采样数
    pub num_samplers: usize,
    /// 同时进行的评估数
    pub num_evaluators: usize,
    /// 每次生成时选取的父代数
    pub selection_num: usize,
    /// 日志根目录
    pub log_root: PathBuf,
    /// 日志风格
    pub log_style: LogStyle,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            algorithm: "meoh".to_string(),
            problem: "bi_kp".to_string(),
            run_label: "v30".to_string(),
            max_sample_nums: 305,
            max_generations: 31,
            pop_size: 10,
            num_samplers: 4,
            num_evaluators: 4,
            selection_num: 2,
            log_root: PathBuf::from("logs"),
            log_style: LogStyle::Complex,
        }
    }
}

impl RunConfig {
    /// 校验所有字段
    ///
    /// 在构造任何协作者之前调用。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_sample_nums", self.max_sample_nums),
            ("max_generations", self.max_generations),
            ("pop_size", self.pop_size),
            ("num_samplers", self.num_samplers),
            ("num_evaluators", self.num_evaluators),
            ("selection_num", self.selection_num),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::NonPositive { field });
            }
        }

        validate_run_label(&self.run_label)
    }

    /// `{log_root}/{algorithm}/{problem}`
    pub fn log_dir(&self) -> PathBuf {
        self.log_root.join(&self.algorithm).join(&self.problem)
    }

    /// `{log_root}/{algorithm}/{problem}/{run_label}`
    pub fn output_dir(&self) -> PathBuf {
        self.log_dir().join(&self.run_label)
    }
}

/// 运行标签必须是单个非空路径组件
fn validate_run_label(label: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        field: "run_label",
        reason: reason.to_string(),
    };

    if label.trim().is_empty() {
        return Err(invalid("不能为空"));
    }
    if label == "." || label == ".." {
        return Err(invalid("不能是 '.' 或 '..'"));
    }
    if label.contains(['/', '\\']) {
        return Err(invalid("不能包含路径分隔符"));
    }
    if label.chars().any(char::is_control) {
        return Err(invalid("不能包含控制字符"));
    }

    Ok(())
}

/// LLM 配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
    /// 存放 API 凭证的环境变量名
    pub credential_env: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://codestral.mistral.ai/v1".to_string(),
            model: "codestral-latest".to_string(),
            timeout_secs: 60,
            credential_env: "API_KEY3".to_string(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 评估脚本配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    /// 解释器命令
    pub command: String,
    /// 存放 `{task}.py` 评估脚本的目录
    pub task_dir: PathBuf,
    /// 单个候选程序的评估超时
    pub timeout_secs: u64,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            task_dir: PathBuf::from("tasks"),
            timeout_secs: 30,
        }
    }
}

impl EvaluatorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// 加载配置：默认值 → 配置文件 → 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        let config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.with_env_overrides()
    }

    /// 从 TOML 文件读取，缺省字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用进程环境变量覆盖配置
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// 用给定的变量来源覆盖配置
    ///
    /// 无法解析的值返回错误，不会被静默忽略。
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let run = &mut self.run;
        override_string(&lookup, "ALGORITHM_NAME", &mut run.algorithm);
        override_string(&lookup, "PROBLEM_NAME", &mut run.problem);
        override_string(&lookup, "RUN_LABEL", &mut run.run_label);
        override_parsed(&lookup, "MAX_SAMPLE_NUMS", &mut run.max_sample_nums)?;
        override_parsed(&lookup, "MAX_GENERATIONS", &mut run.max_generations)?;
        override_parsed(&lookup, "POP_SIZE", &mut run.pop_size)?;
        override_parsed(&lookup, "NUM_SAMPLERS", &mut run.num_samplers)?;
        override_parsed(&lookup, "NUM_EVALUATORS", &mut run.num_evaluators)?;
        override_parsed(&lookup, "SELECTION_NUM", &mut run.selection_num)?;
        override_parsed(&lookup, "LOG_ROOT", &mut run.log_root)?;
        override_parsed(&lookup, "LOG_STYLE", &mut run.log_style)?;

        let llm = &mut self.llm;
        override_string(&lookup, "LLM_API_BASE_URL", &mut llm.api_base);
        override_string(&lookup, "LLM_MODEL_NAME", &mut llm.model);
        override_parsed(&lookup, "LLM_TIMEOUT_SECS", &mut llm.timeout_secs)?;
        override_string(&lookup, "LLM_CREDENTIAL_ENV", &mut llm.credential_env);

        let evaluator = &mut self.evaluator;
        override_string(&lookup, "EVALUATOR_COMMAND", &mut evaluator.command);
        override_parsed(&lookup, "EVALUATOR_TASK_DIR", &mut evaluator.task_dir)?;
        override_parsed(&lookup, "EVALUATOR_TIMEOUT_SECS", &mut evaluator.timeout_secs)?;

        Ok(self)
    }
}

fn override_string<F>(lookup: &F, var_name: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(var_name) {
        *target = value;
    }
}

fn override_parsed<F, T>(lookup: &F, var_name: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(var_name) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: value.clone(),
                expected_type: std::any::type_name::<T>().to_string(),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_reference_run() {
        let config = Config::default();
        assert_eq!(config.run.algorithm, "meoh");
        assert_eq!(config.run.problem, "bi_kp");
        assert_eq!(config.run.max_sample_nums, 305);
        assert_eq!(config.run.max_generations, 31);
        assert_eq!(config.run.selection_num, 2);
        assert_eq!(config.llm.model, "codestral-latest");
        assert_eq!(config.llm.timeout(), Duration::from_secs(60));
        assert!(config.run.validate().is_ok());
    }

    #[test]
    fn test_zero_field_rejected() {
        let run = RunConfig {
            num_evaluators: 0,
            ..Default::default()
        };
        assert!(matches!(
            run.validate(),
            Err(ConfigError::NonPositive {
                field: "num_evaluators"
            })
        ));
    }

    #[test]
    fn test_selection_may_exceed_population() {
        let run = RunConfig {
            pop_size: 2,
            selection_num: 3,
            ..Default::default()
        };
        assert!(run.validate().is_ok());
    }

    #[test]
    fn test_identifiers_left_to_registry_lookup() {
        let run = RunConfig {
            algorithm: String::new(),
            problem: "  ".to_string(),
            ..Default::default()
        };
        assert!(run.validate().is_ok());
    }

    #[test]
    fn test_run_label_must_be_single_component() {
        for label in ["", "..", "a/b", "a\\b"] {
            let run = RunConfig {
                run_label: label.to_string(),
                ..Default::default()
            };
            assert!(run.validate().is_err(), "标签 {label:?} 应该被拒绝");
        }
    }

    #[test]
    fn test_paths_derived_from_identifiers() {
        let run = RunConfig::default();
        assert_eq!(run.log_dir(), PathBuf::from("logs/meoh/bi_kp"));
        assert_eq!(run.output_dir(), PathBuf::from("logs/meoh/bi_kp/v30"));
    }

    #[test]
    fn test_env_overrides_applied() {
        let config = Config::default()
            .with_overrides(env(&[
                ("ALGORITHM_NAME", "nsga2"),
                ("POP_SIZE", "20"),
                ("LOG_STYLE", "simple"),
                ("LLM_TIMEOUT_SECS", "90"),
            ]))
            .unwrap();

        assert_eq!(config.run.algorithm, "nsga2");
        assert_eq!(config.run.pop_size, 20);
        assert_eq!(config.run.log_style, LogStyle::Simple);
        assert_eq!(config.llm.timeout_secs, 90);
    }

    #[test]
    fn test_unparsable_override_is_error() {
        let result = Config::default().with_overrides(env(&[("POP_SIZE", "ten")]));
        assert!(matches!(
            result,
            Err(ConfigError::EnvVarParseFailed { var_name, .. }) if var_name == "POP_SIZE"
        ));
    }

    #[test]
    fn test_toml_partial_file() {
        let content = r#"
            [run]
            algorithm = "moead"
            problem = "tsp_semo"
            run_label = "v31"

            [llm]
            credential_env = "API_KEY1"

            [bounds.bi_cvrp]
            lower = [-1.0, 0.0]
            upper = [0.0, 30.0]
        "#;

        let config = Config::from_toml_str(content, Path::new("run_config.toml")).unwrap();
        assert_eq!(config.run.algorithm, "moead");
        assert_eq!(config.run.pop_size, 10);
        assert_eq!(config.llm.credential_env, "API_KEY1");
        assert_eq!(config.llm.model, "codestral-latest");
        assert!(config.bounds.contains_key("bi_cvrp"));
    }
}
