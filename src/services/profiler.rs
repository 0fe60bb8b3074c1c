//! 运行记录服务 - 业务能力层
//!
//! 只负责"把一次运行的产物写到磁盘"，不关心搜索流程

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProfilerError;

/// 日志风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStyle {
    /// 只记录样本摘要和 Pareto 前沿
    Simple,
    /// 额外保存每个候选程序的源码
    Complex,
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStyle::Simple => write!(f, "simple"),
            LogStyle::Complex => write!(f, "complex"),
        }
    }
}

impl FromStr for LogStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(LogStyle::Simple),
            "complex" => Ok(LogStyle::Complex),
            other => Err(format!("未知日志风格: {other}")),
        }
    }
}

/// Profiler 构造参数
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilerSettings {
    /// `{log_root}/{algorithm}/{problem}`
    pub log_dir: PathBuf,
    pub log_style: LogStyle,
    /// 运行标签，作为 `log_dir` 下的子目录名
    pub result_folder: String,
}

impl ProfilerSettings {
    pub fn output_dir(&self) -> PathBuf {
        self.log_dir.join(&self.result_folder)
    }
}

/// 一次运行的参数快照
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub method: String,
    pub task: String,
    pub llm_model: String,
    pub max_sample_nums: usize,
    pub max_generations: usize,
    pub pop_size: usize,
    pub num_samplers: usize,
    pub num_evaluators: usize,
    pub selection_num: usize,
    pub bounds: [[f64; 2]; 2],
    pub started_at: DateTime<Local>,
}

/// 单个候选程序的记录
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    /// 从 1 开始的样本序号
    pub index: usize,
    pub generation: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// 原始双目标得分，`None` 表示不可行或失败
    pub score: Option<[f64; 2]>,
    pub normalized: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sample_ms: u128,
    pub evaluate_ms: u128,
}

/// 一代结束时的统计
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub total_samples: usize,
    pub feasible_samples: usize,
    pub front_size: usize,
}

/// Pareto 前沿上的一个程序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoEntry {
    pub sample_index: usize,
    pub program: String,
    pub score: [f64; 2],
    pub normalized: [f64; 2],
}

/// 运行记录能力
///
/// 由方法在运行期间调用；编排层只负责构造。
pub trait Profiler: Send + Sync {
    /// 本次运行的输出目录
    fn output_dir(&self) -> &Path;

    fn record_manifest(&self, manifest: &RunManifest) -> Result<(), ProfilerError>;

    fn record_sample(&self, sample: &SampleRecord) -> Result<(), ProfilerError>;

    fn record_generation(&self, summary: &GenerationSummary) -> Result<(), ProfilerError>;

    /// 写出最终的 Pareto 前沿
    fn finish(&self, front: &[ParetoEntry]) -> Result<(), ProfilerError>;
}

/// 基于文件的 Profiler
///
/// 目录结构：
/// - `run.log` 运行头信息
/// - `manifest.json` 参数快照
/// - `samples.jsonl` / `generations.jsonl` 追加写
/// - `pareto_front.json` 运行结束时写出
/// - `programs/sample_{n}.txt` 仅 `Complex` 风格
#[derive(Debug)]
pub struct RunProfiler {
    method_name: String,
    log_style: LogStyle,
    output_dir: PathBuf,
}

impl RunProfiler {
    /// 创建 Profiler 并原子地创建输出目录
    ///
    /// 输出目录已存在时返回 `OutputExists`，不会改动已有内容。
    pub fn create(
        settings: ProfilerSettings,
        method_name: impl Into<String>,
    ) -> Result<Self, ProfilerError> {
        let method_name = method_name.into();
        fs::create_dir_all(&settings.log_dir).map_err(|source| ProfilerError::WriteFailed {
            path: settings.log_dir.clone(),
            source,
        })?;

        let output_dir = settings.output_dir();
        match fs::create_dir(&output_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ProfilerError::OutputExists { path: output_dir });
            }
            Err(source) => {
                return Err(ProfilerError::WriteFailed {
                    path: output_dir,
                    source,
                })
            }
        }

        let profiler = Self {
            method_name,
            log_style: settings.log_style,
            output_dir,
        };

        if profiler.log_style == LogStyle::Complex {
            let programs = profiler.programs_dir();
            fs::create_dir(&programs).map_err(|source| ProfilerError::WriteFailed {
                path: programs,
                source,
            })?;
        }

        profiler.write_header()?;
        debug!(
            "{} 创建输出目录: {}",
            profiler.method_name,
            profiler.output_dir.display()
        );

        Ok(profiler)
    }

    fn programs_dir(&self) -> PathBuf {
        self.output_dir.join("programs")
    }

    fn write_header(&self) -> Result<(), ProfilerError> {
        let header = format!(
            "{}\n{} 运行日志 - {}\n日志风格: {}\n{}\n\n",
            "=".repeat(60),
            self.method_name,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.log_style,
            "=".repeat(60)
        );
        self.write_file("run.log", header.as_bytes())
    }

    fn write_file(&self, name: &str, content: &[u8]) -> Result<(), ProfilerError> {
        let path = self.output_dir.join(name);
        fs::write(&path, content).map_err(|source| ProfilerError::WriteFailed { path, source })
    }

    fn append_line<T: Serialize>(&self, name: &str, value: &T) -> Result<(), ProfilerError> {
        let path = self.output_dir.join(name);
        let mut line = serde_json::to_string(value)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ProfilerError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        file.write_all(line.as_bytes())
            .map_err(|source| ProfilerError::WriteFailed { path, source })
    }
}

impl Profiler for RunProfiler {
    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn record_manifest(&self, manifest: &RunManifest) -> Result<(), ProfilerError> {
        let content = serde_json::to_vec_pretty(manifest)?;
        self.write_file("manifest.json", &content)
    }

    fn record_sample(&self, sample: &SampleRecord) -> Result<(), ProfilerError> {
        if self.log_style == LogStyle::Complex {
            if let Some(program) = &sample.program {
                let path = self
                    .programs_dir()
                    .join(format!("sample_{}.txt", sample.index));
                fs::write(&path, program)
                    .map_err(|source| ProfilerError::WriteFailed { path, source })?;
            }
        }

        // samples.jsonl 只保留摘要，源码在 programs/ 中
        let summary = SampleRecord {
            program: None,
            ..sample.clone()
        };
        self.append_line("samples.jsonl", &summary)
    }

    fn record_generation(&self, summary: &GenerationSummary) -> Result<(), ProfilerError> {
        self.append_line("generations.jsonl", summary)
    }

    fn finish(&self, front: &[ParetoEntry]) -> Result<(), ProfilerError> {
        let content = serde_json::to_vec_pretty(front)?;
        self.write_file("pareto_front.json", &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(root: &Path, style: LogStyle) -> ProfilerSettings {
        ProfilerSettings {
            log_dir: root.join("meoh").join("bi_kp"),
            log_style: style,
            result_folder: "v30".to_string(),
        }
    }

    fn sample(index: usize) -> SampleRecord {
        SampleRecord {
            index,
            generation: 0,
            program: Some("def select(items):\n    return items[0]\n".to_string()),
            score: Some([-0.5, 1.0]),
            normalized: Some([0.5, 0.1]),
            error: None,
            sample_ms: 10,
            evaluate_ms: 5,
        }
    }

    #[test]
    fn test_log_style_parse() {
        assert_eq!("Complex".parse::<LogStyle>().unwrap(), LogStyle::Complex);
        assert_eq!("simple".parse::<LogStyle>().unwrap(), LogStyle::Simple);
        assert!("verbose".parse::<LogStyle>().is_err());
    }

    #[test]
    fn test_create_makes_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let profiler = RunProfiler::create(settings(root.path(), LogStyle::Complex), "MEoH").unwrap();

        let expected = root.path().join("meoh/bi_kp/v30");
        assert_eq!(profiler.output_dir(), expected.as_path());
        assert!(expected.join("run.log").exists());
        assert!(expected.join("programs").is_dir());
    }

    #[test]
    fn test_existing_output_dir_untouched() {
        let root = tempfile::tempdir().unwrap();
        let existing = root.path().join("meoh/bi_kp/v30");
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("keep.txt"), "old run").unwrap();

        let result = RunProfiler::create(settings(root.path(), LogStyle::Simple), "MEoH");

        assert!(matches!(result, Err(ProfilerError::OutputExists { .. })));
        assert_eq!(fs::read_to_string(existing.join("keep.txt")).unwrap(), "old run");
        assert!(!existing.join("run.log").exists());
    }

    #[test]
    fn test_complex_style_stores_programs() {
        let root = tempfile::tempdir().unwrap();
        let profiler = RunProfiler::create(settings(root.path(), LogStyle::Complex), "MEoH").unwrap();

        profiler.record_sample(&sample(1)).unwrap();
        profiler.record_sample(&sample(2)).unwrap();

        let out = profiler.output_dir();
        assert!(out.join("programs/sample_1.txt").exists());
        let lines = fs::read_to_string(out.join("samples.jsonl")).unwrap();
        assert_eq!(lines.lines().count(), 2);
        assert!(!lines.contains("def select"));
    }

    #[test]
    fn test_simple_style_skips_programs() {
        let root = tempfile::tempdir().unwrap();
        let profiler = RunProfiler::create(settings(root.path(), LogStyle::Simple), "NSGA2").unwrap();

        profiler.record_sample(&sample(1)).unwrap();
        profiler
            .finish(&[ParetoEntry {
                sample_index: 1,
                program: "pass".to_string(),
                score: [-0.5, 1.0],
                normalized: [0.5, 0.1],
            }])
            .unwrap();

        let out = profiler.output_dir();
        assert!(!out.join("programs").exists());
        let front: serde_json::Value =
            serde_json::from_slice(&fs::read(out.join("pareto_front.json")).unwrap()).unwrap();
        assert_eq!(front[0]["sample_index"], 1);
    }
}
