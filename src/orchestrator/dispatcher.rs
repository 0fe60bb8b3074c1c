//! 运行调度器 - 编排层
//!
//! 把运行配置解析成一个构造完毕的方法实例，然后只运行一次。
//!
//! 解析顺序固定：校验 → 算法 → 任务 → 边界 → 输出目录 → LLM 客户端 → Profiler → 方法。
//! 前五步不产生任何副作用，失败时不会创建客户端，也不会写磁盘。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::clients::{LlmClientConfig, LlmClientFactory};
use crate::config::RunConfig;
use crate::error::{AppError, AppResult};
use crate::registry::Catalog;
use crate::services::ProfilerSettings;
use crate::utils::logging::log_run_resolved;
use crate::workflow::{Method, MethodConfig};

/// 运行调度器
#[derive(Clone)]
pub struct Orchestrator {
    catalog: Arc<Catalog>,
    llm_factory: Arc<dyn LlmClientFactory>,
}

impl Orchestrator {
    pub fn new(catalog: Arc<Catalog>, llm_factory: Arc<dyn LlmClientFactory>) -> Self {
        Self {
            catalog,
            llm_factory,
        }
    }

    /// 解析配置并构造方法，但不运行
    pub fn prepare(&self, run: &RunConfig, llm_config: &LlmClientConfig) -> AppResult<PreparedRun> {
        run.validate()?;

        let algorithm = self.catalog.algorithm(&run.algorithm)?;
        let task = self.catalog.task(&run.problem)?;
        let bounds = self.catalog.bounds(&run.problem)?;

        let output_dir = run.output_dir();
        if output_dir.exists() {
            return Err(AppError::duplicate_run_label(&run.run_label, output_dir));
        }

        log_run_resolved(run, bounds.as_array(), &output_dir);

        let llm = self.llm_factory.create(llm_config)?;
        debug!("LLM 客户端已创建: {}", llm.model_name());

        let profiler = algorithm.construct_profiler(ProfilerSettings {
            log_dir: run.log_dir(),
            log_style: run.log_style,
            result_folder: run.run_label.clone(),
        })?;

        let method_name = algorithm.method_name().to_string();
        let method = algorithm
            .construct_method(MethodConfig {
                llm: llm.clone(),
                llm_cluster: llm,
                profiler,
                evaluation: task.evaluation(),
                max_sample_nums: run.max_sample_nums,
                max_generations: run.max_generations,
                pop_size: run.pop_size,
                num_samplers: run.num_samplers,
                num_evaluators: run.num_evaluators,
                selection_num: run.selection_num,
                bounds,
            })
            .map_err(|e| AppError::method_failed(&method_name, e))?;

        Ok(PreparedRun {
            method,
            method_name,
            algorithm: run.algorithm.clone(),
            problem: run.problem.clone(),
            run_label: run.run_label.clone(),
            output_dir,
        })
    }

    /// 解析、构造并运行一次
    pub async fn run(&self, run: &RunConfig, llm_config: &LlmClientConfig) -> AppResult<RunOutcome> {
        self.prepare(run, llm_config)?.execute().await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

/// 已构造完毕、尚未运行的方法
pub struct PreparedRun {
    method: Box<dyn Method>,
    method_name: String,
    algorithm: String,
    problem: String,
    run_label: String,
    output_dir: PathBuf,
}

impl PreparedRun {
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 运行方法；方法的错误原样包装后返回
    pub async fn execute(mut self) -> AppResult<RunOutcome> {
        info!("▶️ 开始运行 {} ({} / {})", self.method_name, self.algorithm, self.problem);
        let started = Instant::now();

        self.method
            .run()
            .await
            .map_err(|e| AppError::method_failed(&self.method_name, e))?;

        Ok(RunOutcome {
            algorithm: self.algorithm,
            problem: self.problem,
            run_label: self.run_label,
            method: self.method_name,
            output_dir: self.output_dir,
            elapsed: started.elapsed(),
        })
    }
}

impl std::fmt::Debug for PreparedRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRun")
            .field("method", &self.method_name)
            .field("algorithm", &self.algorithm)
            .field("problem", &self.problem)
            .field("run_label", &self.run_label)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// 一次成功运行的结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub algorithm: String,
    pub problem: String,
    pub run_label: String,
    pub method: String,
    pub output_dir: PathBuf,
    pub elapsed: Duration,
}
