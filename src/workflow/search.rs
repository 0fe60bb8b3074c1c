//! 启发式搜索流程 - 流程层
//!
//! 核心职责：定义一次搜索运行的完整流程
//!
//! 每一代：
//! 1. 从存档中选父代 → 构建提示词
//! 2. 并发采样（受 `num_samplers` 限制）→ 提取程序
//! 3. 并发评估（受 `num_evaluators` 限制）→ 归一化得分
//! 4. 更新非支配存档 → 写入 Profiler
//!
//! 采样数或代数任一耗尽即结束。

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::clients::LlmSampler;
use crate::error::MethodError;
use crate::registry::{AlgorithmKind, BoundPair};
use crate::services::{Evaluation, GenerationSummary, ParetoEntry, RunManifest, SampleRecord};
use crate::workflow::archive::ParetoArchive;
use crate::workflow::method::{Method, MethodConfig};
use crate::workflow::prompt::{build_prompt, extract_program};

/// 内置算法共用的搜索流程
pub struct HeuristicSearch {
    kind: AlgorithmKind,
    config: MethodConfig,
}

impl HeuristicSearch {
    pub fn new(kind: AlgorithmKind, config: MethodConfig) -> Result<Self, MethodError> {
        config.validate()?;
        Ok(Self { kind, config })
    }

    fn manifest(&self) -> RunManifest {
        let cfg = &self.config;
        RunManifest {
            method: self.kind.method_name().to_string(),
            task: cfg.evaluation.task_id().to_string(),
            llm_model: cfg.llm.model_name().to_string(),
            max_sample_nums: cfg.max_sample_nums,
            max_generations: cfg.max_generations,
            pop_size: cfg.pop_size,
            num_samplers: cfg.num_samplers,
            num_evaluators: cfg.num_evaluators,
            selection_num: cfg.selection_num,
            bounds: cfg.bounds.as_array(),
            started_at: Local::now(),
        }
    }
}

#[async_trait]
impl Method for HeuristicSearch {
    fn name(&self) -> &str {
        self.kind.method_name()
    }

    async fn run(&mut self) -> Result<(), MethodError> {
        let cfg = &self.config;
        let method = self.kind.method_name();
        cfg.profiler.record_manifest(&self.manifest())?;

        let sampler_permits = Arc::new(Semaphore::new(cfg.num_samplers));
        let evaluator_permits = Arc::new(Semaphore::new(cfg.num_evaluators));
        let mut archive = ParetoArchive::new(cfg.pop_size);
        let mut total_samples = 0usize;
        let mut feasible_samples = 0usize;

        for generation in 0..cfg.max_generations {
            if total_samples >= cfg.max_sample_nums {
                break;
            }
            let batch = cfg.pop_size.min(cfg.max_sample_nums - total_samples);

            // 存档为空（没有父代）时使用集群采样
            let llm = if archive.is_empty() {
                cfg.llm_cluster.clone()
            } else {
                cfg.llm.clone()
            };
            let parents: Vec<ParetoEntry> = archive
                .select(cfg.selection_num, generation)
                .into_iter()
                .cloned()
                .collect();
            let prompt: Arc<str> =
                build_prompt(self.kind, cfg.evaluation.description(), &parents).into();

            let mut jobs = JoinSet::new();
            for offset in 0..batch {
                let job = SampleJob {
                    index: total_samples + offset + 1,
                    generation,
                    prompt: prompt.clone(),
                    llm: llm.clone(),
                    evaluation: cfg.evaluation.clone(),
                    bounds: cfg.bounds,
                    sampler_permits: sampler_permits.clone(),
                    evaluator_permits: evaluator_permits.clone(),
                };
                jobs.spawn(job.run());
            }

            // 等待本代所有样本完成；出错返回时 JoinSet 被 drop，其余任务随之中止
            let mut records = Vec::with_capacity(batch);
            while let Some(joined) = jobs.join_next().await {
                records.push(joined??);
            }
            records.sort_by_key(|record| record.index);

            for record in records {
                total_samples += 1;

                if let (Some(program), Some(score), Some(normalized)) =
                    (&record.program, record.score, record.normalized)
                {
                    feasible_samples += 1;
                    archive.insert(ParetoEntry {
                        sample_index: record.index,
                        program: program.clone(),
                        score,
                        normalized,
                    });
                }

                cfg.profiler.record_sample(&record)?;
            }

            cfg.profiler.record_generation(&GenerationSummary {
                generation,
                total_samples,
                feasible_samples,
                front_size: archive.len(),
            })?;

            info!(
                "[{}] 第 {} 代完成: 样本 {}/{} | 可行 {} | 前沿 {}",
                method,
                generation + 1,
                total_samples,
                cfg.max_sample_nums,
                feasible_samples,
                archive.len()
            );
        }

        cfg.profiler.finish(archive.entries())?;
        info!(
            "[{}] 搜索结束: 共 {} 个样本，前沿大小 {}",
            method,
            total_samples,
            archive.len()
        );

        Ok(())
    }
}

/// 单个样本的采样与评估
struct SampleJob {
    index: usize,
    generation: usize,
    prompt: Arc<str>,
    llm: Arc<dyn LlmSampler>,
    evaluation: Arc<dyn Evaluation>,
    bounds: BoundPair,
    sampler_permits: Arc<Semaphore>,
    evaluator_permits: Arc<Semaphore>,
}

impl SampleJob {
    async fn run(self) -> Result<SampleRecord, MethodError> {
        let mut record = SampleRecord {
            index: self.index,
            generation: self.generation,
            program: None,
            score: None,
            normalized: None,
            error: None,
            sample_ms: 0,
            evaluate_ms: 0,
        };

        let started = Instant::now();
        let response = {
            let _permit = self
                .sampler_permits
                .acquire()
                .await
                .map_err(anyhow::Error::from)?;
            self.llm.draw_sample(&self.prompt).await
        };
        record.sample_ms = started.elapsed().as_millis();

        let program = match response.map(|text| extract_program(&text)) {
            Ok(Some(program)) => program,
            Ok(None) => {
                warn!("[样本 {}] LLM 响应中没有程序", self.index);
                record.error = Some("LLM 响应中没有程序".to_string());
                return Ok(record);
            }
            Err(e) => {
                warn!("[样本 {}] 采样失败: {}", self.index, e);
                record.error = Some(e.to_string());
                return Ok(record);
            }
        };

        let started = Instant::now();
        let result = {
            let _permit = self
                .evaluator_permits
                .acquire()
                .await
                .map_err(anyhow::Error::from)?;
            self.evaluation.evaluate_program(&program).await
        };
        record.evaluate_ms = started.elapsed().as_millis();

        match result {
            Ok(Some(score)) => {
                record.score = Some(score);
                record.normalized = Some(self.bounds.normalize(score));
            }
            Ok(None) => {
                record.error = Some("不可行".to_string());
            }
            Err(e) => {
                warn!("[样本 {}] 评估失败: {}", self.index, e);
                record.error = Some(e.to_string());
            }
        }
        record.program = Some(program);

        Ok(record)
    }
}
