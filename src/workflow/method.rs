//! 方法契约
//!
//! 编排层按这里的参数构造方法，然后只调用一次 `run`

use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::LlmSampler;
use crate::error::MethodError;
use crate::registry::BoundPair;
use crate::services::{Evaluation, Profiler};

/// 方法构造参数
#[derive(Clone)]
pub struct MethodConfig {
    /// 单点采样使用的 LLM
    pub llm: Arc<dyn LlmSampler>,
    /// 集群/集成采样使用的 LLM（与 `llm` 为同一实例）
    pub llm_cluster: Arc<dyn LlmSampler>,
    pub profiler: Arc<dyn Profiler>,
    pub evaluation: Arc<dyn Evaluation>,
    pub max_sample_nums: usize,
    pub max_generations: usize,
    pub pop_size: usize,
    pub num_samplers: usize,
    pub num_evaluators: usize,
    pub selection_num: usize,
    pub bounds: BoundPair,
}

impl MethodConfig {
    /// 检查数值参数
    pub fn validate(&self) -> Result<(), MethodError> {
        let fields = [
            ("max_sample_nums", self.max_sample_nums),
            ("max_generations", self.max_generations),
            ("pop_size", self.pop_size),
            ("num_samplers", self.num_samplers),
            ("num_evaluators", self.num_evaluators),
            ("selection_num", self.selection_num),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(MethodError::InvalidParameters(format!("{name} 必须为正整数")));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for MethodConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodConfig")
            .field("llm", &self.llm.model_name())
            .field("evaluation", &self.evaluation.task_id())
            .field("output_dir", &self.profiler.output_dir())
            .field("max_sample_nums", &self.max_sample_nums)
            .field("max_generations", &self.max_generations)
            .field("pop_size", &self.pop_size)
            .field("num_samplers", &self.num_samplers)
            .field("num_evaluators", &self.num_evaluators)
            .field("selection_num", &self.selection_num)
            .field("bounds", &self.bounds)
            .finish()
    }
}

/// 搜索方法
///
/// 所有并发（采样、评估）都在 `run` 内部创建和回收。
#[async_trait]
pub trait Method: Send {
    /// 方法名（如 `MEoH`）
    fn name(&self) -> &str;

    /// 运行到预算耗尽；失败原样返回
    async fn run(&mut self) -> Result<(), MethodError>;
}
