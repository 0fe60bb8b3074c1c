//! 应用入口 - 编排层
//!
//! 持有配置和调度器，负责启动日志、构建内置注册表、读取一次凭证。

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{LlmClientConfig, OpenAiClientFactory};
use crate::config::Config;
use crate::error::AppResult;
use crate::orchestrator::dispatcher::{Orchestrator, RunOutcome};
use crate::registry::Catalog;
use crate::utils::logging::{log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: Orchestrator,
    llm_config: LlmClientConfig,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config.run, &config.llm.model);

        let catalog = Catalog::builtin(&config)?;
        let unbounded = catalog.unbounded_tasks();
        if !unbounded.is_empty() {
            warn!("⚠️ 以下问题没有目标边界，无法运行: {:?}", unbounded);
        }

        // 凭证只在启动时读取一次
        let llm_config = LlmClientConfig::from_env(&config.llm)?;
        if llm_config.credential.is_none() {
            warn!("⚠️ 环境变量 {} 未设置", llm_config.credential_env);
        }

        let orchestrator = Orchestrator::new(Arc::new(catalog), Arc::new(OpenAiClientFactory));

        Ok(Self {
            config,
            orchestrator,
            llm_config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunOutcome> {
        let outcome = self
            .orchestrator
            .run(&self.config.run, &self.llm_config)
            .await?;

        print_final_stats(&outcome.method, outcome.elapsed, &outcome.output_dir);
        info!("✅ {} / {} / {} 完成", outcome.algorithm, outcome.problem, outcome.run_label);

        Ok(outcome)
    }
}
