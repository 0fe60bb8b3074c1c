//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use std::path::Path;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::RunConfig;

/// 初始化 tracing 日志
///
/// 级别由 `RUST_LOG` 控制，默认 `info`。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `run`: 本次运行配置
/// - `model`: LLM 模型名
pub fn log_startup(run: &RunConfig, model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 启发式自动设计实验");
    info!("🧠 算法: {} | 问题: {}", run.algorithm, run.problem);
    info!("🏷️ 运行标签: {}", run.run_label);
    info!("🤖 LLM 模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 记录已解析的运行参数
///
/// # 参数
/// - `run`: 本次运行配置
/// - `bounds`: 目标边界 `[lower, upper]`
/// - `output_dir`: 输出目录
pub fn log_run_resolved(run: &RunConfig, bounds: [[f64; 2]; 2], output_dir: &Path) {
    info!("✓ 配置解析完成");
    info!(
        "📊 采样上限: {} | 代数上限: {} | 种群: {} | 父代: {}",
        run.max_sample_nums, run.max_generations, run.pop_size, run.selection_num
    );
    info!(
        "⚙️ 采样并发: {} | 评估并发: {}",
        run.num_samplers, run.num_evaluators
    );
    info!("📐 边界: lower={:?}, upper={:?}", bounds[0], bounds[1]);
    info!("📁 输出目录: {}", output_dir.display());
}

/// 打印最终统计信息
///
/// # 参数
/// - `method`: 方法名
/// - `elapsed`: 运行耗时
/// - `output_dir`: 输出目录
pub fn print_final_stats(method: &str, elapsed: Duration, output_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行完成: {}", method);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("⏱️ 耗时: {:.1} 秒", elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", output_dir.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
