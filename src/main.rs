use anyhow::Result;
use heuristic_runner::config::Config;
use heuristic_runner::utils::logging;
use heuristic_runner::App;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 读取 .env（不覆盖已有的环境变量）
    let dotenv_path = dotenvy::dotenv().ok();

    // 初始化日志
    logging::init();
    if let Some(path) = dotenv_path {
        info!("已加载环境变量文件: {}", path.display());
    }

    // 加载配置
    let config = Config::load()?;

    // 初始化并运行应用
    let _outcome = App::initialize(config)?.run().await?;

    Ok(())
}
