use anyhow::Result;
use employee_pos_update::models::Credentials;
use employee_pos_update::utils::logging;
use employee_pos_update::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载 .env 与配置
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let credentials = Credentials::from_env()?;

    // 初始化并运行应用
    App::initialize(config, credentials).await?.run().await?;

    Ok(())
}
