use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 启动浏览器并打开一个空白页面
///
/// 默认无头；调试时可通过配置切到有头模式观察页面
pub async fn launch_browser(config: &Config) -> AppResult<(Browser, Page)> {
    info!("🚀 正在启动浏览器 (headful: {})...", config.headful);

    let mut builder = BrowserConfig::builder();
    if config.headful {
        builder = builder.with_head();
    } else {
        builder = builder.new_headless_mode();
    }

    let browser_config = builder
        .args(vec![
            "--disable-gpu",             // 无头模式下禁用 GPU
            "--no-sandbox",              // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage",   // 防止共享内存不足
            "--remote-debugging-port=0", // 让浏览器自动选择端口
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            AppError::browser_configuration_failed(e)
        })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::launch_failed(e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::page_creation_failed(e)
    })?;
    debug!("空白页面创建成功");

    Ok((browser, page))
}
