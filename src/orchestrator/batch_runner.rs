//! 批量更新执行器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动浏览器、创建 SessionDriver、登录
//! 2. **批量加载**：读取行数据文件，分流无效行
//! 3. **顺序执行**：逐行调用 RetryFlow，行与行之间重置会话
//! 4. **资源管理**：持有 Browser，确保生命周期覆盖整批处理
//! 5. **报表输出**：审计 / 无效行 / 权限受限三张 CSV
//! 6. **全局统计**：汇总成功失败数量
//!
//! 整批行共享同一个浏览器会话，远端 UI 按会话保存状态且没有任何
//! 并发隔离，所以这里刻意不做任何行级并行

use std::fs;
use std::path::Path;

use chromiumoxide::Browser;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::SessionDriver;
use crate::models::{load_rows_file, Credentials, UpdateOutcome, UpdateRequest};
use crate::services::{ReportWriter, RowUpdater};
use crate::workflow::{RetryFlow, RowCtx, UpdateSession};

/// 顺序处理整批行
///
/// 除第一行外，每行开始前无条件重置会话：上一行无论成败，
/// 都可能把残留的筛选条件或打开的表单留在页面上。
/// 结果与输入保持相同顺序，一行一条
pub async fn run_batch<S: UpdateSession>(
    session: &mut S,
    requests: &[UpdateRequest],
    flow: &RetryFlow,
) -> Vec<UpdateOutcome> {
    let mut outcomes = Vec::with_capacity(requests.len());

    for (index, request) in requests.iter().enumerate() {
        if index > 0 {
            if let Err(e) = session.reset().await {
                warn!("行间重置会话失败: {}", e);
            }
        }

        let ctx = RowCtx::new(index + 1, requests.len());
        outcomes.push(flow.run(session, request, &ctx).await);
    }

    outcomes
}

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    updater: RowUpdater,
}

impl App {
    /// 初始化应用：启动浏览器并登录管理后台
    ///
    /// 登录失败是致命错误，直接向上传播，不会处理任何行
    pub async fn initialize(config: Config, credentials: Credentials) -> AppResult<Self> {
        fs::create_dir_all(&config.log_dir)?;
        init_log_file(&config)?;
        log_startup(&config);

        let (browser, page) = browser::launch_browser(&config).await?;
        let driver = SessionDriver::new(page, &config);

        driver.login(&credentials).await?;
        info!("✓ 登录成功");

        let updater = RowUpdater::new(driver, &config);

        Ok(Self {
            config,
            _browser: browser,
            updater,
        })
    }

    /// 运行主流程：加载行 → 逐行更新 → 导出报表 → 输出统计
    pub async fn run(mut self) -> AppResult<()> {
        let (requests, invalid_rows) = load_rows_file(
            Path::new(&self.config.rows_file),
            self.config.row_offset,
            self.config.row_limit,
        )
        .await?;

        let reports = ReportWriter::new(&self.config);

        if !invalid_rows.is_empty() {
            warn!("⚠️ 发现 {} 行缺少有效的 POS 数据", invalid_rows.len());
            reports.write_invalid(&invalid_rows)?;
        }

        if requests.is_empty() {
            warn!("⚠️ 没有待处理的行，程序结束");
            return Ok(());
        }

        info!(
            "✓ 加载了 {} 行待更新数据 (offset: {}, limit: {:?})",
            requests.len(),
            self.config.row_offset,
            self.config.row_limit
        );

        let flow = RetryFlow::new(&self.config);
        let outcomes = run_batch(&mut self.updater, &requests, &flow).await;

        reports.write_audit(&outcomes)?;
        let denied_count = reports.write_permission_denied(&outcomes)?;
        if denied_count > 0 {
            warn!("⚠️ 发现 {} 个权限受限或不存在的员工", denied_count);
        }

        print_final_stats(&outcomes, &self.config);

        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn init_log_file(config: &Config) -> AppResult<()> {
    let log_header = format!(
        "{}\n员工 POS 批量更新日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(&config.output_log_file, log_header)?;
    Ok(())
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 员工 POS 批量更新");
    info!("📄 数据文件: {}", config.rows_file);
    info!(
        "🔁 每行重试预算: {} 次, 退避 {}s",
        config.retries, config.retry_backoff_seconds
    );
    if config.dry_run {
        info!("🧪 dry-run 模式: 不会提交任何修改");
    }
    info!("{}", "=".repeat(60));
}

fn print_final_stats(outcomes: &[UpdateOutcome], config: &Config) {
    let ok = outcomes.iter().filter(|outcome| outcome.success).count();
    let failed = outcomes.len() - ok;

    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", ok, outcomes.len());
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));

    if failed > 0 {
        for outcome in outcomes.iter().filter(|outcome| !outcome.success) {
            error!(
                "FAILED employee_id={}: {}",
                outcome.employee_id,
                outcome.error.as_deref().unwrap_or("")
            );
        }
    }

    info!("\n审计报表已保存至: {}", config.audit_csv);
}
