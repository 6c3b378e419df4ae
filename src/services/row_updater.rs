//! 员工行更新服务 - 业务能力层
//!
//! 只负责"对单个员工执行 搜索 → 选择 → 校验 → 编辑 → 保存"这一能力，
//! 不关心重试、不关心批量顺序

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::SessionDriver;
use crate::models::UpdateRequest;
use crate::utils::logging::truncate_text;
use crate::workflow::UpdateSession;

/// 员工行更新服务
///
/// 持有会话驱动器，对外实现 [`UpdateSession`] 能力
pub struct RowUpdater {
    driver: SessionDriver,
    config: Config,
}

impl RowUpdater {
    /// 创建新的行更新服务
    pub fn new(driver: SessionDriver, config: &Config) -> Self {
        Self {
            driver,
            config: config.clone(),
        }
    }

    /// 执行 搜索 → 选择 → 校验 → 编辑 → 保存，返回修改前的 POS 值
    ///
    /// 远端 UI 没有任何事务保证，这里靠"每步都重新确认页面状态"
    /// 把序列做成看起来原子的操作
    async fn update_employee_pos(&self, request: &UpdateRequest) -> AppResult<String> {
        let employee_id = &request.employee_id;
        let sel = &self.config.selectors;
        let timeouts = &self.config.timeouts;

        // 打开搜索页，先清掉残留的筛选条件
        self.driver.open_search_page().await?;
        self.step_delay().await;
        self.driver.fill(&sel.search_input, "").await?;
        sleep(Duration::from_millis(500)).await;

        // 填入员工编号并发起搜索
        self.driver.fill(&sel.search_input, employee_id).await?;
        self.step_delay().await;
        self.driver.click(&sel.search_submit).await?;

        // 等待搜索结果；超时只告警，页面可能只是渲染得慢
        self.driver.wait_settle(timeouts.navigation_ms).await;

        // "没有数据"意味着员工不存在或当前账号无权限
        if self.driver.text_present(&sel.no_data_text).await? {
            self.debug_screenshot(&format!("debug_no_data_{}", employee_id))
                .await;
            return Err(AppError::not_found_or_permission_denied(employee_id));
        }
        self.step_delay().await;

        // 轮询等待目标行出现并点击其选择控件
        self.select_employee_row(employee_id).await?;
        self.step_delay().await;

        // 打开编辑表单
        self.driver.click(&sel.edit_button).await?;
        self.driver.wait_settle(timeouts.default_ms).await;
        self.step_delay().await;

        // 完整性校验：表单里必须是我们要改的那个员工。
        // 残留状态可能让 UI 悄悄打开别人的记录，这一步是整个流程最关键的防线
        let shown = self.driver.read_value(&sel.identity_input).await?;
        if shown.trim() != employee_id {
            return Err(AppError::wrong_record_loaded(employee_id, shown.trim()));
        }
        info!("✓ 表单校验通过: {}", employee_id);

        // 读取旧值，清空后写入新值
        self.driver
            .wait_for_selector(&sel.pos_input, timeouts.default_ms)
            .await?;
        let old_pos = self.driver.read_value(&sel.pos_input).await?;
        self.driver.fill(&sel.pos_input, "").await?;
        self.driver.fill(&sel.pos_input, &request.pos_id).await?;
        info!(
            "{}: POS 将从 '{}' 改为 '{}'",
            employee_id, old_pos, request.pos_id
        );
        self.step_delay().await;

        // 保存可能弹出确认对话框，先注册一次性的自动接受
        self.driver.accept_next_dialog().await?;
        self.driver.click(&sel.save_button).await?;
        self.driver.wait_settle(timeouts.navigation_ms).await;
        self.step_delay().await;

        Ok(old_pos)
    }

    /// 等待目标员工所在的行出现并点击其选择控件，必要时重新发起搜索
    async fn select_employee_row(&self, employee_id: &str) -> AppResult<()> {
        let sel = &self.config.selectors;
        let timeouts = &self.config.timeouts;

        for attempt in 1..=timeouts.row_poll_attempts {
            if let Some(row_text) = self
                .try_select_row(employee_id, timeouts.row_wait_ms)
                .await?
            {
                info!(
                    "已选中员工 {} 的结果行: {}",
                    employee_id,
                    truncate_text(&row_text, 200)
                );
                return Ok(());
            }

            if attempt < timeouts.row_poll_attempts {
                warn!(
                    "等待搜索结果第 {}/{} 次未命中，重新发起搜索: {}",
                    attempt, timeouts.row_poll_attempts, employee_id
                );
                sleep(Duration::from_millis(2000)).await;
                self.driver.click(&sel.search_submit).await?;
                sleep(Duration::from_millis(3000)).await;
            }
        }

        self.debug_screenshot(&format!("debug_search_{}", employee_id))
            .await;

        // 轮询期间页面可能才渲染出"没有数据"提示，放弃前再检查一次
        if self.driver.text_present(&sel.no_data_text).await? {
            return Err(AppError::not_found_or_permission_denied(employee_id));
        }
        Err(AppError::row_not_found(
            employee_id,
            timeouts.row_poll_attempts,
        ))
    }

    /// 在限定时间内反复尝试"找行 + 点选"，命中返回该行文本
    async fn try_select_row(
        &self,
        employee_id: &str,
        wait_ms: u64,
    ) -> AppResult<Option<String>> {
        let radio = &self.config.selectors.row_radio;
        let deadline = Instant::now() + Duration::from_millis(wait_ms);

        loop {
            if let Some(row_text) = self
                .driver
                .select_row_by_cell_text(employee_id, radio)
                .await?
            {
                return Ok(Some(row_text));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(Duration::from_millis(500)).await;
        }
    }

    async fn step_delay(&self) {
        if self.config.step_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.step_delay_ms)).await;
        }
    }

    /// 保存调试截图，失败只告警
    async fn debug_screenshot(&self, name: &str) {
        let path = Path::new(&self.config.log_dir).join(format!("{}.png", name));
        if let Err(e) = self.driver.screenshot(&path).await {
            warn!("保存调试截图失败 {}: {}", path.display(), e);
        }
    }
}

#[async_trait]
impl UpdateSession for RowUpdater {
    async fn apply(&mut self, request: &UpdateRequest) -> AppResult<String> {
        self.update_employee_pos(request).await
    }

    async fn reset(&mut self) -> AppResult<()> {
        self.driver.reset_to_search().await
    }
}
