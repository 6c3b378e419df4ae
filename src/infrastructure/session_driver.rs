//! 会话驱动器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"操作远端会话"的能力

use std::path::Path;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::{Config, Selectors, Timeouts};
use crate::error::{AppError, AppResult};
use crate::models::Credentials;

/// 会话驱动器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露导航 / 填表 / 点击 / 读取 / 等待能力
/// - 负责登录和"重置到搜索页"两个会话级操作
/// - 不认识 UpdateRequest，不处理业务流程
///
/// 远端会话状态（当前筛选、选中行、打开的表单）只在 `reset_to_search`
/// 刚执行完时是可信的，其余时刻一律视为未知
pub struct SessionDriver {
    page: Page,
    login_url: String,
    search_url: String,
    selectors: Selectors,
    timeouts: Timeouts,
}

impl SessionDriver {
    /// 创建新的会话驱动器
    pub fn new(page: Page, config: &Config) -> Self {
        Self {
            page,
            login_url: config.login_url.clone(),
            search_url: config.employee_search_url.clone(),
            selectors: config.selectors.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    // ========== JS 执行能力 ==========

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    // ========== 表单与页面原语 ==========

    /// 填充输入框并触发 input/change 事件
    pub async fn fill(&self, selector: &str, value: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.value = {val};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            sel = serde_json::to_string(selector)?,
            val = serde_json::to_string(value)?,
        );

        let found: bool = self.eval_as(js_code).await?;
        if !found {
            return Err(AppError::interaction(format!("找不到输入框: {}", selector)));
        }
        Ok(())
    }

    /// 点击页面元素
    pub async fn click(&self, selector: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.click();
                return true;
            }})()
            "#,
            sel = serde_json::to_string(selector)?,
        );

        let found: bool = self.eval_as(js_code).await?;
        if !found {
            return Err(AppError::interaction(format!("找不到可点击元素: {}", selector)));
        }
        Ok(())
    }

    /// 读取表单字段的当前值
    pub async fn read_value(&self, selector: &str) -> AppResult<String> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                return el ? String(el.value) : null;
            }})()
            "#,
            sel = serde_json::to_string(selector)?,
        );

        let value: Option<String> = self.eval_as(js_code).await?;
        value.ok_or_else(|| AppError::interaction(format!("找不到表单字段: {}", selector)))
    }

    /// 页面正文是否包含指定文本
    pub async fn text_present(&self, text: &str) -> AppResult<bool> {
        let js_code = format!(
            "(() => !!document.body && document.body.innerText.includes({}))()",
            serde_json::to_string(text)?,
        );
        self.eval_as(js_code).await
    }

    /// 在结果表格中查找标识单元格与给定文本完全相等的行，点击其选择控件
    ///
    /// 完全相等匹配（去除首尾空白），取第一个命中的行；
    /// 命中时返回该行文本用于日志，未命中返回 None
    pub async fn select_row_by_cell_text(
        &self,
        cell_text: &str,
        radio_selector: &str,
    ) -> AppResult<Option<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const target = {target};
                const rows = Array.from(document.querySelectorAll('tr'));
                for (const row of rows) {{
                    const cells = Array.from(row.querySelectorAll('td'));
                    if (!cells.some(td => td.innerText.trim() === target)) continue;
                    const control = row.querySelector({radio});
                    if (!control) continue;
                    control.click();
                    return row.innerText;
                }}
                return null;
            }})()
            "#,
            target = serde_json::to_string(cell_text)?,
            radio = serde_json::to_string(radio_selector)?,
        );
        self.eval_as(js_code).await
    }

    // ========== 等待能力 ==========

    /// 轮询等待元素出现，超时返回错误
    pub async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> AppResult<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let js_code = format!(
            "(() => document.querySelector({}) !== null)()",
            serde_json::to_string(selector)?,
        );

        loop {
            if self.eval_as::<bool>(js_code.clone()).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::selector_timeout(selector, timeout_ms));
            }
            sleep(Duration::from_millis(250)).await;
        }
    }

    /// 等待页面导航/网络活动静止
    ///
    /// 超时只告警不报错：远端系统可能只是渲染得慢，后续步骤会自行检查页面状态
    pub async fn wait_settle(&self, timeout_ms: u64) {
        match timeout(
            Duration::from_millis(timeout_ms),
            self.page.wait_for_navigation(),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("等待导航完成失败: {}，继续执行", e),
            Err(_) => warn!("等待网络静止超时 ({}ms)，继续执行", timeout_ms),
        }
        sleep(Duration::from_millis(500)).await;
    }

    // ========== 会话级操作 ==========

    /// 登录管理后台
    ///
    /// 登录序列里的任何失败都包装为致命的登录错误向上传播，
    /// 调用方不应在登录失败后处理任何行
    pub async fn login(&self, credentials: &Credentials) -> AppResult<()> {
        info!("🔐 正在登录管理后台...");
        self.run_login(credentials)
            .await
            .map_err(AppError::auth_failed)?;
        info!("✓ 登录流程已执行完毕");
        Ok(())
    }

    async fn run_login(&self, credentials: &Credentials) -> AppResult<()> {
        self.goto(&self.login_url).await?;
        self.fill(&self.selectors.username_input, &credentials.username)
            .await?;
        self.fill(&self.selectors.password_input, &credentials.password)
            .await?;
        self.click(&self.selectors.login_submit).await?;
        self.wait_settle(self.timeouts.navigation_ms).await;
        Ok(())
    }

    /// 打开员工搜索页（不额外静置）
    pub async fn open_search_page(&self) -> AppResult<()> {
        self.goto(&self.search_url).await
    }

    /// 重置到搜索页并静置，丢弃一切残留的筛选/选中/表单状态
    ///
    /// 上一行失败后远端会话处于未知状态，这是唯一能回到已知状态的途径
    pub async fn reset_to_search(&self) -> AppResult<()> {
        info!("🔄 正在重置到搜索页...");
        self.goto(&self.search_url).await?;
        sleep(Duration::from_millis(self.timeouts.settle_ms)).await;
        Ok(())
    }

    /// 导航到指定地址并等待导航完成
    pub async fn goto(&self, url: &str) -> AppResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::navigation_failed(url, e))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| AppError::navigation_failed(url, e))?;
        Ok(())
    }

    /// 注册一次性的确认对话框处理器：自动接受下一个对话框
    ///
    /// 只消费一个事件，处理完后监听器随任务结束而释放，
    /// 不会在多次重试之间越积越多
    pub async fn accept_next_dialog(&self) -> AppResult<()> {
        let mut dialogs = self
            .page
            .event_listener::<EventJavascriptDialogOpening>()
            .await?;

        let params = HandleJavaScriptDialogParams::builder()
            .accept(true)
            .build()
            .map_err(AppError::browser_configuration_failed)?;

        let page = self.page.clone();
        tokio::spawn(async move {
            if let Some(dialog) = dialogs.next().await {
                debug!("自动接受确认对话框: {}", dialog.message);
                if let Err(e) = page.execute(params).await {
                    warn!("接受确认对话框失败: {}", e);
                }
            }
        });

        Ok(())
    }

    /// 保存当前页面截图（调试用）
    pub async fn screenshot(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }
}
