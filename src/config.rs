/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 登录页地址
    pub login_url: String,
    /// 员工搜索页地址
    pub employee_search_url: String,
    /// 待更新行数据文件（TOML）
    pub rows_file: String,
    /// 是否以有头模式运行浏览器（调试用）
    pub headful: bool,
    /// dry-run 模式：不触碰远端会话，只校验行数据
    pub dry_run: bool,
    /// 从第几个有效行开始处理（断点续跑）
    pub row_offset: usize,
    /// 最多处理多少行（offset 之后）
    pub row_limit: Option<usize>,
    /// 每行失败后的额外重试次数
    pub retries: u32,
    /// 重试前的退避秒数
    pub retry_backoff_seconds: f64,
    /// 主步骤之间的固定等待毫秒数（纯粹迁就渲染慢的页面，0 表示关闭）
    pub step_delay_ms: u64,
    /// 审计报表输出路径
    pub audit_csv: String,
    /// 无效行报表输出路径
    pub invalid_csv: String,
    /// 权限受限员工报表输出路径
    pub permission_denied_csv: String,
    /// 日志与调试截图目录
    pub log_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 页面元素选择器
    pub selectors: Selectors,
    /// 各类等待时长
    pub timeouts: Timeouts,
}

/// 页面元素选择器
#[derive(Clone, Debug)]
pub struct Selectors {
    pub username_input: String,
    pub password_input: String,
    pub login_submit: String,
    pub search_input: String,
    pub search_submit: String,
    /// 结果行内的选择控件
    pub row_radio: String,
    pub edit_button: String,
    /// 编辑表单上的员工标识字段（只读校验用）
    pub identity_input: String,
    pub pos_input: String,
    pub save_button: String,
    /// 搜索无结果时页面显示的提示文本
    pub no_data_text: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            username_input: "#username".to_string(),
            password_input: "#password".to_string(),
            login_submit: "#loginBtn".to_string(),
            search_input: "#sharing_key".to_string(),
            search_submit: "#doSearch".to_string(),
            row_radio: "input[name='sharing_partner_rad']".to_string(),
            edit_button: "#goEdit".to_string(),
            identity_input: "#sharing_key".to_string(),
            pos_input: "#info".to_string(),
            save_button: "#doEdit".to_string(),
            no_data_text: "Không có dữ liệu".to_string(),
        }
    }
}

/// 各类等待时长
#[derive(Clone, Debug)]
pub struct Timeouts {
    /// 一般元素等待毫秒数
    pub default_ms: u64,
    /// 导航/网络静止等待毫秒数（超时只告警，不视为失败）
    pub navigation_ms: u64,
    /// 单次等待结果行出现的毫秒数
    pub row_wait_ms: u64,
    /// 等待结果行的轮询次数（每次会重新发起搜索）
    pub row_poll_attempts: usize,
    /// 重置到搜索页后的固定静置毫秒数
    pub settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: 15000,
            navigation_ms: 20000,
            row_wait_ms: 10000,
            row_poll_attempts: 3,
            settle_ms: 2000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_url: "https://partner-admin.msocial.vn/login".to_string(),
            employee_search_url: "https://partner-admin.msocial.vn/sharing-partner/list"
                .to_string(),
            rows_file: "rows.toml".to_string(),
            headful: false,
            dry_run: false,
            row_offset: 0,
            row_limit: None,
            retries: 2,
            retry_backoff_seconds: 2.0,
            step_delay_ms: 0,
            audit_csv: "logs/audit.csv".to_string(),
            invalid_csv: "logs/invalid_users.csv".to_string(),
            permission_denied_csv: "logs/permission_denied.csv".to_string(),
            log_dir: "logs".to_string(),
            output_log_file: "logs/output.txt".to_string(),
            selectors: Selectors::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            login_url: std::env::var("LOGIN_URL").unwrap_or(default.login_url),
            employee_search_url: std::env::var("EMPLOYEE_SEARCH_URL")
                .unwrap_or(default.employee_search_url),
            rows_file: std::env::var("ROWS_FILE").unwrap_or(default.rows_file),
            headful: std::env::var("HEADFUL").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headful),
            dry_run: std::env::var("DRY_RUN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dry_run),
            row_offset: std::env::var("ROW_OFFSET").ok().and_then(|v| v.parse().ok()).unwrap_or(default.row_offset),
            row_limit: std::env::var("ROW_LIMIT").ok().and_then(|v| v.parse().ok()),
            retries: std::env::var("RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retries),
            retry_backoff_seconds: std::env::var("RETRY_BACKOFF_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_backoff_seconds),
            step_delay_ms: std::env::var("STEP_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.step_delay_ms),
            audit_csv: std::env::var("AUDIT_CSV").unwrap_or(default.audit_csv),
            invalid_csv: std::env::var("INVALID_CSV").unwrap_or(default.invalid_csv),
            permission_denied_csv: std::env::var("PERMISSION_DENIED_CSV").unwrap_or(default.permission_denied_csv),
            log_dir: std::env::var("LOG_DIR").unwrap_or(default.log_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            selectors: default.selectors,
            timeouts: default.timeouts,
        }
    }
}
