use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 浏览器相关错误
    Browser(BrowserError),
    /// 更新业务错误
    Update(UpdateError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Browser(e) => write!(f, "浏览器错误: {}", e),
            AppError::Update(e) => write!(f, "{}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Browser(e) => Some(e),
            AppError::Update(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 浏览器相关错误
#[derive(Debug)]
pub enum BrowserError {
    /// 启动浏览器失败
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    ScriptExecutionFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 脚本返回值解析失败
    ScriptResultParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    ConfigurationFailed {
        message: String,
    },
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::LaunchFailed { source } => {
                write!(f, "启动浏览器失败: {}", source)
            }
            BrowserError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
            BrowserError::NavigationFailed { url, source } => {
                write!(f, "导航到 {} 失败: {}", url, source)
            }
            BrowserError::ScriptExecutionFailed { source } => {
                write!(f, "执行脚本失败: {}", source)
            }
            BrowserError::ScriptResultParseFailed { source } => {
                write!(f, "脚本返回值解析失败: {}", source)
            }
            BrowserError::ConfigurationFailed { message } => {
                write!(f, "浏览器配置失败: {}", message)
            }
        }
    }
}

impl std::error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrowserError::LaunchFailed { source }
            | BrowserError::PageCreationFailed { source }
            | BrowserError::NavigationFailed { source, .. }
            | BrowserError::ScriptExecutionFailed { source }
            | BrowserError::ScriptResultParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            BrowserError::ConfigurationFailed { .. } => None,
        }
    }
}

/// 更新业务错误
///
/// 登录失败是致命错误；其余各类都是行级错误，由重试层按预算重试，
/// 耗尽预算后记入该行的终态结果，不会中断整批处理
#[derive(Debug)]
pub enum UpdateError {
    /// 管理后台登录失败（致命，不处理任何行）
    AuthFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 搜索结果显示"没有数据"：员工不存在，或当前账号无权限访问
    NotFoundOrPermissionDenied {
        employee_id: String,
    },
    /// 多次重新搜索后仍未出现完全匹配的结果行
    RowNotFound {
        employee_id: String,
        attempts: usize,
    },
    /// 编辑表单加载的记录与请求的员工不一致
    WrongRecordLoaded {
        expected: String,
        actual: String,
    },
    /// 等待页面元素超时
    SelectorTimeout {
        selector: String,
        waited_ms: u64,
    },
    /// 其余未分类的页面交互异常
    Interaction {
        detail: String,
    },
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::AuthFailed { source } => {
                write!(f, "管理后台登录失败: {}", source)
            }
            UpdateError::NotFoundOrPermissionDenied { employee_id } => {
                // 报表分流按 "not found" / "permission" 文本匹配，保留英文关键词
                write!(
                    f,
                    "员工不存在或无权限访问 (user not found or no permission): {}",
                    employee_id
                )
            }
            UpdateError::RowNotFound {
                employee_id,
                attempts,
            } => {
                write!(
                    f,
                    "重新搜索 {} 次后仍未找到员工结果行 (row not found): {}",
                    attempts, employee_id
                )
            }
            UpdateError::WrongRecordLoaded { expected, actual } => {
                write!(
                    f,
                    "表单加载了错误的记录: 期望 '{}', 实际为 '{}'",
                    expected, actual
                )
            }
            UpdateError::SelectorTimeout {
                selector,
                waited_ms,
            } => {
                write!(f, "等待页面元素 {} 超时 ({}ms)", selector, waited_ms)
            }
            UpdateError::Interaction { detail } => {
                write!(f, "页面交互异常: {}", detail)
            }
        }
    }
}

impl std::error::Error for UpdateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpdateError::AuthFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 其他 IO 错误
    Io {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
            FileError::Io { source } => write!(f, "IO错误: {}", source),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::TomlParseFailed { source, .. }
            | FileError::Io { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量不存在或为空
    EnvVarNotFound {
        var_name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarNotFound { var_name } => {
                write!(f, "环境变量 {} 不存在或为空", var_name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ScriptResultParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::Io {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器启动错误
    pub fn launch_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Browser(BrowserError::LaunchFailed {
            source: Box::new(source),
        })
    }

    /// 创建页面创建错误
    pub fn page_creation_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(source),
        })
    }

    /// 创建导航错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建浏览器配置错误
    pub fn browser_configuration_failed(message: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::ConfigurationFailed {
            message: message.into(),
        })
    }

    /// 创建登录失败错误
    pub fn auth_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Update(UpdateError::AuthFailed {
            source: Box::new(source),
        })
    }

    /// 创建"不存在或无权限"错误
    pub fn not_found_or_permission_denied(employee_id: impl Into<String>) -> Self {
        AppError::Update(UpdateError::NotFoundOrPermissionDenied {
            employee_id: employee_id.into(),
        })
    }

    /// 创建"未找到结果行"错误
    pub fn row_not_found(employee_id: impl Into<String>, attempts: usize) -> Self {
        AppError::Update(UpdateError::RowNotFound {
            employee_id: employee_id.into(),
            attempts,
        })
    }

    /// 创建"加载了错误记录"错误
    pub fn wrong_record_loaded(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        AppError::Update(UpdateError::WrongRecordLoaded {
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    /// 创建元素等待超时错误
    pub fn selector_timeout(selector: impl Into<String>, waited_ms: u64) -> Self {
        AppError::Update(UpdateError::SelectorTimeout {
            selector: selector.into(),
            waited_ms,
        })
    }

    /// 创建页面交互异常错误
    pub fn interaction(detail: impl Into<String>) -> Self {
        AppError::Update(UpdateError::Interaction {
            detail: detail.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 TOML 解析错误
    pub fn toml_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建环境变量缺失错误
    pub fn env_var_not_found(var_name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::EnvVarNotFound {
            var_name: var_name.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_text_carries_report_keywords() {
        let err = AppError::not_found_or_permission_denied("E1");
        let text = err.to_string().to_lowercase();
        assert!(text.contains("not found"));
        assert!(text.contains("permission"));
        assert!(text.contains("e1"));
    }

    #[test]
    fn wrong_record_text_names_both_ids() {
        let err = AppError::wrong_record_loaded("E1", "E2");
        let text = err.to_string();
        assert!(text.contains("E1"));
        assert!(text.contains("E2"));
    }

    #[test]
    fn auth_failed_keeps_source_chain() {
        let inner = AppError::interaction("点击登录按钮失败");
        let err = AppError::auth_failed(inner);
        assert!(std::error::Error::source(&err).is_some());
    }
}
