//! 重试流程与批量执行的行为测试
//!
//! 用脚本化的 mock 会话替换真实浏览器，验证重试预算、会话重置次数、
//! 结果顺序等关键性质

use std::collections::VecDeque;

use async_trait::async_trait;
use employee_pos_update::error::{AppError, AppResult};
use employee_pos_update::models::UpdateRequest;
use employee_pos_update::workflow::{RetryFlow, UpdateSession};
use employee_pos_update::{run_batch, Config};

/// 脚本化的 mock 会话：apply 按脚本依次返回，统计调用次数
struct MockSession {
    script: VecDeque<AppResult<String>>,
    apply_calls: usize,
    reset_calls: usize,
}

impl MockSession {
    fn new(script: Vec<AppResult<String>>) -> Self {
        Self {
            script: script.into(),
            apply_calls: 0,
            reset_calls: 0,
        }
    }
}

#[async_trait]
impl UpdateSession for MockSession {
    async fn apply(&mut self, _request: &UpdateRequest) -> AppResult<String> {
        self.apply_calls += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok("OLD".to_string()))
    }

    async fn reset(&mut self) -> AppResult<()> {
        self.reset_calls += 1;
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.retries = 2;
    // 测试里不需要真实退避
    config.retry_backoff_seconds = 0.0;
    config.dry_run = false;
    config
}

fn request(employee_id: &str, pos_id: &str) -> UpdateRequest {
    UpdateRequest {
        employee_id: employee_id.to_string(),
        pos_id: pos_id.to_string(),
    }
}

#[tokio::test]
async fn scenario_two_rows_succeed_with_one_reset() {
    let config = test_config();
    let flow = RetryFlow::new(&config);
    let mut session = MockSession::new(vec![Ok("old1".to_string()), Ok("old2".to_string())]);
    let requests = vec![request("E1", "P1"), request("E2", "P2")];

    let outcomes = run_batch(&mut session, &requests, &flow).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].employee_id, "E1");
    assert_eq!(outcomes[1].employee_id, "E2");
    assert!(outcomes.iter().all(|outcome| outcome.success));
    assert_eq!(outcomes[0].old_pos.as_deref(), Some("old1"));
    assert_eq!(outcomes[1].old_pos.as_deref(), Some("old2"));
    assert_eq!(outcomes[0].new_pos.as_deref(), Some("P1"));
    assert_eq!(outcomes[1].new_pos.as_deref(), Some("P2"));

    assert_eq!(session.apply_calls, 2);
    // 只在第二行开始前重置一次
    assert_eq!(session.reset_calls, 1);
}

#[tokio::test]
async fn scenario_permission_denied_exhausts_retry_budget() {
    let config = test_config();
    let flow = RetryFlow::new(&config);
    let mut session = MockSession::new(vec![
        Err(AppError::not_found_or_permission_denied("E1")),
        Err(AppError::not_found_or_permission_denied("E1")),
        Err(AppError::not_found_or_permission_denied("E1")),
    ]);
    let requests = vec![request("E1", "P1")];

    let outcomes = run_batch(&mut session, &requests, &flow).await;

    // retries=2 意味着总共恰好 3 次尝试
    assert_eq!(session.apply_calls, 3);
    // 每次重试前各重置一次
    assert_eq!(session.reset_calls, 2);

    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].success);
    let error = outcomes[0].error.as_deref().unwrap_or("").to_lowercase();
    assert!(error.contains("permission"));
}

#[tokio::test]
async fn scenario_transient_failure_recovers_after_one_retry() {
    let config = test_config();
    let flow = RetryFlow::new(&config);
    let mut session = MockSession::new(vec![
        Err(AppError::interaction("搜索按钮未响应")),
        Ok("old1".to_string()),
    ]);
    let requests = vec![request("E1", "P1")];

    let outcomes = run_batch(&mut session, &requests, &flow).await;

    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].old_pos.as_deref(), Some("old1"));
    // 恰好一轮重试：一次重置，两次尝试
    assert_eq!(session.apply_calls, 2);
    assert_eq!(session.reset_calls, 1);
}

#[tokio::test]
async fn retry_budget_is_respected_exactly() {
    // retries=0：失败一次即终态
    let mut config = test_config();
    config.retries = 0;
    let flow = RetryFlow::new(&config);
    let mut session = MockSession::new(vec![Err(AppError::interaction("失败"))]);
    let outcomes = run_batch(&mut session, &[request("E1", "P1")], &flow).await;
    assert!(!outcomes[0].success);
    assert_eq!(session.apply_calls, 1);
    assert_eq!(session.reset_calls, 0);

    // retries=3：恰好 4 次尝试
    let mut config = test_config();
    config.retries = 3;
    let flow = RetryFlow::new(&config);
    let mut session = MockSession::new(vec![
        Err(AppError::interaction("失败")),
        Err(AppError::interaction("失败")),
        Err(AppError::interaction("失败")),
        Err(AppError::interaction("失败")),
    ]);
    let outcomes = run_batch(&mut session, &[request("E1", "P1")], &flow).await;
    assert!(!outcomes[0].success);
    assert_eq!(session.apply_calls, 4);
    assert_eq!(session.reset_calls, 3);
}

#[tokio::test]
async fn dry_run_never_invokes_the_session() {
    let mut config = test_config();
    config.dry_run = true;
    let flow = RetryFlow::new(&config);
    let mut session = MockSession::new(vec![]);
    let requests = vec![request("E1", "P1"), request("E2", "P2")];

    let outcomes = run_batch(&mut session, &requests, &flow).await;

    assert_eq!(session.apply_calls, 0);
    for (outcome, request) in outcomes.iter().zip(&requests) {
        assert!(outcome.success);
        assert!(outcome.old_pos.is_none());
        assert_eq!(outcome.new_pos.as_deref(), Some(request.pos_id.as_str()));
        assert!(outcome.error.is_none());
    }
    // 行间重置仍然照常执行
    assert_eq!(session.reset_calls, 1);
}

#[tokio::test]
async fn outcomes_preserve_order_and_invariants() {
    let config = test_config();
    let flow = RetryFlow::new(&config);
    // 第二行三次全挂，其余成功
    let mut session = MockSession::new(vec![
        Ok("a".to_string()),
        Err(AppError::interaction("失败")),
        Err(AppError::interaction("失败")),
        Err(AppError::interaction("失败")),
        Ok("c".to_string()),
    ]);
    let requests = vec![
        request("E1", "P1"),
        request("E2", "P2"),
        request("E3", "P3"),
    ];

    let outcomes = run_batch(&mut session, &requests, &flow).await;

    assert_eq!(outcomes.len(), requests.len());
    let ids: Vec<&str> = outcomes
        .iter()
        .map(|outcome| outcome.employee_id.as_str())
        .collect();
    assert_eq!(ids, vec!["E1", "E2", "E3"]);
    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);
    assert!(outcomes[2].success);

    // success <=> error 为空
    for outcome in &outcomes {
        assert_eq!(outcome.success, outcome.error.is_none());
        if outcome.success {
            assert_eq!(outcome.new_pos.as_deref(), Some(outcome.pos_id.as_str()));
        }
    }

    // 重置次数 = 行间重置 (3-1) + 重试重置 (2)
    assert_eq!(session.reset_calls, 4);
}
