use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// `CancelSignal::wait` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    TimedOut,
    Signaled,
}

/// 一次性的可中断等待原语
///
/// 状态只能从“未触发”变为“已触发”，触发后所有当前和之后的 `wait` 立即返回。
/// 每个启用周期使用一个新的实例。
#[derive(Debug, Default)]
pub struct CancelSignal {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        if !*raised {
            *raised = true;
            self.cond.notify_all();
        }
    }

    pub fn is_raised(&self) -> bool {
        *self.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 阻塞直到超时或信号被触发
    ///
    /// 超时长到无法表示为截止时间时，只等待信号。
    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now().checked_add(timeout);
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        // 处理虚假唤醒
        while !*raised {
            let Some(deadline) = deadline else {
                raised = self.cond.wait(raised).unwrap_or_else(PoisonError::into_inner);
                continue;
            };
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }
            raised = self
                .cond
                .wait_timeout(raised, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        WaitOutcome::Signaled
    }
}
