//! tokio 시간 기반 시계.
//!
//! `tokio::time::Instant`의 경과 시간을 시작 시점의 벽시계에 더해 `DateTime<Utc>`로 변환한다.
//! 일시정지된 테스트 런타임에서도 타이머와 메트릭 시각이 같은 시간축을 쓴다.

use chrono::{DateTime, Utc};
use ecoprompt_core::ports::clock::Clock;
use std::time::Duration;
use tokio::time::Instant;

/// 타이머로 기다릴 수 있는 가장 먼 미래 (약 30년)
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_instant: Instant,
    origin_wall: DateTime<Utc>,
}

impl TokioClock {
    /// 현재 시각을 원점으로 하는 시계
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// 지정 벽시계 시각을 원점으로 하는 시계
    pub fn starting_at(origin_wall: DateTime<Utc>) -> Self {
        Self {
            origin_instant: Instant::now(),
            origin_wall,
        }
    }

    /// 벽시계 시각에 대응하는 tokio Instant
    ///
    /// 원점 이전은 원점으로, `Instant`로 표현할 수 없는 먼 미래는 [`FAR_FUTURE`] 뒤로 고정한다.
    pub fn instant_for(&self, at: DateTime<Utc>) -> Instant {
        let offset = (at - self.origin_wall).to_std().unwrap_or(Duration::ZERO);
        self.origin_instant
            .checked_add(offset.min(FAR_FUTURE))
            .unwrap_or_else(|| Instant::now() + FAR_FUTURE)
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin_instant.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin_wall
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
