//! SQLite 저장소 어댑터.
//!
//! `MetricsHistory` 포트 구현.
//!
//! # 모듈 구조
//! - `metrics`: 응답 메트릭 이력 저장/조회, 보관 상한 적용

mod metrics;

use ecoprompt_core::error::CoreError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::migration;

/// SQLite 저장소 — `MetricsHistory` 포트 구현
#[derive(Debug)]
pub struct SqliteStorage {
    pub(super) conn: Mutex<Connection>,
    pub(super) history_limit: usize,
}

impl SqliteStorage {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path, history_limit: usize) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| CoreError::Internal(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )
        .map_err(|e| CoreError::Internal(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Internal(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            history_limit,
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory(history_limit: usize) -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Internal(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Internal(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            history_limit,
        })
    }

    /// 보관 상한
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}
