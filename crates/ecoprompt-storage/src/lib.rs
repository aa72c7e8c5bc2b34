//! # ecoprompt-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 메트릭 이력 저장, 스키마 마이그레이션,
//! 최신 N개(기본 50) 보관 상한을 관리한다.
//!
//! ## 모듈
//! - `sqlite`: 메트릭 이력 저장소 (MetricsHistory 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
pub use sqlite::SqliteStorage;
