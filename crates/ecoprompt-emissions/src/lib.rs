//! # ecoprompt-emissions
//!
//! LLM 응답 한 건의 환경 영향 추정.
//! 추론 시간(지연 + 생성 시간)에 모델별 전력/PUE/WUE/탄소 계수를 곱하는 폐쇄형 계산이다.
//!
//! - [`model_table`] — 모델 계수 테이블과 조회
//! - [`calculator`] — `compute`, 결과 구조체
//! - [`display`] — 화면 표시용 문자열

pub mod calculator;
pub mod display;
pub mod model_table;

pub use calculator::{compute, compute_for_metrics, EmissionsReport};
pub use display::{format_for_display, EmissionsDisplay};
pub use model_table::{lookup, ModelClass, ModelConfig};
