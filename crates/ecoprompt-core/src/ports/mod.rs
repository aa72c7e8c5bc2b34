//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 호스트 환경(문서 관찰, 입력 이벤트)과 싱크/저장소 어댑터가 이 trait들을 구현하며,
//! `ecoprompt-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 저장소처럼 I/O가 있는 포트는 `async_trait` 매크로로 object safety를 보장한다.
//! 모니터 세션 경로의 포트는 동기식이다 (단일 논리 스레드에서 블로킹 없이 호출됨).

pub mod clock;
pub mod document;
pub mod send_detector;
pub mod sink;
pub mod storage;
