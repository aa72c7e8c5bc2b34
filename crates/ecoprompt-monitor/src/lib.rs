//! # ecoprompt-monitor
//!
//! 채팅 페이지의 어시스턴트 응답 스트림 완료 감지.
//!
//! 변경 알림 배치마다 후보 요소를 다시 조회해 텍스트 성장을 추적하고,
//! 일정 시간(조용한 기간) 동안 성장이 없으면 응답이 끝난 것으로 보고 메트릭을 확정한다.
//!
//! - [`session`] — 상태 머신 (`MonitorSession`)
//! - [`stream_monitor`] — tokio 구동 태스크와 핸들
//! - [`virtual_dom`] — 인메모리 문서 어댑터

pub mod clock;
pub mod emitter;
pub mod provider;
pub mod send_detector;
pub mod session;
pub mod stream_monitor;
pub mod timers;
pub mod tracker;
pub mod virtual_dom;

pub use session::MonitorSession;
pub use stream_monitor::{MonitorHandle, StreamMonitor};
pub use virtual_dom::VirtualDocument;
