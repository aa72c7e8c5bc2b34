//! ecoprompt 도메인 모델.
//!
//! 모니터 세션, 싱크, 저장소가 공유하는 데이터 구조체를 정의한다.
//! 외부로 나가는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod dom;
pub mod metrics;
pub mod send;
pub mod settings;
