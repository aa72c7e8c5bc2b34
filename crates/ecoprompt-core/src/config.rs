//! 애플리케이션 설정 구조체.
//!
//! 스트림 감지 임계값, 제공자 셀렉터 테이블, 메트릭 이력 저장 설정을 정의한다.
//! `ConfigManager`를 통해 JSON 파일에서 로드/저장한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::settings::SettingsUpdate;

/// 기본 문자/토큰 비율
pub const DEFAULT_TOKEN_RATIO: f64 = 4.0;

/// 시간 임계값(`*_ms`) 상한: 하루
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 스트림 모니터 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 제공자 셀렉터/모델 매핑
    #[serde(default)]
    pub providers: ProviderConfig,
    /// 메트릭 이력 저장 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            providers: ProviderConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// 로드/저장 전 값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        self.monitor.validate()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 모니터 설정
// ============================================================

/// 스트림 완료 감지 임계값
///
/// 모두 경험적 값이며 페이지 구조에 따라 조정할 수 있다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 텍스트 증가가 없으면 스트림 종료로 보는 시간 (ms)
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
    /// 추적을 시작할 최소 텍스트 길이 (문자)
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
    /// 전송 감지 후 입력 텍스트를 다시 읽기까지의 지연 (ms)
    #[serde(default = "default_send_read_delay_ms")]
    pub send_read_delay_ms: u64,
    /// 메트릭에 남길 스니펫 길이 (문자)
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    /// 문자/토큰 비율
    #[serde(default = "default_token_ratio")]
    pub token_ratio: f64,
    /// 노드별 진단 로그를 info 레벨로 출력
    #[serde(default)]
    pub debug_enabled: bool,
    /// 변경 알림 broadcast 채널 용량
    #[serde(default = "default_change_feed_capacity")]
    pub change_feed_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
            min_text_len: default_min_text_len(),
            send_read_delay_ms: default_send_read_delay_ms(),
            snippet_chars: default_snippet_chars(),
            token_ratio: default_token_ratio(),
            debug_enabled: false,
            change_feed_capacity: default_change_feed_capacity(),
        }
    }
}

impl MonitorConfig {
    /// 조용한 기간
    pub fn quiet_period(&self) -> chrono::Duration {
        interval(self.quiet_period_ms)
    }

    /// 전송 텍스트 지연 읽기 간격
    pub fn send_read_delay(&self) -> chrono::Duration {
        interval(self.send_read_delay_ms)
    }

    /// 시간 임계값이 [`MAX_INTERVAL_MS`] 이하인지 확인
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("monitor.quiet_period_ms", self.quiet_period_ms),
            ("monitor.send_read_delay_ms", self.send_read_delay_ms),
        ] {
            if value > MAX_INTERVAL_MS {
                return Err(CoreError::Validation {
                    field: field.to_string(),
                    message: format!("{}ms는 상한 {}ms를 넘습니다", value, MAX_INTERVAL_MS),
                });
            }
        }
        Ok(())
    }

    /// 유효한 토큰 비율 (0 이하/NaN이면 기본값)
    pub fn effective_token_ratio(&self) -> f64 {
        sanitize_token_ratio(self.token_ratio)
    }

    /// 설정 채널 업데이트 반영
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(ratio) = update.token_ratio {
            self.token_ratio = sanitize_token_ratio(ratio);
        }
        if let Some(debug) = update.debug_enabled {
            self.debug_enabled = debug;
        }
    }
}

/// 상한으로 자른 chrono 간격 (검증을 거치지 않은 설정도 오버플로하지 않는다)
fn interval(ms: u64) -> chrono::Duration {
    chrono::Duration::milliseconds(ms.min(MAX_INTERVAL_MS) as i64)
}

/// 토큰 비율 정규화
pub fn sanitize_token_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        DEFAULT_TOKEN_RATIO
    }
}

fn default_quiet_period_ms() -> u64 {
    1_000
}

fn default_min_text_len() -> usize {
    3
}

fn default_send_read_delay_ms() -> u64 {
    50
}

fn default_snippet_chars() -> usize {
    300
}

fn default_token_ratio() -> f64 {
    DEFAULT_TOKEN_RATIO
}

fn default_change_feed_capacity() -> usize {
    256
}

// ============================================================
// 제공자 설정
// ============================================================

/// 제공자별 후보 셀렉터와 배출량 계산용 모델 매핑
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 제공자 → 순서 있는 셀렉터 목록
    #[serde(default = "default_selectors")]
    pub selectors: BTreeMap<String, Vec<String>>,
    /// 알 수 없는 제공자가 사용할 항목
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// 제공자 → 모델 식별자 (배출량 계수 조회용)
    #[serde(default = "default_provider_models")]
    pub provider_models: BTreeMap<String, String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            selectors: default_selectors(),
            default_provider: default_provider(),
            provider_models: default_provider_models(),
        }
    }
}

impl ProviderConfig {
    /// 제공자 셀렉터 목록 (없으면 기본 항목)
    pub fn selectors_for(&self, provider: &str) -> &[String] {
        self.selectors
            .get(provider)
            .or_else(|| self.selectors.get(&self.default_provider))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 제공자에 매핑된 모델 식별자
    pub fn model_for(&self, provider: &str) -> Option<&str> {
        self.provider_models.get(provider).map(String::as_str)
    }
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_selectors() -> BTreeMap<String, Vec<String>> {
    let openai = [
        r#"div[data-testid="message"]"#,
        r#"div[class*="message"]"#,
        r#"div[role="listitem"]"#,
    ];
    let anthropic = [
        r#"div[data-testid="message-container"]"#,
        r#"div[data-testid="message"]"#,
        r#"div[class*="message-content"]"#,
        r#"div[role="article"]"#,
        "article",
        r#"div[class*="message"]"#,
        r#"div[class*="response"]"#,
        "div > div > div",
    ];

    let mut table = BTreeMap::new();
    table.insert(
        "openai".to_string(),
        openai.iter().map(|s| s.to_string()).collect(),
    );
    table.insert(
        "anthropic".to_string(),
        anthropic.iter().map(|s| s.to_string()).collect(),
    );
    table
}

fn default_provider_models() -> BTreeMap<String, String> {
    let mut models = BTreeMap::new();
    models.insert("openai".to_string(), "gpt-4o".to_string());
    models.insert("anthropic".to_string(), "claude-3.7-sonnet".to_string());
    models
}

// ============================================================
// 저장소 설정
// ============================================================

/// 메트릭 이력 저장 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 경로 (None이면 데이터 디렉토리 기본값)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// 보관할 최신 메트릭 수
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}

/// ms 값을 std Duration으로 변환 (tokio 타이머용)
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
