//! 페이지 호스트 → 제공자 식별자.

/// 호스트명으로 제공자 추정
///
/// 알려진 제공자가 아니면 호스트명 자체를 돌려주며, 셀렉터 조회 시 기본 항목으로 대체된다.
pub fn guess_provider(host: &str) -> String {
    let host = host.trim().to_lowercase();
    if host.contains("openai") || host.contains("chatgpt") {
        "openai".to_string()
    } else if host.contains("claude") || host.contains("anthropic") {
        "anthropic".to_string()
    } else {
        host
    }
}
