//! 모델별 계수 테이블.
//!
//! 시작 시 한 번 정의되고 변경되지 않는다. 알 수 없는 모델은 보수적인 기본 행(Large)으로 대체된다.

use serde::Serialize;
use std::fmt;

/// 모델 규모 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelClass {
    Small,
    Medium,
    Large,
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        };
        f.write_str(name)
    }
}

/// 모델 하나의 전력/물/탄소 계수
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelConfig {
    pub name: &'static str,
    pub provider: &'static str,
    pub hardware: &'static str,
    pub class: ModelClass,
    /// GPU 정격 전력 (kW)
    pub p_gpu_kw: f64,
    /// 비 GPU 정격 전력 (kW)
    pub p_non_gpu_kw: f64,
    /// GPU 사용률
    pub u_gpu: f64,
    /// 비 GPU 사용률
    pub u_non_gpu: f64,
    /// 전력 사용 효율
    pub pue: f64,
    /// 현장 물 사용 효율 (L/kWh)
    pub wue_site: f64,
    /// 발전원 물 사용 효율 (L/kWh)
    pub wue_source: f64,
    /// 탄소 집약도 (kgCO₂e/kWh)
    pub cif: f64,
}

impl ModelConfig {
    /// 실효 전력 (kW) = GPU 전력 × 사용률 + 비 GPU 전력 × 사용률
    pub fn power_draw_kw(&self) -> f64 {
        self.p_gpu_kw * self.u_gpu + self.p_non_gpu_kw * self.u_non_gpu
    }
}

const fn openai(name: &'static str, hardware: &'static str, class: ModelClass) -> ModelConfig {
    let large = matches!(class, ModelClass::Large);
    ModelConfig {
        name,
        provider: "OpenAI (Azure)",
        hardware,
        class,
        p_gpu_kw: if large { 10.20 } else { 6.50 },
        p_non_gpu_kw: if large { 1.02 } else { 0.65 },
        u_gpu: if large { 0.065 } else { 0.0625 },
        u_non_gpu: if large { 0.0625 } else { 0.03125 },
        pue: 1.12,
        wue_site: 0.30,
        wue_source: 3.142,
        cif: 0.3528,
    }
}

const fn anthropic(name: &'static str) -> ModelConfig {
    ModelConfig {
        name,
        provider: "Anthropic (AWS)",
        hardware: "DGX H100/H200",
        class: ModelClass::Large,
        p_gpu_kw: 10.20,
        p_non_gpu_kw: 1.02,
        u_gpu: 0.065,
        u_non_gpu: 0.0625,
        pue: 1.14,
        wue_site: 0.18,
        wue_source: 3.142,
        cif: 0.385,
    }
}

/// 모델 식별자 → 계수 (부분 일치 시 이 순서로 검사)
pub static MODEL_CONFIGS: &[(&str, ModelConfig)] = &[
    ("gpt-4o", openai("GPT-4o", "DGX H100/H200", ModelClass::Large)),
    ("gpt-4o-mini", openai("GPT-4o mini", "DGX A100", ModelClass::Medium)),
    ("gpt-4", openai("GPT-4", "DGX H100/H200", ModelClass::Large)),
    ("claude-3.7-sonnet", anthropic("Claude-3.7 Sonnet")),
    ("claude-3.5-sonnet", anthropic("Claude-3.5 Sonnet")),
    ("claude-3-sonnet", anthropic("Claude-3 Sonnet")),
];

/// 알 수 없는 모델용 기본 행
pub static DEFAULT_CONFIG: ModelConfig = ModelConfig {
    name: "Unknown Model",
    provider: "Unknown",
    ..openai("", "DGX H100/H200", ModelClass::Large)
};

/// 모델 식별자로 계수 조회
///
/// 소문자/trim 정규화 후 정확 일치, 그다음 테이블 순서로 첫 부분 일치(어느 방향이든),
/// 마지막으로 기본 행. `gpt-4o`가 `gpt-4o-mini`보다 앞에 있으므로
/// 버전이 붙은 mini 식별자는 GPT-4o 행으로 간다.
pub fn lookup(model: &str) -> &'static ModelConfig {
    let normalized = model.trim().to_lowercase();
    if normalized.is_empty() {
        return &DEFAULT_CONFIG;
    }

    if let Some((_, config)) = MODEL_CONFIGS.iter().find(|(key, _)| *key == normalized) {
        return config;
    }

    if let Some((_, config)) = MODEL_CONFIGS
        .iter()
        .find(|(key, _)| normalized.contains(key) || key.contains(normalized.as_str()))
    {
        return config;
    }

    tracing::debug!("알 수 없는 모델, 기본 계수 사용: {}", model);
    &DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive() {
        assert_eq!(lookup("GPT-4o").name, "GPT-4o");
        assert_eq!(lookup("  claude-3.5-sonnet ").name, "Claude-3.5 Sonnet");
        assert_eq!(lookup("gpt-4o-mini").class, ModelClass::Medium);
    }

    #[test]
    fn versioned_identifiers_match_by_substring() {
        assert_eq!(lookup("claude-3.7-sonnet-20250219").name, "Claude-3.7 Sonnet");
        assert_eq!(lookup("gpt-4-turbo").name, "GPT-4");
        assert_eq!(lookup("4o").name, "GPT-4o");
        assert_eq!(lookup("3-sonnet").name, "Claude-3 Sonnet");
    }

    #[test]
    fn partial_match_follows_table_order() {
        // 정확 일치가 아니면 앞선 행이 이긴다
        let versioned = lookup("gpt-4o-mini-2024-07-18");
        assert_eq!(versioned.name, "GPT-4o");
        assert_eq!(versioned.class, ModelClass::Large);
        assert_eq!(lookup("gpt-4o-2024-08-06").name, "GPT-4o");
        assert_eq!(lookup("gpt-4o-mini").class, ModelClass::Medium);
    }

    #[test]
    fn unknown_model_uses_large_default() {
        let config = lookup("foo-bar");
        assert_eq!(config, &DEFAULT_CONFIG);
        assert_eq!(config.name, "Unknown Model");
        assert_eq!(config.class, ModelClass::Large);
        assert_eq!(config.p_gpu_kw, 10.20);
        assert_eq!(lookup("").name, "Unknown Model");
        assert_eq!(lookup("   ").name, "Unknown Model");
    }

    #[test]
    fn coefficient_rows() {
        let mini = lookup("gpt-4o-mini");
        assert_eq!(mini.hardware, "DGX A100");
        assert_eq!(mini.p_gpu_kw, 6.50);
        assert_eq!(mini.u_non_gpu, 0.03125);

        let claude = lookup("claude-3-sonnet");
        assert_eq!(claude.pue, 1.14);
        assert_eq!(claude.wue_site, 0.18);
        assert_eq!(claude.cif, 0.385);
        assert!((lookup("gpt-4o").power_draw_kw() - 0.72675).abs() < 1e-12);
    }
}
