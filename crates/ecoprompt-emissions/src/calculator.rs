//! 배출량 계산.
//!
//! 추론 시간(h) × 실효 전력(kW) × PUE로 에너지를 구하고,
//! 에너지에 물 사용 효율과 탄소 집약도를 곱해 물/탄소를 추정한다.

use ecoprompt_core::models::metrics::MetricsRecord;
use serde::Serialize;

use crate::model_table::{lookup, ModelConfig};

/// Google 검색 1회 에너지 (Wh)
const GOOGLE_SEARCH_WH: f64 = 0.30;

/// 스마트폰 1회 완충 에너지 (Wh)
const PHONE_CHARGE_WH: f64 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Energy {
    pub wh: f64,
    pub kwh: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Water {
    pub ml: f64,
    pub liters: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Carbon {
    pub grams: f64,
    pub kg: f64,
}

/// 계산에 사용된 모델 행 요약
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub provider: String,
    pub hardware: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalDetails {
    pub inference_time_seconds: f64,
    pub power_draw_kw: f64,
    pub tokens_processed: u64,
    pub latency_ms: f64,
    pub tps: f64,
}

/// 일상 비교 지표
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactContext {
    pub google_search_equivalent: u64,
    pub phone_charge_percent: f64,
}

/// 계산 결과
///
/// 실패 시 `success = false`, `error`에 사유가 담기고 에너지/물/탄소는 0이다.
/// 호출자는 수치 0이 아니라 `success`로 분기해야 한다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub energy: Energy,
    pub water: Water,
    pub carbon: Carbon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical: Option<TechnicalDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ImpactContext>,
}

impl EmissionsReport {
    fn failure(error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            energy: Energy::default(),
            water: Water::default(),
            carbon: Carbon::default(),
            model: None,
            technical: None,
            context: None,
        }
    }
}

/// 응답 한 건의 환경 영향 계산
///
/// `output_tokens == 0` 또는 `tokens_per_second <= 0`(NaN 포함)이면 실패 결과를 반환한다.
pub fn compute(
    output_tokens: u64,
    tokens_per_second: f64,
    latency_ms: f64,
    model: &str,
) -> EmissionsReport {
    if output_tokens == 0 {
        return EmissionsReport::failure("Invalid output tokens");
    }
    if !(tokens_per_second.is_finite() && tokens_per_second > 0.0) {
        return EmissionsReport::failure("Invalid tokens per second");
    }

    let config = lookup(model);
    let latency_ms = if latency_ms.is_finite() { latency_ms } else { 0.0 };
    evaluate(config, output_tokens, tokens_per_second, latency_ms)
}

/// 모니터 메트릭 기준 계산. 지연을 모르면 0으로 본다
pub fn compute_for_metrics(record: &MetricsRecord, model: &str) -> EmissionsReport {
    compute(
        record.estimated_token_count,
        record.tokens_per_second.unwrap_or(0.0),
        record.latency_ms.unwrap_or(0) as f64,
        model,
    )
}

fn evaluate(
    config: &ModelConfig,
    output_tokens: u64,
    tokens_per_second: f64,
    latency_ms: f64,
) -> EmissionsReport {
    let latency_sec = (latency_ms / 1000.0).max(0.0);
    let generation_sec = output_tokens as f64 / tokens_per_second;
    let total_sec = latency_sec + generation_sec;
    let inference_hours = total_sec / 3600.0;

    let power_draw_kw = config.power_draw_kw();
    let energy_kwh = inference_hours * power_draw_kw * config.pue;
    let energy_wh = energy_kwh * 1000.0;

    // 현장 냉각수는 IT 부하(PUE 제외) 기준, 발전원 물은 전체 에너지 기준
    let it_energy_kwh = energy_kwh / config.pue;
    let water_liters = it_energy_kwh * config.wue_site + energy_kwh * config.wue_source;
    let water_ml = water_liters * 1000.0;

    let carbon_kg = energy_kwh * config.cif;
    let carbon_grams = carbon_kg * 1000.0;

    EmissionsReport {
        success: true,
        error: None,
        energy: Energy {
            wh: round_to(energy_wh, 2),
            kwh: round_to(energy_kwh, 6),
        },
        water: Water {
            ml: round_to(water_ml, 2),
            liters: round_to(water_liters, 5),
        },
        carbon: Carbon {
            grams: round_to(carbon_grams, 2),
            kg: round_to(carbon_kg, 6),
        },
        model: Some(ModelSummary {
            name: config.name.to_string(),
            provider: config.provider.to_string(),
            hardware: config.hardware.to_string(),
        }),
        technical: Some(TechnicalDetails {
            inference_time_seconds: round_to(total_sec, 3),
            power_draw_kw: round_to(power_draw_kw, 4),
            tokens_processed: output_tokens,
            latency_ms: round_to(latency_ms, 1),
            tps: round_to(tokens_per_second, 2),
        }),
        context: Some(ImpactContext {
            google_search_equivalent: (energy_wh / GOOGLE_SEARCH_WH).round() as u64,
            phone_charge_percent: round_to(energy_wh / PHONE_CHARGE_WH * 100.0, 1),
        }),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
