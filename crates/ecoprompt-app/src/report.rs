//! 콘솔 출력 — 메트릭 상태 줄과 배출량 요약.

use ecoprompt_core::config::ProviderConfig;
use ecoprompt_core::models::metrics::MetricsRecord;
use ecoprompt_emissions::{compute_for_metrics, format_for_display, EmissionsDisplay};

/// 레코드에 적용할 모델 식별자 (명시 > 제공자 매핑 > 제공자 이름)
pub fn model_for_record<'a>(
    record: &'a MetricsRecord,
    providers: &'a ProviderConfig,
    override_model: Option<&'a str>,
) -> &'a str {
    override_model
        .or_else(|| providers.model_for(&record.provider))
        .unwrap_or(&record.provider)
}

/// 레코드 한 건의 출력 블록
pub fn render_record(record: &MetricsRecord, model: &str) -> String {
    let display = format_for_display(&compute_for_metrics(record, model));
    let mut out = format!(
        "{} {}\n",
        record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        record
    );
    if let Some(send) = &record.send_snippet {
        out.push_str(&format!("  > {}\n", send));
    }
    out.push_str(&format!("  < {}\n", record.output_snippet));
    out.push_str(&render_emissions(&display));
    out
}

/// 배출량 표시 블록
pub fn render_emissions(display: &EmissionsDisplay) -> String {
    let mut out = format!(
        "  energy {} | water {} | carbon {}\n",
        display.energy, display.water, display.carbon
    );
    let extras: Vec<&str> = [
        display.model_info.as_deref(),
        display.inference_time.as_deref(),
        display.power_draw.as_deref(),
        display.google_equivalent.as_deref(),
        display.phone_charge.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !extras.is_empty() {
        out.push_str(&format!("  {}\n", extras.join(" | ")));
    }
    out
}
