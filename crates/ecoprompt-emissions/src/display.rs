//! 배출량 표시 문자열.

use serde::Serialize;

use crate::calculator::EmissionsReport;

const NOT_AVAILABLE: &str = "N/A";

/// 화면 표시용 문자열 묶음. 실패 결과는 에너지/물/탄소만 "N/A"로 채운다
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsDisplay {
    pub energy: String,
    pub water: String,
    pub carbon: String,
    pub google_equivalent: Option<String>,
    pub phone_charge: Option<String>,
    pub model_info: Option<String>,
    pub inference_time: Option<String>,
    pub power_draw: Option<String>,
}

pub fn format_for_display(report: &EmissionsReport) -> EmissionsDisplay {
    if !report.success {
        return EmissionsDisplay {
            energy: NOT_AVAILABLE.to_string(),
            water: NOT_AVAILABLE.to_string(),
            carbon: NOT_AVAILABLE.to_string(),
            google_equivalent: None,
            phone_charge: None,
            model_info: None,
            inference_time: None,
            power_draw: None,
        };
    }

    EmissionsDisplay {
        energy: format!("{} Wh", report.energy.wh),
        water: format!("{} mL", report.water.ml),
        carbon: format!("{} g CO₂e", report.carbon.grams),
        google_equivalent: report
            .context
            .as_ref()
            .map(|c| format!("~{} Google searches", c.google_search_equivalent)),
        phone_charge: report
            .context
            .as_ref()
            .map(|c| format!("~{:.1}% of a phone charge", c.phone_charge_percent)),
        model_info: report
            .model
            .as_ref()
            .map(|m| format!("{} ({})", m.name, m.provider)),
        inference_time: report
            .technical
            .as_ref()
            .map(|t| format!("{}s", t.inference_time_seconds)),
        power_draw: report
            .technical
            .as_ref()
            .map(|t| format!("{} kW", t.power_draw_kw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::compute;

    #[test]
    fn success_strings() {
        let display = format_for_display(&compute(100, 10.0, 500.0, "gpt-4o"));
        assert_eq!(display.energy, "2.37 Wh");
        assert_eq!(display.water, "8.1 mL");
        assert_eq!(display.carbon, "0.84 g CO₂e");
        assert_eq!(display.google_equivalent.as_deref(), Some("~8 Google searches"));
        assert_eq!(
            display.phone_charge.as_deref(),
            Some("~47.5% of a phone charge")
        );
        assert_eq!(display.model_info.as_deref(), Some("GPT-4o (OpenAI (Azure))"));
        assert_eq!(display.inference_time.as_deref(), Some("10.5s"));
        assert!(display.power_draw.unwrap().ends_with(" kW"));
    }

    #[test]
    fn failure_renders_not_available() {
        let display = format_for_display(&compute(0, 10.0, 100.0, "gpt-4o"));
        assert_eq!(display.energy, "N/A");
        assert_eq!(display.water, "N/A");
        assert_eq!(display.carbon, "N/A");
        assert!(display.model_info.is_none());
    }
}
