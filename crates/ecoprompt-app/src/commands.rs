//! 서브커맨드 처리.

use anyhow::{Context, Result};
use chrono::Utc;
use ecoprompt_core::config_manager::ConfigManager;
use ecoprompt_core::models::settings::SettingsUpdate;
use ecoprompt_core::ports::storage::MetricsHistory;
use ecoprompt_emissions::{compute, format_for_display};
use ecoprompt_monitor::provider::guess_provider;
use ecoprompt_monitor::MonitorSession;
use ecoprompt_storage::SqliteStorage;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::replay::{interrupt_on_signal, replay_realtime, replay_virtual};
use crate::report::{model_for_record, render_emissions, render_record};
use crate::sink::{spawn_history_writer, ChannelSink, SINK_CHANNEL_CAPACITY};
use crate::trace::parse_trace;

/// 설정 파일 이름
const CONFIG_FILE: &str = "config.json";
/// 메트릭 DB 파일 이름
const DB_FILE: &str = "metrics.db";

/// 전역 경로 옵션
#[derive(Debug, Clone, Default)]
pub struct Paths {
    pub data_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl Paths {
    /// 설정 관리자 (`--config` > `--data-dir/config.json` > 플랫폼 기본 경로)
    pub fn config_manager(&self) -> Result<ConfigManager> {
        let manager = match (&self.config, &self.data_dir) {
            (Some(path), _) => ConfigManager::with_path(path.clone()),
            (None, Some(dir)) => ConfigManager::with_path(dir.join(CONFIG_FILE)),
            (None, None) => ConfigManager::new(),
        };
        manager.context("설정 로드 실패")
    }

    /// 메트릭 DB 경로 (`--data-dir/metrics.db` > 설정값 > 플랫폼 기본 경로)
    pub fn db_path(&self, config: &ConfigManager) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.join(DB_FILE)),
            None => config.db_path().context("DB 경로 결정 실패"),
        }
    }

    fn open_storage(&self, config: &ConfigManager) -> Result<SqliteStorage> {
        let path = self.db_path(config)?;
        SqliteStorage::open(&path, config.get().storage.history_limit)
            .with_context(|| format!("메트릭 DB 열기 실패: {}", path.display()))
    }
}

/// 기록 재생 후 메트릭 저장/출력
pub async fn replay(paths: &Paths, trace: &Path, host: Option<&str>, realtime: bool) -> Result<()> {
    let config_manager = paths.config_manager()?;
    let config = config_manager.get();

    let file = File::open(trace).with_context(|| format!("기록 파일 열기 실패: {}", trace.display()))?;
    let events = parse_trace(BufReader::new(file)).context("기록 파싱 실패")?;

    let provider = match host {
        Some(host) => guess_provider(host),
        None => config.providers.default_provider.clone(),
    };
    let session = MonitorSession::new(config.monitor.clone(), &config.providers, &provider);
    let storage = Arc::new(paths.open_storage(&config_manager)?);

    let records = if realtime {
        let (tx, rx) = mpsc::channel(SINK_CHANNEL_CAPACITY);
        let writer = spawn_history_writer(storage.clone(), rx);

        let session = replay_realtime(
            session,
            &events,
            Arc::new(ChannelSink::new(tx)),
            interrupt_on_signal(),
        )
        .await?;
        drop(session);
        writer.await.context("이력 저장 태스크 실패")?
    } else {
        let mut session = session;
        let records = replay_virtual(&mut session, &events, Utc::now())?;
        for record in &records {
            if let Err(e) = storage.save_metrics(record).await {
                warn!("메트릭 이력 저장 실패 ({}): {}", e, record);
            }
        }
        records
    };

    if records.is_empty() {
        println!("확정된 응답이 없습니다.");
    }
    for record in &records {
        let model = model_for_record(record, &config.providers, None);
        print!("{}", render_record(record, model));
    }
    info!("재생 완료: 메트릭 {}개", records.len());
    Ok(())
}

/// 저장된 메트릭 이력 출력 (최신순)
pub async fn history(paths: &Paths, limit: usize, model: Option<&str>) -> Result<()> {
    let config_manager = paths.config_manager()?;
    let config = config_manager.get();
    let storage = paths.open_storage(&config_manager)?;

    let records = storage.recent_metrics(limit).await?;
    if records.is_empty() {
        println!("저장된 메트릭이 없습니다.");
        return Ok(());
    }
    for record in &records {
        print!("{}", render_record(record, model_for_record(record, &config.providers, model)));
    }
    Ok(())
}

/// 단건 배출량 계산
pub fn emissions(tokens: u64, tps: f64, latency_ms: f64, model: &str, json: bool) -> Result<()> {
    let report = compute(tokens, tps, latency_ms, model);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if let Some(error) = &report.error {
        println!("계산 실패: {error}");
    }
    print!("{}", render_emissions(&format_for_display(&report)));
    Ok(())
}

/// 설정 조회/변경. 변경 값이 없으면 현재 설정만 출력한다
pub fn settings(paths: &Paths, update: SettingsUpdate) -> Result<()> {
    let config_manager = paths.config_manager()?;
    let config = if update == SettingsUpdate::default() {
        config_manager.get()
    } else {
        config_manager.apply_settings(&update).context("설정 저장 실패")?
    };

    println!("# {}", config_manager.config_path().display());
    println!("{}", serde_json::to_string_pretty(&config.monitor)?);
    Ok(())
}
