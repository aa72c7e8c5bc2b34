//! # ecoprompt
//!
//! 채팅 응답 스트림 메트릭 CLI.
//! 기록된 세션 재생, 메트릭 이력 조회, 배출량 계산, 설정 변경을 제공한다.

mod commands;
mod replay;
mod report;
mod sink;
mod trace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ecoprompt_core::models::settings::SettingsUpdate;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::commands::Paths;

/// ecoprompt — LLM 응답 지연/속도/배출량 측정
#[derive(Parser, Debug)]
#[command(name = "ecoprompt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "warn", global = true)]
    log_level: String,

    /// 데이터 저장 경로 (config.json, metrics.db)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 설정 파일 경로
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 기록된 세션(JSON Lines)을 모니터에 재생
    Replay {
        /// 기록 파일 경로
        trace: PathBuf,

        /// 페이지 호스트 (제공자 추정용, 예: chatgpt.com)
        #[arg(long)]
        host: Option<String>,

        /// 가상 시간 대신 실제 시간으로 재생
        #[arg(long)]
        realtime: bool,
    },

    /// 저장된 메트릭 이력 (최신순)
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// 배출량 계산에 쓸 모델 (기본: 제공자 매핑)
        #[arg(long)]
        model: Option<String>,
    },

    /// 단건 배출량 계산
    Emissions {
        #[arg(long)]
        tokens: u64,

        /// 초당 토큰 수
        #[arg(long)]
        tps: f64,

        #[arg(long, default_value_t = 0.0)]
        latency_ms: f64,

        #[arg(long, default_value = "gpt-4o")]
        model: String,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 모니터 설정 조회/변경
    Settings {
        /// 문자/토큰 비율
        #[arg(long)]
        token_ratio: Option<f64>,

        /// 노드별 진단 로그 활성화
        #[arg(long)]
        debug: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "ecoprompt={},ecoprompt_app={},ecoprompt_core={},ecoprompt_monitor={},ecoprompt_emissions={},ecoprompt_storage={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = Paths {
        data_dir: args.data_dir,
        config: args.config,
    };

    match args.command {
        Command::Replay {
            trace,
            host,
            realtime,
        } => commands::replay(&paths, &trace, host.as_deref(), realtime).await,
        Command::History { limit, model } => {
            commands::history(&paths, limit, model.as_deref()).await
        }
        Command::Emissions {
            tokens,
            tps,
            latency_ms,
            model,
            json,
        } => commands::emissions(tokens, tps, latency_ms, &model, json),
        Command::Settings { token_ratio, debug } => commands::settings(
            &paths,
            SettingsUpdate {
                token_ratio,
                debug_enabled: debug,
            },
        ),
    }
}
