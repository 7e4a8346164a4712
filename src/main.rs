// ==========================================
// 快递运价引擎 - 命令行入口
// ==========================================
// price         按请求文件计费，输出对外响应 JSON
// replace-slabs 按文件整表替换公司阶梯运价
// list-slabs    回读公司阶梯运价
// 错误时输出 {success:false, message} 并以非零码退出
// ==========================================

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use courier_rate_engine::api::{
    ApiError, BulkReplaceRequest, SlabPriceRequest, ZonePriceRequest,
};
use courier_rate_engine::app::{get_default_db_path, AppState};
use courier_rate_engine::domain::PricingRequest;

#[derive(Parser)]
#[command(name = "courier-rate-engine")]
#[command(version)]
#[command(about = "Courier tariff resolution and pricing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database path (defaults to COURIER_RATES_DB_PATH or the user data dir)
    #[arg(long, global = true)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a zone or slab request read from a JSON file
    Price {
        request: PathBuf,
        #[arg(long)]
        franchise: i64,
    },
    /// Replace all slab tariffs of one company from a JSON payload
    ReplaceSlabs {
        payload: PathBuf,
        #[arg(long)]
        franchise: i64,
    },
    /// Print the stored slab tariffs of one company
    ListSlabs {
        #[arg(long)]
        franchise: i64,
        #[arg(long)]
        company: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    courier_rate_engine::logging::init();

    let cli = Cli::parse();
    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!("{} v{}，数据库: {}", courier_rate_engine::APP_NAME, courier_rate_engine::VERSION, db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let outcome = match cli.command {
        Commands::Price { request, franchise } => {
            let raw = read_json(&request)?;
            price(&state, franchise, &raw)
        }
        Commands::ReplaceSlabs { payload, franchise } => {
            let request: BulkReplaceRequest = serde_json::from_value(read_json(&payload)?)
                .context("批量替换请求格式错误")?;
            state
                .tariff_admin_api
                .replace_all_request(franchise, &request)
                .await
                .and_then(to_json)
        }
        Commands::ListSlabs { franchise, company } => state
            .rate_admin_api
            .list_slab_tariffs(franchise, company)
            .and_then(to_json),
    };

    match outcome {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::warn!(status = err.status_code(), error = %err, "请求失败");
            println!("{}", serde_json::to_string_pretty(&err.to_body())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// 按请求形状选择对外响应
fn price(state: &AppState, franchise_id: i64, raw: &Value) -> Result<Value, ApiError> {
    let api = &state.pricing_api;
    match courier_rate_engine::api::parse_pricing_request(raw)? {
        PricingRequest::Zone {
            origin_pincode,
            destination_pincode,
            service_type,
            weight,
        } => api
            .price_zone(
                franchise_id,
                &ZonePriceRequest {
                    from_pincode: origin_pincode,
                    to_pincode: destination_pincode,
                    weight,
                    service_type,
                },
            )
            .and_then(to_json),
        PricingRequest::Slab {
            company_id,
            courier_type,
            row_name,
            sub_type,
            weight,
        } => api
            .price_slab(
                franchise_id,
                &SlabPriceRequest {
                    company_id,
                    courier_type,
                    row_name,
                    weight,
                    sub_type,
                },
            )
            .and_then(to_json),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::InternalError(format!("响应序列化失败: {}", e)))
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("JSON 解析失败: {}", path.display()))
}
