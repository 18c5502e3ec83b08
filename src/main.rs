// ==========================================
// 供应商耐久性评分系统 - 主入口
// ==========================================
// 子命令: serve / init-db / ingest-manifest
// 技术栈: axum + Rust + SQLite
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use vendor_durability::api::ManifestImportRequest;
use vendor_durability::app::{get_default_db_path, router, AppState};
use vendor_durability::logging::{self, LogFormat};

/// 供应商耐久性评分与批次入账服务
#[derive(Parser, Debug)]
#[command(name = "vendor-durability", version, about = "Vendor durability scoring & batch ingestion")]
struct Cli {
    /// 数据库文件路径（缺省为用户数据目录下的 vendor_durability.db）
    #[arg(long = "db", env = "VENDOR_DURABILITY_DB", global = true)]
    db: Option<String>,

    /// 以 JSON 行输出日志
    #[arg(long = "log-json", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动 HTTP 服务
    Serve {
        /// 监听地址
        #[arg(long = "listen", default_value = "127.0.0.1:8080")]
        listen: String,
    },

    /// 创建/升级数据库结构后退出
    InitDb,

    /// 从 CSV/Excel 清单文件入账一个批次
    IngestManifest {
        #[arg(long = "batch-id")]
        batch_id: String,

        #[arg(long = "vendor-id")]
        vendor_id: String,

        /// 目标主机厂
        #[arg(long = "company", default_value = "")]
        company: String,

        /// 月份标签 (YYYY-MM)
        #[arg(long = "month")]
        month: String,

        /// 有效期开始 (YYYY-MM-DD)
        #[arg(long = "start")]
        start: NaiveDate,

        /// 有效期结束 (YYYY-MM-DD)
        #[arg(long = "end")]
        end: NaiveDate,

        /// 操作人
        #[arg(long = "actor", default_value = "cli")]
        actor: String,

        /// 清单文件 (.csv/.xlsx/.xls)
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    info!(
        version = vendor_durability::VERSION,
        db_path = %db_path,
        "{}",
        vendor_durability::APP_NAME
    );

    let state = AppState::new(&db_path).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Command::Serve { listen } => {
            let app = router(Arc::new(state));
            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .with_context(|| format!("无法监听 {}", listen))?;
            info!(listen = %listen, "HTTP 服务已启动");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP 服务异常退出")?;
            info!("HTTP 服务已停止");
        }
        Command::InitDb => {
            info!(db_path = %db_path, "数据库结构已就绪");
        }
        Command::IngestManifest {
            batch_id,
            vendor_id,
            company,
            month,
            start,
            end,
            actor,
            file,
        } => {
            let import_api = state.import_api.clone();
            let request = ManifestImportRequest {
                batch_id,
                vendor_id,
                company_name: company,
                month,
                start,
                end,
                file_path: file,
            };
            let batch = tokio::task::spawn_blocking(move || {
                import_api.import_manifest(request, &actor)
            })
            .await
            .context("入账任务异常")??;

            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
    }

    Ok(())
}

/// Ctrl-C 触发优雅退出
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "无法监听退出信号");
    }
}
