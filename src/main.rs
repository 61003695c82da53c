// ==========================================
// POS 后台批量上传 - 命令行入口
// ==========================================
// 用法: pos-bulk-upload <inventory|product|user> <file> [db_path]
// 输出: 标准输出打印 JSON 汇总；被拒绝时把错误回执写到输入文件旁
// ==========================================

use pos_bulk_upload::api::{UploadApi, UploadApiResponse};
use pos_bulk_upload::db::get_default_db_path;
use pos_bulk_upload::DocumentKind;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

const USAGE: &str = "用法: pos-bulk-upload <inventory|product|user> <file> [db_path]";

#[tokio::main]
async fn main() -> ExitCode {
    pos_bulk_upload::logging::init();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        // 行级错误：回执已写出
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "批量上传失败");
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> anyhow::Result<bool> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 || args.len() > 3 {
        anyhow::bail!(USAGE);
    }

    let kind: DocumentKind = args[0]
        .parse()
        .map_err(|e| anyhow::anyhow!("{}\n{}", e, USAGE))?;
    let file_path = Path::new(&args[1]);
    let db_path = args.get(2).cloned().unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", pos_bulk_upload::APP_NAME, pos_bulk_upload::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let content = std::fs::read(file_path)
        .map_err(|e| anyhow::anyhow!("无法读取文件 {}: {}", file_path.display(), e))?;
    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let api = UploadApi::new(db_path);
    let response = api.upload(kind, content, &filename).await?;

    match &response {
        UploadApiResponse::Applied {
            summary,
            created,
            updated,
        } => {
            let report = json!({
                "status": "APPLIED",
                "summary": summary,
                "created": created,
                "updated": updated,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(true)
        }
        UploadApiResponse::Rejected {
            summary,
            filename,
            artifact,
            row_errors,
            ..
        } => {
            let artifact_path = file_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(filename);
            std::fs::write(&artifact_path, artifact)?;

            let report = json!({
                "status": "REJECTED",
                "summary": summary,
                "artifact_path": artifact_path.display().to_string(),
                "row_errors": row_errors,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(false)
        }
    }
}
