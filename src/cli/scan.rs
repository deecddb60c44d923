use std::path::Path;
use std::sync::Arc;
use crate::cli::commands::ScanArgs;
use crate::config;
use crate::db::Database;
use crate::errors::SiteguardError;
use crate::pipeline::{ScanRequest, ScanRunner};
use tracing::info;

/// Headless one-shot scan: same pipeline the API spawns, awaited inline.
pub async fn handle_scan(args: ScanArgs) -> Result<(), SiteguardError> {
    if args.repo.is_none() && args.url.is_none() {
        return Err(SiteguardError::Config(
            "Provide --repo, --url, or both".to_string(),
        ));
    }

    let config = config::load_config(args.config.as_deref().map(Path::new)).await?;
    let db = Database::new(&config.server.db_path)?;
    let llm = crate::llm::create_provider(&config.llm)?;

    let scan_id = uuid::Uuid::new_v4().to_string();
    db.ensure_user(&args.user, None)?;
    db.create_scan(&scan_id, &args.user, args.repo.as_deref(), args.url.as_deref())?;

    info!(scan_id = %scan_id, "Running scan");
    let runner = ScanRunner::new(db.clone(), Arc::new(config), Arc::from(llm));
    let result = runner
        .run(ScanRequest {
            scan_id: scan_id.clone(),
            user_id: args.user.clone(),
            repo_url: args.repo.clone(),
            target_url: args.url.clone(),
        })
        .await;

    if let Err(e) = &result {
        db.mark_scan_failed(&scan_id, &e.to_string())?;
    }

    if let Some(scan) = db.get_scan(&scan_id)? {
        println!("{}", serde_json::to_string_pretty(&scan)?);
    }
    result
}
