use smart_invoice::{api, AppConfig, InvoiceAuditor};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting SmartInvoice with config: {:?}", config);

    let auditor = Arc::new(InvoiceAuditor::new(config.analysis.clone()));
    let app = api::router(auditor, config.server.max_upload_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/audit/report   - audit upload, download xlsx report");
    info!("  POST /api/audit/summary  - audit upload, JSON status + previews");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
