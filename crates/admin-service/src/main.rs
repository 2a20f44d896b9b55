//! 后台管理服务入口

use backoffice_admin::{routes, state::AppState};
use backoffice_shared::{config::AppConfig, observability};
use tokio::net::TcpListener;
use tracing::info;

const SERVICE_NAME: &str = "backoffice-admin-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 配置文件缺失时使用默认值，环境变量仍然生效
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        using_mock = config.database.use_mock,
        database_configured = config.database.is_configured(),
        "Starting {} on {}",
        SERVICE_NAME,
        config.server_addr()
    );

    let addr = config.server_addr();
    let state = AppState::from_config(config)?;
    let app = routes::app(state.clone());

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// 监听关闭信号
///
/// SIGTERM 或 Ctrl+C 任一到达即返回，触发 axum 的优雅关闭流程。
/// 信号处理器注册失败时只等待另一种信号。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
