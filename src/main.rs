use oci_function::config::{DEFAULT_LOG_FILTER, LogFormat, Settings};
use oci_function::credential::{CredentialError, EnvironmentSnapshot};
use oci_function::vault::VaultError;
use oci_function::{app, bootstrap, listener, logging};

#[tokio::main]
async fn main() {
    // 加载 .env 文件，必须在导出快照之前
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        // 日志可能还没有初始化
        let _ = logging::init(DEFAULT_LOG_FILTER, LogFormat::Json);
        report(&e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let snapshot = EnvironmentSnapshot::capture()?;
    let settings = Settings::from_snapshot(&snapshot)?;
    logging::init(&settings.log_filter, settings.log_format)?;

    let (state, settings) = bootstrap(&snapshot).await?;
    drop(snapshot);

    let result = listener::serve(app(state.clone()), &settings.listen).await;
    state.close().await;
    tracing::info!("函数退出");
    result
}

/// 输出一行结构化的启动失败日志。
fn report(error: &anyhow::Error) {
    if let Some(e) = error.downcast_ref::<CredentialError>() {
        tracing::error!(
            error_kind = e.kind().as_str(),
            fields = ?e.fields(),
            "凭据物化失败"
        );
    } else if let Some(e) = error.downcast_ref::<VaultError>() {
        tracing::error!(error_kind = "SecretUnavailable", error = %e, "无法读取数据库密钥");
    } else if let Some(e) = error.downcast_ref::<sqlx::Error>() {
        tracing::error!(error_kind = "DatabaseUnavailable", error = %e, "无法连接数据库");
    } else {
        tracing::error!(error_kind = "Startup", error = %error, "启动失败");
    }
}
