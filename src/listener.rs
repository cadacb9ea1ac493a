//! 监听与服务
//!
//! Fn 平台通过 `FN_LISTENER` 下发 unix socket 路径。平台要求 socket 先绑定在同目录的
//! 临时文件名上，放开权限后再以符号链接的形式出现在下发的路径上，
//! 保证平台看到路径时 socket 已经可以连接。

use crate::config::ListenAddr;
use anyhow::{Context, Result};
use axum::Router;
use std::fs::{self, Permissions};
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};
use tokio::net::{TcpListener, UnixListener};

/// 临时 socket 文件名前缀
const PHONY_PREFIX: &str = "phony";

/// 绑定监听地址并开始服务，直到收到终止信号。
pub async fn serve(app: Router, listen: &ListenAddr) -> Result<()> {
    match listen {
        ListenAddr::Tcp(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("无法监听 {}", addr))?;
            tracing::info!(%addr, "服务器开始监听");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        ListenAddr::Unix(path) => {
            let listener = bind_unix(path)?;
            tracing::info!(path = %path.display(), "服务器开始监听 unix socket");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }
    Ok(())
}

/// 按 Fn 的约定绑定 unix socket。
pub fn bind_unix(path: &Path) -> Result<UnixListener> {
    let phony = phony_path(path)?;

    for stale in [phony.as_path(), path] {
        if fs::symlink_metadata(stale).is_ok() {
            fs::remove_file(stale).with_context(|| format!("无法删除 {}", stale.display()))?;
        }
    }

    let listener =
        UnixListener::bind(&phony).with_context(|| format!("无法绑定 {}", phony.display()))?;
    fs::set_permissions(&phony, Permissions::from_mode(0o666))
        .with_context(|| format!("无法修改 {} 的权限", phony.display()))?;

    // 链接目标使用相对路径
    let target = phony
        .file_name()
        .map(PathBuf::from)
        .context("socket 路径缺少文件名")?;
    symlink(&target, path).with_context(|| format!("无法创建链接 {}", path.display()))?;

    Ok(listener)
}

fn phony_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("无效的 socket 路径 {}", path.display()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(format!("{}{}", PHONY_PREFIX, name)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "无法监听 Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("收到终止信号，正在关闭服务器");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixStream;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fn-listener-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_phony_path_is_sibling() {
        let phony = phony_path(Path::new("/tmp/iofs/lsnr.sock")).unwrap();
        assert_eq!(phony, PathBuf::from("/tmp/iofs/phonylsnr.sock"));
    }

    #[tokio::test]
    async fn test_bind_unix_creates_symlink() {
        let dir = scratch_dir();
        let path = dir.join("lsnr.sock");

        let _listener = bind_unix(&path).unwrap();

        let link = fs::read_link(&path).unwrap();
        assert_eq!(link, PathBuf::from("phonylsnr.sock"));

        let mode = fs::metadata(dir.join("phonylsnr.sock"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o666);

        UnixStream::connect(&path).await.unwrap();
        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_bind_unix_replaces_stale_files() {
        let dir = scratch_dir();
        let path = dir.join("lsnr.sock");
        fs::write(&path, b"stale").unwrap();
        fs::write(dir.join("phonylsnr.sock"), b"stale").unwrap();

        let _listener = bind_unix(&path).unwrap();
        UnixStream::connect(&path).await.unwrap();
        fs::remove_dir_all(&dir).unwrap();
    }
}
