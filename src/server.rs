use log::{error, info};
use std::io;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::conn;
use crate::directory::Directory;

/// A failure setting up or running the listening socket. Fatal: the
/// whole process goes down, matching the no-partial-degradation stance.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("accept failed: {0}")]
    Accept(io::Error),
}

/// Binds the listener and serves forever. Never returns `Ok`.
pub async fn run(listen_addr: &str, directory: Directory) -> Result<(), SetupError> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .map_err(|source| SetupError::Bind {
            addr: listen_addr.to_string(),
            source,
        })?;

    info!("listening on {listen_addr}");

    serve(listener, directory).await
}

/// The accept loop. Each accepted socket goes through the directory's
/// handoff slot; publishing waits until the previous worker has claimed
/// its socket, so a new connection can never overwrite one that is
/// still in flight.
pub async fn serve(listener: TcpListener, directory: Directory) -> Result<(), SetupError> {
    loop {
        let (socket, peer) = listener.accept().await.map_err(SetupError::Accept)?;

        info!("new connection from {peer}");

        directory.publish_socket(socket).await;

        let directory = directory.clone();

        tokio::spawn(async move {
            if let Err(err) = conn::handle(directory, peer).await {
                error!("[{peer}] connection error: {err:?}");
            }
        });
    }
}
