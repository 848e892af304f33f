use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::protocol::Response;
use crate::protocol::responses::READY;
use crate::session::{SessionRegistry, handle_session};
use crate::storage::StorageOperations;

pub struct Server {
    session_registry: Arc<Mutex<SessionRegistry>>,
    storage: Arc<StorageOperations>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Prepares the storage root and binds the session listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let storage = StorageOperations::new(config.storage_root_path())?;

        tokio::fs::create_dir_all(storage.resolver().users_root()).await?;
        info!(
            "Storage root: {} (user roots under {})",
            config.storage_root,
            storage.resolver().users_root().display()
        );

        let socket = config.listen_socket();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            session_registry: Arc::new(Mutex::new(SessionRegistry::new())),
            storage: Arc::new(storage),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Starting DropFile server on {} (max {} sessions)",
            self.config.listen_socket(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let session_registry = Arc::clone(&self.session_registry);
                    let storage = Arc::clone(&self.storage);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each session so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_session(stream, addr, session_registry, storage, config)
                                .await
                        {
                            warn!("Failed to handle session {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Admits a new connection: enforces the session cap, greets, and hands off
/// to the session handler.
async fn handle_new_session(
    mut stream: TcpStream,
    addr: SocketAddr,
    session_registry: Arc<Mutex<SessionRegistry>>,
    storage: Arc<StorageOperations>,
    config: Arc<ServerConfig>,
) -> io::Result<()> {
    let registered = {
        let mut sessions = session_registry.lock().await;
        let registered = sessions.try_register(addr, config.max_clients);
        if registered.is_ok() {
            info!(
                "Accepted session {} ({}/{} sessions)",
                addr,
                sessions.len(),
                config.max_clients
            );
        }
        registered
    };

    if let Err(e) = registered {
        warn!("Rejecting {}: {}", addr, e);
        let response = Response::from_error(&ServerError::Protocol(e));
        stream.write_all(response.to_line().as_bytes()).await?;
        return stream.flush().await;
    }

    let greeting = Response::ok(READY, "Welcome to DropFile storage server");
    if let Err(e) = write_greeting(&mut stream, &greeting).await {
        session_registry.lock().await.remove(&addr);
        return Err(e);
    }

    handle_session(stream, addr, session_registry, storage, config).await;
    Ok(())
}

async fn write_greeting(stream: &mut TcpStream, greeting: &Response) -> io::Result<()> {
    stream.write_all(greeting.to_line().as_bytes()).await?;
    stream.flush().await
}
