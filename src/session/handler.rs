use log::{info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::error::{ProtocolError, ServerError};
use crate::protocol::responses::{GOODBYE, OK};
use crate::protocol::{
    Command, CommandResult, CommandStatus, Response, handle_command, handle_upload, parse_command,
};
use crate::session::{Session, SessionRegistry};
use crate::storage::StorageOperations;
use crate::storage::validation::validate_bare_name;

/// Serves one registered session until the peer quits or disconnects.
///
/// - Reads newline-delimited JSON requests, bounded by `max_request_length`.
/// - Runs storage operations on the blocking pool.
/// - Removes the session from the registry on exit.
pub async fn handle_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Arc<Mutex<SessionRegistry>>,
    storage: Arc<StorageOperations>,
    config: Arc<ServerConfig>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(peer_addr);

    if let Err(e) = serve_requests(
        &mut reader,
        &mut write_half,
        &mut session,
        &registry,
        &storage,
        &config,
    )
    .await
    {
        warn!("Session {} ended with error: {}", peer_addr, e);
    }

    let mut registry_guard = registry.lock().await;
    let user = registry_guard.remove(&peer_addr);
    info!(
        "Session {} ({}) disconnected ({} active)",
        peer_addr,
        user.as_deref().unwrap_or("unidentified"),
        registry_guard.len()
    );
}

/// Request loop, generic over the transport so it can be driven by any
/// buffered reader and writer pair.
pub async fn serve_requests<R, W>(
    reader: &mut R,
    writer: &mut W,
    session: &mut Session,
    registry: &Mutex<SessionRegistry>,
    storage: &Arc<StorageOperations>,
    config: &ServerConfig,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let limit = config.max_request_length;
    let mut line = String::new();

    loop {
        line.clear();
        let n = (&mut *reader).take(limit as u64 + 1).read_line(&mut line).await?;
        if n == 0 {
            info!("Connection closed by {}", session.peer_label());
            return Ok(());
        }

        // Bytes beyond the limit stay unread, so the stream cannot be resynchronized
        if n > limit && !line.ends_with('\n') {
            let err = ServerError::from(ProtocolError::RequestTooLong(limit));
            write_response(writer, &CommandResult::failure(err).response).await?;
            return Ok(());
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let result = match parse_command(request) {
            Err(e) => CommandResult::failure(e.into()),
            Ok(Command::Quit) => {
                info!("Session {} requested to quit", session.peer_label());
                CommandResult::close(Response::ok(GOODBYE, "Goodbye"))
            }
            Ok(Command::Identify { user_id }) => identify(session, registry, user_id).await,
            Ok(command) => match session.user_id().map(str::to_string) {
                None => reject_unidentified(reader, command, config).await?,
                Some(user_id) => {
                    info!("Received from {} ({}): {:?}", session.peer_label(), user_id, command);

                    match command {
                        Command::Upload {
                            original_filename: filename,
                            size,
                        } => {
                            receive_upload(reader, user_id, filename, size, storage, config).await?
                        }
                        command => {
                            run_blocking(storage, move |storage| {
                                handle_command(&user_id, command, storage)
                            })
                            .await
                        }
                    }
                }
            },
        };

        write_response(writer, &result.response).await?;

        if result.status == CommandStatus::CloseConnection {
            return Ok(());
        }
    }
}

/// Binds the session to the identity supplied by the upstream collaborator.
async fn identify(
    session: &mut Session,
    registry: &Mutex<SessionRegistry>,
    user_id: String,
) -> CommandResult {
    if let Some(current) = session.user_id() {
        return CommandResult::failure(
            ProtocolError::AlreadyIdentified(current.to_string()).into(),
        );
    }

    if let Err(e) = validate_bare_name(&user_id, "user id") {
        return CommandResult::failure(e.into());
    }

    if let Some(addr) = session.peer_addr() {
        registry.lock().await.set_user(addr, &user_id);
    }
    info!("Session {} identified as {}", session.peer_label(), user_id);

    let response = Response::ok(OK, format!("Identified as {}", user_id));
    session.set_user_id(Some(user_id));
    CommandResult::success(response)
}

/// Reads the `size` raw bytes following an upload request, then stores them.
/// An oversized upload closes the connection since its body is never consumed.
async fn receive_upload<R>(
    reader: &mut R,
    user_id: String,
    original_filename: String,
    size: u64,
    storage: &Arc<StorageOperations>,
    config: &ServerConfig,
) -> io::Result<CommandResult>
where
    R: AsyncBufRead + Unpin,
{
    let limit = config.max_upload_size_bytes();
    let body_len = match usize::try_from(size) {
        Ok(len) if size <= limit => len,
        _ => return Ok(upload_too_large(size, limit)),
    };

    let mut body = vec![0u8; body_len];
    reader.read_exact(&mut body).await?;

    Ok(run_blocking(storage, move |storage| {
        handle_upload(&user_id, &original_filename, body.as_slice(), storage)
    })
    .await)
}

/// Answers a request sent before `identify`. An upload body still follows
/// the request line, so it is drained first; one over the limit closes the
/// connection instead.
async fn reject_unidentified<R>(
    reader: &mut R,
    command: Command,
    config: &ServerConfig,
) -> io::Result<CommandResult>
where
    R: AsyncBufRead + Unpin,
{
    if let Command::Upload { size, .. } = command {
        let limit = config.max_upload_size_bytes();
        if size > limit {
            return Ok(upload_too_large(size, limit));
        }

        let mut body = (&mut *reader).take(size);
        let drained = tokio::io::copy(&mut body, &mut tokio::io::sink()).await?;
        if drained < size {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
    }

    Ok(CommandResult::failure(ProtocolError::NotIdentified.into()))
}

fn upload_too_large(size: u64, limit: u64) -> CommandResult {
    let err = ServerError::from(ProtocolError::UploadTooLarge { size, limit });
    let mut result = CommandResult::failure(err);
    result.status = CommandStatus::CloseConnection;
    result
}

async fn run_blocking<F>(storage: &Arc<StorageOperations>, handler: F) -> CommandResult
where
    F: FnOnce(&StorageOperations) -> CommandResult + Send + 'static,
{
    let storage = Arc::clone(storage);
    match tokio::task::spawn_blocking(move || handler(&storage)).await {
        Ok(result) => result,
        Err(e) => CommandResult::failure(ServerError::IoError(io::Error::other(e))),
    }
}

async fn write_response<W>(writer: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response.to_line().as_bytes()).await?;
    writer.flush().await
}
