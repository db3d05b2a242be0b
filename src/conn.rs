use anyhow::Result;
use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::directory::Directory;
use crate::protocol;
use crate::protocol::DirectoryCommand;
use crate::session::{GameSession, Status};

/// Reply sent when authentication fails; the client maps it back to a
/// login error.
const AUTH_FAIL: &str = "-1";

/// A mid-session write failure. Ends this worker's session only.
#[derive(Debug, Error)]
#[error("failed to send to client: {0}")]
pub struct SendError(#[from] io::Error);

/// One accepted client socket plus the authenticated user slot.
pub struct Connection {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
    current_user: Option<usize>,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        let (reader, writer) = stream.into_split();

        Self {
            reader: BufReader::new(reader).lines(),
            writer,
            peer,
            current_user: None,
        }
    }

    /// Blocking line read. `None` means the peer closed the socket; an
    /// empty line the peer actually sent comes back as `Some("")`.
    pub async fn receive_line(&mut self) -> io::Result<Option<String>> {
        self.reader.next_line().await
    }

    /// Writes the message plus a trailing newline.
    pub async fn send_line(&mut self, message: &str) -> Result<(), SendError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;

        Ok(())
    }

    pub fn current_user(&self) -> Option<usize> {
        self.current_user
    }

    pub fn set_current_user(&mut self, index: usize) {
        self.current_user = Some(index);
    }
}

/// Worker entry point: claim the handed-off socket, authenticate, run
/// the game loop, log the user out. One of these runs per client,
/// concurrently with all others.
pub async fn handle(directory: Directory, peer: SocketAddr) -> Result<()> {
    let Some(stream) = directory.claim_socket().await else {
        anyhow::bail!("handoff slot closed before the socket was claimed");
    };
    let mut conn = Connection::new(stream, peer);

    let Some(auth_line) = conn.receive_line().await? else {
        info!("[{peer}] disconnected before authenticating");
        return Ok(());
    };

    let Some(user_index) = directory.check_authentication(&auth_line) else {
        info!("[{peer}] authentication failed");
        conn.send_line(AUTH_FAIL).await?;
        // Force disconnect: the connection drops when we return.
        return Ok(());
    };

    info!("[{peer}] authenticated as user {user_index}");
    conn.set_current_user(user_index);

    // Authentication marked the user connected, so from here every exit
    // path, error or not, must pass through the logout below.
    let result = run_session(&directory, &mut conn, user_index).await;
    directory.log_out_user(user_index);
    info!("[{peer}] session over");

    result
}

async fn run_session(
    directory: &Directory,
    conn: &mut Connection,
    user_index: usize,
) -> Result<()> {
    let peer = conn.peer;

    conn.send_line(&user_index.to_string()).await?;

    // Handshake: the client confirms it saw the auth reply. Content is
    // not validated, only that the peer is still there.
    let Some(_confirmation) = conn.receive_line().await? else {
        info!("[{peer}] disconnected during handshake");
        return Ok(());
    };

    let Some(mut session) = GameSession::new(directory.clone()) else {
        conn.send_line("The word bank is empty. Try again later.")
            .await?;
        return Ok(());
    };

    conn.send_line(&session.start_message()).await?;

    while session.status() == Status::Active {
        let Some(line) = conn.receive_line().await? else {
            info!("[{peer}] client disconnected mid-game");
            session.end();
            break;
        };
        debug!("[{peer}] input: {line:?}");

        if let Some(command) = protocol::directory_command(&line) {
            run_directory_command(directory, conn, &mut session, user_index, command).await?;
            continue;
        }

        let reply = session.handle_input(&line);
        conn.send_line(&reply).await?;

        directory.update_user_scores(session.score(), session.best_streak(), user_index);
    }

    Ok(())
}

/// Commands that read or write the shared directory rather than the
/// session's own state.
async fn run_directory_command(
    directory: &Directory,
    conn: &mut Connection,
    session: &mut GameSession,
    user_index: usize,
    command: DirectoryCommand,
) -> Result<()> {
    match command {
        DirectoryCommand::AddWord => {
            // Ack with a bare "." so the client switches to gathering
            // the word and hint, then read them back as one line.
            conn.send_line(".").await?;

            let Some(entry_line) = conn.receive_line().await? else {
                info!("[{}] client disconnected mid-game", conn.peer);
                session.end();
                return Ok(());
            };
            match directory.add_word(&entry_line) {
                Ok(()) => {
                    conn.send_line(&format!("Word added to the bank.\n{}", session.prompt()))
                        .await?;
                }
                Err(err) => {
                    warn!("[{}] bad .addword entry: {err}", conn.peer);
                    conn.send_line(&format!(
                        "Could not add that word: {err}\n{}",
                        session.prompt()
                    ))
                    .await?;
                }
            }
        }
        DirectoryCommand::Leaderboard => {
            conn.send_line(&format!("{}\n{}", directory.leaderboard(), session.prompt()))
                .await?;
        }
        DirectoryCommand::HighScore => {
            conn.send_line(&format!(
                "{}\n{}",
                directory.high_score(user_index),
                session.prompt()
            ))
            .await?;
        }
    }

    Ok(())
}
