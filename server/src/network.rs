//! TCP transport: listener, wire framing, and per-connection tasks.
//!
//! Each accepted connection gets two tasks: a reader that decodes frames
//! and forwards them as [`ServerCommand`]s to the game loop, and a writer
//! that drains the connection's outbound packet channel. The game loop is
//! the only place that decides what those commands mean.

use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, MAX_FRAME_BYTES};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Events forwarded from connection tasks to the game loop.
#[derive(Debug)]
pub enum ServerCommand {
    /// A connection was accepted. `sender` is its outbound packet channel;
    /// dropping it ends the connection's writer task.
    Connected {
        id: u32,
        sender: mpsc::UnboundedSender<Packet>,
    },
    /// Movement intent decoded from the connection.
    Input { id: u32, dx: f32, dy: f32 },
    /// The connection went away (clean close or read error alike).
    Disconnected { id: u32 },
}

/// Accepts connections forever, assigning each a fresh id and spawning its
/// reader and writer tasks. Returns when the command channel is closed.
pub async fn accept_loop(listener: TcpListener, commands: mpsc::UnboundedSender<ServerCommand>) {
    let mut next_id: u32 = 1;

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let id = next_id;
                next_id += 1;
                info!("connection {} accepted from {}", id, addr);

                if let Err(e) = stream.set_nodelay(true) {
                    debug!("connection {}: set_nodelay failed: {}", id, e);
                }

                let (reader, writer) = stream.into_split();
                let (sender, outgoing) = mpsc::unbounded_channel();

                if commands
                    .send(ServerCommand::Connected { id, sender })
                    .is_err()
                {
                    return;
                }

                tokio::spawn(write_task(id, writer, outgoing));
                tokio::spawn(read_task(id, reader, commands.clone()));
            }
            Err(e) => {
                error!("accept failed: {}", e);
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_task(
    id: u32,
    mut reader: OwnedReadHalf,
    commands: mpsc::UnboundedSender<ServerCommand>,
) {
    loop {
        match read_frame(&mut reader).await {
            Ok(frame) => match deserialize::<Packet>(&frame) {
                Ok(Packet::Input { dx, dy }) => {
                    if commands.send(ServerCommand::Input { id, dx, dy }).is_err() {
                        return;
                    }
                }
                // Frame boundaries are intact, so a bad payload can be
                // skipped without losing sync.
                Ok(other) => debug!("connection {} sent server-bound {:?}, ignoring", id, other),
                Err(e) => warn!("connection {}: undecodable frame ({}), ignoring", id, e),
            },
            Err(e) => {
                debug!("connection {} read ended: {}", id, e);
                break;
            }
        }
    }

    let _ = commands.send(ServerCommand::Disconnected { id });
}

async fn write_task(
    id: u32,
    mut writer: OwnedWriteHalf,
    mut outgoing: mpsc::UnboundedReceiver<Packet>,
) {
    while let Some(packet) = outgoing.recv().await {
        let body = match serialize(&packet) {
            Ok(body) => body,
            Err(e) => {
                error!("connection {}: failed to encode packet: {}", id, e);
                continue;
            }
        };

        let len = (body.len() as u32).to_le_bytes();
        if writer.write_all(&len).await.is_err() || writer.write_all(&body).await.is_err() {
            // A failed write only loses this connection; the reader task
            // will surface the disconnect.
            debug!("connection {} write failed, dropping outbound queue", id);
            break;
        }
    }
}

async fn read_frame(reader: &mut OwnedReadHalf) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_FRAME_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit", len),
        ));
    }

    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame).await?;
    Ok(frame)
}
