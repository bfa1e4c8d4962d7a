//! Headless smoke client: connects, wanders randomly, and logs what the
//! server sends back. Useful for exercising the server without a window.

use bincode::{deserialize, serialize};
use rand::Rng;
use shared::{Packet, MAX_FRAME_BYTES};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::interval;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let stream = TcpStream::connect(&addr).await?;
    stream.set_nodelay(true)?;
    println!("connected to {}", addr);
    let (mut reader, mut writer) = stream.into_split();

    let mut wander = interval(Duration::from_millis(500));
    let mut rng = rand::thread_rng();
    let mut my_id = None;
    let mut snapshots: u64 = 0;

    loop {
        tokio::select! {
            packet = read_packet(&mut reader) => match packet? {
                Packet::Roster { client_id, entities } => {
                    my_id = Some(client_id);
                    println!("roster: I am {} among {} players", client_id, entities.len());
                }
                Packet::Join { entity } => {
                    println!("join: {} at ({:.1}, {:.1})", entity.id, entity.x, entity.y);
                }
                Packet::Leave { id } => println!("leave: {}", id),
                Packet::Snapshot { entities } => {
                    snapshots += 1;
                    if snapshots % 30 == 0 {
                        if let Some(me) = my_id.and_then(|id| entities.iter().find(|e| e.id == id)) {
                            println!(
                                "snapshot {}: at ({:.1}, {:.1}), {} players",
                                snapshots, me.x, me.y, entities.len()
                            );
                        }
                    }
                }
                other => println!("unexpected packet: {:?}", other),
            },

            _ = wander.tick() => {
                // One of the eight directions, or stand still.
                let dirs: [(f32, f32); 9] = [
                    (0.0, 0.0), (1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0),
                    (0.707, 0.707), (0.707, -0.707), (-0.707, 0.707), (-0.707, -0.707),
                ];
                let (dx, dy) = dirs[rng.gen_range(0..dirs.len())];
                write_packet(&mut writer, &Packet::Input { dx, dy }).await?;
            }
        }
    }
}

async fn read_packet(reader: &mut OwnedReadHalf) -> Result<Packet, Box<dyn std::error::Error>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err("oversized frame from server".into());
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(deserialize(&body)?)
}

async fn write_packet(
    writer: &mut OwnedWriteHalf,
    packet: &Packet,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = serialize(packet)?;
    writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
    writer.write_all(&body).await?;
    Ok(())
}
