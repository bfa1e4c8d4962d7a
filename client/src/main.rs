use clap::Parser;
use client::game::ClientWorld;
use client::input::{direction_from_keys, InputTracker};
use client::network::Connection;
use client::rendering;
use log::error;
use macroquad::prelude::*;
use shared::{Packet, WORLD_HEIGHT, WORLD_WIDTH};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "tilearena".to_string(),
        window_width: WORLD_WIDTH as i32,
        window_height: WORLD_HEIGHT as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut connection = match Connection::connect(&args.server) {
        Ok(connection) => connection,
        Err(e) => {
            error!("failed to connect to {}: {}", args.server, e);
            return;
        }
    };

    let mut world = ClientWorld::new();
    let mut tracker = InputTracker::new();

    loop {
        match connection.poll() {
            Ok(packets) => {
                for packet in packets {
                    world.apply_packet(packet);
                }
            }
            Err(e) => {
                error!("connection lost: {}", e);
                break;
            }
        }
        if connection.is_closed() {
            break;
        }

        let dir = direction_from_keys(
            is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
        );
        world.set_intent(dir.0, dir.1);

        if let Some((dx, dy)) = tracker.track(dir) {
            if let Err(e) = connection.send(&Packet::Input { dx, dy }) {
                error!("failed to send input: {}", e);
                break;
            }
        }

        world.advance(get_frame_time());
        rendering::draw(&world);

        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        next_frame().await;
    }
}
