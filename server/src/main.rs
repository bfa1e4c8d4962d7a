use clap::Parser;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::game::World;
use server::network::{self, ServerCommand};
use shared::grid::CollisionGrid;
use shared::Packet;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Simulation ticks (and snapshot broadcasts) per second
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Tile map file (comma-separated cell codes, one row per line).
    /// Without a map the world is an open box with bounds clamping.
    #[arg(short, long)]
    map: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let grid = match &args.map {
        Some(path) => {
            let grid = CollisionGrid::load(path)?;
            info!(
                "loaded map {} ({}x{} cells)",
                path.display(),
                grid.width_cells(),
                grid.height_cells()
            );
            Some(grid)
        }
        None => None,
    };

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    tokio::spawn(network::accept_loop(listener, commands_tx));

    run_game_loop(World::new(grid), commands_rx, args.tick_rate.max(1)).await;
    Ok(())
}

/// The single owner of the world: drains connection commands and advances
/// the simulation on a fixed-period ticker, broadcasting a snapshot at the
/// end of every tick.
async fn run_game_loop(
    mut world: World,
    mut commands: mpsc::UnboundedReceiver<ServerCommand>,
    tick_rate: u32,
) {
    let mut connections: HashMap<u32, mpsc::UnboundedSender<Packet>> = HashMap::new();

    let dt = 1.0 / tick_rate as f32;
    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut rng = StdRng::from_entropy();
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => handle_command(&mut world, &mut connections, &mut rng, command),
                None => {
                    info!("listener gone, shutting down game loop");
                    break;
                }
            },

            _ = ticker.tick() => {
                world.tick(dt);
                tick += 1;

                let snapshot = Packet::Snapshot { entities: world.snapshot() };
                broadcast(&connections, &snapshot);

                if tick % (tick_rate as u64 * 10) == 0 {
                    debug!("tick {}: {} players connected", tick, world.len());
                }
            }
        }
    }
}

fn handle_command(
    world: &mut World,
    connections: &mut HashMap<u32, mpsc::UnboundedSender<Packet>>,
    rng: &mut StdRng,
    command: ServerCommand,
) {
    match command {
        ServerCommand::Connected { id, sender } => {
            let entity = world.add_player(id, rng);

            // The joining client learns the whole roster and its own id;
            // everyone else only hears about the newcomer.
            let roster = Packet::Roster {
                client_id: id,
                entities: world.snapshot(),
            };
            let _ = sender.send(roster);

            broadcast(connections, &Packet::Join { entity });
            connections.insert(id, sender);
        }

        ServerCommand::Input { id, dx, dy } => {
            world.set_input(id, dx, dy);
        }

        ServerCommand::Disconnected { id } => {
            connections.remove(&id);
            if world.remove_player(id) {
                broadcast(connections, &Packet::Leave { id });
            }
        }
    }
}

/// Fire-and-forget fan-out: a full or closed per-connection channel only
/// affects that connection.
fn broadcast(connections: &HashMap<u32, mpsc::UnboundedSender<Packet>>, packet: &Packet) {
    for sender in connections.values() {
        let _ = sender.send(packet.clone());
    }
}
