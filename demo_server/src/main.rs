use std::{env, sync::Arc, thread, time::{Duration, Instant}};

use anyhow::Context;
use diorite_core_server::{
    Universe,
    config::WorldConfig,
    inventory::{Inventory, InventoryHolder, InventorySlot, InventoryView, item_stack::ItemStack},
};
use diorite_mc_constants::{entity::EntityType, item::Material};
use diorite_mc_protocol::{play::clientbound::PacketHandler, types::GameProfile};
use diorite_network::ChannelConnection;
use glam::{DVec3, IVec3};
use tracing::info;

use packet_log::PacketLog;

mod packet_log;

const DEMO_TICKS: u64 = 60;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match env::args().nth(1) {
        Some(path) => WorldConfig::load(&path)?,
        None => WorldConfig::default(),
    };
    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate as f64);

    let mut universe = Universe::new();
    let world_id = universe.create_world(config).context("invalid world config")?;
    let world = universe.world(world_id).context("world was not created")?.clone();

    let (connection, receiver) = ChannelConnection::new();
    let alice = world.spawn_player(
        GameProfile { uuid: 0xd0e05de76067454dbeaec6d19d886191, username: "alice".into() },
        Some(Arc::new(connection)),
        DVec3::new(8.5, 4.0, 8.5),
    );
    let bob = world.spawn_player(
        GameProfile { uuid: 0x5eb0, username: "bob".into() },
        None,
        DVec3::new(12.5, 4.0, 8.5),
    );

    world.spawn_entity(EntityType::Zombie, DVec3::new(10.5, 20.0, 12.5));
    world.spawn_entity_by_name("minecraft:pig", DVec3::new(6.5, 4.0, 6.5));
    world.drop_item(DVec3::new(8.5, 6.0, 8.5), ItemStack::new(Material::Apple, 3));

    // Crafting: one log in the grid should offer planks in the result slot
    alice.inventory().set_slot(InventorySlot::CraftingInput(0), Some(ItemStack::single(Material::Log)))?;
    bob.inventory().set_slot(InventorySlot::Hotbar(0), Some(ItemStack::single(Material::DiamondSword)))?;

    let chest = Arc::new(Inventory::chest(1, 3, "Demo Chest").with_holder(InventoryHolder::Block(IVec3::new(9, 4, 9))));
    chest.set_item(0, Some(ItemStack::new(Material::Torch, 16)))?;
    alice.open_inventory(chest.clone());

    let mut log = PacketLog::new(alice.profile().username.clone());
    let started = Instant::now();

    for tick in 1..=DEMO_TICKS {
        let tick_start = Instant::now();

        if tick == 20 {
            // Spread the torches over a drag, as a client would
            let drag = chest.drag_controller();
            drag.start(false);
            for slot in [1, 2, 3] {
                drag.add_slot(false, slot);
            }
            if let Some(slots) = drag.end(false) {
                let share = 16 / (slots.len() as u8 + 1);
                chest.set_item(0, Some(ItemStack::new(Material::Torch, 16 - share * slots.len() as u8)))?;
                for slot in slots {
                    chest.set_item(slot, Some(ItemStack::new(Material::Torch, share)))?;
                }
            }
        }
        if tick == 40 {
            alice.inventory().set_held_slot(1)?;
            alice.close_inventory();
        }

        universe.tick();

        for packet in receiver.drain_packets() {
            log.handle(&packet);
        }

        if let Some(remaining) = tick_duration.checked_sub(tick_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    let crafted = alice.inventory().crafting_grid().result().map(|result| (result.material(), result.amount()));
    info!(
        ticks = DEMO_TICKS,
        elapsed = ?started.elapsed(),
        entities = world.entity_count(),
        players = world.player_count(),
        packets = log.received,
        ?crafted,
        apples = alice.inventory().contains_at_least(Material::Apple, 3),
        "demo finished"
    );
    Ok(())
}
