//! # Seed Data Generator
//!
//! Populates a database with a small demo motel for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./innkeep_dev.db
//! cargo run -p innkeep-db --bin seed
//!
//! # More floors
//! cargo run -p innkeep-db --bin seed -- --floors 5
//!
//! # Specify database path
//! cargo run -p innkeep-db --bin seed -- --db ./data/innkeep.db
//! ```
//!
//! ## Generated Data
//! - Users: `admin` (admin) and `reception` (staff)
//! - Room types with half-day / full-day prices
//! - Rooms `{floor}01..{floor}06`, types cycling per room
//! - A drink menu with pack and unit stock

use std::env;

use innkeep_core::pricing::RoomPrice;
use innkeep_core::{Money, UserRole};
use innkeep_db::{Database, DbConfig, NewDrink, RoomTypeRepository};

/// Room types and their (half-day, full-day) prices.
const ROOM_TYPES: &[(&str, i64, i64)] = &[
    ("Standard", 300_000, 500_000),
    ("Deluxe", 400_000, 650_000),
    ("VIP", 550_000, 900_000),
];

const ROOMS_PER_FLOOR: i64 = 6;

/// (name, cost, selling, units per pack, packs, loose units)
const DRINKS: &[(&str, i64, i64, i64, i64, i64)] = &[
    ("Tiger", 15_000, 25_000, 24, 4, 10),
    ("Heineken", 18_000, 30_000, 24, 3, 0),
    ("Coca-Cola", 8_000, 15_000, 24, 2, 12),
    ("Aquafina", 4_000, 10_000, 24, 5, 0),
    ("Red Bull", 10_000, 20_000, 24, 1, 6),
    ("Sting", 7_000, 15_000, 24, 2, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut floors: i64 = 3;
    let mut db_path = String::from("./innkeep_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--floors" | "-f" => {
                if i + 1 < args.len() {
                    floors = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("innkeep Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --floors <N>   Number of floors to generate (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./innkeep_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 innkeep Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Floors:   {}", floors);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.rooms().list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} rooms", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    let admin = db.users().create("admin", "Administrator", UserRole::Admin).await?;
    let staff = db.users().create("reception", "Front Desk", UserRole::Staff).await?;
    println!("✓ Users: {} ({}), {} ({})", admin.username, admin.id, staff.username, staff.id);

    // Room types and prices
    let room_types = RoomTypeRepository::new(db.pool().clone());
    let mut logic = db.price_logic().get().await?;
    let mut type_ids = Vec::with_capacity(ROOM_TYPES.len());

    for (name, half_day, full_day) in ROOM_TYPES {
        let room_type = room_types.create(name).await?;
        logic.room_prices.insert(
            room_type.id.clone(),
            RoomPrice {
                half_day_price: Money::new(*half_day),
                full_day_price: Money::new(*full_day),
            },
        );
        type_ids.push(room_type.id);
    }
    db.price_logic().update(logic).await?;
    println!("✓ {} room types priced", type_ids.len());

    // Rooms
    let mut rooms = 0;
    for floor in 1..=floors {
        for slot in 1..=ROOMS_PER_FLOOR {
            let number = format!("{}{:02}", floor, slot);
            let room_type = &type_ids[(slot as usize - 1) % type_ids.len()];
            if let Err(e) = db.rooms().create(&number, floor, room_type).await {
                eprintln!("Failed to insert room {}: {}", number, e);
                continue;
            }
            rooms += 1;
        }
    }
    println!("✓ {} rooms", rooms);

    // Drinks
    let mut drinks = 0;
    for (name, cost, selling, per_pack, packs, units) in DRINKS {
        let new = NewDrink {
            name: name.to_string(),
            cost_price: Money::new(*cost),
            selling_price: Money::new(*selling),
            units_per_pack: *per_pack,
            pack_stock: *packs,
            unit_stock: *units,
            alert_threshold: 6,
        };
        if let Err(e) = db.drinks().create(new).await {
            eprintln!("Failed to insert drink {}: {}", name, e);
            continue;
        }
        drinks += 1;
    }
    println!("✓ {} drinks", drinks);

    let low = db.drinks().list().await?.into_iter().filter(|d| d.is_low_stock()).count();
    if low > 0 {
        println!("  {} drinks already at low stock", low);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
