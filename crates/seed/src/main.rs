use anyhow::{Context, bail};
use chrono::Utc;
use rust_decimal::Decimal;

use showroom_auth::{Role, StaffUser};
use showroom_core::UserId;
use showroom_infra::{InventoryStore, PostgresStore, StoreBackend, StoreConfig};
use showroom_inventory::NewCar;

struct StaffSeed {
    username: &'static str,
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: Role,
}

const STAFF: [StaffSeed; 3] = [
    StaffSeed {
        username: "superadmin",
        email: "admin@jajiautos.ng",
        first_name: "Super",
        last_name: "Admin",
        role: Role::SUPER_ADMIN,
    },
    StaffSeed {
        username: "salesperson",
        email: "sales@jajiautos.ng",
        first_name: "John",
        last_name: "Doe",
        role: Role::SALES_PERSONNEL,
    },
    StaffSeed {
        username: "inventorymanager",
        email: "inventory@jajiautos.ng",
        first_name: "Jane",
        last_name: "Smith",
        role: Role::INVENTORY_MANAGER,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    showroom_observability::init();

    let config = StoreConfig::from_env().context("reading store configuration")?;
    let StoreBackend::Postgres { database_url } = &config.backend else {
        bail!("seeding needs SHOWROOM_STORE=postgres and DATABASE_URL");
    };

    let store = PostgresStore::connect(database_url, config.max_connections, config.lock_timeout)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("applying schema")?;

    let mut inventory_manager = None;
    for seed in &STAFF {
        let id = ensure_staff(&store, seed).await?;
        if seed.role == Role::INVENTORY_MANAGER {
            inventory_manager = Some(id);
        }
    }

    let existing = store.count_cars().await?;
    if existing > 0 {
        tracing::info!(existing, "cars already present, skipping car seed");
        return Ok(());
    }

    let now = Utc::now();
    let cars = sample_cars();
    let count = cars.len();
    for new_car in cars {
        let car = new_car.into_car(inventory_manager, now)?;
        store.insert_car(&car).await?;
        tracing::info!(car_id = %car.id, name = %car.name, in_stock = car.in_stock, "seeded car");
    }

    tracing::info!(count, "seed complete");
    Ok(())
}

async fn ensure_staff(store: &PostgresStore, seed: &StaffSeed) -> anyhow::Result<UserId> {
    if let Some(user) = store.find_user_by_email(seed.email).await? {
        tracing::info!(email = seed.email, "staff user already exists");
        return Ok(user.id);
    }

    let user = StaffUser::new(
        seed.username,
        seed.email,
        seed.first_name,
        seed.last_name,
        seed.role.clone(),
    )?;
    store.insert_user(&user).await?;
    tracing::info!(email = seed.email, role = %user.role, "seeded staff user");
    Ok(user.id)
}

#[allow(clippy::too_many_arguments)]
fn car(
    name: &str,
    brand: &str,
    model: &str,
    category: &str,
    year: i32,
    price: i64,
    description: &str,
    in_stock: u32,
    featured: bool,
) -> NewCar {
    NewCar {
        name: name.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        category: category.to_string(),
        year,
        price: Decimal::from(price),
        description: Some(description.to_string()),
        in_stock,
        featured,
    }
}

fn sample_cars() -> Vec<NewCar> {
    vec![
        car(
            "Mercedes-Benz GLE 450",
            "Mercedes-Benz",
            "GLE 450",
            "Luxury SUV",
            2023,
            45_000_000,
            "Premium SUV combining elegant design with current driver-assistance technology.",
            3,
            true,
        ),
        car(
            "BMW X5 xDrive40i",
            "BMW",
            "X5 xDrive40i",
            "Luxury SUV",
            2023,
            42_000_000,
            "Sporty performance and a comfortable cabin.",
            2,
            true,
        ),
        car(
            "Audi Q7 Premium Plus",
            "Audi",
            "Q7 Premium Plus",
            "Luxury SUV",
            2022,
            38_000_000,
            "Spacious three-row SUV with quattro all-wheel drive.",
            4,
            true,
        ),
        car(
            "Porsche Cayenne S",
            "Porsche",
            "Cayenne S",
            "Sports SUV",
            2023,
            52_000_000,
            "Sports car handling in an SUV body.",
            1,
            true,
        ),
        car(
            "Toyota Camry XLE",
            "Toyota",
            "Camry XLE",
            "Sedan",
            2023,
            18_000_000,
            "Reliable, efficient mid-size sedan.",
            5,
            false,
        ),
    ]
}
