use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use electro_parts_api::{
    config::{AppConfig, DEFAULT_GUEST_EMAIL},
    db::create_pool,
};
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price: i64,
    original_price: Option<i64>,
    image: &'static str,
    is_offer: bool,
    in_stock: bool,
}

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    products: &'static [SeedProduct],
}

const CATALOG: &[SeedCategory] = &[
    SeedCategory {
        name: "Passive Components",
        slug: "passive-components",
        description: "Resistors, capacitors and inductors for your projects.",
        products: &[
            SeedProduct {
                name: "Carbon Film Resistors 1/4W",
                slug: "carbon-film-resistors-1-4w",
                description: "Kit of 100 resistors in assorted values for prototyping.",
                price: 25,
                original_price: Some(30),
                image: "/carbon-film-resistors.png",
                is_offer: true,
                in_stock: true,
            },
            SeedProduct {
                name: "Electrolytic Capacitors",
                slug: "electrolytic-capacitors",
                description: "Capacitor set from 10uF to 1000uF.",
                price: 45,
                original_price: None,
                image: "/electrolytic-capacitors.png",
                is_offer: false,
                in_stock: true,
            },
            SeedProduct {
                name: "Toroidal Inductors",
                slug: "toroidal-inductors",
                description: "High quality inductors for filters and power supplies.",
                price: 85,
                original_price: None,
                image: "/toroidal-inductors.png",
                is_offer: false,
                in_stock: true,
            },
        ],
    },
    SeedCategory {
        name: "Active Components",
        slug: "active-components",
        description: "Microcontrollers, semiconductors and integrated circuits.",
        products: &[
            SeedProduct {
                name: "Arduino Uno R3",
                slug: "arduino-uno-r3",
                description: "Microcontroller board for automation projects and learning.",
                price: 320,
                original_price: Some(380),
                image: "/arduino-uno-r3.png",
                is_offer: true,
                in_stock: true,
            },
            SeedProduct {
                name: "NPN/PNP Transistor Kit",
                slug: "npn-pnp-transistor-kit",
                description: "Transistor kit for amplification circuits.",
                price: 35,
                original_price: None,
                image: "/npn-pnp-transistor-kit.png",
                is_offer: false,
                in_stock: true,
            },
            SeedProduct {
                name: "74HC Logic IC Series",
                slug: "74hc-logic-ic-series",
                description: "Complete series of logic gates for digital labs.",
                price: 120,
                original_price: None,
                image: "/74hc-logic-ic-series.png",
                is_offer: false,
                in_stock: false,
            },
            SeedProduct {
                name: "Assorted Diodes and Transistors",
                slug: "assorted-diodes-transistors",
                description: "Complete semiconductor kit for repairs and testing.",
                price: 55,
                original_price: None,
                image: "/assorted-diodes-transistors.png",
                is_offer: false,
                in_stock: true,
            },
        ],
    },
    SeedCategory {
        name: "Power Supplies",
        slug: "power-supplies",
        description: "Power solutions for labs and projects.",
        products: &[
            SeedProduct {
                name: "Variable Bench Supply 0-30V",
                slug: "variable-bench-supply-0-30v",
                description: "Adjustable supply with digital display and overload protection.",
                price: 850,
                original_price: Some(950),
                image: "/variable-bench-supply.png",
                is_offer: true,
                in_stock: true,
            },
            SeedProduct {
                name: "Rechargeable Li-ion Batteries",
                slug: "rechargeable-li-ion-batteries",
                description: "Pack of four 18650 cells with a smart charger.",
                price: 180,
                original_price: None,
                image: "/rechargeable-li-ion-batteries.png",
                is_offer: false,
                in_stock: true,
            },
        ],
    },
    SeedCategory {
        name: "Instrumentation",
        slug: "instrumentation",
        description: "Measurement and diagnostic instruments.",
        products: &[
            SeedProduct {
                name: "Digital Multimeter",
                slug: "digital-multimeter",
                description: "Professional high precision multimeter with True RMS.",
                price: 1200,
                original_price: Some(1400),
                image: "/digital-multimeter.png",
                is_offer: true,
                in_stock: true,
            },
            SeedProduct {
                name: "USB Oscilloscope 2 Channels",
                slug: "usb-oscilloscope-2-channels",
                description: "Portable oscilloscope for signal analysis on a PC.",
                price: 2500,
                original_price: None,
                image: "/usb-oscilloscope-2-channels.png",
                is_offer: false,
                in_stock: true,
            },
        ],
    },
    SeedCategory {
        name: "Accessories",
        slug: "accessories",
        description: "Everything you need to round out your builds.",
        products: &[
            SeedProduct {
                name: "Breadboard 830 Points",
                slug: "breadboard-830-points",
                description: "High quality breadboard for prototyping.",
                price: 65,
                original_price: None,
                image: "/breadboard-830-points.png",
                is_offer: false,
                in_stock: true,
            },
            SeedProduct {
                name: "Jumper Wires Male-Female",
                slug: "jumper-wires-male-female",
                description: "Set of 120 flexible connection wires.",
                price: 40,
                original_price: Some(50),
                image: "/jumper-wires-male-female.png",
                is_offer: true,
                in_stock: true,
            },
            SeedProduct {
                name: "Electronics Tool Kit",
                slug: "electronics-tool-kit",
                description: "Professional tools for electronics maintenance.",
                price: 250,
                original_price: None,
                image: "/electronics-tool-kit.png",
                is_offer: false,
                in_stock: true,
            },
        ],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    ensure_user(&pool, "Guest", DEFAULT_GUEST_EMAIL, "guest123").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email}");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for category in CATALOG {
        let (category_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category.name)
        .bind(category.slug)
        .bind(category.description)
        .fetch_one(pool)
        .await?;

        for product in category.products {
            sqlx::query(
                r#"
                INSERT INTO products
                    (id, name, slug, description, price, original_price, image,
                     is_offer, in_stock, category_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (slug) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product.name)
            .bind(product.slug)
            .bind(product.description)
            .bind(product.price)
            .bind(product.original_price)
            .bind(product.image)
            .bind(product.is_offer)
            .bind(product.in_stock)
            .bind(category_id)
            .execute(pool)
            .await?;
        }
        println!("Seeded category {}", category.slug);
    }

    Ok(())
}
