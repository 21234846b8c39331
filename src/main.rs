use clap::Parser;
use tracing::info;

use crate::{
    auth::Auth,
    config::{Config, StartArgs},
    state::Shelf,
};

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod folder;
pub mod ids;
pub mod library;
pub mod ordering;
pub mod router;
pub mod state;

#[cfg(test)]
mod memory;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let StartArgs {
        config_path,
        address: host,
        port,
        log_level: level,
    } = StartArgs::parse();

    tracing_subscriber::fmt().with_max_level(level).init();

    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let db_pool = db::create_pool(&db_url)
        .await
        .expect("error while connecting to db");

    db::migrate(&db_pool).await.expect("error in migrations");

    let addr = format!("{host}:{port}");

    let Config {
        title,
        admin,
        defaults,
    } = Config::read(config_path).expect("invalid config file");

    let auth = admin.map(|config| Auth::new(config).expect("error in auth configuration"));
    if auth.is_none() {
        info!("No admin configured, admin routes disabled");
    }

    let shelf = Shelf::new(db_pool, title, defaults);

    info!("Now listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("error while starting TCP listener");

    let router = router::router(shelf, auth);

    axum::serve(listener, router)
        .await
        .expect("error while starting server");
}
