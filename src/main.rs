use std::net::SocketAddr;
use std::sync::Arc;

use astra::Server;

use crate::baserow::BaserowClient;
use crate::db::connection::{init_db, Database};
use crate::responses::error_to_response;
use crate::router::handle;
use crate::store::ItemStore;

mod auth;
mod baserow;
mod db;
mod domain;
mod errors;
mod responses;
mod router;
mod store;

#[cfg(test)]
mod tests;

fn main() {
    // 1️⃣ Create the snapshot database handle
    let db_path = std::env::var("SNAPSHOT_DB").unwrap_or_else(|_| "giveaway.sqlite3".to_string());
    let db = Database::new(db_path);

    // 2️⃣ Initialize database from schema.sql
    if let Err(e) = init_db(&db, "sql/schema.sql") {
        eprintln!("❌ Database initialization failed: {e}");
        std::process::exit(1);
    }

    // 3️⃣ Connect to Baserow (or fall back to local mode)
    let remote = match BaserowClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Baserow client setup failed: {e}");
            std::process::exit(1);
        }
    };

    // 4️⃣ Load the item collection
    let store = Arc::new(ItemStore::new(db, remote));
    let report = store.load();
    if report.degraded {
        eprintln!("⚠️ Serving {} items without a live Baserow connection", report.count);
    }

    // 5️⃣ Start the server
    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("❌ Invalid BIND_ADDR {bind}: {e}");
            std::process::exit(1);
        }
    };
    println!("Starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(8);

    // 6️⃣ Serve requests, passing the store into the closure
    let result = server.serve(move |req, _info| match handle(req, &store) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        eprintln!("Server ended with error: {e}");
    }

    println!("Server shut down cleanly.");
}
