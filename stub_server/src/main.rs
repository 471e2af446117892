use salon_client::models::ServiceDraft;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stub_server::{config::StubConfig, state::AppState};

fn seed_catalog(state: &AppState) {
    let entries = [
        ("Haircut", "Hair", 35.0, 45),
        ("Balayage", "Hair", 120.0, 150),
        ("Gel manicure", "Nails", 45.0, 60),
        ("Brow shaping", "Brows", 20.0, 20),
    ];
    for (name, category, price, duration_minutes) in entries {
        state.add_service(ServiceDraft {
            name: name.to_string(),
            description: None,
            price,
            duration_minutes,
            category: Some(category.to_string()),
            active: true,
        });
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = StubConfig::load()?;
    let port = config.port;
    let state = AppState::new(config);
    seed_catalog(&state);

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Stub server listening on {}", listener.local_addr()?);
    stub_server::serve(listener, state).await?;
    Ok(())
}
