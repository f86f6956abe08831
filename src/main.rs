use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(err) = es_rest_gateway::server::run().await {
        error!("Gateway stopped: {}", err);
        std::process::exit(1);
    }
}
