//! Autho.D.oX HTTP service

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    authodox::server::run().await
}
