#[tokio::main]
async fn main() -> anyhow::Result<()> {
    voice_alerts_lib::run().await
}
