#[tokio::main]
async fn main() -> anyhow::Result<()> {
    riddle_server::start_server().await
}
