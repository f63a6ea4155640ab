use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Bank file path, or an http(s) URL to fetch it from
    bank: String,

    /// First day to fill, relative to today
    #[arg(long, default_value_t = 1)]
    start_offset: i64,

    /// Number of consecutive days to fill
    #[arg(long, default_value_t = 30)]
    days: u32,

    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    redis_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    process::load_riddles(&args.bank, &args.redis_url, args.start_offset, args.days).await
}
