use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = pos_daily_sales::args::parse();
    pos_daily_sales::cli::main(args).await
}
