use migrate_releases::cli;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = cli::run().await {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}
