use clap::Parser;

use fundscope::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let state = fundscope::load_state(&config)?;
    fundscope::serve(&config, state).await
}
