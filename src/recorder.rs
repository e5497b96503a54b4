use clap::Parser;
use tracing::{debug, info, warn};

mod log;
mod utils;

#[derive(Parser)]
#[command(version)]
struct Args {
    /// Set config file path
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg: recorder::config::Config = utils::load("recorder".to_string(), args.config);

    log::set(format!(
        "minaret_recorder={},recorder={},storage={},http_log={}",
        cfg.log.level, cfg.log.level, cfg.log.level, cfg.log.level
    ));

    cfg.validate()?;

    warn!("set log level : {}", cfg.log.level);
    debug!("config : {:?}", cfg);

    let listener = tokio::net::TcpListener::bind(cfg.http.listen).await?;

    recorder::serve(cfg, listener, utils::shutdown_signal()).await?;
    info!("Server shutdown");
    Ok(())
}
