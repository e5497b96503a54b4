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
    let cfg: control::config::Config = utils::load("control".to_string(), args.config);

    #[cfg(debug_assertions)]
    log::set(format!(
        "minaret_control={},control={},http_log={},sea_orm=info",
        cfg.log.level, cfg.log.level, cfg.log.level
    ));

    #[cfg(not(debug_assertions))]
    log::set(format!(
        "minaret_control={},control={},http_log={},sea_orm=warn",
        cfg.log.level, cfg.log.level, cfg.log.level
    ));

    cfg.validate()?;

    warn!("set log level : {}", cfg.log.level);
    debug!("config : {:?}", cfg);

    let listener = tokio::net::TcpListener::bind(cfg.http.listen).await?;

    control::serve(cfg, listener, utils::shutdown_signal()).await?;
    info!("Server shutdown");
    Ok(())
}
