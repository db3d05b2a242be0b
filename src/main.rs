use anyhow::Result;
use clap::Parser;

use wordasaurus::directory::Directory;
use wordasaurus::server;

const DEFAULT_PORT: u16 = 12119;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// TCP port to listen on
    #[clap(default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let listen = format!("0.0.0.0:{}", args.port);

    let directory = Directory::with_defaults();

    server::run(&listen, directory).await?;

    Ok(())
}
