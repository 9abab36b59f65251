use clap::Parser;

use cladeview::app::{AppConfig, CladeView};

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();

    let config = AppConfig::parse();
    if let Err(err) = CladeView::run(&config) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
