mod app;
mod config;

use crate::app::App;
use crate::config::{CONFIG_FILE, ViewerConfig};
use vantage_runtime::Graphics;
use winit::event_loop::EventLoop;

fn main() -> Result<(), winit::error::EventLoopError> {
    let loaded = ViewerConfig::load_or_default(CONFIG_FILE);
    let filter = match &loaded {
        Ok(config) => config.log.filter.clone(),
        Err(_) => ViewerConfig::default().log.filter,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("{CONFIG_FILE}: {e}, using defaults");
        ViewerConfig::default()
    });

    let event_loop = EventLoop::<Graphics>::with_user_event().build()?;
    let mut app = App::new(&event_loop, config);
    event_loop.run_app(&mut app)
}
