//! LlamaHelm entry point

use dioxus::desktop::{Config, WindowBuilder};
use llamahelm::app::App;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("starting LlamaHelm");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            Config::new().with_window(
                WindowBuilder::new()
                    .with_title("LlamaHelm")
                    .with_resizable(true),
            ),
        )
        .launch(App);
}
