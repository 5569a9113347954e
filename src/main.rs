use anyhow::Context;
use env_logger::Env;

use skylit::AppConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=off,naga=warn"),
    )
    .init();

    // Optional first argument: a JSON config file.
    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.to_string_lossy()))?,
        None => AppConfig::default(),
    };

    skylit::run(config).context("running skylit")
}
