/// Mirrors a simulation host headless. Takes an optional TOML config path.
#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use simviz::ViewerConfig;

    let config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::from_file(std::path::Path::new(&path))?,
        None => ViewerConfig::default(),
    };
    simviz::run(config)
}

// In the browser the page calls the exported `start` instead.
#[cfg(target_arch = "wasm32")]
fn main() {}
