#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Background work (image inlining, AI requests, save dialogs) runs on tokio
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    let _guard = runtime.enter();

    // Run the logo maker
    logo_maker::run_app()
}

// The web build starts from `logo_maker::start`
#[cfg(target_arch = "wasm32")]
fn main() {}
