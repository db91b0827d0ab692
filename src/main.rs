use clap::Parser;
use eframe::egui;
use fast_config::Config;
use game_server_panel::{
    cli, Args, ConfigData, ControlPanel, HttpTransport, INITIAL_HEIGHT, INITIAL_WIDTH,
    PROGRAM_TITLE,
};
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

fn config_path(args: &Args) -> PathBuf {
    if let Some(path) = &args.config {
        return path.clone();
    }
    // Determine config path safely
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")); // Fallback to current dir
    config_dir.join("server_panel.json")
}

fn load_config(args: &Args) -> Config<ConfigData> {
    let path = config_path(args).to_string_lossy().into_owned();
    let mut config = match Config::new(&path, ConfigData::default()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error creating config file at {}: {}", path, e);
            exit(1)
        }
    };

    if let Some(server) = &args.server {
        log::info!("Using backend {} from the command line.", server);
        config.data.base_url = server.clone();
    }
    config
}

// Application Entry Point
fn main() {
    // Initialize logging
    #[cfg(feature = "logging")]
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args);

    let timeout = Duration::from_secs(config.data.request_timeout_secs);
    let transport = match HttpTransport::new(&config.data.base_url, timeout) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("{}", e);
            exit(1)
        }
    };

    if let Some(command) = &args.command {
        let mut stdout = std::io::stdout();
        if let Err(e) = cli::run(command, &config.data, &transport, &mut stdout) {
            eprintln!("{}", e);
            exit(1)
        }
        return;
    }

    log::info!("Starting {} against {}", PROGRAM_TITLE, transport.base_url());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([INITIAL_WIDTH, INITIAL_HEIGHT])
            .with_title(PROGRAM_TITLE), // Set window title here
        ..Default::default()
    };

    let panel = ControlPanel::new(config, Arc::new(transport));
    if let Err(e) = eframe::run_native(
        PROGRAM_TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(panel))),
    ) {
        eprintln!("{}", e);
        exit(1)
    }
}
