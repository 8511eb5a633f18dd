use clap::Parser;
use log::{error, info};
use nectar::configuration::config::Config;
use nectar::controller::controller_handler::Controller;
use std::path::Path;

#[derive(Parser)]
#[command(name = "nectar")]
#[command(version = "0.1.0")]
#[command(about = "An SSH deception sensor with command risk triage")]
struct Args {
    config_file: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
███╗   ██╗███████╗ ██████╗████████╗ █████╗ ██████╗
████╗  ██║██╔════╝██╔════╝╚══██╔══╝██╔══██╗██╔══██╗
██╔██╗ ██║█████╗  ██║        ██║   ███████║██████╔╝
██║╚██╗██║██╔══╝  ██║        ██║   ██╔══██║██╔══██╗
██║ ╚████║███████╗╚██████╗   ██║   ██║  ██║██║  ██║
╚═╝  ╚═══╝╚══════╝ ╚═════╝   ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝
===================================================
    An SSH deception sensor with risk triage v0.1.0
===================================================
"
    );

    info!("Importing configuration");

    let args = Args::parse();

    if args.config_file.is_empty() {
        error!("No configuration file found");
        std::process::exit(1);
    }

    let config = match Config::from_file(Path::new(args.config_file.as_str())) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration from file: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration imported successfully");

    let controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    info!("Spawning the controller");
    if let Err(e) = controller.run().await {
        error!("Error occured in the controller process: {}, exiting...", e);
        std::process::exit(1);
    }
}
