use argh::FromArgs;
use detect_gateway::{
    DetectClient, DetectError, DetectView, LiveFeed, Preview, controller::notification, render,
};
use std::path::PathBuf;

// defaults for the client
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const SNAPSHOT_PATH: &str = "/pi/snapshot.jpg";

#[derive(FromArgs)]
/// Detection client for submitting images through the gateway
struct ClientArgs {
    /// the gateway base url
    #[argh(option, short = 'u', default = "DEFAULT_BASE_URL.to_string()")]
    base_url: String,

    /// command to execute: "detect", "snapshot" or "health"
    #[argh(subcommand)]
    command: ClientCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum ClientCommands {
    Detect(DetectCommand),
    Snapshot(SnapshotCommand),
    Health(HealthCommand),
}

#[derive(FromArgs)]
/// Run detection on an image file
#[argh(subcommand, name = "detect")]
struct DetectCommand {
    /// the path to the image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// where to write the annotated image
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(FromArgs)]
/// Run detection on the camera relay's latest frame
#[argh(subcommand, name = "snapshot")]
struct SnapshotCommand {
    /// where to write the annotated image
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(FromArgs)]
/// Check that the gateway is up
#[argh(subcommand, name = "health")]
struct HealthCommand {}

/// Prints results to the terminal and optionally saves the annotated image.
struct ConsoleView {
    output: Option<PathBuf>,
}

impl LiveFeed for ConsoleView {
    fn attach_live(&mut self) {}
    fn detach_live(&mut self) {}
}

impl DetectView for ConsoleView {
    fn set_preview(&mut self, _preview: &Preview) {}

    fn show_annotated(&mut self, jpeg: &[u8]) {
        let Some(path) = &self.output else {
            return;
        };
        match std::fs::write(path, jpeg) {
            Ok(()) => log::info!("Wrote annotated image to {}", path.display()),
            Err(err) => log::error!("Failed to write {}: {err}", path.display()),
        }
    }

    fn show_detections(&mut self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

async fn detect(
    client: &DetectClient,
    view: &mut ConsoleView,
    jpeg: Vec<u8>,
) -> Result<(), DetectError> {
    match client.submit(jpeg).await {
        Ok(result) => {
            render::render(view, &result);
            Ok(())
        }
        Err(err) => {
            view.notify(&notification(&err));
            Err(err)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ClientArgs = argh::from_env();

    let client = DetectClient::new(args.base_url);

    match args.command {
        ClientCommands::Detect(command) => {
            let jpeg = std::fs::read(&command.image_path)?;
            let mut view = ConsoleView {
                output: command.output,
            };
            detect(&client, &mut view, jpeg).await?;
        }
        ClientCommands::Snapshot(command) => {
            let jpeg = client.fetch_bytes(SNAPSHOT_PATH).await?;
            let mut view = ConsoleView {
                output: command.output,
            };
            detect(&client, &mut view, jpeg).await?;
        }
        ClientCommands::Health(_) => {
            let result = client.health().await?;
            println!("Result: {}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
