use argh::FromArgs;
use detect_gateway::{
    GatewayConfig,
    config::{
        DEFAULT_DETECT_UPSTREAM, DEFAULT_HOST, DEFAULT_STATIC_DIR, default_camera_upstream,
        default_port,
    },
    gateway,
};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Serves the detection front end and proxies /api and /pi to the backends.
struct GatewayArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on (defaults to $PORT or 3000)
    #[argh(option, short = 'p', default = "default_port()")]
    port: u16,

    /// directory with the static front end
    #[argh(option, default = "PathBuf::from(DEFAULT_STATIC_DIR)")]
    static_dir: PathBuf,

    /// base url of the detection server
    #[argh(option, default = "DEFAULT_DETECT_UPSTREAM.to_string()")]
    detect_upstream: String,

    /// base url of the camera relay (defaults to http://$PI_HOST:3001)
    #[argh(option, default = "default_camera_upstream()")]
    camera_upstream: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: GatewayArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let config = GatewayConfig {
        static_dir: args.static_dir,
        detect_upstream: args.detect_upstream,
        camera_upstream: args.camera_upstream,
    };

    log::info!("Starting the gateway");
    log::info!("Listening on: {}", addr);
    log::info!("Serving static files from {}", config.static_dir.display());
    log::info!("Press Ctrl+C to stop the server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    gateway::serve(listener, &config).await?;

    Ok(())
}
