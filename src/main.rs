use gallerow::app::GalleryApp;
use gallerow::GalleryConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gallerow=info")),
        )
        .init();

    let config = GalleryConfig::from_env().with_args(std::env::args().skip(1));
    info!(
        endpoint = %config.endpoint,
        batch_limit = config.batch_limit,
        "Starting gallerow"
    );

    let app = GalleryApp::new(config);
    std::process::exit(app.run());
}
