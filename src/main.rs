//! Command-line submission of a single report.
//!
//! ```text
//! dhaal (--config <config.yaml> | --offline) <image> <lat> <lng> [--proceed]
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use dhaal::{
    accept_image, DhaalConfig, GeoPoint, IngestionCoordinator, PipelineError, SubmissionRequest,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dhaal", version, about = "Submit a civic report photo")]
struct Cli {
    /// Pipeline configuration file
    #[arg(short, long, value_name = "FILE", required_unless_present = "offline")]
    config: Option<PathBuf>,

    /// Use the stub oracle and in-memory stores
    #[arg(long, conflicts_with = "config")]
    offline: bool,

    /// Photo of the issue
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Latitude in degrees
    #[arg(allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(allow_negative_numbers = true)]
    lng: f64,

    /// Submit even if a likely duplicate is found
    #[arg(long)]
    proceed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .json()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) if !cli.offline => DhaalConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        _ => DhaalConfig::offline(),
    };

    let bytes = std::fs::read(&cli.image)
        .with_context(|| format!("reading {}", cli.image.display()))?;
    let image = accept_image(bytes, Some(mime_for(&cli.image)), &config.ingest)?;

    let mut request = SubmissionRequest::new(image, GeoPoint::new(cli.lat, cli.lng).ok());
    if cli.proceed {
        request = request.proceeding_anyway();
    }

    let coordinator = IngestionCoordinator::from_config(&config)?;
    match coordinator.submit_report(request).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(PipelineError::LocationMissing) => bail!(
            "{}: coordinates must be within -90..=90 and -180..=180",
            PipelineError::LocationMissing
        ),
        Err(err) => {
            let code = err.outcome_code().map(|c| c.as_str()).unwrap_or("REJECTED");
            bail!("{code}: {err}")
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_parse_as_positionals() {
        let cli = Cli::try_parse_from(["dhaal", "--offline", "photo.png", "-33.86", "151.2"]).unwrap();
        assert!(cli.offline);
        assert_eq!(cli.lat, -33.86);
        assert_eq!(cli.lng, 151.2);
        assert!(!cli.proceed);
        assert_eq!(mime_for(&cli.image), "image/png");
    }

    #[test]
    fn config_or_offline_is_required() {
        assert!(Cli::try_parse_from(["dhaal", "photo.jpg", "12.9", "77.6"]).is_err());
        assert!(Cli::try_parse_from([
            "dhaal", "--offline", "--config", "p.yaml", "photo.jpg", "12.9", "77.6"
        ])
        .is_err());

        let cli = Cli::try_parse_from(["dhaal", "-c", "p.yaml", "photo.JPG", "12.9", "77.6", "--proceed"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("p.yaml")));
        assert!(cli.proceed);
        assert_eq!(mime_for(&cli.image), "image/jpeg");
    }
}
