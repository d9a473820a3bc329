use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use mask_canvas::MaskDialog;
use mask_canvas::config::MaskCanvasConfig;
use mask_canvas::domain::StrokeScript;
use mask_canvas::render::encode::save_png;
use mask_canvas::upload::{DirectoryUploader, ImageUploader, UploadSession};

const USAGE: &str = "\
Usage: mask-canvas [OPTIONS] IMAGE

Options:
  --config PATH        Config file (default: user config dir)
  --brush-size N       Brush size, 1-100
  --strokes FILE       JSON stroke script to replay
  --preview FILE       Write the painted preview as PNG
  --out DIR            Export masks into DIR
  --upload URL         PUT masks under URL instead of exporting locally
  --public-base URL    Public base URL of uploaded masks
";

struct Args {
    config: Option<PathBuf>,
    brush_size: Option<f32>,
    strokes: Option<PathBuf>,
    preview: Option<PathBuf>,
    out: Option<PathBuf>,
    upload: Option<String>,
    public_base: Option<String>,
    image: String,
}

fn parse_args() -> Result<Args> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{USAGE}");
        std::process::exit(0);
    }

    let parsed = Args {
        config: args.opt_value_from_str("--config")?,
        brush_size: args.opt_value_from_str("--brush-size")?,
        strokes: args.opt_value_from_str("--strokes")?,
        preview: args.opt_value_from_str("--preview")?,
        out: args.opt_value_from_str("--out")?,
        upload: args.opt_value_from_str("--upload")?,
        public_base: args.opt_value_from_str("--public-base")?,
        image: args
            .finish()
            .into_iter()
            .next()
            .and_then(|s| s.into_string().ok())
            .with_context(|| format!("Missing IMAGE argument\n\n{USAGE}"))?,
    };
    Ok(parsed)
}

async fn save<U: ImageUploader>(dialog: &mut MaskDialog, uploader: &U) -> Result<()> {
    let Some(urls) = dialog.save_mask(uploader).await else {
        bail!("Mask export failed");
    };
    println!("{}", serde_json::to_string_pretty(&urls)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args()?;

    let mut config = match &args.config {
        Some(path) => MaskCanvasConfig::load_from(path)?,
        None => MaskCanvasConfig::load(),
    };
    if let Some(size) = args.brush_size {
        config.brush_size = size;
    }
    if let Some(endpoint) = args.upload {
        config.upload.endpoint = Some(endpoint);
    }
    if let Some(public_base) = args.public_base {
        config.upload.public_base = Some(public_base);
    }

    let mut dialog = MaskDialog::new(&config);
    dialog.open();
    dialog.editor_mut().load(&args.image).await?;

    if let Some(path) = &args.strokes {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stroke script: {}", path.display()))?;
        let script = StrokeScript::from_json(&json)
            .with_context(|| format!("Failed to parse stroke script: {}", path.display()))?;
        dialog.editor_mut().replay(&script);
    }

    if let Some(path) = &args.preview
        && let Some(preview) = dialog.editor().composite_preview()
    {
        save_png(&preview, path)
            .with_context(|| format!("Failed to write preview: {}", path.display()))?;
    }

    if config.upload.endpoint.is_some() {
        let session = UploadSession::from_config(&config.upload)?;
        save(&mut dialog, &session).await
    } else {
        let dir = args
            .out
            .or(config.upload.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let uploader = DirectoryUploader::new(dir).with_upload_path(config.upload.upload_path.clone());
        save(&mut dialog, &uploader).await
    }
}
