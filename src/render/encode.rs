//! Lossless PNG encoding of rendered layers

use std::io;

use image::RgbaImage;

pub const MIME_TYPE: &str = "image/png";

pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, png::EncodingError> {
    let mut buffer = Vec::new();
    write_png(&mut buffer, image)?;
    Ok(buffer)
}

pub fn save_png(image: &RgbaImage, path: &std::path::Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    Ok(write_png(io::BufWriter::new(file), image)?)
}
