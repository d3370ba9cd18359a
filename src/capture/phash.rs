use anyhow::{Context, Result};
use image::ImageFormat;
use image_hasher::{HashAlg, HasherConfig, ImageHash};

/// What we learn from decoding an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPhoto {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub phash: String,
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| format!("{format:?}").to_lowercase())
}

/// Sniffs the container format, decodes, and hashes. Fails for anything that is not an image.
pub fn decode_photo(bytes: &[u8]) -> Result<DecodedPhoto> {
    let format = image::guess_format(bytes).context("unrecognized image data")?;
    let img = image::load_from_memory_with_format(bytes, format)
        .with_context(|| format!("failed to decode {format:?} image"))?;

    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();
    let hash = hasher.hash_image(&img);

    Ok(DecodedPhoto {
        format: format_name(format),
        width: img.width(),
        height: img.height(),
        phash: hash.to_base64(),
    })
}

pub fn hamming_distance(lhs: &str, rhs: &str) -> u32 {
    let Ok(h1) = ImageHash::<Vec<u8>>::from_base64(lhs) else {
        return u32::MAX;
    };
    let Ok(h2) = ImageHash::<Vec<u8>>::from_base64(rhs) else {
        return u32::MAX;
    };
    h1.dist(&h2)
}
