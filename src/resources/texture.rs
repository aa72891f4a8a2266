use anyhow::{anyhow, bail};
use image::RgbaImage;

use crate::data_structures::description::TextureDescription;

/// Raw RGBA8 pixels of a texture served by the host.
#[derive(Clone, Debug)]
pub struct Texture {
    pub id: String,
    pub image: RgbaImage,
}

impl Texture {
    /// Wraps an uncompressed RGBA8 buffer.
    ///
    /// The host reports the pixel row length under `height` and the row count
    /// under `width`, so the image is `height` pixels wide and `width` high.
    /// With `flip_y` the rows are stored bottom-up, the way a GPU upload with
    /// vertical flip would see them.
    pub fn from_bytes(
        desc: &TextureDescription,
        data: Vec<u8>,
        flip_y: bool,
    ) -> anyhow::Result<Self> {
        let expected = (desc.height as usize)
            .checked_mul(desc.width as usize)
            .and_then(|pixels| pixels.checked_mul(4));
        if expected != Some(data.len()) {
            bail!(
                "Texture {} declares {}x{} RGBA pixels but the buffer holds {} bytes",
                desc.id,
                desc.height,
                desc.width,
                data.len()
            );
        }
        let mut image = RgbaImage::from_raw(desc.height, desc.width, data)
            .ok_or_else(|| anyhow!("Texture {} does not fit in memory", desc.id))?;
        if flip_y {
            image::imageops::flip_vertical_in_place(&mut image);
        }
        Ok(Self {
            id: desc.id.clone(),
            image,
        })
    }
}

pub fn load_texture(
    desc: &TextureDescription,
    data: Vec<u8>,
    flip_y: bool,
) -> anyhow::Result<Texture> {
    let texture = Texture::from_bytes(desc, data, flip_y)?;
    log::debug!(
        "Decoded texture {} ({}x{})",
        texture.id,
        texture.image.width(),
        texture.image.height()
    );
    Ok(texture)
}
