// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Texture loading from encoded images.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use lumen_core::asset::AssetHandle;
use lumen_core::device::{TextureDescriptor, TextureFormat};
use lumen_core::texture::Texture;
use lumen_data::AssetLibraryRef;
use lumen_io::{AbstractParser, Options, ParserError, ParserFactory, ParserRef, ParserSignals};
use std::rc::Rc;

/// Decodes image files into textures uploaded on the render context.
///
/// Images are converted to RGBA8. Non-power-of-two images are resized to the
/// nearest power of two and, when requested, a full mip chain is built before
/// upload.
#[derive(Default, Debug)]
pub struct ImageParser {
    signals: ParserSignals,
}

impl ImageParser {
    /// File extensions this parser handles.
    pub const EXTENSIONS: [&'static str; 5] = ["png", "jpg", "jpeg", "bmp", "tga"];

    /// Creates a parser.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A factory to register under each of [`EXTENSIONS`](Self::EXTENSIONS).
    pub fn factory() -> ParserFactory {
        Rc::new(|| -> ParserRef { ImageParser::new() })
    }
}

impl AbstractParser for ImageParser {
    fn parse(
        &self,
        filename: &str,
        resolved_filename: &str,
        options: &Options,
        data: &[u8],
        library: &AssetLibraryRef,
    ) -> Result<(), ParserError> {
        let image = decode_image(resolved_filename, data)?;
        let texture = create_texture(filename, image, options)?;
        library.set_texture(filename, texture);
        self.signals.complete.execute(&());
        Ok(())
    }

    fn signals(&self) -> &ParserSignals {
        &self.signals
    }
}

/// Decodes an encoded image into RGBA8 texels.
pub(crate) fn decode_image(filename: &str, data: &[u8]) -> Result<RgbaImage, ParserError> {
    let image = image::load_from_memory(data).map_err(|e| ParserError::InvalidFile {
        filename: filename.to_string(),
        reason: format!("failed to decode image: {e}"),
    })?;
    Ok(image.to_rgba8())
}

/// Returns the power of two closest to `size`, rounding ties up.
pub(crate) fn nearest_power_of_two(size: u32) -> u32 {
    if size <= 1 {
        return 1;
    }
    let upper = size.checked_next_power_of_two().unwrap_or(1 << 31);
    let lower = upper >> 1;
    if upper == size || size - lower >= upper - size {
        upper
    } else {
        lower
    }
}

fn mip_chain(base: RgbaImage, filter: FilterType) -> Vec<RgbaImage> {
    let mut levels = vec![base];
    while let Some(last) = levels.last() {
        let (width, height) = last.dimensions();
        if width == 1 && height == 1 {
            break;
        }
        let next = imageops::resize(last, (width / 2).max(1), (height / 2).max(1), filter);
        levels.push(next);
    }
    levels
}

/// Turns decoded texels into a texture uploaded on `options.context()`.
///
/// The texture function of `options` is applied to the result.
pub(crate) fn create_texture(
    name: &str,
    image: RgbaImage,
    options: &Options,
) -> Result<AssetHandle<Texture>, ParserError> {
    let filter = if options.resize_smoothly() {
        FilterType::Triangle
    } else {
        FilterType::Nearest
    };

    let (width, height) = image.dimensions();
    let (pot_width, pot_height) = (nearest_power_of_two(width), nearest_power_of_two(height));
    let base = if (pot_width, pot_height) != (width, height) {
        log::debug!(
            "ImageParser: resizing '{name}' from {width}x{height} to {pot_width}x{pot_height}"
        );
        imageops::resize(&image, pot_width, pot_height, filter)
    } else {
        image
    };

    let levels = if options.generate_mipmaps() {
        mip_chain(base, filter)
    } else {
        vec![base]
    };

    let mut texture = Texture::from_pixels(
        name,
        pot_width,
        pot_height,
        TextureFormat::Rgba8Unorm,
        Vec::new(),
    );
    texture.levels = levels.into_iter().map(RgbaImage::into_raw).collect();
    upload(&mut texture, options)?;

    if options.dispose_texture_after_loading() {
        texture.dispose_data();
    }
    Ok((options.texture_function())(name, AssetHandle::new(texture)))
}

fn upload(texture: &mut Texture, options: &Options) -> Result<(), ParserError> {
    let device_error = |e: lumen_core::device::DeviceError| ParserError::Device {
        filename: texture.name.clone(),
        reason: e.to_string(),
    };

    let context = options.context();
    let id = context
        .create_texture(&TextureDescriptor {
            label: texture.name.clone(),
            width: texture.width,
            height: texture.height,
            format: texture.format,
            mip_level_count: texture.mip_level_count(),
            render_target: false,
        })
        .map_err(device_error)?;
    for (level, texels) in texture.levels.iter().enumerate() {
        context
            .upload_texture(id, level as u32, texels)
            .map_err(device_error)?;
    }
    texture.device_id = Some(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::device::{DeviceCall, HeadlessContext};
    use lumen_data::AssetLibrary;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn sizes_snap_to_the_nearest_power_of_two() {
        assert_eq!(nearest_power_of_two(1), 1);
        assert_eq!(nearest_power_of_two(3), 4);
        assert_eq!(nearest_power_of_two(5), 4);
        assert_eq!(nearest_power_of_two(6), 8);
        assert_eq!(nearest_power_of_two(100), 128);
        assert_eq!(nearest_power_of_two(256), 256);
    }

    #[test]
    fn images_are_uploaded_with_their_mip_chain() {
        let context = Rc::new(HeadlessContext::new());
        let library = AssetLibrary::new(context.clone());
        let mut options = Options::new(&library);
        options.set_generate_mipmaps(true);

        let parser = ImageParser::new();
        parser
            .parse("red.png", "assets/red.png", &options, &png(5, 8), &library)
            .unwrap();

        let texture = library.texture("red.png").unwrap();
        assert_eq!((texture.width, texture.height), (4, 8));
        assert_eq!(texture.mip_level_count(), 4);
        assert!(texture.device_id.is_some());
        let uploads = context
            .calls()
            .iter()
            .filter(|call| matches!(call, DeviceCall::UploadTexture { .. }))
            .count();
        assert_eq!(uploads, 4);
    }

    #[test]
    fn disposed_textures_keep_their_device_copy() {
        let context = Rc::new(HeadlessContext::new());
        let library = AssetLibrary::new(context.clone());
        let mut options = Options::new(&library);
        options.set_dispose_texture_after_loading(true);

        ImageParser::new()
            .parse("red.png", "red.png", &options, &png(2, 2), &library)
            .unwrap();

        let texture = library.texture("red.png").unwrap();
        assert!(texture.is_disposed());
        assert_eq!(context.live_textures(), 1);
    }

    #[test]
    fn garbage_is_an_invalid_file() {
        let library = AssetLibrary::new(Rc::new(HeadlessContext::new()));
        let options = Options::new(&library);
        let error = ImageParser::new()
            .parse("x.png", "x.png", &options, b"not an image", &library)
            .unwrap_err();
        assert_eq!(error.type_tag(), "InvalidFile");
    }
}
