use pdf_writer::{Filter, Pdf, Ref};

use crate::error::Error;
use crate::model::{EmbeddedImage, ImageFormat};

/// Decode image bytes, keeping JPEG RGB data as-is (embedded with DCTDecode)
/// and converting everything else to raw RGBA pixels.
pub(super) fn decode(bytes: &[u8], location: &str) -> Result<EmbeddedImage, Error> {
    let load_err = |reason: String| Error::ImageLoad {
        location: location.to_string(),
        reason,
    };
    let format = image::guess_format(bytes).map_err(|e| load_err(e.to_string()))?;
    let decoded =
        image::load_from_memory_with_format(bytes, format).map_err(|e| load_err(e.to_string()))?;

    let (pixel_width, pixel_height) = (decoded.width(), decoded.height());
    if pixel_width == 0 || pixel_height == 0 {
        return Err(load_err("image has no pixels".into()));
    }

    if format == image::ImageFormat::Jpeg && decoded.color() == image::ColorType::Rgb8 {
        return Ok(EmbeddedImage {
            data: bytes.to_vec(),
            format: ImageFormat::Jpeg,
            pixel_width,
            pixel_height,
        });
    }

    Ok(EmbeddedImage {
        data: decoded.to_rgba8().into_raw(),
        format: ImageFormat::Other,
        pixel_width,
        pixel_height,
    })
}

/// Write the image XObject (plus a soft mask when it has transparency).
pub(super) fn embed(pdf: &mut Pdf, img: &EmbeddedImage, alloc: &mut impl FnMut() -> Ref) -> Ref {
    let xobj_ref = alloc();
    let (w, h) = (img.pixel_width as i32, img.pixel_height as i32);

    match img.format {
        ImageFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        ImageFormat::Other => {
            let rgb: Vec<u8> = img
                .data
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect();
            let has_alpha = img.data.chunks_exact(4).any(|p| p[3] < 255);
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6);

            let smask_ref = if has_alpha {
                let alpha: Vec<u8> = img.data.chunks_exact(4).map(|p| p[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    xobj_ref
}
