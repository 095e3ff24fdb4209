//! AVIF input: container parsing with `avif-parse`, AV1 decoding with `rav1d`.
//!
//! The `image` crate's `"avif"` feature only brings the rav1e *encoder*;
//! decoding through it needs the C dav1d library. `rav1d` is the pure Rust
//! port of dav1d, driven here through its dav1d-compatible API.

use super::backend::{BackendError, Dimensions};
use image::{DynamicImage, RgbImage};
use std::ptr::NonNull;

/// Stored frame size from the container, without decoding.
pub fn avif_dimensions(bytes: &[u8]) -> Result<Dimensions, BackendError> {
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(bytes))
        .map_err(|e| BackendError::Decode(format!("AVIF container: {e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| BackendError::Decode(format!("AVIF metadata: {e:?}")))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Decode the primary AV1 item of an AVIF file to 8-bit RGB.
pub fn decode_avif(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };
    use rav1d::include::dav1d::picture::Dav1dPicture;

    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(bytes))
        .map_err(|e| BackendError::Decode(format!("AVIF container: {e:?}")))?;
    let av1: &[u8] = &avif.primary_item;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    let settings_ptr = NonNull::new(settings.as_mut_ptr())
        .ok_or_else(|| BackendError::Decode("rav1d settings allocation".into()))?;
    unsafe { rav1d::src::lib::dav1d_default_settings(settings_ptr) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc =
        unsafe { rav1d::src::lib::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(BackendError::Decode(format!("rav1d open failed ({})", rc.0)));
    }

    let mut data = Dav1dData::default();
    let buf = unsafe { rav1d::src::lib::dav1d_data_create(NonNull::new(&mut data), av1.len()) };
    if buf.is_null() {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::Decode("rav1d data_create failed".into()));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1.as_ptr(), buf, av1.len()) };

    let rc = unsafe { rav1d::src::lib::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            rav1d::src::lib::dav1d_data_unref(NonNull::new(&mut data));
            rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(BackendError::Decode(format!("rav1d send_data failed ({})", rc.0)));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { rav1d::src::lib::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::Decode(format!("rav1d get_picture failed ({})", rc.0)));
    }

    let layout = pic.p.layout;
    let subsampling = match layout {
        DAV1D_PIXEL_LAYOUT_I400 => Some(Chroma::Monochrome),
        DAV1D_PIXEL_LAYOUT_I420 => Some(Chroma::Subsampled { x: true, y: true }),
        DAV1D_PIXEL_LAYOUT_I422 => Some(Chroma::Subsampled { x: true, y: false }),
        DAV1D_PIXEL_LAYOUT_I444 => Some(Chroma::Subsampled { x: false, y: false }),
        _ => None,
    };

    let planes = [pic.data[0], pic.data[1], pic.data[2]];
    let frame = match (subsampling, planes) {
        (Some(Chroma::Monochrome), [Some(y), _, _]) => {
            let y = y.as_ptr() as *const u8;
            Some(YuvFrame {
                planes: [y, y, y],
                strides: [pic.stride[0], 0],
                width: pic.p.w as u32,
                height: pic.p.h as u32,
                bit_depth: pic.p.bpc as u32,
                chroma: Chroma::Monochrome,
            })
        }
        (Some(chroma), [Some(y), Some(u), Some(v)]) => Some(YuvFrame {
            planes: [
                y.as_ptr() as *const u8,
                u.as_ptr() as *const u8,
                v.as_ptr() as *const u8,
            ],
            strides: [pic.stride[0], pic.stride[1]],
            width: pic.p.w as u32,
            height: pic.p.h as u32,
            bit_depth: pic.p.bpc as u32,
            chroma,
        }),
        _ => None,
    };

    // Convert while the picture is still referenced, then release it.
    let rgb = frame.map(|f| f.to_rgb());

    unsafe {
        rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic));
        rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
    }

    rgb.map(DynamicImage::ImageRgb8)
        .ok_or_else(|| BackendError::Decode(format!("unsupported AVIF pixel layout {layout}")))
}

#[derive(Debug, Clone, Copy)]
enum Chroma {
    Monochrome,
    Subsampled { x: bool, y: bool },
}

/// Borrowed view of a decoded picture's planes.
struct YuvFrame {
    /// Y, U, V base pointers (all Y for monochrome).
    planes: [*const u8; 3],
    /// Luma stride, chroma stride, in bytes.
    strides: [isize; 2],
    width: u32,
    height: u32,
    bit_depth: u32,
    chroma: Chroma,
}

impl YuvFrame {
    /// BT.601 YCbCr → RGB, scaled down to 8 bits.
    fn to_rgb(&self) -> RgbImage {
        let max = ((1u32 << self.bit_depth) - 1) as f32;
        let mid = (1u32 << (self.bit_depth - 1)) as f32;
        let scale = 255.0 / max;
        let to_u8 = |v: f32| (v * scale).clamp(0.0, 255.0) as u8;

        RgbImage::from_fn(self.width, self.height, |x, y| {
            let luma = self.sample(0, self.strides[0], x, y);
            match self.chroma {
                Chroma::Monochrome => {
                    let v = to_u8(luma);
                    image::Rgb([v, v, v])
                }
                Chroma::Subsampled { x: ss_x, y: ss_y } => {
                    let cx = if ss_x { x / 2 } else { x };
                    let cy = if ss_y { y / 2 } else { y };
                    let cb = self.sample(1, self.strides[1], cx, cy) - mid;
                    let cr = self.sample(2, self.strides[1], cx, cy) - mid;
                    image::Rgb([
                        to_u8(luma + 1.402 * cr),
                        to_u8(luma - 0.344136 * cb - 0.714136 * cr),
                        to_u8(luma + 1.772 * cb),
                    ])
                }
            }
        })
    }

    /// One sample from a plane; high bit depths are stored as `u16`.
    #[inline]
    fn sample(&self, plane: usize, stride: isize, x: u32, y: u32) -> f32 {
        let base = self.planes[plane];
        if self.bit_depth <= 8 {
            (unsafe { *base.offset(y as isize * stride + x as isize) }) as f32
        } else {
            let offset = y as isize * stride + x as isize * 2;
            (unsafe { (base.offset(offset) as *const u16).read_unaligned() }) as f32
        }
    }
}
