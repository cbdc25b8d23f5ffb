//! 커버 리사이즈.
//!
//! 목표 종횡비의 중앙 영역을 잘라낸 뒤 fast_image_resize로 정확한 크기로 맞춘다.
//! 결과는 항상 목표 크기를 꽉 채우며 레터박스는 없다.

use camlens_core::error::CoreError;
use fast_image_resize::{images::Image as FirImage, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage};
use tracing::debug;

/// 소스 이미지 내 크롭 영역
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 목표 종횡비를 갖는 최대 중앙 영역.
///
/// 모든 크기는 0보다 커야 한다.
pub fn cover_crop(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> CropRect {
    let (sw, sh, dw, dh) = (src_w as u64, src_h as u64, dst_w as u64, dst_h as u64);

    if sw * dh > sh * dw {
        // 소스가 더 넓음 → 좌우를 자름
        let width = ((sh * dw + dh / 2) / dh).clamp(1, sw) as u32;
        CropRect {
            x: (src_w - width) / 2,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        // 소스가 더 높거나 같은 비율 → 위아래를 자름
        let height = ((sw * dh + dw / 2) / dw).clamp(1, sh) as u32;
        CropRect {
            x: 0,
            y: (src_h - height) / 2,
            width: src_w,
            height,
        }
    }
}

/// 정확한 크기로 고속 리사이즈 (RGB, 바이리니어)
pub fn fast_resize(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, CoreError> {
    let (src_w, src_h) = (image.width(), image.height());

    if src_w == 0 || src_h == 0 {
        return Err(CoreError::Internal("소스 이미지 크기 0".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(CoreError::Internal("목표 이미지 크기 0".to_string()));
    }

    let src_rgb = image.to_rgb8();
    if src_w == width && src_h == height {
        return Ok(DynamicImage::ImageRgb8(src_rgb));
    }

    let src_image = FirImage::from_vec_u8(
        src_w,
        src_h,
        src_rgb.into_raw(),
        fast_image_resize::PixelType::U8x3,
    )
    .map_err(|e| CoreError::Internal(format!("소스 이미지 생성 실패: {e}")))?;

    let mut dst_image = FirImage::new(width, height, fast_image_resize::PixelType::U8x3);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| CoreError::Internal(format!("리사이즈 실패: {e}")))?;

    let result = RgbImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| CoreError::Internal("결과 이미지 생성 실패".to_string()))?;

    Ok(DynamicImage::ImageRgb8(result))
}

/// 커버 리사이즈: 중앙 크롭 후 정확한 크기로 리사이즈
pub fn cover_resize(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, CoreError> {
    let (src_w, src_h) = (image.width(), image.height());
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return Err(CoreError::Internal(format!(
            "잘못된 리사이즈 크기: {src_w}x{src_h} → {width}x{height}"
        )));
    }

    let rect = cover_crop(src_w, src_h, width, height);
    debug!(
        "커버 크롭: {}x{} → ({}, {}) {}x{} → {}x{}",
        src_w, src_h, rect.x, rect.y, rect.width, rect.height, width, height
    );

    if rect.width == src_w && rect.height == src_h {
        fast_resize(image, width, height)
    } else {
        let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
        fast_resize(&cropped, width, height)
    }
}
