/*
 *  decoder.rs
 *
 *  LEDNode - pixels on a string
 *  (c) 2020-26 Stuart Hunter
 *
 *  Image decoding into RGBA8 frames
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use png::{ColorType, Decoder, Transformations};
use thiserror::Error;

use crate::frame::Frame;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("PNG decode error: {0}")]
    Png(#[from] png::DecodingError),
    #[error("unsupported image layout: {0}")]
    Unsupported(String),
    #[error("pixel buffer is {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
}

/// Anything that can turn stored bytes into an RGBA frame.
pub trait ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, DecodeError>;
}

/// Lossless PNG decoding, normalised to 8-bit RGBA.
///
/// Palette, grayscale and sub-byte depths are expanded, 16-bit channels are
/// stripped to 8 bits, and a `tRNS` chunk becomes real alpha. Images without
/// any transparency come out fully opaque.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngDecoder;

impl ImageDecoder for PngDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, DecodeError> {
        let mut decoder = Decoder::new(bytes);
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());

        let width = info.width as usize;
        let height = info.height as usize;
        let rgba = match info.color_type {
            ColorType::Rgba => buf,
            ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            ColorType::Grayscale => buf
                .iter()
                .flat_map(|&v| [v, v, v, 255])
                .collect(),
            ColorType::Indexed => {
                return Err(DecodeError::Unsupported(
                    "indexed PNG was not expanded".to_string(),
                ));
            }
        };

        Frame::new(width, height, rgba)
    }
}
