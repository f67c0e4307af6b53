// crates/fabric_vga/src/bmp.rs
//! Decodificador de BMP (Windows bitmap) sin compresión, 24 bits por pixel.
//!
//! Layout en disco (little endian):
//!
//! ```text
//! 14 bytes  BITMAPFILEHEADER  signature, file size, reserved, data offset
//! 40 bytes  BITMAPINFOHEADER  size, width, height, planes, bpp, compression,
//!                             image size, x/y pixels per meter, colors used,
//!                             important colors
//! ...       relleno opcional hasta `data offset` (tablas de color)
//! pixeles   B,G,R por pixel, filas de abajo hacia arriba,
//!           cada fila rellenada a múltiplo de 4 bytes
//! ```

use std::io::{self, Read};
use thiserror::Error;

pub const HEADER_SIZE: u32 = 14;
pub const INFO_HEADER_SIZE: u32 = 40;

/// "BM" leído como u16 little endian.
pub const BMP_SIGNATURE: u16 = 0x4D42;

#[derive(Error, Debug)]
pub enum BmpError {
    #[error("bitmap stream ended early: {0}")]
    Truncated(#[source] io::Error),
    #[error("error reading bitmap: {0}")]
    Io(#[source] io::Error),
    #[error("bad signature 0x{0:04X}, expected \"BM\"")]
    BadSignature(u16),
    #[error("unsupported plane count {0}")]
    UnsupportedPlanes(u16),
    #[error("unsupported bit depth {0}, only 24 bpp is handled")]
    UnsupportedDepth(u16),
    #[error("compressed bitmaps are not supported (compression = {0})")]
    Compressed(u32),
    #[error("pixel data offset {0} points inside the headers")]
    DataOffsetInsideHeader(u32),
    #[error("unsupported dimensions {width}x{height}")]
    BadDimensions { width: u32, height: u32 },
}

impl From<io::Error> for BmpError {
    // Sólo un EOF prematuro es un archivo truncado
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => BmpError::Truncated(e),
            _ => BmpError::Io(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BmpHeader {
    pub signature: u16,
    pub file_size: u32,
    pub reserved: u32,
    pub data_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BmpInfoHeader {
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_m: u32,
    pub y_pixels_per_m: u32,
    pub colors_used: u32,
    pub important_colors: u32,
}

impl BmpInfoHeader {
    /// Verifica que el archivo sea de la única variante soportada:
    /// firma "BM", 1 plano, 24 bpp, sin compresión, filas bottom-up.
    /// Cualquier otra cosa se reporta antes de tocar la VRAM.
    pub fn check_supported(&self, header: &BmpHeader) -> Result<(), BmpError> {
        if header.signature != BMP_SIGNATURE {
            return Err(BmpError::BadSignature(header.signature));
        }
        if self.planes != 1 {
            return Err(BmpError::UnsupportedPlanes(self.planes));
        }
        if self.bits_per_pixel != 24 {
            return Err(BmpError::UnsupportedDepth(self.bits_per_pixel));
        }
        if self.compression != 0 {
            return Err(BmpError::Compressed(self.compression));
        }
        if header.data_offset < HEADER_SIZE + INFO_HEADER_SIZE {
            return Err(BmpError::DataOffsetInsideHeader(header.data_offset));
        }
        // Alto negativo (top-down) o ancho absurdo: no cabe en i32.
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(BmpError::BadDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Bytes de relleno al final de cada fila de `width` pixeles.
#[inline]
pub fn row_padding(width: u32) -> u32 {
    // width * 3 = width + width * 2
    let line_size = width.wrapping_add(width << 1);
    (4 - (line_size & 0x3)) & 0x3
}

/// Lector secuencial de un BMP sobre cualquier `Read`.
/// Lleva la cuenta de bytes consumidos.
pub struct BmpReader<R: Read> {
    inner: R,
    consumed: u64,
}

impl<R: Read> BmpReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    /// Bytes consumidos desde el inicio del stream.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_bytes<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.consumed += N as u64;
        Ok(buf)
    }

    fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.read_bytes::<1>()?[0])
    }

    fn read_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_le_bytes(self.read_bytes()?))
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes()?))
    }

    /// Lee los 14 bytes del file header. No valida la firma.
    pub fn read_header(&mut self) -> Result<BmpHeader, BmpError> {
        Ok(BmpHeader {
            signature: self.read_u16()?,
            file_size: self.read_u32()?,
            reserved: self.read_u32()?,
            data_offset: self.read_u32()?,
        })
    }

    /// Lee los 40 bytes del info header.
    pub fn read_info_header(&mut self) -> Result<BmpInfoHeader, BmpError> {
        Ok(BmpInfoHeader {
            size: self.read_u32()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
            planes: self.read_u16()?,
            bits_per_pixel: self.read_u16()?,
            compression: self.read_u32()?,
            image_size: self.read_u32()?,
            x_pixels_per_m: self.read_u32()?,
            y_pixels_per_m: self.read_u32()?,
            colors_used: self.read_u32()?,
            important_colors: self.read_u32()?,
        })
    }

    /// Descarta lo que haya entre el info header y los pixeles
    /// (`data_offset - 54` bytes, uno a uno).
    pub fn skip_to_pixel_data(&mut self, data_offset: u32) -> Result<(), BmpError> {
        for _ in (HEADER_SIZE + INFO_HEADER_SIZE)..data_offset {
            self.read_u8()?;
        }
        Ok(())
    }

    /// Lee el siguiente pixel. En disco el orden es B, G, R.
    pub fn read_pixel(&mut self) -> Result<Rgb, BmpError> {
        let [b, g, r] = self.read_bytes::<3>()?;
        Ok(Rgb { r, g, b })
    }

    /// Descarta `count` bytes de relleno de fila.
    pub fn skip_padding(&mut self, count: u32) -> Result<(), BmpError> {
        for _ in 0..count {
            self.read_u8()?;
        }
        Ok(())
    }
}
