// crates/fabric_vga/src/blit.rs
//! Volcado de un BMP a VRAM: decodifica, cuantiza a 3-3-2 y escribe
//! pixel a pixel, invirtiendo el orden de filas (el BMP va de abajo a arriba).

use crate::bmp::{row_padding, BmpError, BmpHeader, BmpInfoHeader, BmpReader, Rgb};
use crate::framebuffer::{Framebuffer, PixelWrite};
use fabric_core::MemoryBus;
use log::{debug, error};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
//  CONFIGURACIÓN Y ERRORES
// ============================================================================

#[derive(Debug, Clone)]
pub struct BlitConfig {
    /// Espera fija antes de abrir el archivo (el almacenamiento del
    /// fabric necesita asentarse). No es un chequeo de readiness.
    pub settle_delay: Duration,
    /// Desplaza cada fila una posición hacia arriba (`y - 1`), como el
    /// firmware heredado, para comparar volcados bit a bit.
    pub legacy_row_shift: bool,
}

impl Default for BlitConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(10),
            legacy_row_shift: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum BlitError {
    #[error("Can't open file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bad bitmap: {0}")]
    Format(#[from] BmpError),
}

/// Resumen de un volcado terminado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitReport {
    pub header: BmpHeader,
    pub info: BmpInfoHeader,
    pub pixels_written: u64,
}

// ============================================================================
//  CUANTIZACIÓN
// ============================================================================

/// Reduce un color de 24 bits a un byte RRRGGGBB (bits altos de cada canal).
#[inline(always)]
pub fn quantize_rgb332(px: Rgb) -> u8 {
    let r = px.r & 0xE0;
    let g = (px.g & 0xE0) >> 3;
    let b = (px.b & 0xE0) >> 6;
    r | g | b
}

// ============================================================================
//  BLIT
// ============================================================================

/// Abre `path` y lo dibuja con la esquina superior izquierda en `(x0, y0)`.
///
/// Si el archivo no se puede abrir se reporta y no se escribe ningún pixel.
/// Un BMP de formato no soportado también se rechaza antes de dibujar.
/// El archivo se cierra al salir en todos los caminos.
pub fn draw_picture<T, P>(
    target: &mut T,
    path: P,
    x0: i32,
    y0: i32,
    config: &BlitConfig,
) -> Result<BlitReport, BlitError>
where
    T: PixelWrite + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !config.settle_delay.is_zero() {
        thread::sleep(config.settle_delay);
    }

    let file = match open_regular(path) {
        Ok(file) => file,
        Err(source) => {
            error!("Can't open file {}: {}", path.display(), source);
            return Err(BlitError::Open {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    debug!("FileName: {}", path.display());
    blit_from_reader(target, BufReader::new(file), x0, y0, config).map_err(|e| {
        error!("Can't draw {}: {}", path.display(), e);
        BlitError::from(e)
    })
}

// Un directorio abre sin error en Linux; se rechaza aquí y no al leer.
fn open_regular(path: &Path) -> io::Result<File> {
    let file = File::open(path)?;
    if !file.metadata()?.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
    }
    Ok(file)
}

/// Decodifica un BMP desde cualquier stream y lo escribe en `target`.
pub fn blit_from_reader<T, R>(
    target: &mut T,
    reader: R,
    x0: i32,
    y0: i32,
    config: &BlitConfig,
) -> Result<BlitReport, BmpError>
where
    T: PixelWrite + ?Sized,
    R: Read,
{
    let mut bmp = BmpReader::new(reader);
    let header = bmp.read_header()?;
    let info = bmp.read_info_header()?;
    info.check_supported(&header)?;

    debug!("FileSize: {}", header.file_size);
    debug!("DataOffset: {}", header.data_offset);
    debug!("Size: {}", info.size);
    debug!("Width: {}", info.width);
    debug!("Height: {}", info.height);

    bmp.skip_to_pixel_data(header.data_offset)?;
    let pixels_written = draw_rows(target, &mut bmp, &info, x0, y0, config.legacy_row_shift)?;

    Ok(BlitReport {
        header,
        info,
        pixels_written,
    })
}

/// Dibuja todas las filas. La fila `k` del archivo (0 = la de abajo)
/// va a `y0 + height - 1 - k`.
fn draw_rows<T, R>(
    target: &mut T,
    bmp: &mut BmpReader<R>,
    info: &BmpInfoHeader,
    x0: i32,
    y0: i32,
    legacy_row_shift: bool,
) -> Result<u64, BmpError>
where
    T: PixelWrite + ?Sized,
    R: Read,
{
    // `check_supported` ya garantizó que caben en i32
    let width = info.width as i32;
    let height = info.height as i32;
    let padding = row_padding(info.width);
    let shift = if legacy_row_shift { 1 } else { 0 };
    let mut written = 0u64;

    for row in 0..height {
        let y = y0.wrapping_add(height - 1 - row).wrapping_sub(shift);
        for col in 0..width {
            let px = bmp.read_pixel()?;
            target.write_pixel(x0.wrapping_add(col), y, quantize_rgb332(px));
            written += 1;
        }
        bmp.skip_padding(padding)?;
    }

    Ok(written)
}

impl<B: MemoryBus> Framebuffer<B> {
    /// Dibuja el BMP `path` en `(x0, y0)`. Ver [`draw_picture`].
    pub fn draw_picture<P: AsRef<Path>>(
        &mut self,
        path: P,
        x0: i32,
        y0: i32,
        config: &BlitConfig,
    ) -> Result<BlitReport, BlitError> {
        draw_picture(self, path, x0, y0, config)
    }
}
