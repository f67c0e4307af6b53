// crates/fabric_vga/src/lib.rs - Driver VGA del fabric (VRAM 3-3-2, 640x480)
//
// Capas (de abajo hacia arriba):
//   framebuffer -> direccionamiento de VRAM + pixel I/O
//   raster      -> líneas (Bresenham) y cajas rellenas
//   bmp         -> decodificador de BMP 24-bit sin compresión
//   blit        -> BMP -> cuantización 3-3-2 -> VRAM

pub mod blit;
pub mod bmp;
pub mod framebuffer;
pub mod raster;

mod tests;

pub use blit::{blit_from_reader, draw_picture, quantize_rgb332, BlitConfig, BlitError, BlitReport};
pub use bmp::{row_padding, BmpError, BmpHeader, BmpInfoHeader, BmpReader, Rgb};
pub use framebuffer::{vram_addr, Framebuffer, PixelWrite, SCREEN_HEIGHT, SCREEN_WIDTH, VRAM_SIZE};
pub use raster::{draw_box, draw_line};
