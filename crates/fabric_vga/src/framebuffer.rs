// crates/fabric_vga/src/framebuffer.rs

use crate::raster;
use fabric_core::MemoryBus;
use log::info;

/// Ancho visible del controlador VGA
pub const SCREEN_WIDTH: i32 = 640;
/// Alto visible del controlador VGA
pub const SCREEN_HEIGHT: i32 = 480;

// La VRAM se direcciona como {y[8:0], x[9:0]}: 1024x512 celdas de 1 byte,
// más grande que el área visible.
pub const X_BITS: u32 = 10;
pub const Y_BITS: u32 = 9;
pub const X_MASK: i32 = 0x3FF;
pub const Y_MASK: i32 = 0x1FF;

/// Tamaño total del espacio direccionable de VRAM (512KB).
pub const VRAM_SIZE: usize = 1 << (X_BITS + Y_BITS);

/// Calcula el offset de VRAM para la coordenada `(x, y)`.
///
/// Las coordenadas fuera de rango NO fallan: se enmascaran a 10/9 bits y
/// aparecen en otra posición (periodo 1024 en x, 512 en y). Los negativos
/// se enmascaran en complemento a dos de la misma forma.
#[inline(always)]
pub fn vram_addr(x: i32, y: i32) -> u32 {
    (((y & Y_MASK) << X_BITS) | (x & X_MASK)) as u32
}

/// Destino de escritura de pixeles. El rasterizador y el blitter
/// sólo conocen este contrato.
pub trait PixelWrite {
    fn write_pixel(&mut self, x: i32, y: i32, pixel: u8);
}

impl<T: PixelWrite + ?Sized> PixelWrite for &mut T {
    fn write_pixel(&mut self, x: i32, y: i32, pixel: u8) {
        (**self).write_pixel(x, y, pixel)
    }
}

/// VRAM del controlador VGA vista a través de un `MemoryBus`.
/// El driver nunca reserva la memoria: sólo calcula offsets desde `base`.
pub struct Framebuffer<B: MemoryBus> {
    bus: B,
    base: u32,
}

impl<B: MemoryBus> Framebuffer<B> {
    /// Inicializa el framebuffer sobre `bus`, con la VRAM empezando en `base`.
    pub fn new(bus: B, base: u32) -> Self {
        Self { bus, base }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Lee un pixel de VRAM (IORD_8DIRECT).
    pub fn read_pixel(&self, x: i32, y: i32) -> u8 {
        self.bus.read(self.base.wrapping_add(vram_addr(x, y)))
    }

    /// Escribe un pixel en VRAM (IOWR_8DIRECT). Sin buffering.
    pub fn write_pixel(&mut self, x: i32, y: i32, pixel: u8) {
        self.bus.write(self.base.wrapping_add(vram_addr(x, y)), pixel);
    }

    /// Pinta toda el área visible (640x480) con `pixel`.
    pub fn clear_screen(&mut self, pixel: u8) {
        info!("clear the screen with 0x{:02X}", pixel);
        for x in 0..SCREEN_WIDTH {
            for y in 0..SCREEN_HEIGHT {
                self.write_pixel(x, y, pixel);
            }
        }
        info!("clear the screen done");
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, pixel: u8) {
        raster::draw_line(self, x0, y0, x1, y1, pixel);
    }

    pub fn draw_box(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, pixel: u8) {
        raster::draw_box(self, x0, y0, x1, y1, pixel);
    }
}

impl<B: MemoryBus> PixelWrite for Framebuffer<B> {
    fn write_pixel(&mut self, x: i32, y: i32, pixel: u8) {
        Framebuffer::write_pixel(self, x, y, pixel);
    }
}
