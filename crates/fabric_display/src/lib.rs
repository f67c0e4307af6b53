// crates/fabric_display/src/lib.rs
// Ventana de preview en el host: muestra la VRAM 3-3-2 del controlador VGA.

use fabric_core::MemoryBus;
use fabric_vga::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use log::warn;
use minifb::{Key, Scale, ScaleMode, Window, WindowOptions};
use std::time::Duration;
use thiserror::Error;


// ============================================================================
//  CONFIGURACIÓN Y ERRORES
// ============================================================================

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub title: String,
    pub width: usize,
    pub height: usize,
    pub scale: WindowScale,
    pub target_fps: f64,
    pub resizable: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Fabric VGA".to_string(),
            width: SCREEN_WIDTH as usize,
            height: SCREEN_HEIGHT as usize,
            scale: WindowScale::X1,
            target_fps: 60.0,
            resizable: false,
        }
    }
}

/// Abstracción de escalas para no depender directamente de los enums de minifb fuera de esta lib
#[derive(Debug, Clone, Copy)]
pub enum WindowScale {
    X1,
    X2,
    X4,
    FitScreen,
}

impl From<WindowScale> for Scale {
    fn from(s: WindowScale) -> Self {
        match s {
            WindowScale::X1 => Scale::X1,
            WindowScale::X2 => Scale::X2,
            WindowScale::X4 => Scale::X4,
            WindowScale::FitScreen => Scale::FitScreen,
        }
    }
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("cannot open preview window: {0}")]
    Window(#[from] minifb::Error),
    #[error("buffer holds {got} pixels, expected {expected}")]
    BufferSize { got: usize, expected: usize },
}

// ============================================================================
//  CONVERSIÓN DE PIXELES
// ============================================================================

/// Expande un byte RRRGGGBB a 0x00RRGGBB (formato de minifb),
/// replicando los bits altos en los bajos para que 0xFF sea blanco puro.
#[inline(always)]
pub fn expand_rgb332(pixel: u8) -> u32 {
    let r3 = (pixel >> 5) as u32;
    let g3 = ((pixel >> 2) & 0x7) as u32;
    let b2 = (pixel & 0x3) as u32;

    let r = (r3 << 5) | (r3 << 2) | (r3 >> 1);
    let g = (g3 << 5) | (g3 << 2) | (g3 >> 1);
    let b = b2 * 0x55;
    (r << 16) | (g << 8) | b
}

/// Vuelca el área visible de `fb` a `buffer` (width * height, fila a fila).
pub fn render_framebuffer<B: MemoryBus>(
    fb: &Framebuffer<B>,
    width: usize,
    height: usize,
    buffer: &mut [u32],
) -> Result<(), DisplayError> {
    let expected = width * height;
    if buffer.len() != expected {
        return Err(DisplayError::BufferSize {
            got: buffer.len(),
            expected,
        });
    }
    for (y, row) in buffer.chunks_exact_mut(width).enumerate() {
        for (x, out) in row.iter_mut().enumerate() {
            *out = expand_rgb332(fb.read_pixel(x as i32, y as i32));
        }
    }
    Ok(())
}

// ============================================================================
//  VENTANA
// ============================================================================

pub struct FabricDisplay {
    window: Window,
    width: usize,
    height: usize,
    buffer: Vec<u32>,
}

impl FabricDisplay {
    /// Crea una nueva ventana lista para mostrar la VRAM
    pub fn new(config: DisplayConfig) -> Result<Self, DisplayError> {
        let mut opts = WindowOptions::default();
        opts.scale = config.scale.into();
        opts.resize = config.resizable;
        opts.scale_mode = ScaleMode::AspectRatioStretch;

        let mut window = Window::new(&config.title, config.width, config.height, opts)?;

        if config.target_fps > 0.0 {
            let micros = (1_000_000.0 / config.target_fps) as u64;
            window.limit_update_rate(Some(Duration::from_micros(micros)));
        } else {
            window.limit_update_rate(None);
        }

        Ok(Self {
            window,
            width: config.width,
            height: config.height,
            buffer: vec![0; config.width * config.height],
        })
    }

    /// Relee la VRAM y la presenta en la ventana.
    pub fn present<B: MemoryBus>(&mut self, fb: &Framebuffer<B>) -> Result<(), DisplayError> {
        render_framebuffer(fb, self.width, self.height, &mut self.buffer)?;
        if let Err(e) = self
            .window
            .update_with_buffer(&self.buffer, self.width, self.height)
        {
            warn!("Display Error: {}", e);
        }
        Ok(())
    }

    /// Procesa eventos sin redibujar (la VRAM no cambió).
    pub fn idle(&mut self) {
        self.window.update();
    }

    /// Verifica si la ventana sigue abierta (para el loop principal)
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.window.is_key_down(key)
    }
}
