// crates/fabric_vga/src/raster.rs
//! Primitivas sintéticas: líneas y cajas. Sólo usan `PixelWrite`.

use crate::framebuffer::PixelWrite;
use std::mem::swap;

/// Dibuja una línea de `(x0, y0)` a `(x1, y1)` con Bresenham entero.
///
/// Siempre avanza sobre el eje de mayor recorrido, escribiendo exactamente
/// `max(|dx|, |dy|) + 1` pixeles. El orden de los extremos no cambia el
/// resultado.
pub fn draw_line<T: PixelWrite + ?Sized>(
    target: &mut T,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    pixel: u8,
) {
    // Diferencias en i64: entre extremos i32 pueden no caber en i32.
    let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);

    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        swap(&mut x0, &mut y0);
        swap(&mut x1, &mut y1);
    }

    if x0 > x1 {
        swap(&mut x0, &mut x1);
        swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let mut error = dx / 2;
    let ystep = if y0 < y1 { 1 } else { -1 };
    let mut y = y0;

    // x e y nunca salen de [x0, x1] / [y0, y1], así que vuelven a i32 sin pérdida
    for x in x0..=x1 {
        if steep {
            target.write_pixel(y as i32, x as i32, pixel);
        } else {
            target.write_pixel(x as i32, y as i32, pixel);
        }
        error -= dy;
        if error < 0 {
            y += ystep;
            error += dx;
        }
    }
}

/// Rellena el rectángulo inclusivo `(x0, y0)..=(x1, y1)`.
///
/// Sólo se normaliza x (intercambiando ambos pares para conservar la
/// diagonal). Si tras eso `y0 > y1`, no se escribe nada.
pub fn draw_box<T: PixelWrite + ?Sized>(
    target: &mut T,
    mut x0: i32,
    mut y0: i32,
    mut x1: i32,
    mut y1: i32,
    pixel: u8,
) {
    if x0 > x1 {
        swap(&mut x0, &mut x1);
        swap(&mut y0, &mut y1);
    }

    for y in y0..=y1 {
        for x in x0..=x1 {
            target.write_pixel(x, y, pixel);
        }
    }
}
