// crates/fabric_vga/src/tests.rs
#[cfg(test)]
mod tests {
    use crate::*;
    use fabric_core::{MemoryBus, MmioBus, Ram};
    use std::collections::BTreeSet;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::Duration;

    // Lienzo que sólo registra las escrituras, en orden.
    #[derive(Default)]
    struct Canvas {
        writes: Vec<(i32, i32, u8)>,
    }

    impl PixelWrite for Canvas {
        fn write_pixel(&mut self, x: i32, y: i32, pixel: u8) {
            self.writes.push((x, y, pixel));
        }
    }

    impl Canvas {
        fn points(&self) -> BTreeSet<(i32, i32)> {
            self.writes.iter().map(|&(x, y, _)| (x, y)).collect()
        }
    }

    fn vram() -> Framebuffer<Ram> {
        Framebuffer::new(Ram::new(VRAM_SIZE), 0)
    }

    fn quick() -> BlitConfig {
        BlitConfig {
            settle_delay: Duration::ZERO,
            legacy_row_shift: false,
        }
    }

    /// Arma un BMP 24-bit en memoria. `rows` va de abajo hacia arriba, como en disco.
    fn build_bmp(width: u32, rows: &[&[(u8, u8, u8)]], filler: usize, bpp: u16) -> Vec<u8> {
        let height = rows.len() as u32;
        let pad = row_padding(width) as usize;
        let data_offset = 54 + filler as u32;
        let image_size = ((width as usize * 3 + pad) * rows.len()) as u32;

        let mut out = Vec::new();
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(data_offset + image_size).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&data_offset.to_le_bytes());

        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&bpp.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&image_size.to_le_bytes());
        out.extend_from_slice(&2835u32.to_le_bytes());
        out.extend_from_slice(&2835u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());

        out.extend(std::iter::repeat(0xCC).take(filler));
        for row in rows {
            for &(r, g, b) in row.iter() {
                out.extend_from_slice(&[b, g, r]);
            }
            out.extend(std::iter::repeat(0).take(pad));
        }
        out
    }

    fn temp_bmp(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "fabric_vga_{}_{}.bmp",
            std::process::id(),
            name
        ));
        fs::write(&path, bytes).unwrap();
        path
    }

    const RED: (u8, u8, u8) = (255, 0, 0);
    const GREEN: (u8, u8, u8) = (0, 255, 0);
    const BLUE: (u8, u8, u8) = (0, 0, 255);
    const WHITE: (u8, u8, u8) = (255, 255, 255);

    fn two_by_two() -> Vec<u8> {
        build_bmp(2, &[&[RED, GREEN], &[BLUE, WHITE]], 0, 24)
    }

    // ------------------------------------------------------------------
    //  Direccionamiento
    // ------------------------------------------------------------------

    #[test]
    fn test_vram_addr_layout() {
        assert_eq!(vram_addr(0, 0), 0);
        assert_eq!(vram_addr(1, 0), 1);
        assert_eq!(vram_addr(0, 1), 1024);
        assert_eq!(vram_addr(639, 479), 479 * 1024 + 639);
        assert_eq!(vram_addr(1023, 511), (VRAM_SIZE - 1) as u32);
    }

    #[test]
    fn test_vram_addr_wraps() {
        for &(x, y) in &[(0, 0), (5, 7), (639, 479), (1000, 300), (-1, -1), (-640, 12)] {
            assert_eq!(vram_addr(x + 1024, y), vram_addr(x, y));
            assert_eq!(vram_addr(x, y + 512), vram_addr(x, y));
            assert_eq!(vram_addr(x - 1024, y - 512), vram_addr(x, y));
        }
        assert_eq!(vram_addr(-1, 0), 0x3FF);
        assert_eq!(vram_addr(0, -1), 0x1FF << 10);
    }

    #[test]
    fn test_pixel_io_with_base() {
        let base = VRAM_SIZE as u32;
        let mut fb = Framebuffer::new(Ram::new(VRAM_SIZE * 2), base);
        fb.write_pixel(3, 2, 0x9C);
        assert_eq!(fb.read_pixel(3, 2), 0x9C);
        assert_eq!(fb.bus().as_slice()[VRAM_SIZE + 2 * 1024 + 3], 0x9C);
        // alias
        assert_eq!(fb.read_pixel(3 + 1024, 2 + 512), 0x9C);
        assert_eq!(fb.base(), base);
    }

    #[test]
    fn test_framebuffer_over_borrowed_ram() {
        let mut ram = Ram::new(VRAM_SIZE);
        {
            let mut fb = Framebuffer::new(&mut ram, 0);
            fb.write_pixel(10, 1, 0x42);
        }
        assert_eq!(ram.read(1024 + 10), 0x42);
    }

    #[test]
    fn test_framebuffer_over_mmio_window() {
        let mut window = vec![0u8; VRAM_SIZE];
        let bus = unsafe { MmioBus::new(window.as_mut_ptr(), window.len()) }.unwrap();
        let mut fb = Framebuffer::new(bus, 0);
        fb.draw_box(2, 1, 3, 1, 0x1C);
        assert_eq!(fb.read_pixel(3, 1), 0x1C);
        drop(fb);
        assert_eq!(window[1024 + 2], 0x1C);
        assert_eq!(window[1024 + 3], 0x1C);
        assert_eq!(window.iter().filter(|&&b| b != 0).count(), 2);
    }

    #[test]
    fn test_clear_screen_only_visible_area() {
        let mut fb = Framebuffer::new(Ram::filled(VRAM_SIZE, 0xAA), 0);
        fb.clear_screen(0x00);
        assert_eq!(fb.read_pixel(0, 0), 0x00);
        assert_eq!(fb.read_pixel(639, 479), 0x00);
        assert_eq!(fb.read_pixel(640, 0), 0xAA);
        assert_eq!(fb.read_pixel(0, 480), 0xAA);
        let cleared = fb.into_bus().as_slice().iter().filter(|&&b| b == 0).count();
        assert_eq!(cleared, (SCREEN_WIDTH * SCREEN_HEIGHT) as usize);
    }

    // ------------------------------------------------------------------
    //  Rasterizador
    // ------------------------------------------------------------------

    const LINES: [(i32, i32, i32, i32); 9] = [
        (0, 0, 10, 3),
        (0, 0, 3, 10),
        (5, 5, -4, 8),
        (2, 9, 7, -6),
        (0, 0, 6, 6),
        (6, 0, 0, 6),
        (4, 4, 4, 4),
        (-3, 2, 12, 2),
        (1, -5, 1, 5),
    ];

    #[test]
    fn test_line_symmetry() {
        for &(x0, y0, x1, y1) in LINES.iter() {
            let mut forward = Canvas::default();
            let mut backward = Canvas::default();
            draw_line(&mut forward, x0, y0, x1, y1, 1);
            draw_line(&mut backward, x1, y1, x0, y0, 1);
            assert_eq!(
                forward.points(),
                backward.points(),
                "line ({},{})-({},{})",
                x0,
                y0,
                x1,
                y1
            );
        }
    }

    #[test]
    fn test_line_connectivity() {
        for &(x0, y0, x1, y1) in LINES.iter() {
            let mut canvas = Canvas::default();
            draw_line(&mut canvas, x0, y0, x1, y1, 7);

            let steps = (x1 - x0).abs().max((y1 - y0).abs()) as usize;
            assert_eq!(canvas.writes.len(), steps + 1);
            assert_eq!(canvas.points().len(), steps + 1);

            // 8-conexa: cada pixel toca al anterior
            for pair in canvas.writes.windows(2) {
                let (ax, ay, _) = pair[0];
                let (bx, by, _) = pair[1];
                assert!((ax - bx).abs() <= 1 && (ay - by).abs() <= 1);
                assert!((ax, ay) != (bx, by));
            }

            // Ambos extremos presentes
            assert!(canvas.points().contains(&(x0, y0)));
            assert!(canvas.points().contains(&(x1, y1)));
            assert!(canvas.writes.iter().all(|&(_, _, p)| p == 7));
        }
    }

    #[test]
    fn test_line_on_framebuffer() {
        let mut fb = vram();
        fb.draw_line(0, 0, 4, 2, 0xE0);
        for &(x, y) in &[(0, 0), (1, 0), (2, 1), (3, 1), (4, 2)] {
            assert_eq!(fb.read_pixel(x, y), 0xE0, "({}, {})", x, y);
        }
        assert_eq!(fb.read_pixel(1, 1), 0);
    }

    /// Cuenta pixeles por columna sin guardarlos (la línea tiene ~2^31 puntos).
    #[derive(Default)]
    struct ColumnCounter {
        columns: [u64; 2],
        first: Option<(i32, i32)>,
        last: Option<(i32, i32)>,
    }

    impl PixelWrite for ColumnCounter {
        fn write_pixel(&mut self, x: i32, y: i32, _pixel: u8) {
            self.columns[x as usize] += 1;
            self.first.get_or_insert((x, y));
            self.last = Some((x, y));
        }
    }

    #[test]
    fn test_line_with_extreme_endpoint() {
        let mut counter = ColumnCounter::default();
        draw_line(&mut counter, 0, i32::MIN, 1, 1, 0xFF);

        // 2^31 + 2 pixeles repartidos en mitades iguales entre x = 0 y x = 1
        assert_eq!(counter.columns, [(1u64 << 30) + 1, (1u64 << 30) + 1]);
        assert_eq!(counter.first, Some((0, i32::MIN)));
        assert_eq!(counter.last, Some((1, 1)));
    }

    #[test]
    fn test_box_fill() {
        let mut canvas = Canvas::default();
        draw_box(&mut canvas, 2, 3, 5, 4, 0x1C);
        assert_eq!(canvas.writes.len(), 4 * 2);
        assert!(canvas.points().contains(&(2, 3)));
        assert!(canvas.points().contains(&(5, 4)));
    }

    #[test]
    fn test_box_normalizes_x_pairs() {
        let mut swapped = Canvas::default();
        let mut direct = Canvas::default();
        draw_box(&mut swapped, 9, 6, 1, 2, 1);
        draw_box(&mut direct, 1, 2, 9, 6, 1);
        assert_eq!(swapped.points(), direct.points());
        assert_eq!(direct.writes.len(), 9 * 5);
    }

    #[test]
    fn test_box_does_not_normalize_y() {
        let mut canvas = Canvas::default();
        draw_box(&mut canvas, 1, 5, 8, 2, 1);
        assert!(canvas.writes.is_empty());

        let mut fb = vram();
        fb.draw_box(1, 5, 8, 2, 0xFF);
        assert!(fb.bus().as_slice().iter().all(|&b| b == 0));
    }

    // ------------------------------------------------------------------
    //  Decodificador
    // ------------------------------------------------------------------

    #[test]
    fn test_quantize_keeps_high_bits() {
        for r in (0..=255u16).step_by(17) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(17) {
                    let (r, g, b) = (r as u8, g as u8, b as u8);
                    let q = quantize_rgb332(Rgb::new(r, g, b));
                    assert_eq!(q >> 5, r >> 5);
                    assert_eq!((q >> 2) & 0x7, g >> 5);
                    assert_eq!(q & 0x3, b >> 6);
                    assert_eq!(q, quantize_rgb332(Rgb::new(r, g, b)));
                }
            }
        }
        assert_eq!(quantize_rgb332(Rgb::new(255, 0, 0)), 0xE0);
        assert_eq!(quantize_rgb332(Rgb::new(0, 255, 0)), 0x1C);
        assert_eq!(quantize_rgb332(Rgb::new(0, 0, 255)), 0x03);
        assert_eq!(quantize_rgb332(Rgb::new(255, 255, 255)), 0xFF);
    }

    #[test]
    fn test_row_padding_formula() {
        assert_eq!(row_padding(0), 0);
        assert_eq!(row_padding(1), 1);
        assert_eq!(row_padding(2), 2);
        assert_eq!(row_padding(3), 3);
        assert_eq!(row_padding(4), 0);
        for w in 0..64u32 {
            assert_eq!(row_padding(w), (4 - (w * 3 % 4)) % 4);
        }
    }

    #[test]
    fn test_row_consumes_pixels_and_padding() {
        for w in 0..9u32 {
            let pad = row_padding(w) as usize;
            let mut stream: Vec<u8> = (0..w as usize * 3).map(|i| i as u8).collect();
            stream.extend(std::iter::repeat(0xEE).take(pad));
            stream.extend_from_slice(&[0x11, 0x22, 0x33]);

            let mut bmp = BmpReader::new(Cursor::new(stream));
            for _ in 0..w {
                bmp.read_pixel().unwrap();
            }
            bmp.skip_padding(row_padding(w)).unwrap();
            assert_eq!(bmp.position(), (w as usize * 3 + pad) as u64);

            // Siguiente fila alineada
            assert_eq!(bmp.read_pixel().unwrap(), Rgb::new(0x33, 0x22, 0x11));
        }
    }

    #[test]
    fn test_headers_parse() {
        let bytes = build_bmp(3, &[&[RED, RED, RED]], 6, 24);
        let mut bmp = BmpReader::new(Cursor::new(bytes));
        let header = bmp.read_header().unwrap();
        let info = bmp.read_info_header().unwrap();
        assert_eq!(bmp.position(), 54);
        assert_eq!(header.signature, bmp::BMP_SIGNATURE);
        assert_eq!(header.data_offset, 60);
        assert_eq!(header.file_size, 60 + 12);
        assert_eq!(info.size, 40);
        assert_eq!(info.width, 3);
        assert_eq!(info.height, 1);
        assert_eq!(info.planes, 1);
        assert_eq!(info.bits_per_pixel, 24);
        assert_eq!(info.compression, 0);
        assert_eq!(info.x_pixels_per_m, 2835);
        assert!(info.check_supported(&header).is_ok());

        bmp.skip_to_pixel_data(header.data_offset).unwrap();
        assert_eq!(bmp.position(), 60);
        assert_eq!(bmp.read_pixel().unwrap(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_pixel_byte_order_is_bgr() {
        let mut bmp = BmpReader::new(Cursor::new(vec![0x01, 0x02, 0x03]));
        assert_eq!(bmp.read_pixel().unwrap(), Rgb { r: 0x03, g: 0x02, b: 0x01 });
    }

    #[test]
    fn test_format_checks() {
        let header = BmpHeader {
            signature: bmp::BMP_SIGNATURE,
            data_offset: 54,
            ..Default::default()
        };
        let good = BmpInfoHeader {
            size: 40,
            width: 1,
            height: 1,
            planes: 1,
            bits_per_pixel: 24,
            ..Default::default()
        };
        assert!(good.check_supported(&header).is_ok());

        let bad_sig = BmpHeader { signature: 0x5858, ..header };
        assert!(matches!(good.check_supported(&bad_sig), Err(BmpError::BadSignature(0x5858))));

        let planes = BmpInfoHeader { planes: 2, ..good };
        assert!(matches!(planes.check_supported(&header), Err(BmpError::UnsupportedPlanes(2))));

        let depth = BmpInfoHeader { bits_per_pixel: 32, ..good };
        assert!(matches!(depth.check_supported(&header), Err(BmpError::UnsupportedDepth(32))));

        let rle = BmpInfoHeader { compression: 1, ..good };
        assert!(matches!(rle.check_supported(&header), Err(BmpError::Compressed(1))));

        let short = BmpHeader { data_offset: 20, ..header };
        assert!(matches!(good.check_supported(&short), Err(BmpError::DataOffsetInsideHeader(20))));

        let top_down = BmpInfoHeader { height: (-2i32) as u32, ..good };
        assert!(matches!(top_down.check_supported(&header), Err(BmpError::BadDimensions { .. })));
    }

    // ------------------------------------------------------------------
    //  Blit
    // ------------------------------------------------------------------

    #[test]
    fn test_end_to_end_two_by_two() {
        let path = temp_bmp("e2e", &two_by_two());
        let mut fb = vram();
        let report = fb.draw_picture(&path, 0, 0, &quick()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(report.info.width, 2);
        assert_eq!(report.info.height, 2);
        assert_eq!(report.pixels_written, 4);

        // Fila de arriba (la segunda en disco)
        assert_eq!(fb.read_pixel(0, 0), 0x03);
        assert_eq!(fb.read_pixel(1, 0), 0xFF);
        // Fila de abajo (la primera en disco)
        assert_eq!(fb.read_pixel(0, 1), 0xE0);
        assert_eq!(fb.read_pixel(1, 1), 0x1C);
        // Nada más
        let touched = fb.bus().as_slice().iter().filter(|&&b| b != 0).count();
        assert_eq!(touched, 4);
    }

    #[test]
    fn test_blit_at_origin() {
        let mut fb = vram();
        blit_from_reader(&mut fb, Cursor::new(two_by_two()), 100, 50, &quick()).unwrap();
        assert_eq!(fb.read_pixel(100, 50), 0x03);
        assert_eq!(fb.read_pixel(101, 50), 0xFF);
        assert_eq!(fb.read_pixel(100, 51), 0xE0);
        assert_eq!(fb.read_pixel(101, 51), 0x1C);
    }

    #[test]
    fn test_blit_legacy_row_shift() {
        let config = BlitConfig {
            legacy_row_shift: true,
            ..quick()
        };
        let mut fb = vram();
        blit_from_reader(&mut fb, Cursor::new(two_by_two()), 0, 0, &config).unwrap();
        // Todo sube una fila; la fila de arriba cae en y = -1 (alias de 511)
        assert_eq!(fb.read_pixel(0, -1), 0x03);
        assert_eq!(fb.read_pixel(1, 511), 0xFF);
        assert_eq!(fb.read_pixel(0, 0), 0xE0);
        assert_eq!(fb.read_pixel(1, 0), 0x1C);
        assert_eq!(fb.read_pixel(0, 1), 0x00);
    }

    #[test]
    fn test_blit_skips_filler_and_padding() {
        // ancho 3 -> 3 bytes de relleno por fila, más 4 bytes antes de los pixeles
        let rows: [&[(u8, u8, u8)]; 2] = [&[RED, GREEN, BLUE], &[WHITE, (0x20, 0x40, 0x80), RED]];
        let bytes = build_bmp(3, &rows, 4, 24);
        let mut canvas = Canvas::default();
        let report = blit_from_reader(&mut canvas, Cursor::new(bytes), 0, 0, &quick()).unwrap();
        assert_eq!(report.header.data_offset, 58);
        assert_eq!(
            canvas.writes,
            vec![
                (0, 1, 0xE0),
                (1, 1, 0x1C),
                (2, 1, 0x03),
                (0, 0, 0xFF),
                (1, 0, 0x20 | (0x40 >> 3) | (0x80 >> 6)),
                (2, 0, 0xE0),
            ]
        );
    }

    #[test]
    fn test_open_failure_leaves_vram_untouched() {
        let mut fb = Framebuffer::new(Ram::filled(VRAM_SIZE, 0x5A), 0);
        let missing = std::env::temp_dir().join("fabric_vga_does_not_exist.bmp");
        let err = fb.draw_picture(&missing, 0, 0, &quick()).unwrap_err();
        match &err {
            BlitError::Open { path, .. } => assert_eq!(path, &missing),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().starts_with("Can't open file"));
        assert!(fb.bus().as_slice().iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_unsupported_depth_rejected_before_drawing() {
        let bytes = build_bmp(2, &[&[RED, GREEN]], 0, 8);
        let path = temp_bmp("depth8", &bytes);
        let mut fb = Framebuffer::new(Ram::filled(VRAM_SIZE, 0x5A), 0);
        let err = fb.draw_picture(&path, 0, 0, &quick()).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, BlitError::Format(BmpError::UnsupportedDepth(8))));
        assert!(fb.bus().as_slice().iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_bad_signature_rejected() {
        let mut bytes = two_by_two();
        bytes[0] = b'X';
        bytes[1] = b'X';
        let mut canvas = Canvas::default();
        let err = blit_from_reader(&mut canvas, Cursor::new(bytes), 0, 0, &quick()).unwrap_err();
        assert!(matches!(err, BmpError::BadSignature(0x5858)));
        assert!(canvas.writes.is_empty());
    }

    #[test]
    fn test_truncated_pixel_data() {
        let mut bytes = two_by_two();
        bytes.truncate(bytes.len() - 7);
        let mut canvas = Canvas::default();
        let err = blit_from_reader(&mut canvas, Cursor::new(bytes), 0, 0, &quick()).unwrap_err();
        assert!(matches!(err, BmpError::Truncated(_)));
        // La primera fila completa sí llegó a escribirse
        assert_eq!(canvas.writes.len(), 2);
    }

    #[test]
    fn test_directory_path_is_open_failure() {
        let dir = std::env::temp_dir();
        let mut fb = Framebuffer::new(Ram::filled(VRAM_SIZE, 0x5A), 0);
        let err = fb.draw_picture(&dir, 0, 0, &quick()).unwrap_err();
        assert!(matches!(err, BlitError::Open { .. }), "{:?}", err);
        assert!(fb.bus().as_slice().iter().all(|&b| b == 0x5A));
    }

    struct DeniedReader;

    impl std::io::Read for DeniedReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_read_error_is_not_truncation() {
        let mut canvas = Canvas::default();
        let err = blit_from_reader(&mut canvas, DeniedReader, 0, 0, &quick()).unwrap_err();
        match err {
            BmpError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(canvas.writes.is_empty());
    }
}
