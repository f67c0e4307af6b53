// crates/systems/fabric_demo/src/main.rs
use fabric_core::{MemoryBus, MmioBus, Ram};
use fabric_display::{DisplayConfig, FabricDisplay, WindowScale};
use fabric_vga::{BlitConfig, Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH, VRAM_SIZE};
use log::{error, info, warn};
use minifb::Key;
use std::env;
use std::process::ExitCode;


// Colores RRRGGGBB
const BLACK: u8 = 0x00;
const WHITE: u8 = 0xFF;
const RED: u8 = 0xE0;
const GREEN: u8 = 0x1C;
const BLUE: u8 = 0x03;
const YELLOW: u8 = 0xFC;

fn draw_test_pattern<B: MemoryBus>(fb: &mut Framebuffer<B>) {
    let (w, h) = (SCREEN_WIDTH - 1, SCREEN_HEIGHT - 1);

    // Marco y diagonales
    fb.draw_line(0, 0, w, 0, WHITE);
    fb.draw_line(w, 0, w, h, WHITE);
    fb.draw_line(w, h, 0, h, WHITE);
    fb.draw_line(0, h, 0, 0, WHITE);
    fb.draw_line(0, 0, w, h, RED);
    fb.draw_line(w, 0, 0, h, GREEN);

    // Abanico desde el centro
    let (cx, cy) = (SCREEN_WIDTH / 2, SCREEN_HEIGHT / 2);
    for i in 0..16 {
        fb.draw_line(cx, cy, i * 40, 40, YELLOW);
    }

    fb.draw_box(20, 300, 120, 400, BLUE);
    fb.draw_box(140, 300, 240, 400, GREEN);
    fb.draw_box(260, 300, 360, 400, RED);
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let DemoArgs { mmio, picture } = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            error!("{}", msg);
            error!("Usage: fabric_demo [--mmio] [bmp_path] [x,y]");
            return ExitCode::FAILURE;
        }
    };
    let picture = picture.as_ref().map(|(path, x0, y0)| (path.as_str(), *x0, *y0));

    if mmio {
        // En el hardware esto sería la región mapeada de la VRAM; aquí un buffer de host
        let mut window = vec![0u8; VRAM_SIZE];
        // Safety: `window` vive hasta el final del bloque y no se toca mientras
        // el MmioBus existe.
        let bus = match unsafe { MmioBus::new(window.as_mut_ptr(), window.len()) } {
            Some(bus) => bus,
            None => {
                error!("VRAM window has a null base");
                return ExitCode::FAILURE;
            }
        };
        info!("Drawing through MMIO window ({} bytes)", bus.span());
        run(Framebuffer::new(bus, 0), picture)
    } else {
        run(Framebuffer::new(Ram::new(VRAM_SIZE), 0), picture)
    }
}

fn run<B: MemoryBus>(mut fb: Framebuffer<B>, picture: Option<(&str, i32, i32)>) -> ExitCode {
    fb.clear_screen(BLACK);
    draw_test_pattern(&mut fb);

    if let Some((path, x0, y0)) = picture {
        match fb.draw_picture(path, x0, y0, &BlitConfig::default()) {
            Ok(report) => info!(
                "{}: {}x{} drawn at ({}, {}), {} pixels",
                path, report.info.width, report.info.height, x0, y0, report.pixels_written
            ),
            // draw_picture ya registró el detalle
            Err(_) => warn!("{} not drawn, showing the test pattern only", path),
        }
    }

    let config = DisplayConfig {
        title: "Fabric VGA - 640x480 RGB332".to_string(),
        scale: WindowScale::X1,
        ..DisplayConfig::default()
    };
    let mut display = match FabricDisplay::new(config) {
        Ok(display) => display,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // La VRAM no cambia después de dibujar: un solo volcado y luego solo eventos
    if let Err(e) = display.present(&fb) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    while display.is_open() {
        if display.is_key_down(Key::R) {
            if let Err(e) = display.present(&fb) {
                error!("{}", e);
            }
        }
        display.idle();
    }

    ExitCode::SUCCESS
}

#[derive(Debug, PartialEq, Eq)]
struct DemoArgs {
    /// Dibujar a través de la ventana volatile en vez de la RAM de host.
    mmio: bool,
    picture: Option<(String, i32, i32)>,
}

fn parse_args(args: &[String]) -> Result<DemoArgs, String> {
    let mmio = args.iter().any(|a| a == "--mmio");
    let rest: Vec<&String> = args.iter().filter(|a| *a != "--mmio").collect();

    let picture = match rest.as_slice() {
        [] => None,
        [path] => Some((path.to_string(), 0, 0)),
        [path, origin] => match parse_origin(origin) {
            Some((x0, y0)) => Some((path.to_string(), x0, y0)),
            None => return Err(format!("Origin must be x,y (e.g. 100,50), got {:?}", origin)),
        },
        _ => return Err(format!("Too many arguments ({})", rest.len())),
    };
    Ok(DemoArgs { mmio, picture })
}

fn parse_origin(s: &str) -> Option<(i32, i32)> {
    let (x, y) = s.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}
