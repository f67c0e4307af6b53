// crates/fabric_audio/src/config.rs

/// Registro de reset del codec (escribir 0 lo resetea).
pub const RESET_REG: u8 = 15;

/// Valores iniciales de los registros R0..R9 del codec.
/// Se pasa explícitamente a `AudioController::init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub left_line_in: u16,
    pub right_line_in: u16,
    pub left_headphone_out: u16,
    pub right_headphone_out: u16,
    pub analog_path: u16,
    pub digital_path: u16,
    pub power_down: u16,
    pub digital_interface: u16,
    pub sampling: u16,
    pub active: u16,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            left_line_in: 0x0010,        // R0: ganancia line-in izq. 0dB
            right_line_in: 0x0010,       // R1: ganancia line-in der. 0dB
            left_headphone_out: 0x0079,  // R2: volumen auricular izq. 0dB
            right_headphone_out: 0x0079, // R3: volumen auricular der. 0dB
            analog_path: 0x0031,         // R4: line-in -> ADC, DAC -> line-out
            digital_path: 0x0001,        // R5: sin filtro, sin de-emphasis
            power_down: 0x0000,          // R6: todo encendido
            digital_interface: 0x0001,   // R7: left-justified, 16 bits
            sampling: 0x0000,            // R8: 48 kHz
            active: 0x0001,              // R9: activar
        }
    }
}

impl CodecConfig {
    /// Pares (registro, valor) en el orden en que se escriben.
    pub fn writes(&self) -> [(u8, u16); 10] {
        [
            (0, self.left_line_in),
            (1, self.right_line_in),
            (2, self.left_headphone_out),
            (3, self.right_headphone_out),
            (4, self.analog_path),
            (5, self.digital_path),
            (6, self.power_down),
            (7, self.digital_interface),
            (8, self.sampling),
            (9, self.active),
        ]
    }
}
