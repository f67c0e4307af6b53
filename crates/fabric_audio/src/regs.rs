// crates/fabric_audio/src/regs.rs
// Mapa de registros del controlador de audio y empaquetado de bits.
// Todo el conocimiento del layout del hardware vive en este archivo.

use bitflags::bitflags;

// ============================================================================
//  OFFSETS (registros de 32 bits desde la base del controlador)
// ============================================================================
pub const CTRL: u32 = 0x00;
pub const STATUS: u32 = 0x04;
pub const I2C_CTRL: u32 = 0x08;
pub const ADC_DATA: u32 = 0x0C;
pub const DAC_DATA: u32 = 0x10;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AudioStatus: u32 {
        const I2C_IDLE       = 1 << 0;
        const ADC_FIFO_EMPTY = 1 << 1;
        const DAC_FIFO_FULL  = 1 << 2;
    }
}

// ============================================================================
//  CTRL: selección de fuente de datos
// ============================================================================

/// Origen de las muestras de ADC/DAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// El CPU mueve las muestras por el bus (FIFOs ADC/DAC).
    Bus = 0,
    /// El hardware conecta ADC -> DAC sin pasar por el CPU.
    Loopback = 1,
}

const CTRL_DAC_SEL: u32 = 1 << 0;
const CTRL_ADC_SEL: u32 = 1 << 1;

pub fn encode_ctrl(dac: DataSource, adc: DataSource) -> u32 {
    let mut word = 0;
    if dac == DataSource::Loopback {
        word |= CTRL_DAC_SEL;
    }
    if adc == DataSource::Loopback {
        word |= CTRL_ADC_SEL;
    }
    word
}

pub fn decode_ctrl(word: u32) -> (DataSource, DataSource) {
    let pick = |bit: u32| {
        if word & bit != 0 {
            DataSource::Loopback
        } else {
            DataSource::Bus
        }
    };
    (pick(CTRL_DAC_SEL), pick(CTRL_ADC_SEL))
}

// ============================================================================
//  PAQUETE I2C DE 24 BITS
// ============================================================================

/// Dirección I2C fija del codec (0b0011010).
pub const CODEC_I2C_ID: u8 = 0x1A;
/// Ancho del dato de cada registro del codec.
pub const REG_DATA_BITS: u32 = 9;

/// Comando de escritura a un registro del codec.
///
/// ```text
/// 23      17 16  15      9 8         0
/// [ dev id  ][W][ reg addr ][  data   ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cCommand {
    pub device: u8,
    pub reg: u8,
    pub data: u16,
}

impl I2cCommand {
    pub fn new(reg: u8, data: u16) -> Self {
        Self {
            device: CODEC_I2C_ID,
            reg,
            data,
        }
    }

    pub fn encode(&self) -> u32 {
        let byte_2 = (self.device as u32 & 0x7F) << 1; // 7 bit id + bit W=0 (escritura)
        let byte_1_0 = ((self.reg as u32 & 0x7F) << REG_DATA_BITS) | (self.data as u32 & 0x1FF);
        (byte_2 << 16) | byte_1_0
    }

    pub fn decode(packet: u32) -> Self {
        Self {
            device: ((packet >> 17) & 0x7F) as u8,
            reg: ((packet >> REG_DATA_BITS) & 0x7F) as u8,
            data: (packet & 0x1FF) as u16,
        }
    }
}

// ============================================================================
//  I2C_CTRL: palabra que dispara la transferencia
// ============================================================================

/// Contenido del registro I2C_CTRL.
///
/// bit 0: start (flanco que lanza la transferencia)
/// bits 1..=24: paquete de 24 bits
/// bits 25..=31: id I2C del dispositivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cCtrl {
    pub start: bool,
    pub packet: u32,
    pub device: u8,
}

impl I2cCtrl {
    pub fn encode(&self) -> u32 {
        (self.start as u32) | ((self.packet & 0x00FF_FFFF) << 1) | ((self.device as u32 & 0x7F) << 25)
    }

    pub fn decode(word: u32) -> Self {
        Self {
            start: word & 1 != 0,
            packet: (word >> 1) & 0x00FF_FFFF,
            device: ((word >> 25) & 0x7F) as u8,
        }
    }
}
