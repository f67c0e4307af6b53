// crates/fabric_audio/src/lib.rs - Driver del controlador de audio (codec por I2C + FIFOs)
use fabric_core::{CoreError, MemoryBus, PollPolicy};
use log::debug;
use thiserror::Error;

pub mod config;
pub mod regs;


pub use config::{CodecConfig, RESET_REG};
pub use regs::{AudioStatus, DataSource, I2cCommand, I2cCtrl, CODEC_I2C_ID};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error(transparent)]
    NotReady(#[from] CoreError),
}

/// Controlador de audio mapeado en memoria a partir de `base`.
pub struct AudioController<B: MemoryBus> {
    bus: B,
    base: u32,
    poll: PollPolicy,
}

impl<B: MemoryBus> AudioController<B> {
    pub fn new(bus: B, base: u32) -> Self {
        Self {
            bus,
            base,
            poll: PollPolicy::default(),
        }
    }

    /// Cambia la política de espera para I2C idle / DAC lleno.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    fn read_reg(&self, offset: u32) -> u32 {
        self.bus.read_u32_le(self.base.wrapping_add(offset))
    }

    fn write_reg(&mut self, offset: u32, val: u32) {
        self.bus.write_u32_le(self.base.wrapping_add(offset), val);
    }

    pub fn status(&self) -> AudioStatus {
        AudioStatus::from_bits_truncate(self.read_reg(regs::STATUS))
    }

    // --- I2C (configuración del codec) ---

    pub fn i2c_is_idle(&self) -> bool {
        self.status().contains(AudioStatus::I2C_IDLE)
    }

    /// Espera (acotado) a que el maestro I2C quede libre.
    pub fn wait_i2c_idle(&self) -> Result<u32, AudioError> {
        Ok(self.poll.wait_until("audio i2c", || self.i2c_is_idle())?)
    }

    /// Lanza un comando de 24 bits: escribe I2C_CTRL con start=1 y luego start=0.
    /// No espera a que termine; usar `wait_i2c_idle` antes del siguiente.
    pub fn write_i2c_cmd(&mut self, reg: u8, data: u16) {
        let cmd = I2cCommand::new(reg, data);
        debug!("I2C Write cmd. Addr: {:x}, Data = {:x}", reg, data);

        let mut ctrl = I2cCtrl {
            start: true,
            packet: cmd.encode(),
            device: cmd.device,
        };
        self.write_reg(regs::I2C_CTRL, ctrl.encode());
        ctrl.start = false;
        self.write_reg(regs::I2C_CTRL, ctrl.encode());
    }

    /// Selecciona de dónde salen/entran las muestras de DAC y ADC.
    pub fn select_source(&mut self, dac: DataSource, adc: DataSource) {
        self.write_reg(regs::CTRL, regs::encode_ctrl(dac, adc));
    }

    /// Resetea el codec, escribe R0..R9 desde `config` y deja ADC/DAC en el bus.
    pub fn init(&mut self, config: &CodecConfig) -> Result<(), AudioError> {
        self.wait_i2c_idle()?;
        self.write_i2c_cmd(RESET_REG, 0);

        for (reg, value) in config.writes() {
            self.wait_i2c_idle()?;
            self.write_i2c_cmd(reg, value);
        }

        self.select_source(DataSource::Bus, DataSource::Bus);
        debug!("audio codec configured");
        Ok(())
    }

    // --- FIFOs de muestras ---

    pub fn adc_fifo_empty(&self) -> bool {
        self.status().contains(AudioStatus::ADC_FIFO_EMPTY)
    }

    /// Lee una muestra del ADC sin mirar el estado.
    pub fn read_adc(&mut self) -> u32 {
        self.read_reg(regs::ADC_DATA)
    }

    /// Lee una muestra sólo si hay alguna en la FIFO.
    pub fn try_read_adc(&mut self) -> Option<u32> {
        if self.adc_fifo_empty() {
            None
        } else {
            Some(self.read_adc())
        }
    }

    pub fn dac_fifo_full(&self) -> bool {
        self.status().contains(AudioStatus::DAC_FIFO_FULL)
    }

    /// Escribe una muestra al DAC sin mirar el estado.
    pub fn write_dac(&mut self, sample: u32) {
        self.write_reg(regs::DAC_DATA, sample);
    }

    /// Espera (acotado) hueco en la FIFO del DAC y escribe la muestra.
    pub fn write_dac_wait(&mut self, sample: u32) -> Result<(), AudioError> {
        self.poll.wait_until("audio dac fifo", || !self.dac_fifo_full())?;
        self.write_dac(sample);
        Ok(())
    }
}
