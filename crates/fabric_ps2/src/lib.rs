use bitflags::bitflags;
use fabric_core::{CoreError, MemoryBus, PollPolicy};
use log::{debug, trace};
use thiserror::Error;


// ============================================================================
//  MAPA DE REGISTROS
// ============================================================================

pub const DATA: u32 = 0x00;
pub const STATUS: u32 = 0x04;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Ps2Status: u32 {
        const RX_FIFO_EMPTY = 1 << 0;
        const TX_FIFO_FULL  = 1 << 1;
    }
}

/// Escritura: byte de comando en bits 0..=7.
#[inline(always)]
pub fn encode_data(cmd: u8) -> u32 {
    cmd as u32
}

/// Lectura: byte recibido en bits 0..=7, el resto se ignora.
#[inline(always)]
pub fn decode_data(word: u32) -> u8 {
    (word & 0xFF) as u8
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Ps2Error {
    #[error(transparent)]
    NotReady(#[from] CoreError),
}

// ============================================================================
//  DRIVER
// ============================================================================

/// Controlador PS/2 con FIFOs de transmisión y recepción.
pub struct Ps2Controller<B: MemoryBus> {
    bus: B,
    base: u32,
    poll: PollPolicy,
}

impl<B: MemoryBus> Ps2Controller<B> {
    pub fn new(bus: B, base: u32) -> Self {
        Self {
            bus,
            base,
            poll: PollPolicy::default(),
        }
    }

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

    pub fn status(&self) -> Ps2Status {
        Ps2Status::from_bits_truncate(self.bus.read_u32_le(self.base.wrapping_add(STATUS)))
    }

    // --- Transmisión ---

    pub fn tx_fifo_full(&self) -> bool {
        self.status().contains(Ps2Status::TX_FIFO_FULL)
    }

    /// Hay hueco en la FIFO de transmisión.
    pub fn tx_is_idle(&self) -> bool {
        !self.tx_fifo_full()
    }

    /// Escribe un comando sin mirar el estado.
    pub fn write_cmd(&mut self, cmd: u8) {
        trace!("ps2 tx 0x{:02X}", cmd);
        self.bus.write_u32_le(self.base.wrapping_add(DATA), encode_data(cmd));
    }

    /// Espera (acotado) a que la FIFO de TX tenga hueco y escribe el comando.
    pub fn write_cmd_wait(&mut self, cmd: u8) -> Result<(), Ps2Error> {
        self.poll.wait_until("ps2 tx fifo", || self.tx_is_idle())?;
        self.write_cmd(cmd);
        Ok(())
    }

    // --- Recepción ---

    pub fn rx_fifo_empty(&self) -> bool {
        self.status().contains(Ps2Status::RX_FIFO_EMPTY)
    }

    // Leer DATA desencola un byte en el hardware.
    fn pop_rx(&self) -> u8 {
        decode_data(self.bus.read_u32_le(self.base.wrapping_add(DATA)))
    }

    /// Lee un byte de la FIFO de RX sin mirar el estado.
    pub fn read_rx_fifo(&mut self) -> u8 {
        self.pop_rx()
    }

    /// Devuelve el siguiente byte recibido, o `None` si la FIFO está vacía.
    pub fn get_packet(&mut self) -> Option<u8> {
        if self.rx_fifo_empty() {
            None
        } else {
            Some(self.pop_rx())
        }
    }

    /// Vacía la FIFO de RX. Retorna cuántos bytes se descartaron.
    /// Un dispositivo que no deja de transmitir agota la política de polling.
    pub fn flush_fifo(&mut self) -> Result<usize, Ps2Error> {
        let mut drained = 0usize;
        self.poll.wait_until("ps2 rx flush", || {
            if self.rx_fifo_empty() {
                return true;
            }
            self.pop_rx();
            drained += 1;
            false
        })?;
        debug!("ps2 rx fifo flushed ({} bytes)", drained);
        Ok(drained)
    }
}
