use log::warn;
use std::ptr::NonNull;
use std::thread;
use std::time::Duration;
use thiserror::Error;


// ============================================================================
//  CONTRACTS (TRAITS)
// ============================================================================

/// Contrato UNIFICADO para cualquier región mapeada en memoria (VRAM, CSRs).
/// El procesador del fabric (Nios II) es little endian y los periféricos
/// exponen registros de 32 bits, por eso los helpers son LE.
pub trait MemoryBus {
    // --- Métodos Obligatorios (acceso de 1 byte) ---
    fn read(&self, addr: u32) -> u8;
    fn write(&mut self, addr: u32, val: u8);

    // --- Helpers Automáticos (Default Impls) ---

    // Lectura 32-bit Little Endian (IORD_32DIRECT)
    fn read_u32_le(&self, addr: u32) -> u32 {
        let b0 = self.read(addr) as u32;
        let b1 = self.read(addr.wrapping_add(1)) as u32;
        let b2 = self.read(addr.wrapping_add(2)) as u32;
        let b3 = self.read(addr.wrapping_add(3)) as u32;
        (b3 << 24) | (b2 << 16) | (b1 << 8) | b0
    }

    // Escritura 32-bit Little Endian (IOWR_32DIRECT)
    fn write_u32_le(&mut self, addr: u32, val: u32) {
        self.write(addr, (val & 0xFF) as u8);
        self.write(addr.wrapping_add(1), (val >> 8) as u8);
        self.write(addr.wrapping_add(2), (val >> 16) as u8);
        self.write(addr.wrapping_add(3), (val >> 24) as u8);
    }
}

/// Permite prestar un bus a un driver sin cederlo (`Framebuffer<&mut Ram>`).
impl<B: MemoryBus + ?Sized> MemoryBus for &mut B {
    fn read(&self, addr: u32) -> u8 {
        (**self).read(addr)
    }
    fn write(&mut self, addr: u32, val: u8) {
        (**self).write(addr, val)
    }
    fn read_u32_le(&self, addr: u32) -> u32 {
        (**self).read_u32_le(addr)
    }
    fn write_u32_le(&mut self, addr: u32, val: u32) {
        (**self).write_u32_le(addr, val)
    }
}

// ============================================================================
//  ERRORES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{what} not ready after {polls} polls")]
    NotReady { what: &'static str, polls: u32 },
}

// ============================================================================
//  RAM DEL HOST (memoria simulada)
// ============================================================================

/// Región de memoria respaldada por un `Vec<u8>`.
/// Las direcciones fuera de rango se espejan (mirror) como en el hardware,
/// así que nunca hay un acceso fuera de límites.
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    /// Crea una región de `size` bytes inicializada a cero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "Ram size must be non-zero");
        Self {
            data: vec![0; size],
        }
    }

    /// Crea una región rellena con `value` (útil para tests de "no tocado").
    pub fn filled(size: usize, value: u8) -> Self {
        assert!(size > 0, "Ram size must be non-zero");
        Self {
            data: vec![value; size],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Acceso directo al buffer (para el preview de video).
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl MemoryBus for Ram {
    fn read(&self, addr: u32) -> u8 {
        self.data[addr as usize % self.data.len()]
    }

    fn write(&mut self, addr: u32, val: u8) {
        let len = self.data.len();
        self.data[addr as usize % len] = val;
    }
}

// ============================================================================
//  MMIO REAL (volatile)
// ============================================================================

/// Ventana volatile sobre una región física mapeada en memoria.
/// Accesos fuera de `span` se comportan como bus abierto: lectura 0xFF,
/// escritura ignorada.
pub struct MmioBus {
    base: NonNull<u8>,
    span: usize,
}

impl MmioBus {
    /// # Safety
    ///
    /// `base..base + span` must be a valid, mapped region for byte-wide
    /// volatile reads and writes for as long as this `MmioBus` is alive, and
    /// nothing else may create references into it.
    pub unsafe fn new(base: *mut u8, span: usize) -> Option<Self> {
        NonNull::new(base).map(|base| Self { base, span })
    }

    pub fn span(&self) -> usize {
        self.span
    }
}

impl MemoryBus for MmioBus {
    fn read(&self, addr: u32) -> u8 {
        let offset = addr as usize;
        if offset >= self.span {
            return 0xFF;
        }
        // Safe: offset < span, validado en `new`
        unsafe { self.base.as_ptr().add(offset).read_volatile() }
    }

    fn write(&mut self, addr: u32, val: u8) {
        let offset = addr as usize;
        if offset >= self.span {
            return;
        }
        unsafe { self.base.as_ptr().add(offset).write_volatile(val) }
    }
}

// ============================================================================
//  POLLING ACOTADO (reemplaza los `while(!idle){}`)
// ============================================================================

/// Política de espera para bits de estado (idle, FIFO llena, FIFO vacía).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Número máximo de lecturas del registro antes de rendirse.
    pub max_polls: u32,
    /// Pausa entre lecturas. `None` = spin puro.
    pub interval: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_polls: 100_000,
            interval: None,
        }
    }
}

impl PollPolicy {
    pub fn new(max_polls: u32, interval: Option<Duration>) -> Self {
        Self {
            max_polls,
            interval,
        }
    }

    /// Llama a `ready` hasta que devuelva `true`.
    /// Retorna cuántas lecturas hicieron falta, o `NotReady` si se agotó el presupuesto.
    pub fn wait_until<F>(&self, what: &'static str, mut ready: F) -> Result<u32, CoreError>
    where
        F: FnMut() -> bool,
    {
        for polls in 1..=self.max_polls {
            if ready() {
                return Ok(polls);
            }
            match self.interval {
                Some(pause) => thread::sleep(pause),
                None => std::hint::spin_loop(),
            }
        }
        warn!("{} still busy after {} polls", what, self.max_polls);
        Err(CoreError::NotReady {
            what,
            polls: self.max_polls,
        })
    }
}
