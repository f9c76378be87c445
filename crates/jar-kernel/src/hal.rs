//! The seam between the kernel and the appliance hardware.
//!
//! Everything outside the control core — ADC channel, wireless UART, EEPROM,
//! buzzer, OLED, power switch — is reached through these traits. The gate and
//! power-hold pins use `embedded_hal::digital::OutputPin` directly. A board
//! crate implements them against real peripherals; `jar-sim` implements them
//! in memory.

use jar_proto::records::StatusRecord;

/// A single ADC channel producing 10-bit readings.
pub trait AdcInput {
    /// One conversion; blocking, bounded by the converter.
    fn read(&mut self) -> u16;
}

/// The wireless module's UART.
pub trait SerialLink {
    /// Takes one received byte if any is pending. Never blocks.
    fn read_byte(&mut self) -> Option<u8>;
    /// Queues bytes for transmission; bounded by the UART FIFO.
    fn write_all(&mut self, bytes: &[u8]);
}

/// A keyed byte-addressed non-volatile store (EEPROM or emulation).
pub trait NvStore {
    fn read(&mut self, addr: usize, buf: &mut [u8]);
    fn write(&mut self, addr: usize, bytes: &[u8]);

    /// Reads a native-encoded `f32` at `addr`.
    fn read_f32(&mut self, addr: usize) -> f32 {
        let mut bytes = [0u8; 4];
        self.read(addr, &mut bytes);
        f32::from_le_bytes(bytes)
    }

    /// Writes a native-encoded `f32` at `addr`.
    fn write_f32(&mut self, addr: usize, value: f32) {
        self.write(addr, &value.to_le_bytes());
    }
}

/// The melodies the sequencer and lifecycle ask for.
///
/// Playback is synchronous and may block the foreground for seconds; the
/// interrupt pair keeps regulating heat underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Melody {
    /// A cooking program ran to completion.
    Finish,
    /// A hold elapsed.
    Notify,
    /// The terminal beep on power-down.
    Shutdown,
}

/// The buzzer melody player.
pub trait Sounder {
    fn play(&mut self, melody: Melody);
}

/// The OLED rendering helper; shown `ST:<code>` among other fields.
pub trait StatusDisplay {
    fn render(&mut self, status: &StatusRecord);
}

/// The debounced power switch (active low on the hardware).
pub trait PowerSwitch {
    fn is_pressed(&mut self) -> bool;
}

/// The bundle of out-of-core peripherals a foreground pass touches.
#[derive(Debug)]
pub struct Shell<A, L, N, S, D> {
    pub adc: A,
    pub link: L,
    pub nv: N,
    pub sounder: S,
    pub display: D,
}
