/*!
    seam to the pulse generation/capture peripheral

    the engine owns one transmit/receive channel pair and the bounded queue its capture
    interrupt fills. once a frame is handed over, the peripheral's own clock shapes the
    pulses, no task scheduling jitter reaches the wire.
*/

use crate::pulse::RawPulse;


/// channel identifiers select among a fixed hardware set, 0 to `MAX_CHANNELS` excluded
pub const MAX_CHANNELS: u8 = 8;

/// one generate/capture channel pair, exclusively owned by a single bus for its lifetime
pub trait PulseEngine {
    type Error: core::fmt::Debug;

    /// route both channels onto the data line and allocate the capture queue
    fn configure(&mut self, pin: u8, tx_channel: u8, rx_channel: u8) -> Result<(), Self::Error>;

    /// arm the receive channel so the coming transmit is observed from its first edge
    fn arm(&mut self) -> Result<(), Self::Error>;

    /// hand a packed frame to the transmit channel, resolves once generation completed
    async fn transmit(&mut self, frame: &[RawPulse]) -> Result<(), Self::Error>;

    /// next word from the capture queue, pending until the peripheral delivers one
    async fn capture(&mut self) -> Result<RawPulse, Self::Error>;

    /// tear both channels down and drop the capture queue
    fn release(&mut self);
}
