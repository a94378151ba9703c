/*!
    the transceiver and the bus surface it exposes

    The central resource is the [Transceiver] struct which owns the engine's channel pair
    and serializes operations on the line.

    higher level logic (addressing, search, device commands) consumes it only through the
    [OneWireBus] trait, so a different backend (a bit-banged pin for instance) can stand in
    without touching calling code.
*/

use core::fmt::Debug;
use embedded_hal_async::delay::DelayNs;
use log::*;
use thiserror::Error;

use crate::{
    engine::{PulseEngine, MAX_CHANNELS},
    lock::BusLock,
    pulse::{self, Presence, PulseItem},
    session::{Session, CAPTURE_MARGIN},
    timing::{TimingError, TimingProfile},
    };


/// error raised by a bus operation
#[derive(Error, Debug)]
pub enum Error<E> {
    /// fault reported by the pulse engine
    #[error("pulse engine fault")]
    Engine(E),
    /**
        the capture produced no edges at all before the extended timeout

        this is a dead or misrouted channel, not a protocol outcome: an empty bus answers
        a reset with [Presence::Absent], never with this error.
    */
    #[error("capture produced no edges before the timeout")]
    CaptureTimeout,
}

/// error refusing a bind
#[derive(Error, Debug)]
pub enum InitError<E> {
    #[error("timing profile rejected: {0}")]
    Timing(#[from] TimingError),
    #[error("channel {0} is outside the engine's channel set")]
    Channel(u8),
    #[error("transmit and receive must use distinct channels")]
    SharedChannel,
    #[error("engine refused the configuration")]
    Engine(E),
}


/// bus operations exposed to higher level logic
pub trait OneWireBus {
    type Error: Debug;

    /// issue a reset pulse and report whether any responder signalled presence
    async fn reset(&self) -> Result<Presence, Self::Error>;
    /// drive one write slot, holding the bus until the slot completed on the wire
    async fn write_bit(&self, bit: bool) -> Result<(), Self::Error>;
    /// open one read slot and sample the responder's answer
    async fn read_bit(&self) -> Result<bool, Self::Error>;

    /// bits go out least significant first, one independent slot each
    async fn write_byte(&self, byte: u8) -> Result<(), Self::Error> {
        for n in 0..8 {
            self.write_bit(byte & 1 << n != 0).await?;
        }
        Ok(())
    }
    async fn read_byte(&self) -> Result<u8, Self::Error> {
        let mut byte = 0;
        for n in 0..8 {
            if self.read_bit().await? {
                byte |= 1 << n;
            }
        }
        Ok(byte)
    }
    async fn write_bytes(&self, data: &[u8]) -> Result<(), Self::Error> {
        for &byte in data {
            self.write_byte(byte).await?;
        }
        Ok(())
    }
    async fn read_bytes(&self, data: &mut [u8]) -> Result<(), Self::Error> {
        for byte in data {
            *byte = self.read_byte().await?;
        }
        Ok(())
    }
}


/**
    one-wire transceiver over a pulse generation/capture engine

    owns its channel pair exclusively, several transceivers over distinct pin/channel sets
    live independently. operations taken concurrently on one transceiver queue on the
    internal bus lock rather than interleave.
*/
pub struct Transceiver<E, D> {
    session: BusLock<Session<E, D>>,
    timing: TimingProfile,
    tick_ns: u32,
}

impl<E: PulseEngine, D: DelayNs> Transceiver<E, D> {
    /**
        validate the profile, configure the channel pair against the data line and take
        ownership of the engine

        channel identifiers select among the engine's fixed set and are refused out of
        range, the engine itself may still refuse a pair that is already bound.
    */
    pub fn bind(
        mut engine: E,
        delay: D,
        pin: u8,
        tx_channel: u8,
        rx_channel: u8,
        timing: TimingProfile,
    ) -> Result<Self, InitError<E::Error>> {
        timing.validate()?;
        for channel in [tx_channel, rx_channel] {
            if channel >= MAX_CHANNELS
                {return Err(InitError::Channel(channel))}
        }
        if tx_channel == rx_channel
            {return Err(InitError::SharedChannel)}
        engine.configure(pin, tx_channel, rx_channel).map_err(InitError::Engine)?;
        debug!("bus bound to pin {} over channels tx {} rx {}", pin, tx_channel, rx_channel);
        Ok(Self {
            session: BusLock::new(Session::new(engine, delay)),
            timing,
            tick_ns: 1_000,
        })
    }

    /// set the engine tick length used to convert tick counts into wall clock waits
    pub fn with_tick_ns(mut self, tick_ns: u32) -> Self {
        self.tick_ns = tick_ns;
        self
    }

    /// profile currently shaping every slot
    pub fn timing(&self) -> &TimingProfile {
        &self.timing
    }

    /// release both channels and the capture queue, handing the engine back
    pub fn unbind(self) -> E {
        self.session.into_inner().into_engine()
    }

    /// wall clock budget for one capture, the whole frame plus the idle gap and a margin
    fn wait_budget(&self, slot: &[PulseItem]) -> u32 {
        let ticks = slot.iter().map(|item| u32::from(item.duration)).sum::<u32>()
            + u32::from(self.timing.rx_idle_gap)
            + u32::from(CAPTURE_MARGIN);
        ticks.saturating_mul(self.tick_ns) / 1_000
    }
}

impl<E: PulseEngine, D: DelayNs> OneWireBus for Transceiver<E, D> {
    type Error = Error<E::Error>;

    async fn reset(&self) -> Result<Presence, Self::Error> {
        let mut session = self.session.lock().await;
        let slot = pulse::encode_reset(&self.timing);
        let captured = session
            .exchange(&pulse::pack_frame(&slot), self.wait_budget(&slot))
            .await?;
        Ok(pulse::decode_presence(&captured, &self.timing))
    }

    async fn write_bit(&self, bit: bool) -> Result<(), Self::Error> {
        let mut session = self.session.lock().await;
        let slot = pulse::encode_write_bit(&self.timing, bit);
        session.send(&pulse::pack_frame(&slot)).await
    }

    async fn read_bit(&self) -> Result<bool, Self::Error> {
        let mut session = self.session.lock().await;
        let slot = pulse::encode_read_trigger(&self.timing);
        let captured = session
            .exchange(&pulse::pack_frame(&slot), self.wait_budget(&slot))
            .await?;
        Ok(pulse::decode_read_bit(&captured, &self.timing))
    }
}
