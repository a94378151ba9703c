/*!
    capture session driving one operation through the engine

    this is the tricky part of the crate: the same wait on the capture queue must tell a
    normally ended capture (the idle gap, reported as a terminator word or as silence after
    some edges) apart from a channel that never saw the line at all.
*/

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use log::*;

use crate::{
    bus::Error,
    engine::PulseEngine,
    pulse::{self, PulseSeq, RawPulse},
    };


/// ticks granted past the idle gap before a capture wait is declared dead
pub(crate) const CAPTURE_MARGIN: u16 = 1_000;


#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    /// channel pair configured but dormant
    Idle,
    /// a frame has been handed to the transmit channel
    Triggered,
    /// hardware is generating and capturing, we block on the queue
    Capturing,
    /// a complete batch arrived and goes to the codec
    Draining,
}

pub(crate) struct Session<E, D> {
    engine: E,
    delay: D,
    state: State,
}

impl<E: PulseEngine, D: DelayNs> Session<E, D> {
    pub(crate) fn new(engine: E, delay: D) -> Self {
        Self {engine, delay, state: State::Idle}
    }

    pub(crate) fn into_engine(mut self) -> E {
        self.engine.release();
        self.engine
    }

    fn enter(&mut self, next: State) {
        trace!("capture session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// fire a frame without observing the line, resolves once generation completed
    pub(crate) async fn send(&mut self, frame: &[RawPulse]) -> Result<(), Error<E::Error>> {
        self.enter(State::Triggered);
        let sent = self.engine.transmit(frame).await;
        self.enter(State::Idle);
        sent.map_err(Error::Engine)
    }

    /// fire a frame with the receive channel armed and drain the resulting capture batch
    pub(crate) async fn exchange(&mut self, frame: &[RawPulse], timeout_us: u32)
        -> Result<PulseSeq, Error<E::Error>>
    {
        if let Err(fault) = self.engine.arm()
            {return Err(Error::Engine(fault))}
        self.enter(State::Triggered);
        if let Err(fault) = self.engine.transmit(frame).await {
            self.enter(State::Idle);
            return Err(Error::Engine(fault));
        }
        self.enter(State::Capturing);
        let drained = self.drain(timeout_us).await;
        self.enter(State::Idle);
        drained
    }

    async fn drain(&mut self, timeout_us: u32) -> Result<PulseSeq, Error<E::Error>> {
        let mut batch = PulseSeq::new();
        loop {
            match select(self.engine.capture(), self.delay.delay_us(timeout_us)).await {
                Either::First(Ok(word)) => {
                    if pulse::unpack_into(&mut batch, word) {
                        // terminator half, the idle gap ended the capture
                        break
                    }
                }
                Either::First(Err(fault)) => return Err(Error::Engine(fault)),
                Either::Second(()) => {
                    if batch.is_empty() {
                        // nothing at all in the extended wait, the channel never saw the line
                        return Err(Error::CaptureTimeout);
                    }
                    // edges then silence is the idle gap itself, the operation is done
                    break
                }
            }
        }
        self.enter(State::Draining);
        debug!("captured {} edges", batch.len());
        Ok(batch)
    }
}
