/*!
    software model of the engine and the line

    drives the transceiver without the peripheral: transmitted frames are classified
    against the bound profile and answered the way an open-drain line with at most one
    responder would, delivered back through the same bounded queue discipline the hardware
    uses. the knobs on [SimEngine] exercise the failure branches a healthy line never takes.
*/

use core::{
    convert::Infallible,
    future::poll_fn,
    task::Poll,
    };
use std::{
    collections::VecDeque,
    vec,
    vec::Vec,
    };
use embedded_hal_async::delay::DelayNs;

use crate::{
    engine::PulseEngine,
    pulse::{self, PulseItem, PulseSeq, RawPulse},
    timing::TimingProfile,
    };


/// scripted responder hanging on the simulated line
pub struct SimDevice {
    /// ticks between the reset release and the presence pulse
    pub presence_delay: u16,
    /// ticks the presence pulse is held
    pub presence_hold: u16,
    /// feed every observed write bit back into the response queue
    pub echo: bool,
    /// bits served to coming read slots, the line is left released when empty
    pub respond: VecDeque<bool>,
    /// write bits observed so far
    pub written: Vec<bool>,
}
impl SimDevice {
    pub fn new(presence_delay: u16, presence_hold: u16) -> Self {
        Self {
            presence_delay,
            presence_hold,
            echo: false,
            respond: VecDeque::new(),
            written: Vec::new(),
        }
    }
    /// answer read slots with the bits previously written to the device
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }
}


/// simulated channel pair and line
pub struct SimEngine {
    timing: TimingProfile,
    device: Option<SimDevice>,
    queue: VecDeque<RawPulse>,
    armed: bool,
    mute: bool,
    drop_terminator: bool,
}

impl SimEngine {
    pub fn new(timing: TimingProfile) -> Self {
        Self {
            timing,
            device: None,
            queue: VecDeque::new(),
            armed: false,
            mute: false,
            drop_terminator: false,
        }
    }
    /// hang a responder on the line
    pub fn attach(mut self, device: SimDevice) -> Self {
        self.device = Some(device);
        self
    }
    /// capture channel that never delivers, for exercising the hard timeout
    pub fn muted(mut self) -> Self {
        self.mute = true;
        self
    }
    /// withhold the terminator word so captures end on silence instead
    pub fn without_terminator(mut self) -> Self {
        self.drop_terminator = true;
        self
    }
    pub fn device(&self) -> Option<&SimDevice> {
        self.device.as_ref()
    }

    /// a slot fired with the receive channel dormant can only be a write slot
    fn observe_write(&mut self, slot: &[PulseItem]) {
        let Some(first) = slot.first() else {return};
        let Some(device) = self.device.as_mut() else {return};
        let bit = first.duration < self.timing.write_0_low;
        device.written.push(bit);
        if device.echo {
            device.respond.push_back(bit);
        }
    }

    /// what the receive channel sees on the line for one transmitted slot
    fn line_response(&mut self, slot: &[PulseItem]) -> Vec<PulseItem> {
        let Some(first) = slot.first() else {return Vec::new()};
        let gap = self.timing.rx_idle_gap;
        if first.duration >= self.timing.reset_low {
            // reset pulse, a responder answers with its presence pulse after the release
            match &self.device {
                Some(device) => vec![
                    PulseItem::low(first.duration),
                    PulseItem::high(device.presence_delay),
                    PulseItem::low(device.presence_hold),
                    PulseItem::high(gap),
                ],
                None => vec![
                    PulseItem::low(first.duration),
                    PulseItem::high(gap),
                ],
            }
        }
        else {
            // read slot, a responder answering 0 stretches the low phase
            let bit = self.device.as_mut()
                .and_then(|device| device.respond.pop_front())
                .unwrap_or(true);
            if bit {
                vec![
                    PulseItem::low(first.duration),
                    PulseItem::high(gap),
                ]
            }
            else {
                vec![
                    PulseItem::low(self.timing.write_0_low),
                    PulseItem::high(gap),
                ]
            }
        }
    }
}

impl PulseEngine for SimEngine {
    type Error = Infallible;

    fn configure(&mut self, _pin: u8, _tx_channel: u8, _rx_channel: u8) -> Result<(), Infallible> {
        Ok(())
    }

    fn arm(&mut self) -> Result<(), Infallible> {
        self.armed = true;
        Ok(())
    }

    async fn transmit(&mut self, frame: &[RawPulse]) -> Result<(), Infallible> {
        let mut slot = PulseSeq::new();
        for &word in frame {
            if pulse::unpack_into(&mut slot, word)
                {break}
        }
        if !self.armed {
            self.observe_write(&slot);
            return Ok(())
        }
        self.armed = false;
        if self.mute
            {return Ok(())}
        let captured = self.line_response(&slot);
        for pair in captured.chunks(2) {
            let second = pair.get(1).copied().unwrap_or(PulseItem::END);
            self.queue.push_back(RawPulse::pack(pair[0], second));
        }
        if !self.drop_terminator {
            self.queue.push_back(RawPulse::end_marker());
        }
        Ok(())
    }

    async fn capture(&mut self) -> Result<RawPulse, Infallible> {
        poll_fn(|context| match self.queue.pop_front() {
            Some(word) => Poll::Ready(Ok(word)),
            None => {
                // the queue only fills on a transmit, keep the task scheduled anyway
                context.waker().wake_by_ref();
                Poll::Pending
            }
            }).await
    }

    fn release(&mut self) {
        self.queue.clear();
        self.armed = false;
    }
}


/**
    delay counted in executor polls instead of wall time

    the simulated engine resolves everything it ever will at transmit time, so a real
    clock would only slow tests down. scaled with the requested wait so longer budgets
    still outlast shorter ones.
*/
pub struct SimDelay;

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        let mut budget = (ns / 1_000_000).max(8);
        poll_fn(|context| {
            if budget == 0
                {return Poll::Ready(())}
            budget -= 1;
            context.waker().wake_by_ref();
            Poll::Pending
            }).await
    }
}
