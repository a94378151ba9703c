/*!
    pulse codec for the bus

    pure functions translating logical operations (reset, write bit, read trigger) into the
    pulse trains the engine generates, and captured edge sequences back into logical outcomes.
    [RawPulse] is the packed word the engine itself exchanges, two line segments per word.
*/

use bilge::prelude::*;
use log::warn;

use crate::timing::TimingProfile;


/// largest duration one packed pulse half can carry
pub const MAX_PULSE_TICKS: u16 = 0x7fff;
/// most edges one capture batch can hold
pub const MAX_PULSES: usize = 24;
/// most packed words one transmit frame can hold, terminator included
pub const FRAME_WORDS: usize = MAX_PULSES / 2 + 1;

/// edges captured during one operation
pub type PulseSeq = heapless::Vec<PulseItem, MAX_PULSES>;
/// packed words handed to the transmit channel in one trigger
pub type Frame = heapless::Vec<RawPulse, FRAME_WORDS>;


/// line level of one pulse segment
#[bitsize(1)]
#[derive(Copy, Clone, FromBits, Debug, PartialEq)]
pub enum Level {
    Low = 0,
    High = 1,
}

/// one line level held for a number of ticks, the atomic unit exchanged with the engine
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PulseItem {
    pub level: Level,
    pub duration: u16,
}
impl PulseItem {
    /// zero-length half, ends whatever frame or batch it appears in
    pub const END: Self = Self {level: Level::Low, duration: 0};

    pub const fn low(duration: u16) -> Self {
        Self {level: Level::Low, duration}
    }
    pub const fn high(duration: u16) -> Self {
        Self {level: Level::High, duration}
    }
}

/// packed engine word carrying two pulse segments
#[bitsize(32)]
#[derive(Copy, Clone, FromBits, DebugBits, PartialEq)]
pub struct RawPulse {
    pub duration0: u15,
    pub level0: Level,
    pub duration1: u15,
    pub level1: Level,
}
impl RawPulse {
    /// word of two zero-length halves, generation stops at the first one
    pub fn end_marker() -> Self {
        Self::from(0u32)
    }
    /// pack two segments into one engine word
    pub fn pack(first: PulseItem, second: PulseItem) -> Self {
        Self::new(
            u15::new(first.duration.min(MAX_PULSE_TICKS)),
            first.level,
            u15::new(second.duration.min(MAX_PULSE_TICKS)),
            second.level,
            )
    }
    /// both segments of this word, in wire order
    pub fn halves(self) -> [PulseItem; 2] {
        [
            PulseItem {level: self.level0(), duration: self.duration0().value()},
            PulseItem {level: self.level1(), duration: self.duration1().value()},
        ]
    }
}


/// outcome of a reset pulse
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Presence {
    /// at least one responder pulled the line low after the reset release
    Present,
    /// the idle gap elapsed with no responder activity, a normal result on an empty bus
    Absent,
}


/// reset pulse followed by the released line held long enough to capture a presence answer
pub fn encode_reset(timing: &TimingProfile) -> [PulseItem; 2] {
    [
        PulseItem::low(timing.reset_low),
        PulseItem::high(timing.rx_idle_gap),
    ]
}

/// one write slot, the bit value selects how long the line is held low
pub fn encode_write_bit(timing: &TimingProfile, bit: bool) -> [PulseItem; 2] {
    if bit {
        [
            PulseItem::low(timing.write_1_low),
            PulseItem::high(timing.write_1_high),
        ]
    }
    else {
        [
            PulseItem::low(timing.write_0_low),
            PulseItem::high(timing.write_0_high),
        ]
    }
}

/// opens a read slot exactly like a write-1 slot, leaving responders room to drive a 0
pub fn encode_read_trigger(timing: &TimingProfile) -> [PulseItem; 2] {
    [
        PulseItem::low(timing.write_1_low),
        PulseItem::high(timing.write_1_high),
    ]
}

/**
    scan a captured reset for a presence answer

    only a low segment beginning strictly after the reset pulse and before the idle gap
    elapses counts, so our own drive and trailing noise are both ignored.
*/
pub fn decode_presence(captured: &[PulseItem], timing: &TimingProfile) -> Presence {
    let open = u32::from(timing.reset_low);
    let close = open + u32::from(timing.rx_idle_gap);
    let mut elapsed = 0u32;
    for item in captured {
        if item.level == Level::Low && elapsed > open && elapsed < close
            {return Presence::Present}
        elapsed += u32::from(item.duration);
    }
    Presence::Absent
}

/**
    line level at the sample offset of a captured read slot

    a capture that ends before the sample point means the line was released, which reads
    high, hence 1.
*/
pub fn decode_read_bit(captured: &[PulseItem], timing: &TimingProfile) -> bool {
    let sample = u32::from(timing.sample_offset);
    let mut elapsed = 0u32;
    for item in captured {
        elapsed += u32::from(item.duration);
        if sample < elapsed
            {return item.level == Level::High}
    }
    true
}


/// pack a pulse train into engine words, closing it with a terminator
pub fn pack_frame(items: &[PulseItem]) -> Frame {
    let mut frame = Frame::new();
    let mut pairs = items.chunks_exact(2);
    for pair in &mut pairs {
        frame.push(RawPulse::pack(pair[0], pair[1])).ok();
    }
    match pairs.remainder() {
        // an odd trailing segment gets the terminator as its second half
        [last] => {frame.push(RawPulse::pack(*last, PulseItem::END)).ok();}
        _ => {frame.push(RawPulse::end_marker()).ok();}
    }
    frame
}

/**
    append the segments of one captured word to a batch

    returns true once the batch is complete, either on the engine's zero-length
    terminator or when the batch is full (excess edges are noise and dropped).
*/
pub fn unpack_into(batch: &mut PulseSeq, word: RawPulse) -> bool {
    for item in word.halves() {
        if item.duration == 0
            {return true}
        if batch.push(item).is_err() {
            warn!("capture batch full, dropping further edges");
            return true
        }
    }
    false
}
