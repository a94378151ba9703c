/*!
    slot timing profiles for the bus

    every duration is counted in engine ticks, nominally one microsecond. a profile is
    validated once when a bus is bound, invalid profiles are refused rather than clamped.
*/

use thiserror::Error;

use crate::pulse::MAX_PULSE_TICKS;


/// durations shaping every slot on the wire
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimingProfile {
    /// low phase of the reset pulse
    pub reset_low: u16,
    /// low phase of a write-1 slot, also opens every read slot
    pub write_1_low: u16,
    /// high phase completing a write-1 slot
    pub write_1_high: u16,
    /// low phase of a write-0 slot
    pub write_0_low: u16,
    /// high phase completing a write-0 slot
    pub write_0_high: u16,
    /// offset from read slot start at which the line level is taken
    pub sample_offset: u16,
    /// idle hold ending a capture, must outlast every single slot phase
    pub rx_idle_gap: u16,
}

/// regular speed grade
pub const STANDARD: TimingProfile = TimingProfile {
    reset_low: 480,
    write_1_low: 6,
    write_1_high: 64,
    write_0_low: 60,
    write_0_high: 10,
    sample_offset: 13,
    rx_idle_gap: 72,
};

/// same slot shapes, roughly ten times faster
pub const OVERDRIVE: TimingProfile = TimingProfile {
    reset_low: 70,
    write_1_low: 1,
    write_1_high: 8,
    write_0_low: 8,
    write_0_high: 3,
    sample_offset: 3,
    rx_idle_gap: 13,
};


/// reason a profile was refused at bind time
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimingError {
    #[error("every duration must be nonzero")]
    ZeroDuration,
    #[error("duration exceeds the engine's pulse range")]
    OutOfRange,
    #[error("a write-1 low phase must be shorter than a write-0 low phase")]
    SlotOrder,
    #[error("sample offset must fall before the idle gap elapses")]
    SampleBeyondGap,
    #[error("sample offset must fall inside the read slot response window")]
    SampleWindow,
    #[error("idle gap must outlast every write slot phase")]
    IdleGapTooShort,
}

impl TimingProfile {
    /// check the profile invariants, called once when binding a bus
    pub fn validate(&self) -> Result<(), TimingError> {
        let durations = [
            self.reset_low,
            self.write_1_low,
            self.write_1_high,
            self.write_0_low,
            self.write_0_high,
            self.sample_offset,
            self.rx_idle_gap,
            ];
        if durations.iter().any(|&duration| duration == 0)
            {return Err(TimingError::ZeroDuration)}
        if durations.iter().any(|&duration| duration > MAX_PULSE_TICKS)
            {return Err(TimingError::OutOfRange)}
        if self.write_1_low >= self.write_0_low
            {return Err(TimingError::SlotOrder)}
        if self.sample_offset >= self.rx_idle_gap
            {return Err(TimingError::SampleBeyondGap)}
        // the sample must land after our own release and before a responder's 0 ends
        if self.sample_offset <= self.write_1_low || self.sample_offset >= self.write_0_low
            {return Err(TimingError::SampleWindow)}
        let longest = self.write_1_low
            .max(self.write_1_high)
            .max(self.write_0_low)
            .max(self.write_0_high);
        if self.rx_idle_gap <= longest
            {return Err(TimingError::IdleGapTooShort)}
        Ok(())
    }
}
