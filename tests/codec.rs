use onepulse::{
    pulse::{self, Presence, PulseItem, PulseSeq, RawPulse},
    timing::{self, TimingError, TimingProfile},
    };


#[test]
fn canonical_profiles_validate() {
    timing::STANDARD.validate().unwrap();
    timing::OVERDRIVE.validate().unwrap();
}

#[test]
fn rejects_inverted_write_slots() {
    let inverted = TimingProfile {write_1_low: 60, write_0_low: 6, ..timing::STANDARD};
    assert_eq!(inverted.validate(), Err(TimingError::SlotOrder));

    let flat = TimingProfile {write_1_low: 60, ..timing::STANDARD};
    assert_eq!(flat.validate(), Err(TimingError::SlotOrder));
}

#[test]
fn rejects_zero_durations() {
    let dead_reset = TimingProfile {reset_low: 0, ..timing::STANDARD};
    assert_eq!(dead_reset.validate(), Err(TimingError::ZeroDuration));

    let dead_sample = TimingProfile {sample_offset: 0, ..timing::OVERDRIVE};
    assert_eq!(dead_sample.validate(), Err(TimingError::ZeroDuration));
}

#[test]
fn rejects_sample_past_idle_gap() {
    let late = TimingProfile {sample_offset: 80, ..timing::STANDARD};
    assert_eq!(late.validate(), Err(TimingError::SampleBeyondGap));

    let edge = TimingProfile {sample_offset: 72, ..timing::STANDARD};
    assert_eq!(edge.validate(), Err(TimingError::SampleBeyondGap));
}

#[test]
fn rejects_sample_outside_response_window() {
    let early = TimingProfile {sample_offset: 6, ..timing::STANDARD};
    assert_eq!(early.validate(), Err(TimingError::SampleWindow));

    let late = TimingProfile {sample_offset: 60, ..timing::STANDARD};
    assert_eq!(late.validate(), Err(TimingError::SampleWindow));
}

#[test]
fn rejects_short_idle_gap() {
    let short = TimingProfile {rx_idle_gap: 50, ..timing::STANDARD};
    assert_eq!(short.validate(), Err(TimingError::IdleGapTooShort));
}

#[test]
fn standard_write_slot_shapes() {
    assert_eq!(
        pulse::encode_write_bit(&timing::STANDARD, true),
        [PulseItem::low(6), PulseItem::high(64)],
        );
    assert_eq!(
        pulse::encode_write_bit(&timing::STANDARD, false),
        [PulseItem::low(60), PulseItem::high(10)],
        );
}

#[test]
fn reset_holds_line_through_the_idle_gap() {
    let slot = pulse::encode_reset(&timing::STANDARD);
    assert_eq!(slot[0], PulseItem::low(480));
    assert!(slot[1].duration >= 72);
}

#[test]
fn read_slot_opens_like_a_write_1() {
    let trigger = pulse::encode_read_trigger(&timing::STANDARD);
    let write_1 = pulse::encode_write_bit(&timing::STANDARD, true);
    assert_eq!(trigger[0], write_1[0]);
}

#[test]
fn write_slot_loopback_decodes_back() {
    for profile in [timing::STANDARD, timing::OVERDRIVE] {
        for bit in [false, true] {
            let slot = pulse::encode_write_bit(&profile, bit);
            assert_eq!(pulse::decode_read_bit(&slot, &profile), bit);
        }
    }
}

#[test]
fn presence_pulse_after_release_reads_present() {
    // responder pulls low 510 ticks in, within the post-reset window
    let captured = [
        PulseItem::low(480),
        PulseItem::high(30),
        PulseItem::low(120),
        PulseItem::high(72),
    ];
    assert_eq!(pulse::decode_presence(&captured, &timing::STANDARD), Presence::Present);
}

#[test]
fn silence_after_reset_reads_absent() {
    let captured = [PulseItem::low(480), PulseItem::high(72)];
    assert_eq!(pulse::decode_presence(&captured, &timing::STANDARD), Presence::Absent);
}

#[test]
fn only_lows_after_the_reset_count() {
    // a single stretched low merging our own drive never left the line after the reset
    let merged = [PulseItem::low(500), PulseItem::high(72)];
    assert_eq!(pulse::decode_presence(&merged, &timing::STANDARD), Presence::Absent);

    // noise glitches around the presence pulse are tolerated, the first qualifying low wins
    let noisy = [
        PulseItem::low(480),
        PulseItem::high(10),
        PulseItem::low(5),
        PulseItem::high(5),
        PulseItem::low(30),
        PulseItem::high(72),
    ];
    assert_eq!(pulse::decode_presence(&noisy, &timing::STANDARD), Presence::Present);
}

#[test]
fn empty_capture_reads_released_line() {
    assert!(pulse::decode_read_bit(&[], &timing::STANDARD));
}

#[test]
fn frames_always_end_on_a_terminator() {
    let even = pulse::pack_frame(&[PulseItem::low(6), PulseItem::high(64)]);
    assert_eq!(even.len(), 2);
    assert_eq!(even[1], RawPulse::end_marker());

    // an odd trailing segment carries the terminator in its second half
    let odd = pulse::pack_frame(&[PulseItem::low(480), PulseItem::high(72), PulseItem::low(120)]);
    assert_eq!(odd.len(), 2);
    assert_eq!(odd[1].halves()[1].duration, 0);

    let mut batch = PulseSeq::new();
    for &word in &odd {
        if pulse::unpack_into(&mut batch, word)
            {break}
    }
    assert_eq!(
        batch.as_slice(),
        [PulseItem::low(480), PulseItem::high(72), PulseItem::low(120)],
        );
}
