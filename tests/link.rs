use anyhow::Result;
use float_cmp::assert_approx_eq;
use hoplink::blocks::HopDemod;
use hoplink::blocks::HopMod;
use hoplink::blocks::PskMod;
use hoplink::blocks::SerAccumulator;
use hoplink::blocks::SlotFrameSource;
use hoplink::hop::FixedClock;
use hoplink::hop::HOP_SEQUENCE_SEED;
use hoplink::hop::HopParameters;
use hoplink::hop::HopSequence;
use hoplink::prelude::*;

const SPH: usize = 2400;

fn params() -> HopParameters {
    HopParameters::new(12000.0, 3000.0, 0.0, 12000.0, 5.0).unwrap()
}

fn sequence() -> HopSequence {
    HopSequence::new(params().num_channels(), HOP_SEQUENCE_SEED).unwrap()
}

fn rx_time(index: usize, t: TimeSpec) -> ItemTag {
    ItemTag::new(index, Tag::NamedTime(RX_TIME.to_string(), t))
}

fn transmit(clock_secs: f64, data: Vec<Complex32>) -> Result<(Vec<Complex32>, TimeSpec)> {
    let clock = FixedClock(TimeSpec::from_secs_f64(clock_secs));
    let hop_mod: HopMod<FixedClock> = HopMod::new(params(), SPH, clock)?;
    let mut tx = Mocker::new(hop_mod);
    tx.output().reserve(data.len());
    let (hopped, tags, _) = tx.process(data, vec![]);
    let start = tags[0].tag.time_named(TX_TIME).unwrap();
    Ok((hopped, start))
}

#[test]
fn tx_starts_at_next_slot() -> Result<()> {
    let clock = FixedClock(TimeSpec::from_secs_f64(0.1));
    let hop_mod: HopMod<FixedClock> = HopMod::new(params(), SPH, clock)?;
    let mut tx = Mocker::new(hop_mod);
    tx.output().reserve(3 * SPH);

    let (out, tags, consumed) = tx.process(vec![Complex32::new(1.0, 0.0); 2 * SPH + 10], vec![]);
    assert_eq!(out.len(), 2 * SPH);
    assert_eq!(consumed, 2 * SPH);
    assert_eq!(
        tags,
        vec![ItemTag::new(
            0,
            Tag::NamedTime(TX_TIME.to_string(), TimeSpec::new(0, 0.2))
        )]
    );

    let hop_mod = tx.kernel();
    let a = hop_mod.alignment().unwrap();
    assert_eq!(a.start_slot, 1);
    assert_eq!(a.hop_count, 1);
    assert_eq!(hop_mod.hops(), 2);
    assert_eq!(hop_mod.hop_count(), 3);
    assert_eq!(hop_mod.next_channel(), sequence().channel(3));

    // the first hop sits on the channel of slot 1
    let table = hop_mod.frequency_table();
    let f = table.frequency(sequence().channel(1));
    let w = 2.0 * std::f64::consts::PI * f / 12000.0;
    assert_approx_eq!(f32, out[1].re, w.cos() as f32, epsilon = 1e-5);
    assert_approx_eq!(f32, out[1].im, w.sin() as f32, epsilon = 1e-5);

    let (_, tags, _) = tx.process(vec![Complex32::new(1.0, 0.0); SPH], vec![]);
    assert!(tags.is_empty());
    Ok(())
}

#[test]
fn both_ends_agree_at_three_tenths() -> Result<()> {
    let p = params();
    assert_eq!(p.num_channels(), 4);
    assert_eq!(sequence().len(), 8);

    // tx armed at 0.1 s transmits its first hop from 0.2 s to 0.4 s
    let clock = FixedClock(TimeSpec::from_secs_f64(0.1));
    let hop_mod: HopMod<FixedClock> = HopMod::new(p, SPH, clock)?;
    let mut tx = Mocker::new(hop_mod);
    let tx_channel = sequence().channel(1);
    tx.process(vec![Complex32::new(1.0, 0.0); SPH], vec![]);
    assert_eq!(tx.kernel().alignment().unwrap().start_slot, 1);

    let demod: HopDemod = HopDemod::new(p)?;
    let mut rx = Mocker::new(demod);
    rx.process(
        vec![Complex32::new(1.0, 0.0)],
        vec![rx_time(0, TimeSpec::from_secs_f64(0.3))],
    );
    assert_eq!(rx.kernel().current_channel(), Some(tx_channel));
    assert_eq!(
        rx.kernel().current_frequency(),
        tx.kernel().frequency_table().frequency(tx_channel)
    );
    Ok(())
}

#[test]
fn rx_locates_its_slot() -> Result<()> {
    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let data = vec![Complex32::new(1.0, 0.0); 1200];
    rx.process(data, vec![rx_time(0, TimeSpec::from_secs_f64(0.3))]);

    let demod = rx.kernel();
    assert!(demod.has_time_reference());
    assert_eq!(demod.sequence_index(), Some(1));
    assert_eq!(demod.current_channel(), Some(sequence().channel(1)));
    assert_eq!(demod.hop_count(), 0);
    assert_approx_eq!(f64, demod.slot_state().elapsed_samples, 2400.0, epsilon = 1e-6);

    rx.process(vec![Complex32::new(1.0, 0.0)], vec![]);
    let demod = rx.kernel();
    assert_eq!(demod.hop_count(), 1);
    assert_eq!(demod.sequence_index(), Some(2));
    assert_eq!(demod.current_channel(), Some(sequence().channel(2)));
    Ok(())
}

#[test]
fn tx_and_rx_select_same_channels() -> Result<()> {
    let clock = FixedClock(TimeSpec::from_secs_f64(0.1));
    let hop_mod: HopMod<FixedClock> = HopMod::new(params(), SPH, clock)?;
    let mut tx = Mocker::new(hop_mod);
    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);

    // tx starts in slot 1, the radio stamps the first received sample with its start
    let mut tags = vec![rx_time(0, TimeSpec::from_secs_f64(0.2))];
    let seq = sequence();
    for hop in 0..12 {
        let (hopped, _, _) = tx.process(vec![Complex32::new(1.0, 0.0); SPH], vec![]);
        rx.process(hopped, std::mem::take(&mut tags));
        assert_eq!(tx.kernel().hop_count(), (2 + hop) % seq.len());
        assert_eq!(rx.kernel().current_channel(), Some(seq.channel(1 + hop)), "hop {hop}");
    }
    Ok(())
}

#[test]
fn round_trip_restores_baseband() -> Result<()> {
    let data: Vec<Complex32> = (0..4 * SPH)
        .map(|i| Complex32::from_polar(1.0, (i % 13) as f32 * 0.4))
        .collect();
    let (hopped, start) = transmit(17.93, data.clone())?;
    assert_eq!(hopped.len(), data.len());

    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let (baseband, _, _) = rx.process(hopped, vec![rx_time(0, start)]);

    assert_eq!(baseband.len(), data.len());
    for (y, x) in baseband.iter().zip(data.iter()) {
        assert_approx_eq!(f32, y.re, x.re, epsilon = 1e-3);
        assert_approx_eq!(f32, y.im, x.im, epsilon = 1e-3);
    }
    Ok(())
}

#[test]
fn chunked_input_matches_single_pass() -> Result<()> {
    let data: Vec<Complex32> = (0..3 * SPH)
        .map(|i| Complex32::from_polar(1.0, (i % 11) as f32 * 0.5))
        .collect();
    let (hopped, start) = transmit(4.37, data)?;

    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let (whole, _, _) = rx.process(hopped.clone(), vec![rx_time(0, start)]);

    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let mut chunked = Vec::new();
    for (c, chunk) in hopped.chunks(1000).enumerate() {
        let mut tags = vec![ItemTag::new(chunk.len() / 3, Tag::Id(c as u64))];
        if c == 0 {
            tags.push(rx_time(0, start));
        }
        let (out, _, consumed) = rx.process(chunk.to_vec(), tags);
        assert_eq!(consumed, chunk.len());
        chunked.extend(out);
    }

    assert_eq!(chunked.len(), whole.len());
    for (a, b) in chunked.iter().zip(whole.iter()) {
        assert_approx_eq!(f32, a.re, b.re, epsilon = 1e-4);
        assert_approx_eq!(f32, a.im, b.im, epsilon = 1e-4);
    }
    Ok(())
}

#[test]
fn late_reference_locks_phase_at_next_hop() -> Result<()> {
    let (hopped, start) = transmit(0.1, vec![Complex32::new(1.0, 0.0); 2 * SPH])?;

    // the radio stamps a sample in the middle of the first hop
    let late = TimeSpec::from_nanos(start.as_nanos() + 50_000_000);
    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let (baseband, _, _) = rx.process(hopped[600..].to_vec(), vec![rx_time(0, late)]);

    // right channel but unknown phase until the hop boundary
    let first = baseband[0];
    for y in &baseband[..SPH - 600] {
        assert_approx_eq!(f32, y.re, first.re, epsilon = 1e-3);
        assert_approx_eq!(f32, y.im, first.im, epsilon = 1e-3);
    }
    for y in &baseband[SPH - 600..] {
        assert_approx_eq!(f32, y.re, 1.0, epsilon = 1e-3);
        assert_approx_eq!(f32, y.im, 0.0, epsilon = 1e-3);
    }
    Ok(())
}

#[test]
fn passes_through_without_reference() -> Result<()> {
    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let data: Vec<Complex32> = (0..10).map(|i| Complex32::new(i as f32, 1.0)).collect();
    let (out, _, _) = rx.process(data.clone(), vec![]);

    assert_eq!(out, data);
    assert_eq!(rx.kernel().passthrough_samples(), 10);
    assert_eq!(rx.kernel().current_channel(), None);
    assert_eq!(rx.kernel().current_frequency(), 0.0);
    Ok(())
}

#[test]
fn malformed_rx_time_is_ignored() -> Result<()> {
    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let bad = ItemTag::new(2, Tag::NamedF64(RX_TIME.to_string(), 0.3));
    let (out, tags, _) = rx.process(vec![Complex32::new(1.0, 1.0); 5], vec![bad.clone()]);

    assert_eq!(out, vec![Complex32::new(1.0, 1.0); 5]);
    assert_eq!(tags, vec![bad]);
    assert_eq!(rx.kernel().malformed_tags(), 1);
    assert!(!rx.kernel().has_time_reference());
    Ok(())
}

#[test]
fn tags_keep_their_positions() -> Result<()> {
    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    rx.output().reserve(6);
    let tags = vec![
        rx_time(1, TimeSpec::from_secs_f64(5.0)),
        ItemTag::new(4, Tag::NamedF64(PHASE_EST.to_string(), 0.25)),
        ItemTag::new(7, Tag::Id(9)),
    ];
    rx.input().set_with_tags(vec![Complex32::new(1.0, 0.0); 8], tags.clone());
    rx.run();

    let (out, out_tags) = rx.output().take();
    assert_eq!(out.len(), 6);
    assert_eq!(out_tags, tags[..2].to_vec());
    assert_eq!(rx.input().slice_with_tags().1, &vec![ItemTag::new(1, Tag::Id(9))]);
    Ok(())
}

#[test]
fn symbols_survive_the_link() -> Result<()> {
    const OS: usize = 5;
    const FRAMES: u64 = 3;

    let src: SlotFrameSource = SlotFrameSource::new(5, 4, 99)?.with_max_frames(FRAMES);
    let frame_len = src.frame_len();
    let mut src = Mocker::new(src);
    src.output().reserve(FRAMES as usize * frame_len);
    src.run();
    let (symbols, _) = src.output().take();

    let psk: PskMod = PskMod::new(5, 4, OS)?;
    assert_eq!(psk.frame_samples(), SPH);
    let constellation = psk.constellation().clone();
    let mut psk = Mocker::new(psk);
    let (baseband, _, _) = psk.process(symbols.clone(), vec![]);

    let (hopped, start) = transmit(1234.5, baseband)?;
    let demod: HopDemod = HopDemod::new(params())?;
    let mut rx = Mocker::new(demod);
    let (received, _, _) = rx.process(hopped, vec![rx_time(0, start)]);

    let mut decided = Vec::new();
    let mut boundaries = Vec::new();
    for f in 0..FRAMES as usize {
        boundaries.push(ItemTag::new(
            decided.len(),
            Tag::NamedF64(PHASE_EST.to_string(), 0.0),
        ));
        for k in 0..frame_len {
            decided.push(constellation.decide(received[f * SPH + k * OS + OS / 2]));
        }
    }
    assert_eq!(decided, symbols);

    let ser: SerAccumulator = SerAccumulator::from_reference(symbols[..frame_len].to_vec())?;
    let mut ser = Mocker::new(ser);
    ser.input().set_with_tags(decided, boundaries);
    ser.run();
    assert_eq!(ser.kernel().total_frames(), FRAMES);
    assert_eq!(ser.kernel().rolling_average(), Some(0.0));
    assert_eq!(ser.kernel().current_frame_ser(), Some(0.0));
    Ok(())
}
