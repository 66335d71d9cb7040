use anyhow::Result;
use float_cmp::assert_approx_eq;
use hoplink::blocks::SerAccumulator;
use hoplink::runtime::Error;
use hoplink::runtime::ItemTag;
use hoplink::runtime::Mocker;
use hoplink::runtime::PHASE_EST;
use hoplink::runtime::Tag;
use hoplink::runtime::buffer::CpuBufferReader;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const F: usize = 8;

fn reference() -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    (0..F).map(|_| rng.random_range(0..4u8)).collect()
}

fn boundaries(frames: usize, len: usize) -> Vec<ItemTag> {
    (0..frames)
        .map(|f| ItemTag::new(f * len, Tag::NamedF64(PHASE_EST.to_string(), 0.0)))
        .collect()
}

fn repeated(r: &[u8], times: usize) -> Vec<u8> {
    r.iter().copied().cycle().take(r.len() * times).collect()
}

#[test]
fn matching_frames_have_zero_ser() -> Result<()> {
    let r = reference();
    let ser: SerAccumulator = SerAccumulator::from_reference(r.clone())?;
    let mut mocker = Mocker::new(ser);
    mocker.input().set_with_tags(repeated(&r, 4), boundaries(4, F));
    mocker.run();

    let ser = mocker.kernel();
    assert_eq!(ser.total_frames(), 4);
    assert_eq!(ser.history().collect::<Vec<_>>(), vec![0.0; 3]);
    assert_eq!(ser.current_frame_ser(), Some(0.0));
    assert_eq!(ser.rolling_average(), Some(0.0));
    assert_eq!(ser.desync_samples(), 0);
    Ok(())
}

#[test]
fn mismatches_count_per_frame() -> Result<()> {
    let r = reference();
    let mut input = repeated(&r, 4);
    input[F + 1] ^= 0x01;
    input[F + 5] ^= 0x02;
    input[F + 6] ^= 0x03;

    let ser: SerAccumulator = SerAccumulator::from_reference(r)?;
    let mut mocker = Mocker::new(ser);
    mocker.input().set_with_tags(input, boundaries(4, F));
    mocker.run();

    let history: Vec<f64> = mocker.kernel().history().collect();
    assert_eq!(history.len(), 3);
    assert_approx_eq!(f64, history[0], 0.0);
    assert_approx_eq!(f64, history[1], 3.0 / F as f64);
    assert_approx_eq!(f64, history[2], 0.0);
    assert_approx_eq!(f64, mocker.kernel().rolling_average().unwrap(), 1.0 / F as f64);
    Ok(())
}

#[test]
fn output_emits_average_before_closing_frame() -> Result<()> {
    let r = reference();
    let mut input = repeated(&r, 3);
    input[F] ^= 0x01;
    input[F + 1] ^= 0x01;

    let ser: SerAccumulator = SerAccumulator::from_reference(r)?.with_output();
    let mut mocker = Mocker::new(ser);
    mocker.output().reserve(16);
    mocker.input().set_with_tags(input, boundaries(3, F));
    mocker.input().push_with_tags(vec![0], boundaries(1, 1));
    mocker.run();

    // nothing at the first boundary, the first frame on its own at the second, then
    // the mean of the frames closed before each boundary
    let (out, _) = mocker.output().get();
    assert_eq!(out.len(), 3);
    assert_approx_eq!(f32, out[0], 0.0);
    assert_approx_eq!(f32, out[1], 0.0);
    assert_approx_eq!(f32, out[2], 0.125);
    Ok(())
}

#[test]
fn stops_when_output_is_full() -> Result<()> {
    let r = reference();
    let ser: SerAccumulator = SerAccumulator::from_reference(r.clone())?.with_output();
    let mut mocker = Mocker::new(ser);
    mocker.output().reserve(1);
    mocker.input().set_with_tags(repeated(&r, 3), boundaries(3, F));
    mocker.run();

    assert_eq!(mocker.output().get().0.len(), 1);
    assert_eq!(mocker.kernel().total_frames(), 2);
    assert_eq!(mocker.input().slice().len(), F);
    assert_eq!(mocker.input().slice_with_tags().1[0].index, 0);

    mocker.output().reserve(4);
    mocker.run();
    assert_eq!(mocker.output().get().0.len(), 2);
    assert_eq!(mocker.kernel().total_frames(), 3);
    Ok(())
}

#[test]
fn samples_past_reference_are_excluded() -> Result<()> {
    let r = reference();
    let mut input = repeated(&r, 1);
    input.extend_from_slice(&[0xff; 4]);

    let ser: SerAccumulator = SerAccumulator::from_reference(r)?;
    let mut mocker = Mocker::new(ser);
    mocker.input().set_with_tags(input, boundaries(1, F));
    mocker.run();

    assert_eq!(mocker.kernel().desync_samples(), 4);
    assert_eq!(mocker.kernel().current_frame_ser(), Some(0.0));
    Ok(())
}

#[test]
fn reports_every_hundred_frames() -> Result<()> {
    let r = vec![1u8, 2];
    let ser: SerAccumulator = SerAccumulator::from_reference(r.clone())?;
    let mut mocker = Mocker::new(ser);
    mocker.input().set_with_tags(repeated(&r, 100), boundaries(100, 2));
    mocker.run();

    let report = mocker.kernel().last_report().unwrap();
    assert_eq!(report.total_frames, 100);
    assert_eq!(report.frames_averaged, 99);
    assert_approx_eq!(f64, report.average, 0.0);

    mocker.input().set_with_tags(repeated(&r, 150), boundaries(150, 2));
    mocker.run();
    assert_eq!(mocker.kernel().total_frames(), 250);
    assert_eq!(mocker.kernel().history().count(), 100);
    assert_eq!(mocker.kernel().last_report().unwrap().total_frames, 200);
    Ok(())
}

#[test]
fn eviction_drops_oldest_frame() -> Result<()> {
    let r = reference();
    let ser: SerAccumulator = SerAccumulator::from_reference(r.clone())?;
    let mut mocker = Mocker::new(ser);

    // frame 1 all wrong, frames 2..=101 clean
    let mut data: Vec<u8> = r.iter().map(|s| (s + 1) % 4).collect();
    data.extend(repeated(&r, 100));
    mocker.input().set_with_tags(data, boundaries(101, F));
    mocker.run();

    let ser = mocker.kernel();
    assert_eq!(ser.history().count(), 100);
    assert_eq!(ser.history().next(), Some(1.0));
    assert_approx_eq!(f64, ser.rolling_average().unwrap(), 0.01);

    // closing frame 101 pushes frame 1 out
    mocker.input().push_with_tags(r.clone(), boundaries(1, F));
    mocker.run();

    let ser = mocker.kernel();
    assert_eq!(ser.history().count(), 100);
    assert!(ser.history().all(|s| s == 0.0));
    assert_eq!(ser.rolling_average(), Some(0.0));
    Ok(())
}

#[test]
fn custom_boundary_key() -> Result<()> {
    let r = reference();
    let ser: SerAccumulator = SerAccumulator::from_reference(r.clone())?.with_boundary_key("frame");
    let mut mocker = Mocker::new(ser);
    let tags = vec![
        ItemTag::new(0, Tag::NamedUsize("frame".to_string(), 0)),
        ItemTag::new(3, Tag::NamedF64(PHASE_EST.to_string(), 0.0)),
        ItemTag::new(F, Tag::NamedUsize("frame".to_string(), 1)),
    ];
    mocker.input().set_with_tags(repeated(&r, 2), tags);
    mocker.run();
    assert_eq!(mocker.kernel().total_frames(), 2);
    Ok(())
}

#[test]
fn loads_reference_file() -> Result<()> {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("hoplink-ser-{}.bin", std::process::id()));
    std::fs::write(&path, reference())?;
    let ser: SerAccumulator = SerAccumulator::new(&path)?;
    std::fs::remove_file(&path)?;
    assert_eq!(ser.frame_length(), F);
    Ok(())
}

#[test]
fn missing_or_empty_reference_fails() -> Result<()> {
    let dir = std::env::temp_dir();
    let missing = dir.join("hoplink-does-not-exist.bin");
    let r: std::result::Result<SerAccumulator, _> = SerAccumulator::new(&missing);
    assert!(matches!(r, Err(Error::ReferenceLoad { .. })));

    let empty = dir.join(format!("hoplink-empty-{}.bin", std::process::id()));
    std::fs::write(&empty, b"")?;
    let r: std::result::Result<SerAccumulator, _> = SerAccumulator::new(&empty);
    std::fs::remove_file(&empty)?;
    assert!(matches!(r, Err(Error::EmptyReference { .. })));
    Ok(())
}
