//! Playback pipeline tests
//!
//! Tests:
//! - Chunking: ceil(L/K) writes, last write carries the remainder
//! - Zero-length clip: no writes, exactly one clear
//! - Invalid clip: no output interaction at all
//! - Replay starts from byte 0 every time
//! - Errors mid-stream still leave the output cleared

use rust_clip_player::{
    AudioSink, ClipError, ClipSource, MemoryClip, OutputError, PlaybackError, PlaybackReport, Player, Volume,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Write(Vec<u8>),
    Clear,
}

/// Sink that records every call.
#[derive(Default)]
struct RecordingSink {
    ops: Vec<Op>,
    fail_write_at: Option<usize>,
}

impl RecordingSink {
    fn writes(&self) -> Vec<&[u8]> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Write(b) => Some(b.as_slice()),
                Op::Clear => None,
            })
            .collect()
    }

    fn clears(&self) -> usize {
        self.ops.iter().filter(|op| **op == Op::Clear).count()
    }
}

impl AudioSink for RecordingSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, OutputError> {
        if self.fail_write_at == Some(self.writes().len()) {
            return Err(OutputError::Driver(-1));
        }
        self.ops.push(Op::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn clear(&mut self) -> Result<(), OutputError> {
        self.ops.push(Op::Clear);
        Ok(())
    }
}

/// Clip whose reads fail after `good_reads` successful ones.
struct FlakyClip<'a> {
    inner: MemoryClip<'a>,
    good_reads: usize,
    reads: usize,
}

impl ClipSource for FlakyClip<'_> {
    fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    fn rewind(&mut self) -> Result<(), ClipError> {
        self.inner.rewind()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError> {
        if self.reads == self.good_reads {
            return Err(ClipError::Read);
        }
        self.reads += 1;
        self.inner.read(buf)
    }
}

#[test]
fn test_write_count_is_ceil_of_length_over_chunk() {
    for len in [1usize, 7, 8, 9, 16, 17, 100] {
        let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let mut player: Player<_, 8> = Player::new(RecordingSink::default(), Volume::unity());
        let mut clip = MemoryClip::new(&data);

        let report = player.play_clip(&mut clip).unwrap();

        let expected_writes = len.div_ceil(8);
        let writes = player.sink().writes();
        assert_eq!(writes.len(), expected_writes, "len {}", len);
        assert_eq!(report, PlaybackReport { chunks: expected_writes as u32, bytes: len as u64 });

        let last = writes.last().unwrap();
        let expected_last = if len % 8 == 0 { 8 } else { len % 8 };
        assert_eq!(last.len(), expected_last, "last write size for len {}", len);
        assert!(writes[..writes.len() - 1].iter().all(|w| w.len() == 8));

        assert_eq!(player.sink().ops.last(), Some(&Op::Clear));
        assert_eq!(player.sink().clears(), 1);
    }
}

#[test]
fn test_unity_volume_is_bit_exact() {
    let data: Vec<u8> = (0..=255u8).collect();
    let mut player: Player<_, 64> = Player::new(RecordingSink::default(), Volume::unity());
    let mut clip = MemoryClip::new(&data);

    player.play_clip(&mut clip).unwrap();

    let out: Vec<u8> = player.sink().writes().concat();
    assert_eq!(out, data);
}

#[test]
fn test_zero_length_clip() {
    let mut player: Player<_, 8> = Player::new(RecordingSink::default(), Volume::unity());
    let mut clip = MemoryClip::new(&[]);

    let report = player.play_clip(&mut clip).unwrap();

    assert_eq!(report, PlaybackReport::default());
    assert_eq!(player.sink().ops, vec![Op::Clear]);
}

#[test]
fn test_invalid_clip_touches_nothing() {
    let mut player: Player<_, 8> = Player::new(RecordingSink::default(), Volume::unity());
    let mut clip = MemoryClip::invalid();

    assert_eq!(player.play_clip(&mut clip), Err(PlaybackError::InvalidClip));
    assert!(player.sink().ops.is_empty());
}

#[test]
fn test_replay_starts_from_first_byte() {
    let data = [10u8, 20, 30, 40, 50];
    let mut player: Player<_, 2> = Player::new(RecordingSink::default(), Volume::unity());
    let mut clip = MemoryClip::new(&data);

    player.play_clip(&mut clip).unwrap();
    player.play_clip(&mut clip).unwrap();

    let expected_once = vec![
        Op::Write(vec![10, 20]),
        Op::Write(vec![30, 40]),
        Op::Write(vec![50]),
        Op::Clear,
    ];
    let expected: Vec<Op> = expected_once.iter().chain(expected_once.iter()).cloned().collect();
    assert_eq!(player.sink().ops, expected);
}

#[test]
fn test_replay_after_partial_cursor() {
    let data = [1u8, 2, 3, 4];
    let mut clip = MemoryClip::new(&data);
    let mut scratch = [0u8; 3];
    clip.read(&mut scratch).unwrap();
    assert_eq!(clip.position(), 3);

    let mut player: Player<_, 8> = Player::new(RecordingSink::default(), Volume::unity());
    player.play_clip(&mut clip).unwrap();

    assert_eq!(player.sink().writes(), vec![&[1u8, 2, 3, 4][..]]);
}

#[test]
fn test_half_volume_chunks() {
    let data = [100u8, 150, 200, 250];
    let mut player: Player<_, 2> = Player::new(RecordingSink::default(), Volume::from_factor(0.5));
    let mut clip = MemoryClip::new(&data);

    player.play_clip(&mut clip).unwrap();

    assert_eq!(
        player.sink().ops,
        vec![Op::Write(vec![114, 139]), Op::Write(vec![164, 189]), Op::Clear]
    );
    // Source data is never modified
    assert_eq!(data, [100, 150, 200, 250]);
}

#[test]
fn test_read_error_mid_stream_still_clears() {
    let data = [128u8; 10];
    let mut clip = FlakyClip {
        inner: MemoryClip::new(&data),
        good_reads: 1,
        reads: 0,
    };
    let mut player: Player<_, 4> = Player::new(RecordingSink::default(), Volume::unity());

    assert_eq!(player.play_clip(&mut clip), Err(PlaybackError::Read(ClipError::Read)));
    assert_eq!(player.sink().ops, vec![Op::Write(vec![128; 4]), Op::Clear]);
}

#[test]
fn test_write_error_mid_stream_still_clears() {
    let data = [128u8; 10];
    let sink = RecordingSink {
        fail_write_at: Some(1),
        ..Default::default()
    };
    let mut player: Player<_, 4> = Player::new(sink, Volume::unity());
    let mut clip = MemoryClip::new(&data);

    assert_eq!(
        player.play_clip(&mut clip),
        Err(PlaybackError::Write(OutputError::Driver(-1)))
    );
    assert_eq!(player.sink().writes().len(), 1);
    assert_eq!(player.sink().clears(), 1);
    assert_eq!(player.sink().ops.last(), Some(&Op::Clear));
}

#[test]
fn test_error_messages() {
    assert_eq!(PlaybackError::InvalidClip.to_string(), "file invalid");
    assert_eq!(
        PlaybackError::Read(ClipError::Read).to_string(),
        "read: clip read failed"
    );
    assert_eq!(
        PlaybackError::Write(OutputError::Stalled).to_string(),
        "write: output stalled"
    );
}
