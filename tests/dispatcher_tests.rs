//! Dispatcher integration tests
//!
//! Tests:
//! - Three-button session at half volume (write sequence per press)
//! - Simultaneous presses serviced in channel order, one clip at a time
//! - Presses during playback are not queued; a button still held after
//!   playback is a fresh edge
//! - Invalid clips are skipped and the loop carries on
//! - Log lines and counters

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rust_clip_player::dispatcher::verify_channels;
use rust_clip_player::logging::{LogLevel, LogStream};
use rust_clip_player::{
    AudioChannel, AudioSink, ButtonInputs, ButtonLevels, Dispatcher, DispatcherStats, MemoryClip, OutputError,
    Player, Volume, CONFIG,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Sample(u8),
    Write(Vec<u8>),
    Clear,
}

type Trace = Rc<RefCell<Vec<Event>>>;

struct TraceSink(Trace);

impl AudioSink for TraceSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, OutputError> {
        self.0.borrow_mut().push(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn clear(&mut self) -> Result<(), OutputError> {
        self.0.borrow_mut().push(Event::Clear);
        Ok(())
    }
}

/// Replays a fixed list of snapshots, then reports all LOW.
struct Script {
    levels: Vec<u8>,
    next: usize,
    trace: Trace,
}

impl ButtonInputs for Script {
    fn sample(&mut self) -> ButtonLevels {
        let bits = self.levels.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        self.trace.borrow_mut().push(Event::Sample(bits));
        ButtonLevels::from_bits(bits)
    }
}

fn clock() -> i64 {
    42
}

const CLIP_A: [u8; 4] = [100, 150, 200, 250];
const CLIP_B: [u8; 4] = [0, 255, 128, 64];
const CLIP_C: [u8; 4] = [128, 128, 128, 128];

fn writes(trace: &Trace) -> Vec<Vec<u8>> {
    trace
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Write(b) => Some(b.clone()),
            _ => None,
        })
        .collect()
}

fn messages(log: &LogStream) -> Vec<(LogLevel, String)> {
    let mut out = Vec::new();
    while let Some(entry) = log.drain() {
        out.push((entry.level, entry.message().to_string()));
    }
    out
}

#[test]
fn test_three_button_session_at_half_volume() {
    let log: LogStream = LogStream::new();
    let trace: Trace = Rc::default();
    let channels = [
        AudioChannel::new("a", 22, MemoryClip::new(&CLIP_A)),
        AudioChannel::new("b", 35, MemoryClip::new(&CLIP_B)),
        AudioChannel::new("c", 32, MemoryClip::new(&CLIP_C)),
    ];
    let player: Player<_, 2> = Player::new(TraceSink(trace.clone()), Volume::from_factor(0.5));
    let mut dispatcher = Dispatcher::new(channels, player, &log, clock as fn() -> i64);

    let mut inputs = Script {
        levels: vec![0b000, 0b001, 0b000, 0b010, 0b000, 0b100, 0b000],
        next: 0,
        trace: trace.clone(),
    };
    let started: usize = (0..7).map(|_| dispatcher.poll(&mut inputs)).sum();
    assert_eq!(started, 3);

    use Event::*;
    assert_eq!(
        *trace.borrow(),
        vec![
            Sample(0b000),
            Sample(0b001),
            Write(vec![114, 139]),
            Write(vec![164, 189]),
            Clear,
            Sample(0b000),
            Sample(0b010),
            Write(vec![64, 192]),
            Write(vec![128, 96]),
            Clear,
            Sample(0b000),
            Sample(0b100),
            Write(vec![128, 128]),
            Write(vec![128, 128]),
            Clear,
            Sample(0b000),
        ]
    );

    assert_eq!(
        dispatcher.stats(),
        DispatcherStats { ticks: 7, presses: 3, completed: 3, skipped: 0, failed: 0 }
    );
}

#[test]
fn test_simultaneous_presses_in_channel_order() {
    let log: LogStream = LogStream::new();
    let trace: Trace = Rc::default();
    let channels = [
        AudioChannel::new("a", 22, MemoryClip::new(&CLIP_A)),
        AudioChannel::new("b", 35, MemoryClip::new(&CLIP_B)),
        AudioChannel::new("c", 32, MemoryClip::new(&CLIP_C)),
    ];
    let player: Player<_, 4> = Player::new(TraceSink(trace.clone()), Volume::unity());
    let mut dispatcher = Dispatcher::new(channels, player, &log, clock as fn() -> i64);

    assert_eq!(dispatcher.tick(ButtonLevels::from_bits(0b101)), 2);

    // A to completion, then C; never interleaved
    assert_eq!(
        *trace.borrow(),
        vec![
            Event::Write(CLIP_A.to_vec()),
            Event::Clear,
            Event::Write(CLIP_C.to_vec()),
            Event::Clear,
        ]
    );
}

/// Button levels shared between the inputs and the sink, so a test can
/// press or release buttons while a clip is being written.
type Levels = Rc<Cell<u8>>;

/// Reads the live levels.
struct LiveInputs {
    levels: Levels,
    trace: Trace,
}

impl ButtonInputs for LiveInputs {
    fn sample(&mut self) -> ButtonLevels {
        let bits = self.levels.get();
        self.trace.borrow_mut().push(Event::Sample(bits));
        ButtonLevels::from_bits(bits)
    }
}

/// Presses `press` on every write and releases `release` just before the
/// buffer is cleared.
struct PressingSink {
    levels: Levels,
    trace: Trace,
    press: u8,
    release: u8,
}

impl AudioSink for PressingSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, OutputError> {
        self.levels.set(self.levels.get() | self.press);
        self.trace.borrow_mut().push(Event::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn clear(&mut self) -> Result<(), OutputError> {
        self.levels.set(self.levels.get() & !self.release);
        self.trace.borrow_mut().push(Event::Clear);
        Ok(())
    }
}

#[test]
fn test_press_during_playback_is_lost() {
    let log: LogStream = LogStream::new();
    let trace: Trace = Rc::default();
    let levels: Levels = Rc::new(Cell::new(0b01));
    let channels = [
        AudioChannel::new("a", 22, MemoryClip::new(&CLIP_A)),
        AudioChannel::new("b", 35, MemoryClip::new(&CLIP_B)),
    ];
    let sink = PressingSink {
        levels: levels.clone(),
        trace: trace.clone(),
        press: 0b10,
        release: 0b10,
    };
    let player: Player<_, 2> = Player::new(sink, Volume::unity());
    let mut dispatcher = Dispatcher::new(channels, player, &log, clock as fn() -> i64);
    let mut inputs = LiveInputs {
        levels: levels.clone(),
        trace: trace.clone(),
    };

    // B goes HIGH during A's first write and LOW again before A's clear
    for _ in 0..3 {
        dispatcher.poll(&mut inputs);
    }

    use Event::*;
    assert_eq!(
        *trace.borrow(),
        vec![
            Sample(0b01),
            Write(vec![100, 150]),
            Write(vec![200, 250]),
            Clear,
            Sample(0b01),
            Sample(0b01),
        ]
    );
    assert_eq!(dispatcher.stats().presses, 1);
    assert!(!dispatcher.channel(1).unwrap().last_level());
}

#[test]
fn test_press_held_through_playback_plays_once_after() {
    let log: LogStream = LogStream::new();
    let trace: Trace = Rc::default();
    let levels: Levels = Rc::new(Cell::new(0b01));
    let channels = [
        AudioChannel::new("a", 22, MemoryClip::new(&CLIP_A)),
        AudioChannel::new("b", 35, MemoryClip::new(&CLIP_B)),
    ];
    let sink = PressingSink {
        levels: levels.clone(),
        trace: trace.clone(),
        press: 0b10,
        release: 0,
    };
    let player: Player<_, 2> = Player::new(sink, Volume::unity());
    let mut dispatcher = Dispatcher::new(channels, player, &log, clock as fn() -> i64);
    let mut inputs = LiveInputs {
        levels: levels.clone(),
        trace: trace.clone(),
    };

    // B pressed during A and still held when A ends
    for _ in 0..4 {
        dispatcher.poll(&mut inputs);
    }

    use Event::*;
    assert_eq!(
        *trace.borrow(),
        vec![
            Sample(0b01),
            Write(vec![100, 150]),
            Write(vec![200, 250]),
            Clear,
            Sample(0b11),
            Write(vec![0, 255]),
            Write(vec![128, 64]),
            Clear,
            Sample(0b11),
            Sample(0b11),
        ]
    );
    assert_eq!(dispatcher.stats().presses, 2);
    assert_eq!(dispatcher.stats().completed, 2);
}

#[test]
fn test_button_still_held_after_playback_is_serviced() {
    let log: LogStream = LogStream::new();
    let trace: Trace = Rc::default();
    let channels = [
        AudioChannel::new("a", 22, MemoryClip::new(&CLIP_A)),
        AudioChannel::new("b", 35, MemoryClip::new(&CLIP_B)),
    ];
    let player: Player<_, 4> = Player::new(TraceSink(trace.clone()), Volume::unity());
    let mut dispatcher = Dispatcher::new(channels, player, &log, clock as fn() -> i64);

    dispatcher.tick(ButtonLevels::from_bits(0b01));
    // A released, B pressed and still held at the next snapshot
    dispatcher.tick(ButtonLevels::from_bits(0b10));

    assert_eq!(writes(&trace), vec![CLIP_A.to_vec(), CLIP_B.to_vec()]);
}

#[test]
fn test_invalid_clip_skipped() {
    let log: LogStream = LogStream::new();
    let trace: Trace = Rc::default();
    let channels = [
        AudioChannel::new("a", 22, MemoryClip::invalid()),
        AudioChannel::new("b", 35, MemoryClip::new(&CLIP_B)),
    ];
    let player: Player<_, 4> = Player::new(TraceSink(trace.clone()), Volume::unity());
    let mut dispatcher = Dispatcher::new(channels, player, &log, clock as fn() -> i64);

    assert_eq!(dispatcher.verify_clips(), Err(0));

    assert_eq!(dispatcher.tick(ButtonLevels::from_bits(0b01)), 1);
    assert!(trace.borrow().is_empty());
    assert!(dispatcher.channel(0).unwrap().last_level());

    // Loop is ready for the next press right away
    dispatcher.tick(ButtonLevels::ALL_LOW);
    dispatcher.tick(ButtonLevels::from_bits(0b10));
    assert_eq!(writes(&trace), vec![CLIP_B.to_vec()]);

    let stats = dispatcher.stats();
    assert_eq!(stats.presses, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.completed, 1);

    let logged = messages(&log);
    assert!(logged.contains(&(LogLevel::Warn, "a: file invalid".to_string())));
}

#[test]
fn test_log_lines_carry_clock_and_duration() {
    let log: LogStream = LogStream::new();
    let data = [128u8; 441];
    let channels = [AudioChannel::new("kiritsu", 22, MemoryClip::new(&data))];
    let player: Player<_, 1024> = Player::new(TraceSink(Rc::default()), Volume::unity());
    let mut dispatcher =
        Dispatcher::new(channels, player, &log, clock as fn() -> i64).with_output_config(CONFIG.output_config());

    dispatcher.tick(ButtonLevels::from_bits(1));

    let first = log.drain().unwrap();
    assert_eq!(first.timestamp_us, 42);
    assert_eq!(first.level, LogLevel::Info);
    assert_eq!(first.message(), "kiritsu pressed, starting");

    // 441 bytes at 44100 bytes/s
    let second = log.drain().unwrap();
    assert_eq!(second.message(), "kiritsu completed: 441 bytes, 1 chunks, 10 ms");
    assert!(log.drain().is_none());
}

#[test]
fn test_verify_channels_reports_first_invalid() {
    let good = [AudioChannel::new("a", 1, MemoryClip::new(&CLIP_A)), AudioChannel::new("b", 2, MemoryClip::new(&CLIP_B))];
    assert_eq!(verify_channels(&good), Ok(()));

    let bad = [
        AudioChannel::new("a", 1, MemoryClip::new(&CLIP_A)),
        AudioChannel::new("b", 2, MemoryClip::invalid()),
        AudioChannel::new("c", 3, MemoryClip::invalid()),
    ];
    assert_eq!(verify_channels(&bad), Err(1));
}
