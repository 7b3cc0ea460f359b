// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic sensor producing test patterns
//!
//! Behaves like a single Kinect without hardware: frames are paced at a fixed
//! rate, and tilt, LED and log level are recorded. Tests can inject one-shot
//! failures into any operation to exercise error paths.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::sensor::{DeviceAttributes, DriverLogLevel, FrameSink, LedMode, SensorDriver, SubDevices};
use crate::constants::{DRIVER_EVENT_TIMEOUT, FRAME_HEIGHT, FRAME_PIXELS, FRAME_WIDTH};
use crate::errors::DeviceError;
use crate::frames::{StreamKind, StreamSet};

/// Operations that can be made to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticOp {
    Scan,
    Open,
    Close,
    Start(StreamKind),
    Stop(StreamKind),
    SetTilt,
    SetLed,
    SetLogLevel,
    SelectSubdevices,
    ProcessEvents,
}

struct SyntheticState {
    open: Option<usize>,
    streams: StreamSet,
    tilt: i8,
    led: LedMode,
    log_level: DriverLogLevel,
    selected: SubDevices,
    frame: u64,
    next_frame: Option<Instant>,
    failures: HashSet<SyntheticOp>,
}

impl SyntheticState {
    fn check(&mut self, op: SyntheticOp) -> Result<(), DeviceError> {
        if self.failures.remove(&op) {
            return Err(DeviceError::Backend(format!("injected failure in {:?}", op)));
        }
        Ok(())
    }

    fn require_open(&self) -> Result<(), DeviceError> {
        self.open.map(|_| ()).ok_or(DeviceError::NotOpen)
    }
}

struct Scratch {
    depth: Vec<u16>,
    color: Vec<u8>,
}

/// Hardware-free sensor driver
pub struct SyntheticSensor {
    state: Mutex<SyntheticState>,
    scratch: Mutex<Scratch>,
    devices: Vec<DeviceAttributes>,
    frame_interval: Duration,
}

impl SyntheticSensor {
    /// One synthetic device producing frames at `fps`
    pub fn new(fps: u32) -> Self {
        Self::with_devices(fps, 1)
    }

    pub fn with_devices(fps: u32, count: usize) -> Self {
        let devices = (0..count)
            .map(|index| DeviceAttributes {
                index,
                serial: format!("SYNTH{:011}", index + 1),
            })
            .collect();

        Self {
            state: Mutex::new(SyntheticState {
                open: None,
                streams: StreamSet::NONE,
                tilt: 0,
                led: LedMode::Off,
                log_level: DriverLogLevel::Warning,
                selected: SubDevices::MOTOR.union(SubDevices::CAMERA),
                frame: 0,
                next_frame: None,
                failures: HashSet::new(),
            }),
            scratch: Mutex::new(Scratch {
                depth: vec![0; FRAME_PIXELS],
                color: vec![0; FRAME_PIXELS * 3],
            }),
            devices,
            frame_interval: Duration::from_secs(1) / fps.max(1),
        }
    }

    /// Make the next call of `op` fail
    pub fn inject_failure(&self, op: SyntheticOp) {
        self.lock().failures.insert(op);
    }

    pub fn tilt(&self) -> i8 {
        self.lock().tilt
    }

    pub fn led(&self) -> LedMode {
        self.lock().led
    }

    pub fn log_level(&self) -> DriverLogLevel {
        self.lock().log_level
    }

    fn lock(&self) -> MutexGuard<'_, SyntheticState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SensorDriver for SyntheticSensor {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn device_count(&self) -> Result<usize, DeviceError> {
        self.lock().check(SyntheticOp::Scan)?;
        Ok(self.devices.len())
    }

    fn device_attributes(&self) -> Result<Vec<DeviceAttributes>, DeviceError> {
        self.lock().check(SyntheticOp::Scan)?;
        Ok(self.devices.clone())
    }

    fn supported_subdevices(&self) -> SubDevices {
        SubDevices::ALL
    }

    fn select_subdevices(&self, subdevices: SubDevices) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.check(SyntheticOp::SelectSubdevices)?;
        state.selected = subdevices;
        Ok(())
    }

    fn selected_subdevices(&self) -> SubDevices {
        self.lock().selected
    }

    fn open(&self, index: usize) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.check(SyntheticOp::Open)?;
        if state.open.is_some() {
            return Err(DeviceError::AlreadyOpen);
        }
        if self.devices.is_empty() {
            return Err(DeviceError::NoDevice);
        }
        if index >= self.devices.len() {
            return Err(DeviceError::DeviceNotFound(index));
        }
        state.open = Some(index);
        info!(index, "Synthetic sensor opened");
        Ok(())
    }

    fn close(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.require_open()?;
        state.check(SyntheticOp::Close)?;
        state.open = None;
        state.streams = StreamSet::NONE;
        state.next_frame = None;
        info!("Synthetic sensor closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open.is_some()
    }

    fn start_stream(&self, stream: StreamKind) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.require_open()?;
        state
            .check(SyntheticOp::Start(stream))
            .map_err(|e| DeviceError::stream(stream, "starting", e.to_string()))?;
        state.streams = state.streams.with(stream, true);
        debug!(stream = %stream, "Synthetic stream started");
        Ok(())
    }

    fn stop_stream(&self, stream: StreamKind) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.require_open()?;
        state
            .check(SyntheticOp::Stop(stream))
            .map_err(|e| DeviceError::stream(stream, "stopping", e.to_string()))?;
        state.streams = state.streams.with(stream, false);
        debug!(stream = %stream, "Synthetic stream stopped");
        Ok(())
    }

    fn active_streams(&self) -> StreamSet {
        self.lock().streams
    }

    fn set_tilt(&self, degrees: i8) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.require_open()?;
        state.check(SyntheticOp::SetTilt)?;
        state.tilt = degrees;
        Ok(())
    }

    fn set_led(&self, mode: LedMode) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.require_open()?;
        state.check(SyntheticOp::SetLed)?;
        state.led = mode;
        Ok(())
    }

    fn set_log_level(&self, level: DriverLogLevel) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.check(SyntheticOp::SetLogLevel)?;
        state.log_level = level;
        Ok(())
    }

    fn process_events(&self, sink: &mut dyn FrameSink) -> Result<usize, DeviceError> {
        let (streams, frame, tilt, wait) = {
            let mut state = self.lock();
            state.check(SyntheticOp::ProcessEvents)?;

            let now = Instant::now();
            if state.open.is_none() || state.streams.is_empty() {
                state.next_frame = None;
                (StreamSet::NONE, 0, 0, DRIVER_EVENT_TIMEOUT.min(self.frame_interval))
            } else {
                let due = *state.next_frame.get_or_insert(now);
                if due > now + DRIVER_EVENT_TIMEOUT {
                    (StreamSet::NONE, 0, 0, DRIVER_EVENT_TIMEOUT)
                } else {
                    state.next_frame = Some(due.max(now) + self.frame_interval);
                    state.frame += 1;
                    (state.streams, state.frame, state.tilt, due.saturating_duration_since(now))
                }
            }
        };

        thread::sleep(wait);
        if streams.is_empty() {
            return Ok(0);
        }

        let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        let Scratch { depth, color } = &mut *scratch;
        let mut delivered = 0;

        if streams.contains(StreamKind::Depth) {
            fill_depth(depth, frame, tilt);
            sink.depth_ready(depth);
            delivered += 1;
        }
        if streams.contains(StreamKind::Color) {
            fill_color(color, frame);
            sink.color_ready(color, frame as u32);
            delivered += 1;
        }
        Ok(delivered)
    }
}

/// Concentric rings drifting outward; tilt shifts the center vertically
fn fill_depth(out: &mut [u16], frame: u64, tilt: i8) {
    let cx = FRAME_WIDTH as i64 / 2;
    let cy = FRAME_HEIGHT as i64 / 2 - tilt as i64 * 4;
    let phase = (frame * 4) as i64;

    for (i, sample) in out.iter_mut().enumerate() {
        let x = (i % FRAME_WIDTH) as i64 - cx;
        let y = (i / FRAME_WIDTH) as i64 - cy;
        let r = ((x * x + y * y) as f64).sqrt() as i64;
        *sample = (400 + (r * 2 + phase).rem_euclid(600)) as u16;
    }
}

/// Horizontal red ramp, vertical green ramp, blue cycling per frame
fn fill_color(out: &mut [u8], frame: u64) {
    let blue = (frame * 4 % 256) as u8;
    for (i, pixel) in out.chunks_exact_mut(3).enumerate() {
        let x = i % FRAME_WIDTH;
        let y = i / FRAME_WIDTH;
        pixel[0] = (x * 255 / (FRAME_WIDTH - 1)) as u8;
        pixel[1] = (y * 255 / (FRAME_HEIGHT - 1)) as u8;
        pixel[2] = blue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        depth: usize,
        color: usize,
        last_depth_len: usize,
        last_color_len: usize,
    }

    impl FrameSink for CountingSink {
        fn depth_ready(&mut self, samples: &[u16]) {
            self.depth += 1;
            self.last_depth_len = samples.len();
        }

        fn color_ready(&mut self, rgb: &[u8], _timestamp: u32) {
            self.color += 1;
            self.last_color_len = rgb.len();
        }
    }

    #[test]
    fn test_open_close() {
        let sensor = SyntheticSensor::new(100);
        assert!(!sensor.is_open());
        sensor.open(0).unwrap();
        assert_eq!(sensor.open(0), Err(DeviceError::AlreadyOpen));
        sensor.close().unwrap();
        assert_eq!(sensor.close(), Err(DeviceError::NotOpen));
    }

    #[test]
    fn test_open_missing_device() {
        assert_eq!(
            SyntheticSensor::with_devices(100, 0).open(0),
            Err(DeviceError::NoDevice)
        );
        assert_eq!(
            SyntheticSensor::new(100).open(3),
            Err(DeviceError::DeviceNotFound(3))
        );
    }

    #[test]
    fn test_streams_require_open_device() {
        let sensor = SyntheticSensor::new(100);
        assert_eq!(
            sensor.start_stream(StreamKind::Depth),
            Err(DeviceError::NotOpen)
        );
        assert_eq!(sensor.set_tilt(10), Err(DeviceError::NotOpen));
    }

    #[test]
    fn test_process_events_delivers_active_streams() {
        let sensor = SyntheticSensor::new(200);
        sensor.open(0).unwrap();
        sensor.start_stream(StreamKind::Depth).unwrap();

        let mut sink = CountingSink::default();
        assert_eq!(sensor.process_events(&mut sink).unwrap(), 1);
        assert_eq!(sink.depth, 1);
        assert_eq!(sink.color, 0);
        assert_eq!(sink.last_depth_len, FRAME_PIXELS);

        sensor.start_stream(StreamKind::Color).unwrap();
        assert_eq!(sensor.process_events(&mut sink).unwrap(), 2);
        assert_eq!(sink.last_color_len, FRAME_PIXELS * 3);
    }

    #[test]
    fn test_process_events_idle_without_streams() {
        let sensor = SyntheticSensor::new(200);
        let mut sink = CountingSink::default();
        assert_eq!(sensor.process_events(&mut sink).unwrap(), 0);
        assert_eq!(sink.depth + sink.color, 0);
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let sensor = SyntheticSensor::new(100);
        sensor.open(0).unwrap();
        sensor.inject_failure(SyntheticOp::Start(StreamKind::Color));

        let err = sensor.start_stream(StreamKind::Color).unwrap_err();
        assert!(matches!(err, DeviceError::Stream { stream: StreamKind::Color, .. }));
        assert!(!sensor.active_streams().contains(StreamKind::Color));

        sensor.start_stream(StreamKind::Color).unwrap();
        assert!(sensor.active_streams().contains(StreamKind::Color));
    }

    #[test]
    fn test_depth_pattern_spans_all_bands() {
        let mut depth = vec![0u16; FRAME_PIXELS];
        fill_depth(&mut depth, 0, 0);
        let palette = crate::frames::DepthPalette::new();
        let bands: HashSet<_> = depth.iter().map(|&d| palette.classify(d)).collect();
        assert_eq!(bands.len(), 3);
    }
}
