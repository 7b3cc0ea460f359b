// SPDX-License-Identifier: GPL-3.0-only

#![cfg(all(target_arch = "x86_64", feature = "freedepth"))]

//! Kinect driver backed by freedepth
//!
//! Opening a device creates a `KinectStreamer`, which unbinds the kernel
//! driver. freedepth streams video and depth together, so the receivers are
//! started on the first `start_stream` and frames of streams that are not
//! active are drained and dropped. Closing stops the streamer and rebinds
//! the kernel driver.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use freedepth::{DepthFormat, DepthFrame, KinectStreamer, Resolution, VideoFormat, VideoFrame};
use tracing::{debug, info, warn};

use super::sensor::{DeviceAttributes, DriverLogLevel, FrameSink, LedMode, SensorDriver, SubDevices};
use crate::constants::DRIVER_EVENT_TIMEOUT;
use crate::errors::DeviceError;
use crate::frames::{StreamKind, StreamSet};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

struct Streams {
    video_rx: Receiver<VideoFrame>,
    depth_rx: Receiver<DepthFrame>,
}

struct FreedepthState {
    streamer: Option<KinectStreamer>,
    streams: Option<Streams>,
    active: StreamSet,
    selected: SubDevices,
    rgb: Vec<u8>,
}

/// USB Kinect driver
pub struct FreedepthSensor {
    state: Mutex<FreedepthState>,
}

impl FreedepthSensor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FreedepthState {
                streamer: None,
                streams: None,
                active: StreamSet::NONE,
                selected: SubDevices::MOTOR.union(SubDevices::CAMERA),
                rgb: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FreedepthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FreedepthSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriver for FreedepthSensor {
    fn name(&self) -> &str {
        "freedepth"
    }

    fn device_count(&self) -> Result<usize, DeviceError> {
        freedepth::enumerate_devices()
            .map(|devices| devices.len())
            .map_err(|e| DeviceError::Backend(e.to_string()))
    }

    fn device_attributes(&self) -> Result<Vec<DeviceAttributes>, DeviceError> {
        let devices =
            freedepth::enumerate_devices().map_err(|e| DeviceError::Backend(e.to_string()))?;

        Ok(devices
            .iter()
            .map(|dev| DeviceAttributes {
                index: dev.index,
                serial: dev
                    .id
                    .serial
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            })
            .collect())
    }

    fn supported_subdevices(&self) -> SubDevices {
        SubDevices::MOTOR.union(SubDevices::CAMERA)
    }

    fn select_subdevices(&self, subdevices: SubDevices) -> Result<(), DeviceError> {
        if subdevices.contains(SubDevices::AUDIO) {
            return Err(DeviceError::Unsupported("audio subdevice".to_string()));
        }
        self.lock().selected = subdevices;
        Ok(())
    }

    fn selected_subdevices(&self) -> SubDevices {
        self.lock().selected
    }

    fn open(&self, index: usize) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if state.streamer.is_some() {
            return Err(DeviceError::AlreadyOpen);
        }

        let count = self.device_count()?;
        if count == 0 {
            return Err(DeviceError::NoDevice);
        }
        if index >= count {
            return Err(DeviceError::DeviceNotFound(index));
        }

        info!(index, "Opening Kinect via freedepth");
        let streamer = KinectStreamer::new(index)
            .map_err(|e| DeviceError::Backend(format!("Failed to create streamer: {}", e)))?;
        state.streamer = Some(streamer);
        Ok(())
    }

    fn close(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let mut streamer = state.streamer.take().ok_or(DeviceError::NotOpen)?;

        state.streams = None;
        state.active = StreamSet::NONE;
        streamer.stop();
        if let Err(e) = streamer.rebind_driver() {
            warn!(error = %e, "Failed to rebind kernel driver");
        }
        info!("Kinect closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().streamer.is_some()
    }

    fn start_stream(&self, stream: StreamKind) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let state = &mut *state;
        let streamer = state.streamer.as_mut().ok_or(DeviceError::NotOpen)?;

        if state.streams.is_none() {
            let (video_rx, depth_rx) = streamer
                .start(VideoFormat::Bayer, Resolution::Medium, DepthFormat::Depth11Bit)
                .map_err(|e| DeviceError::stream(stream, "starting", e.to_string()))?;
            state.streams = Some(Streams { video_rx, depth_rx });
            debug!("freedepth streaming started");
        }

        state.active = state.active.with(stream, true);
        Ok(())
    }

    fn stop_stream(&self, stream: StreamKind) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if state.streamer.is_none() {
            return Err(DeviceError::NotOpen);
        }
        state.active = state.active.with(stream, false);
        Ok(())
    }

    fn active_streams(&self) -> StreamSet {
        self.lock().active
    }

    fn set_tilt(&self, degrees: i8) -> Result<(), DeviceError> {
        let state = self.lock();
        let streamer = state.streamer.as_ref().ok_or(DeviceError::NotOpen)?;
        streamer
            .set_tilt(degrees)
            .map_err(|e| DeviceError::Backend(format!("Failed to set tilt: {}", e)))
    }

    fn set_led(&self, _mode: LedMode) -> Result<(), DeviceError> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen);
        }
        Err(DeviceError::Unsupported("LED control".to_string()))
    }

    fn set_log_level(&self, _level: DriverLogLevel) -> Result<(), DeviceError> {
        // freedepth logs through tracing; RUST_LOG controls it
        Err(DeviceError::Unsupported("driver log level".to_string()))
    }

    fn process_events(&self, sink: &mut dyn FrameSink) -> Result<usize, DeviceError> {
        let deadline = Instant::now() + DRIVER_EVENT_TIMEOUT;

        loop {
            let delivered = {
                let mut state = self.lock();
                let state = &mut *state;
                match state.streams.as_ref() {
                    Some(streams) => drain(streams, state.active, &mut state.rgb, sink)?,
                    None => 0,
                }
            };

            if delivered > 0 || Instant::now() >= deadline {
                return Ok(delivered);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain(
    streams: &Streams,
    active: StreamSet,
    rgb: &mut Vec<u8>,
    sink: &mut dyn FrameSink,
) -> Result<usize, DeviceError> {
    let mut delivered = 0;

    match streams.video_rx.try_recv() {
        Ok(frame) => {
            if active.contains(StreamKind::Color) {
                let pixels = (frame.width * frame.height) as usize;
                rgb.resize(pixels * 3, 0);
                freedepth::convert_bayer_to_rgb(&frame.data, rgb, frame.width, frame.height);
                sink.color_ready(rgb, frame.timestamp as u32);
                delivered += 1;
            }
        }
        Err(TryRecvError::Empty) => {}
        Err(TryRecvError::Disconnected) => {
            return Err(DeviceError::stream(StreamKind::Color, "reading", "channel disconnected"));
        }
    }

    match streams.depth_rx.try_recv() {
        Ok(frame) => {
            if active.contains(StreamKind::Depth) {
                if let Some(samples) = frame.as_u16() {
                    sink.depth_ready(samples);
                    delivered += 1;
                }
            }
        }
        Err(TryRecvError::Empty) => {}
        Err(TryRecvError::Disconnected) => {
            return Err(DeviceError::stream(StreamKind::Depth, "reading", "channel disconnected"));
        }
    }

    Ok(delivered)
}
