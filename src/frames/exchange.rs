// SPDX-License-Identifier: GPL-3.0-only

//! Double-buffered frame hand-off between the capture and render threads
//!
//! One mutex and one condition variable guard both streams. A single ready
//! counter tracks how many enabled streams have contributed a fresh frame
//! since the last consume; the render side waits until every enabled stream
//! has contributed before swapping back buffers to the front.
//!
//! ```text
//!  capture thread                         render thread
//!  ──────────────                         ─────────────
//!  convert → staging                      acquire()
//!  lock                                     lock
//!  swap staging ⇄ back                      wait until ready == enabled
//!  ready += 1 (first per stream)            swap back ⇄ front (enabled)
//!  notify                                   ready = 0
//!  unlock                                   unlock → &front
//! ```

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::depth::DepthPalette;
use crate::constants::{DISPLAY_BYTES_PER_PIXEL, FRAME_HEIGHT, FRAME_WIDTH};

/// Stream kinds delivered by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Depth,
    Color,
}

impl StreamKind {
    pub const ALL: [StreamKind; 2] = [StreamKind::Depth, StreamKind::Color];

    fn index(self) -> usize {
        match self {
            StreamKind::Depth => 0,
            StreamKind::Color => 1,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Depth => write!(f, "depth"),
            StreamKind::Color => write!(f, "RGB"),
        }
    }
}

/// Set of enabled streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSet {
    depth: bool,
    color: bool,
}

impl StreamSet {
    pub const NONE: StreamSet = StreamSet {
        depth: false,
        color: false,
    };
    pub const BOTH: StreamSet = StreamSet {
        depth: true,
        color: true,
    };

    pub fn only(kind: StreamKind) -> Self {
        Self::NONE.with(kind, true)
    }

    pub fn with(mut self, kind: StreamKind, enabled: bool) -> Self {
        match kind {
            StreamKind::Depth => self.depth = enabled,
            StreamKind::Color => self.color = enabled,
        }
        self
    }

    pub fn contains(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Depth => self.depth,
            StreamKind::Color => self.color,
        }
    }

    pub fn len(&self) -> usize {
        self.depth as usize + self.color as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = StreamKind> + '_ {
        StreamKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }
}

/// Fixed frame geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: usize,
    pub height: usize,
    pub bytes_per_pixel: usize,
}

impl FrameLayout {
    /// 640x480 RGB24, the largest frame the Kinect produces in medium resolution
    pub const KINECT_RGB: FrameLayout = FrameLayout {
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        bytes_per_pixel: DISPLAY_BYTES_PER_PIXEL,
    };

    pub fn stride(&self) -> usize {
        self.width * self.bytes_per_pixel
    }

    pub fn byte_len(&self) -> usize {
        self.stride() * self.height
    }
}

struct Slot {
    back: Vec<u8>,
    fresh: bool,
    published: u64,
}

struct Shared {
    slots: [Slot; 2],
    ready: usize,
    enabled: StreamSet,
    closed: bool,
}

impl Shared {
    fn disable(&mut self, kind: StreamKind) {
        let slot = &mut self.slots[kind.index()];
        if slot.fresh {
            slot.fresh = false;
            self.ready -= 1;
        }
        self.enabled = self.enabled.with(kind, false);
    }
}

struct Exchange {
    shared: Mutex<Shared>,
    frame_ready: Condvar,
    layouts: [FrameLayout; 2],
}

impl Exchange {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Buffers stay structurally valid if a holder panicked
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a frame exchange with fixed-size buffers for both streams
///
/// Returns the capture-side publisher, the render-side receiver and a
/// cloneable control handle for enabling streams.
pub fn frame_exchange(
    depth: FrameLayout,
    color: FrameLayout,
) -> (FramePublisher, FrameReceiver, FrameControl) {
    let layouts = [depth, color];
    let slot = |layout: &FrameLayout| Slot {
        back: vec![0; layout.byte_len()],
        fresh: false,
        published: 0,
    };

    let exchange = Arc::new(Exchange {
        shared: Mutex::new(Shared {
            slots: [slot(&depth), slot(&color)],
            ready: 0,
            enabled: StreamSet::NONE,
            closed: false,
        }),
        frame_ready: Condvar::new(),
        layouts,
    });

    debug!(
        depth_bytes = depth.byte_len(),
        color_bytes = color.byte_len(),
        "Frame exchange allocated"
    );

    (
        FramePublisher {
            exchange: Arc::clone(&exchange),
            palette: DepthPalette::new(),
            staging: [vec![0; depth.byte_len()], vec![0; color.byte_len()]],
        },
        FrameReceiver {
            exchange: Arc::clone(&exchange),
            front: [vec![0; depth.byte_len()], vec![0; color.byte_len()]],
        },
        FrameControl { exchange },
    )
}

/// Capture-side handle; the only writer of the back buffers
pub struct FramePublisher {
    exchange: Arc<Exchange>,
    palette: DepthPalette,
    staging: [Vec<u8>; 2],
}

impl FramePublisher {
    /// Convert raw 11-bit depth samples and publish them
    pub fn publish_depth(&mut self, raw: &[u16]) {
        let staging = &mut self.staging[StreamKind::Depth.index()];
        self.palette.convert(raw, staging);
        self.deposit(StreamKind::Depth);
    }

    /// Copy an RGB24 color frame and publish it
    pub fn publish_color(&mut self, raw: &[u8]) {
        let staging = &mut self.staging[StreamKind::Color.index()];
        let n = raw.len().min(staging.len());
        staging[..n].copy_from_slice(&raw[..n]);
        staging[n..].fill(0);
        self.deposit(StreamKind::Color);
    }

    pub fn enabled_streams(&self) -> StreamSet {
        self.exchange.lock().enabled
    }

    fn deposit(&mut self, kind: StreamKind) {
        let i = kind.index();
        let mut shared = self.exchange.lock();
        std::mem::swap(&mut shared.slots[i].back, &mut self.staging[i]);
        shared.slots[i].published += 1;

        if shared.enabled.contains(kind) && !shared.slots[i].fresh {
            shared.slots[i].fresh = true;
            shared.ready += 1;
        }
        trace!(stream = %kind, ready = shared.ready, "Frame published");
        drop(shared);

        self.exchange.frame_ready.notify_one();
    }
}

/// Result of a render-side acquire
pub enum Acquire<'a> {
    /// Every enabled stream contributed; front buffers swapped
    Ready(FrontBuffers<'a>),
    /// No stream is enabled; nothing to wait for
    Idle,
    /// The wait bound elapsed before all enabled streams contributed
    TimedOut,
    /// The exchange was closed
    Closed,
}

/// Front buffers, valid until the next acquire
pub struct FrontBuffers<'a> {
    pub depth: &'a [u8],
    pub color: &'a [u8],
    /// Streams swapped by this acquire
    pub updated: StreamSet,
}

/// Render-side handle; the only reader of the front buffers
pub struct FrameReceiver {
    exchange: Arc<Exchange>,
    front: [Vec<u8>; 2],
}

impl FrameReceiver {
    /// Block until every enabled stream has contributed a frame
    pub fn acquire(&mut self) -> Acquire<'_> {
        self.acquire_until(None)
    }

    /// Like [`acquire`](Self::acquire), waiting at most `timeout`
    pub fn acquire_timeout(&mut self, timeout: Duration) -> Acquire<'_> {
        self.acquire_until(Some(Instant::now() + timeout))
    }

    /// Current front buffer for a stream
    pub fn front(&self, kind: StreamKind) -> &[u8] {
        &self.front[kind.index()]
    }

    pub fn layout(&self, kind: StreamKind) -> FrameLayout {
        self.exchange.layouts[kind.index()]
    }

    fn acquire_until(&mut self, deadline: Option<Instant>) -> Acquire<'_> {
        let mut shared = self.exchange.lock();

        loop {
            if shared.closed {
                return Acquire::Closed;
            }
            if shared.enabled.is_empty() {
                return Acquire::Idle;
            }
            if shared.ready >= shared.enabled.len() {
                break;
            }

            shared = match deadline {
                None => self
                    .exchange
                    .frame_ready
                    .wait(shared)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Acquire::TimedOut;
                    }
                    let (guard, _) = self
                        .exchange
                        .frame_ready
                        .wait_timeout(shared, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    guard
                }
            };
        }

        let updated = shared.enabled;
        for kind in updated.iter() {
            let i = kind.index();
            std::mem::swap(&mut shared.slots[i].back, &mut self.front[i]);
            shared.slots[i].fresh = false;
        }
        shared.ready = 0;
        drop(shared);

        Acquire::Ready(FrontBuffers {
            depth: &self.front[StreamKind::Depth.index()],
            color: &self.front[StreamKind::Color.index()],
            updated,
        })
    }
}

/// Cloneable handle for stream enablement and shutdown
#[derive(Clone)]
pub struct FrameControl {
    exchange: Arc<Exchange>,
}

impl FrameControl {
    pub fn set_enabled(&self, kind: StreamKind, enabled: bool) {
        let mut shared = self.exchange.lock();
        if enabled {
            shared.enabled = shared.enabled.with(kind, true);
        } else {
            shared.disable(kind);
        }
        debug!(stream = %kind, enabled, "Stream enablement changed");
        drop(shared);

        // The barrier target changed; let the waiter re-evaluate
        self.exchange.frame_ready.notify_all();
    }

    pub fn disable_all(&self) {
        let mut shared = self.exchange.lock();
        for kind in StreamKind::ALL {
            shared.disable(kind);
        }
        drop(shared);
        self.exchange.frame_ready.notify_all();
    }

    pub fn enabled(&self) -> StreamSet {
        self.exchange.lock().enabled
    }

    /// Total frames published for a stream, enabled or not
    pub fn published(&self, kind: StreamKind) -> u64 {
        self.exchange.lock().slots[kind.index()].published
    }

    /// Wake any waiter and make further acquires return `Closed`
    pub fn close(&self) {
        self.exchange.lock().closed = true;
        self.exchange.frame_ready.notify_all();
    }
}
