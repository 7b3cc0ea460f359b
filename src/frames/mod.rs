// SPDX-License-Identifier: GPL-3.0-only

//! Frame buffers shared between capture and render

mod depth;
mod exchange;

pub use depth::{DepthBand, DepthPalette};
pub use exchange::{
    Acquire, FrameControl, FrameLayout, FramePublisher, FrameReceiver, FrontBuffers, StreamKind,
    StreamSet, frame_exchange,
};
