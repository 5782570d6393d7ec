// src/core/protocol/mod.rs

mod frame;

pub use frame::{MAX_FRAME_SIZE, WireFrame, WireFrameCodec};
