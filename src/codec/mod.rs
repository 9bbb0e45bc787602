//! Framed channel codec.
//!
//! Every message on the channel, in both directions, is a 4-byte
//! little-endian `u32` payload length followed by that many bytes of UTF-8
//! JSON. A reader that sees fewer than 4 bytes before end of stream treats
//! it as a clean hang-up; a reader that sees a short payload cannot recover.
//!
//! ```text
//! +----------------+------------------------------+
//! | len: u32 (LE)  | payload: len bytes of JSON   |
//! +----------------+------------------------------+
//! ```

mod frame;

pub use frame::{
    decode_payload, encode_frame, FrameReader, FrameWriter, Message, DEFAULT_MAX_FRAME_SIZE,
    LENGTH_PREFIX_LEN,
};
