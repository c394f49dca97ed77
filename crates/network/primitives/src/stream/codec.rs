use core::str::{from_utf8, Utf8Error};
use std::io::Error as IoError;

use bytes::BytesMut;
use thiserror::Error as ThisError;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder};

use crate::envelope::DELIMITER;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub data: Vec<u8>,
}

impl Message {
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum CodecError {
    #[error(transparent)]
    StdIo(#[from] IoError),
    #[error("frame exceeds the {max} byte limit")]
    FrameTooLarge { max: usize },
    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),
}

/// Splits a byte stream into newline-terminated records, skipping blank lines.
#[derive(Debug)]
pub(crate) struct FrameCodec {
    max_size: usize,
    delimited: AnyDelimiterCodec,
}

impl FrameCodec {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            delimited: AnyDelimiterCodec::new_with_max_length(
                vec![DELIMITER],
                vec![DELIMITER],
                max_size,
            ),
        }
    }

    fn codec_error(&self, err: AnyDelimiterCodecError) -> CodecError {
        match err {
            AnyDelimiterCodecError::MaxChunkLengthExceeded => CodecError::FrameTooLarge {
                max: self.max_size,
            },
            AnyDelimiterCodecError::Io(err) => CodecError::StdIo(err),
        }
    }
}

fn is_blank(frame: &[u8]) -> bool {
    frame.iter().all(u8::is_ascii_whitespace)
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let frame = match self.delimited.decode(src) {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(None),
                Err(err) => return Err(self.codec_error(err)),
            };

            if !is_blank(&frame) {
                return Ok(Some(Message::new(frame.to_vec())));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let frame = match self.delimited.decode_eof(src) {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(None),
                Err(err) => return Err(self.codec_error(err)),
            };

            if !is_blank(&frame) {
                return Ok(Some(Message::new(frame.to_vec())));
            }
        }
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut data = item.data.as_slice();
        if let Some((&DELIMITER, head)) = data.split_last() {
            data = head;
        }

        if data.len() > self.max_size {
            return Err(CodecError::FrameTooLarge { max: self.max_size });
        }

        self.delimited
            .encode(from_utf8(data)?, dst)
            .map_err(|err| self.codec_error(err))
    }
}
