// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::DecodePool;
use crate::io::AssetBuffer;
use khora_core::asset::ByteSlice;
use std::{
    io::{self, Read},
    mem,
};

/// The decoded bytes of one compressed section.
#[derive(Debug)]
pub struct DecodedSection {
    /// Exactly `src_size` bytes. Regions no frame produced are zero.
    pub buffer: AssetBuffer,
    /// How many frames decoded successfully.
    pub frames: u32,
}

/// One frame and the part of the output it owns.
struct FrameJob<'a> {
    frame: &'a [u8],
    region: &'a mut [u8],
    /// Decoded size from the frame header, `None` if the header omits it.
    content_size: Option<u64>,
}

/// Decodes a zstd section made of independent frames.
///
/// Consumes exactly `slice.size` bytes from `reader` and returns a buffer of
/// exactly `slice.src_size` bytes. Each frame owns the output region given by the
/// content sizes in the frame headers and decodes straight into it, in parallel
/// on `pool`; the call blocks until every frame is done. No frame ever writes
/// past its region, so memory stays bounded by `src_size`.
///
/// Damage is tolerated: a frame that fails to decode leaves its own region
/// zeroed, trailing bytes that do not form a frame are ignored, and output past
/// `src_size` is dropped. A frame without a content size takes the rest of the
/// output and ends the section. When the number of decoded frames differs from
/// `slice.frames`, a single warning is logged and the call still succeeds.
pub fn decode_frames<R: Read>(
    reader: R,
    slice: &ByteSlice,
    pool: &DecodePool,
) -> io::Result<DecodedSection> {
    let src_size = usize::try_from(slice.src_size)
        .map_err(|_| crate::error::invalid_argument("decoded section does not fit in memory"))?;

    let mut compressed = Vec::new();
    reader.take(slice.size).read_to_end(&mut compressed)?;
    if (compressed.len() as u64) < slice.size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "compressed section is truncated",
        ));
    }

    let frames = split_frames(&compressed, slice.offset);
    let mut buffer = AssetBuffer::zeroed(src_size);
    let results = {
        let mut jobs = assign_regions(&frames, buffer.as_mut_slice(), slice.offset);
        pool.map_mut(&mut jobs, decode_into_region)
    };

    let mut decoded_frames = 0u32;
    let mut dropped = 0u64;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(excess) => {
                decoded_frames += 1;
                dropped += excess;
            }
            Err(e) => {
                log::warn!(
                    "zstd frame {index} of section at offset {} failed to decode: {e}",
                    slice.offset
                );
            }
        }
    }
    if dropped > 0 {
        log::debug!(
            "zstd section at offset {} produced {dropped} bytes past its declared size",
            slice.offset
        );
    }

    if decoded_frames != slice.frames {
        log::warn!(
            "zstd section at offset {} decoded {decoded_frames} frames, expected {}; content may be damaged",
            slice.offset,
            slice.frames
        );
    }

    Ok(DecodedSection {
        buffer,
        frames: decoded_frames,
    })
}

/// Splits `data` at zstd frame boundaries. Stops at the first bytes that do not
/// start a complete frame.
fn split_frames(data: &[u8], offset: u64) -> Vec<&[u8]> {
    let mut frames = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        match zstd::zstd_safe::find_frame_compressed_size(rest) {
            Ok(len) if len > 0 && len <= rest.len() => {
                let (frame, tail) = rest.split_at(len);
                frames.push(frame);
                rest = tail;
            }
            _ => {
                log::warn!(
                    "zstd section at offset {offset}: ignoring {} trailing bytes that are not a frame",
                    rest.len()
                );
                break;
            }
        }
    }
    frames
}

/// Cuts `dst` into one disjoint region per frame, in frame order.
///
/// Regions are clamped to the end of `dst`; frames starting past it get an empty
/// region.
fn assign_regions<'a>(frames: &[&'a [u8]], dst: &'a mut [u8], offset: u64) -> Vec<FrameJob<'a>> {
    let mut jobs = Vec::with_capacity(frames.len());
    let mut rest = dst;
    for (index, frame) in frames.iter().copied().enumerate() {
        let content_size = zstd::zstd_safe::get_frame_content_size(frame)
            .ok()
            .flatten();
        let len = content_size
            .and_then(|size| usize::try_from(size).ok())
            .map_or(rest.len(), |size| size.min(rest.len()));

        let (region, tail) = mem::take(&mut rest).split_at_mut(len);
        rest = tail;
        jobs.push(FrameJob {
            frame,
            region,
            content_size,
        });

        if content_size.is_none() {
            let skipped = frames.len() - index - 1;
            if skipped > 0 {
                log::warn!(
                    "zstd frame {index} of section at offset {offset} has no content size; ignoring {skipped} later frames"
                );
            }
            break;
        }
    }
    jobs
}

/// Decodes one frame into its region and returns how many decoded bytes did not
/// fit. On failure the region is zeroed again.
fn decode_into_region(job: &mut FrameJob<'_>) -> io::Result<u64> {
    let result = fill_region(job);
    if result.is_err() {
        job.region.fill(0);
    }
    result
}

fn fill_region(job: &mut FrameJob<'_>) -> io::Result<u64> {
    let mut decoder = zstd::stream::read::Decoder::with_buffer(job.frame)?;
    let mut filled = 0;
    while filled < job.region.len() {
        match decoder.read(&mut job.region[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let region_len = job.region.len() as u64;
    if let Some(size) = job.content_size.filter(|size| *size > region_len) {
        return Ok(size - region_len);
    }

    // Run the frame to its end so the content checksum, if any, is verified.
    let mut scratch = [0u8; 256];
    let mut excess = 0u64;
    loop {
        match decoder.read(&mut scratch) {
            Ok(0) => break,
            Ok(read) => excess += read as u64,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(excess)
}
