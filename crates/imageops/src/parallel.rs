//! Chunked dispatch shared by the engines.
//!
//! With the `parallel` feature (default) chunks go through rayon's
//! `par_chunks_mut`; without it the same closures run on the calling thread.
//! Every chunk writes only its own output slice, so both paths produce the
//! same bytes.

use imageops_core::ImageBatch;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pixels per work item in [`map_pixels`].
const PIXELS_PER_CHUNK: usize = 4096;

/// Calls `f(index, chunk)` for every `chunk_len`-sized chunk of `dst`.
pub(crate) fn for_each_chunk<T, F>(dst: &mut [T], chunk_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if chunk_len == 0 {
        return;
    }

    #[cfg(feature = "parallel")]
    dst.par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| f(i, chunk));

    #[cfg(not(feature = "parallel"))]
    dst.chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| f(i, chunk));
}

/// Maps every `channels`-wide pixel of `src` to an `out_channels`-wide pixel.
pub(crate) fn map_pixels<F>(src: &[f32], channels: usize, out_channels: usize, f: F) -> Vec<f32>
where
    F: Fn(&[f32], &mut [f32]) + Sync + Send,
{
    let pixels = src.len() / channels.max(1);
    let mut dst = vec![0.0f32; pixels * out_channels];
    for_each_chunk(&mut dst, PIXELS_PER_CHUNK * out_channels, |i, out| {
        let first = i * PIXELS_PER_CHUNK;
        for (j, px) in out.chunks_exact_mut(out_channels).enumerate() {
            let s = (first + j) * channels;
            f(&src[s..s + channels], px);
        }
    });
    dst
}

/// Copies `src` and rewrites every pixel in place with `f`.
pub(crate) fn map_image<F>(src: &ImageBatch, f: F) -> ImageBatch
where
    F: Fn(&mut [f32]) + Sync + Send,
{
    let c = src.channels();
    let mut out = src.clone();
    for_each_chunk(out.data_mut(), PIXELS_PER_CHUNK * c, |_, chunk| {
        chunk.chunks_exact_mut(c).for_each(&f);
    });
    out
}
