//! Real-world scenario tests for imageops-matte
//!
//! Synthetic stand-ins for the inputs the matte algorithms are used on:
//! stickers on black, green-screen footage and short frame sequences.

use image::{Luma, Rgba};
use imageops_matte::{
    process_frames, BorderFloodFillMatte, ChromaKey, ColorKey, ComputeMatte, FrameFailure,
    FrameSink, FrameSource, Image, KeyColor, MaskStats, MatteConfig, MatteError, MemoryFrameSink,
    MemoryFrameSource, PixelBuffer,
};

const BACKGROUND_GREEN: Rgba<u8> = Rgba([0, 253, 33, 255]);
const SKIN: Rgba<u8> = Rgba([220, 180, 150, 255]);

/// Sticker scenario
/// A white sticker on a black background with dark details drawn inside it
#[test]
fn sticker_outline_details_survive_background_removal() {
    let mut sticker: PixelBuffer = Image::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
    for y in 4..16 {
        for x in 4..16 {
            sticker.put_pixel(x, y, Rgba([250, 250, 250, 255]));
        }
    }
    // Eyes and a mouth in the same black as the background.
    for (x, y) in [(7, 7), (12, 7), (8, 12), (9, 12), (10, 12), (11, 12)] {
        sticker.put_pixel(x, y, Rgba([0, 0, 0, 255]));
    }

    let mask = sticker.border_flood_fill_matte(30).unwrap();

    assert_eq!(mask.transparent_count(), 400 - 144);
    for (x, y) in [(7, 7), (12, 7), (8, 12), (11, 12)] {
        assert_eq!(mask.get_pixel(x, y), &Luma([255]));
    }
}

/// Scanned artwork scenario
/// The black background carries sensor noise below the threshold
#[test]
fn noisy_black_background_is_removed() {
    let mut artwork: PixelBuffer = Image::from_fn(24, 16, |x, y| {
        let noise = ((x * 7 + y * 13) % 23) as u8;
        Rgba([noise, noise / 2, noise + 3, 255])
    });
    for y in 5..11 {
        for x in 6..18 {
            artwork.put_pixel(x, y, Rgba([180, 40, 60, 255]));
        }
    }

    let output = MatteConfig::flood_fill(30)
        .build()
        .unwrap()
        .compute_composited(&artwork)
        .unwrap();

    let opaque = output.pixels().filter(|pixel| pixel[3] == 255).count();
    assert_eq!(opaque, 6 * 12);
    assert_eq!(output.get_pixel(10, 8), &Rgba([180, 40, 60, 255]));
    assert_eq!(output.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
}

/// Green-screen scenario
/// A subject on a chroma green backdrop with a green halo around its edge
#[test]
fn green_screen_halo_is_despilled() {
    let halo = Rgba([60, 220, 80, 255]);
    let frame: PixelBuffer = Image::from_fn(48, 48, |x, y| {
        let inside = |lo: u32, hi: u32| (lo..hi).contains(&x) && (lo..hi).contains(&y);
        if inside(16, 32) {
            SKIN
        } else if inside(15, 33) {
            halo
        } else {
            BACKGROUND_GREEN
        }
    });

    let chroma = ChromaKey::with_key(ColorKey::new(KeyColor::default().0, 40));
    let output = chroma.compute_composited(&frame).unwrap();

    // The backdrop is gone.
    assert_eq!(output.get_pixel(2, 2), &Rgba([0, 0, 0, 0]));
    assert_eq!(output.get_pixel(45, 24), &Rgba([0, 0, 0, 0]));
    // The subject keeps its color.
    assert_eq!(output.get_pixel(24, 24), &SKIN);
    // Halo pixels are either removed or lose part of their green.
    for x in 15..33 {
        let pixel = output.get_pixel(x, 15);
        assert!(pixel[1] < halo[1], "halo pixel at ({x}, 15) kept its green: {pixel:?}");
    }
}

/// Short clip scenario
/// Frames are keyed in order and a corrupt frame does not stop the run
#[test]
fn clip_with_corrupt_frame_is_keyed_in_order() {
    let clip_frame = |offset: u32| -> PixelBuffer {
        Image::from_fn(32, 24, |x, y| {
            let subject_x = (8 + offset)..(20 + offset);
            if subject_x.contains(&x) && (6..18).contains(&y) {
                SKIN
            } else {
                BACKGROUND_GREEN
            }
        })
    };
    let frames = vec![clip_frame(0), clip_frame(2), Image::new(32, 0), clip_frame(4)];
    let mut source = MemoryFrameSource::new(frames).with_frame_rate(24.0);
    assert_eq!(source.metadata().frame_rate, Some(24.0));

    let algorithm = MatteConfig::chroma_key(KeyColor::default(), 40)
        .build()
        .unwrap();
    let mut sink = MemoryFrameSink::new();
    let report = process_frames(&mut source, &algorithm, &mut sink, 2).unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(
        report.failures,
        vec![FrameFailure {
            index: 2,
            error: MatteError::InvalidDimensions {
                width: 32,
                height: 0
            }
        }]
    );
    assert!(source.next_frame().is_none());

    let keyed = sink.into_frames();
    assert_eq!(keyed.len(), 3);
    // The subject moves right by two pixels per frame.
    for (frame, offset) in keyed.iter().zip([0u32, 2, 4]) {
        assert_eq!(frame.get_pixel(14 + offset, 12), &SKIN);
        assert_eq!(frame.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }
}

/// Custom sink scenario
/// Sinks see frames one at a time, in production order
#[test]
fn custom_sink_receives_transparent_counts() {
    struct CountingSink(Vec<usize>);

    impl FrameSink for CountingSink {
        type Error = MatteError;

        fn push_frame(&mut self, frame: PixelBuffer) -> Result<(), Self::Error> {
            self.0
                .push(frame.pixels().filter(|pixel| pixel[3] == 0).count());
            Ok(())
        }
    }

    let frames = (0..4u32).map(|lit| {
        Image::from_fn(4, 4, |x, _| {
            if x < lit {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    });
    let mut source = MemoryFrameSource::new(frames);
    let mut sink = CountingSink(Vec::new());

    let algorithm = MatteConfig::default().build().unwrap();
    let report = process_frames(&mut source, &algorithm, &mut sink, 3).unwrap();

    assert!(report.is_success());
    assert_eq!(sink.0, vec![16, 12, 8, 4]);
}
