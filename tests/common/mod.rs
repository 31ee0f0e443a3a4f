#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anime_lens::{Classifier, ClassifierError, InferenceBackend, ANIME_TITLES};
use env_logger::{Builder, Env};
use image::codecs::gif::GifEncoder;
use image::{DynamicImage, ExtendedColorType, ImageBuffer, ImageFormat, Rgb};
use ndarray::{Array4, Axis};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Deterministic stand-in for the network: each class score is a fixed
/// weighting of the per-channel means of the input tensor.
#[derive(Debug)]
pub struct ChannelMeanBackend {
    pub num_classes: usize,
    pub calls: AtomicUsize,
}

impl ChannelMeanBackend {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            calls: AtomicUsize::new(0),
        }
    }
}

impl InferenceBackend for ChannelMeanBackend {
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        assert_eq!(input.shape(), &[1, 3, 224, 224]);
        self.calls.fetch_add(1, Ordering::SeqCst);

        let image = input.index_axis(Axis(0), 0);
        let means: Vec<f32> = image
            .axis_iter(Axis(0))
            .map(|channel| channel.mean().unwrap_or(0.0))
            .collect();

        Ok((0..self.num_classes)
            .map(|class| {
                means
                    .iter()
                    .enumerate()
                    .map(|(channel, mean)| mean * (((class * 7 + channel * 3) % 11) as f32 - 5.0))
                    .sum::<f32>()
            })
            .collect())
    }
}

/// Fails the first `failures` calls, then behaves like `ChannelMeanBackend`.
#[derive(Debug)]
pub struct FlakyBackend {
    pub failures: AtomicUsize,
    pub inner: ChannelMeanBackend,
}

impl InferenceBackend for FlakyBackend {
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClassifierError::InferenceError("device lost".into()));
        }
        self.inner.forward(input)
    }
}

/// Returns a fixed score vector regardless of input.
#[derive(Debug)]
pub struct FixedBackend(pub Vec<f32>);

impl InferenceBackend for FixedBackend {
    fn forward(&self, _input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        Ok(self.0.clone())
    }
}

pub fn anime_classifier() -> Classifier {
    Classifier::builder()
        .with_backend(Arc::new(ChannelMeanBackend::new(ANIME_TITLES.len())))
        .build()
        .expect("Failed to create classifier")
}

pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    if format == ImageFormat::Gif {
        let rgba = image.to_rgba8();
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder
            .encode(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
            .expect("Failed to encode test gif");
        drop(encoder);
        return bytes;
    }
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Png)
}

pub const DATASET: &str = "\
anime_id,title,title_english,title_synonyms,type,year,source,episodes,status,rating,score,studio,genre
1535,Death Note,Death Note,DN,TV,2006,Manga,37,Finished Airing,R - 17+,8.62,Madhouse,\"Mystery, Police, Psychological\"
16498,Shingeki no Kyojin,Attack on Titan,AoT,TV,2013,Manga,25,Finished Airing,R - 17+,8.54,Wit Studio,\"Action, Drama\"
28851,Koe no Katachi,A Silent Voice,The Shape of Voice,Movie,2016,Manga,1,Finished Airing,PG-13,9.0,Kyoto Animation,Drama
";
