// Transform — post-decode preprocessing pipeline
//
// A transform maps one value to another and is applied by the datasets right
// after decoding. Image-to-image steps (Resize, Grayscale) come first, then
// ToSample turns the image into a dense `Sample`, after which sample-level
// steps such as Normalize apply. Steps are chained with `then`:
//
//   let t = Resize::new(224, 224).then(ToSample).then(Normalize::imagenet());

use image::imageops::FilterType;
use image::DynamicImage;

use crate::dataset::Sample;

/// A transform applied to each decoded sample.
pub trait Transform<In>: Send + Sync {
    /// The transformed value.
    type Output;

    /// Apply the transform.
    fn apply(&self, input: In) -> Self::Output;
}

/// Chaining helper available on every transform.
pub trait TransformExt: Sized {
    /// Run `self`, then feed its output to `next`.
    fn then<B>(self, next: B) -> Chain<Self, B> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T> TransformExt for T {}

// Built-in transforms

/// Returns its input unchanged. The default transform of both datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> Transform<T> for Identity {
    type Output = T;

    fn apply(&self, input: T) -> T {
        input
    }
}

/// Two transforms run back to back.
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<In, A, B> Transform<In> for Chain<A, B>
where
    A: Transform<In>,
    B: Transform<A::Output>,
{
    type Output = B::Output;

    fn apply(&self, input: In) -> Self::Output {
        self.second.apply(self.first.apply(input))
    }
}

/// Wraps a closure as a transform. See [`from_fn`].
#[derive(Clone)]
pub struct FnTransform<F>(F);

/// Use a closure as a transform.
pub fn from_fn<F>(f: F) -> FnTransform<F> {
    FnTransform(f)
}

impl<In, Out, F> Transform<In> for FnTransform<F>
where
    F: Fn(In) -> Out + Send + Sync,
{
    type Output = Out;

    fn apply(&self, input: In) -> Out {
        (self.0)(input)
    }
}

/// Resize to exactly (width, height), ignoring aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
    pub filter: FilterType,
}

impl Resize {
    /// Resize with a Lanczos3 filter.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: FilterType::Lanczos3,
        }
    }

    /// Use `filter` instead of Lanczos3.
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl Transform<DynamicImage> for Resize {
    type Output = DynamicImage;

    fn apply(&self, img: DynamicImage) -> DynamicImage {
        if img.width() == self.width && img.height() == self.height {
            return img;
        }
        img.resize_exact(self.width, self.height, self.filter)
    }
}

/// Convert to single-channel luma.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grayscale;

impl Transform<DynamicImage> for Grayscale {
    type Output = DynamicImage;

    fn apply(&self, img: DynamicImage) -> DynamicImage {
        DynamicImage::ImageLuma8(img.to_luma8())
    }
}

/// Convert an image to a [`Sample`] with pixels in `[C, H, W]` layout,
/// scaled to `[0, 1]`.
///
/// Luma images (with or without alpha) produce one channel, everything else
/// is converted to RGB. Alpha is dropped. [`DefaultDecoder`] always yields RGB,
/// so a one-channel sample only comes out after an explicit [`Grayscale`].
///
/// [`DefaultDecoder`]: crate::decoder::DefaultDecoder
#[derive(Debug, Clone, Copy, Default)]
pub struct ToSample;

impl Transform<DynamicImage> for ToSample {
    type Output = Sample;

    fn apply(&self, img: DynamicImage) -> Sample {
        let (w, h) = (img.width() as usize, img.height() as usize);
        if img.color().channel_count() <= 2 {
            let gray = img.to_luma8();
            let features = gray.as_raw().iter().map(|&v| v as f64 / 255.0).collect();
            return Sample {
                features,
                feature_shape: vec![1, h, w],
                target: Vec::new(),
                target_shape: Vec::new(),
            };
        }

        let rgb = img.to_rgb8();
        let raw = rgb.as_raw();
        // [H, W, C] interleaved to [C, H, W] planar
        let npix = w * h;
        let mut features = vec![0.0f64; 3 * npix];
        for i in 0..npix {
            features[i] = raw[i * 3] as f64 / 255.0;
            features[npix + i] = raw[i * 3 + 1] as f64 / 255.0;
            features[2 * npix + i] = raw[i * 3 + 2] as f64 / 255.0;
        }
        Sample {
            features,
            feature_shape: vec![3, h, w],
            target: Vec::new(),
            target_shape: Vec::new(),
        }
    }
}

/// Per-channel `(x - mean) / std` on a `[C, H, W]` sample.
///
/// Channel `c` uses statistic `c % mean.len()`, so a single mean/std value is
/// broadcast to every channel and a one-channel sample under RGB statistics
/// uses the first one.
#[derive(Debug, Clone)]
pub struct Normalize {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Normalize {
    /// One mean/std pair per channel, in channel order.
    ///
    /// Panics if `mean` and `std` differ in length or are empty.
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Self {
        assert_eq!(
            mean.len(),
            std.len(),
            "Normalize: mean and std must have the same length"
        );
        assert!(!mean.is_empty(), "Normalize: need at least one channel");
        Self { mean, std }
    }

    /// The usual ImageNet RGB statistics.
    pub fn imagenet() -> Self {
        Self::new(vec![0.485, 0.456, 0.406], vec![0.229, 0.224, 0.225])
    }
}

impl Transform<Sample> for Normalize {
    type Output = Sample;

    fn apply(&self, mut sample: Sample) -> Sample {
        let stats = self.mean.len().min(self.std.len());
        if stats == 0 {
            return sample;
        }
        let channels = sample.feature_shape.first().copied().unwrap_or(1).max(1);
        let plane = (sample.features.len() / channels).max(1);
        for (i, v) in sample.features.iter_mut().enumerate() {
            let c = (i / plane) % stats;
            *v = (*v - self.mean[c]) / self.std[c];
        }
        sample
    }
}
