// THEORY (single-pixel greenness):
// The `Pixel` module is the most fundamental unit of the classifier. It is a
// "dumb" data container for one RGB pixel plus the heuristics that can be computed
// from that pixel alone, with no knowledge of neighbours or regions.
//
// Channels are stored normalized to [0, 1]. That is the scale every vegetation
// rule is written in (red < 0.6, excess green > 0.05, ...), so 8-bit input is
// divided by 255 once, on construction.
//
// Heuristic families:
// - Greenness:  green−red, green−blue, their sum (excess green, ExG) and their
//               product (positive only when green dominates both or neither)
// - Perception: CIE L*u*v* coordinates under D65, the space in which the
//               mean-shift segmenter measures colour distance
//
// Key principles:
// 1) Single-pixel scope: nothing here reads another pixel.
// 2) Validation lives at the image boundary (`ColorImage`), not per heuristic.

pub mod pixel {
    pub type Channel = u8;
    pub type NormalizedChannel = f64;
    pub type ColorDifference = f64;
    pub type ExcessGreen = f64;
    pub type Luv = [f64; 3];

    const CHANNEL_MAX: f64 = 255.0;

    // D65 reference white in u'v' chromaticity.
    const WHITE_U_PRIME: f64 = 0.197_839_824_821_408;
    const WHITE_V_PRIME: f64 = 0.468_336_302_932_409;
    const CIE_EPSILON: f64 = 216.0 / 24_389.0;
    const CIE_KAPPA: f64 = 24_389.0 / 27.0;

    /// A "dumb" data container representing a single normalized RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pixel {
        /// The red channel value (0.0-1.0).
        pub red: NormalizedChannel,
        /// The green channel value (0.0-1.0).
        pub green: NormalizedChannel,
        /// The blue channel value (0.0-1.0).
        pub blue: NormalizedChannel,
    }

    impl Pixel {
        pub fn new(red: NormalizedChannel, green: NormalizedChannel, blue: NormalizedChannel) -> Self {
            Self { red, green, blue }
        }

        /// Builds a pixel from 8-bit channels, dividing each by 255.
        pub fn from_bytes(red: Channel, green: Channel, blue: Channel) -> Self {
            Self {
                red: red as NormalizedChannel / CHANNEL_MAX,
                green: green as NormalizedChannel / CHANNEL_MAX,
                blue: blue as NormalizedChannel / CHANNEL_MAX,
            }
        }

        /// Rounds back to 8-bit channels, saturating outside [0, 1].
        pub fn to_bytes(&self) -> [Channel; 3] {
            let quantize = |v: NormalizedChannel| (v * CHANNEL_MAX).round().clamp(0.0, CHANNEL_MAX) as Channel;
            [quantize(self.red), quantize(self.green), quantize(self.blue)]
        }

        pub fn channels(&self) -> [NormalizedChannel; 3] {
            [self.red, self.green, self.blue]
        }

        pub fn is_finite(&self) -> bool {
            self.red.is_finite() && self.green.is_finite() && self.blue.is_finite()
        }

        /// True when every channel is finite and inside [0, 1].
        pub fn is_normalized(&self) -> bool {
            self.channels().iter().all(|c| (0.0..=1.0).contains(c))
        }

        /// =================================Heuristics==================================

        /// Green minus red. Positive when the pixel leans green over red.
        pub fn green_red_difference(&self) -> ColorDifference {
            self.green - self.red
        }

        /// Green minus blue.
        pub fn green_blue_difference(&self) -> ColorDifference {
            self.green - self.blue
        }

        /// Excess green, `(g − r) + (g − b)`. Brightness independent colour bias
        /// toward green; negative for red, blue and magenta tones.
        pub fn excess_green(&self) -> ExcessGreen {
            self.green_red_difference() + self.green_blue_difference()
        }

        /// Product of the two green differences.
        pub fn difference_product(&self) -> ColorDifference {
            self.green_red_difference() * self.green_blue_difference()
        }

        /// CIE L*u*v* (D65) coordinates of the pixel, treating channels as sRGB.
        ///
        /// - L* spans 0..100; u*, v* are roughly within ±100 for sRGB gamut.
        /// - Euclidean distance here approximates perceived colour difference,
        ///   which is what the segmenter's range radius is expressed in.
        pub fn to_luv(&self) -> Luv {
            let r = srgb_to_linear(self.red);
            let g = srgb_to_linear(self.green);
            let b = srgb_to_linear(self.blue);

            let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
            let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
            let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;

            let lightness = if y > CIE_EPSILON {
                116.0 * y.cbrt() - 16.0
            } else {
                CIE_KAPPA * y
            };

            let denominator = x + 15.0 * y + 3.0 * z;
            if denominator <= f64::EPSILON {
                return [lightness, 0.0, 0.0];
            }
            let u_prime = 4.0 * x / denominator;
            let v_prime = 9.0 * y / denominator;

            [
                lightness,
                13.0 * lightness * (u_prime - WHITE_U_PRIME),
                13.0 * lightness * (v_prime - WHITE_V_PRIME),
            ]
        }
    }

    impl From<&[u8]> for Pixel {
        /// Reads the first three bytes as R, G, B. Any trailing alpha byte is ignored.
        fn from(bytes: &[u8]) -> Self {
            match bytes {
                [red, green, blue, ..] => Pixel::from_bytes(*red, *green, *blue),
                _ => Pixel::default(),
            }
        }
    }

    impl From<image::Rgb<u8>> for Pixel {
        fn from(rgb: image::Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::from_bytes(red, green, blue)
        }
    }

    /// Inverse sRGB transfer function on a normalized channel.
    fn srgb_to_linear(value: NormalizedChannel) -> f64 {
        if value <= 0.040_45 {
            value / 12.92
        } else {
            ((value + 0.055) / 1.055).powf(2.4)
        }
    }

    /// Squared Euclidean distance between two L*u*v* colours.
    pub fn luv_distance_squared(a: &Luv, b: &Luv) -> f64 {
        a.iter().zip(b.iter()).map(|(p, q)| (p - q) * (p - q)).sum()
    }
}
