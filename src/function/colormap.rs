//! Perceptual colormaps for diagnostic exports.

/// Samples of the viridis colormap at `0.0, 0.1, ..., 1.0`.
///
/// These are 11 of the 256 entries in matplotlib's table. [`viridis`]
/// interpolates linearly between them, so colors between the samples
/// can differ from matplotlib's by about one 8-bit step.
pub const VIRIDIS: [[f64; 3]; 11] = [
    [0.267004, 0.004874, 0.329415],
    [0.282623, 0.140926, 0.457517],
    [0.253935, 0.265254, 0.529983],
    [0.206756, 0.371758, 0.553117],
    [0.163625, 0.471133, 0.558148],
    [0.127568, 0.566949, 0.550556],
    [0.134692, 0.658636, 0.517649],
    [0.266941, 0.748751, 0.440573],
    [0.477504, 0.821444, 0.318195],
    [0.741388, 0.873449, 0.149561],
    [0.993248, 0.906157, 0.143936],
];

/// Looking up the viridis colormap with linear interpolation
/// between the [`VIRIDIS`] samples.
///
/// `value` is clamped into `[0, 1]`.
pub fn viridis(value: f64) -> [f64; 3] {
    let position = value.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
    let index = (position.floor() as usize).min(VIRIDIS.len() - 2);
    let weight = position - index as f64;
    let [lower, upper] = [VIRIDIS[index], VIRIDIS[index + 1]];

    [0, 1, 2].map(|c| lower[c] * (1.0 - weight) + upper[c] * weight)
}

/// Sampling `count` colors uniformly over `[0, 1]` as 8-bit RGB.
///
/// A single sample takes the start of the colormap.
pub fn viridis_rgb8(count: usize) -> Vec<[u8; 3]> {
    let denominator = count.saturating_sub(1).max(1) as f64;

    (0..count)
        .map(|index| {
            viridis(index as f64 / denominator)
                .map(|c| (c * 255.0).clamp(0.0, 255.0) as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #[test]
    fn viridis_endpoints() {
        use super::*;

        assert_eq!(viridis(0.0), VIRIDIS[0]);
        assert_eq!(viridis(1.0), VIRIDIS[10]);
        assert_eq!(viridis(-1.0), VIRIDIS[0]);
        assert_eq!(viridis(2.0), VIRIDIS[10]);

        let middle = viridis(0.55);
        for c in 0..3 {
            let target = (VIRIDIS[5][c] + VIRIDIS[6][c]) / 2.0;
            assert!((middle[c] - target).abs() < 1e-9);
        }
    }

    #[test]
    fn viridis_between_samples() {
        use super::*;

        // Entry 64 of matplotlib's 256-entry table
        let target = [0.229739, 0.322361, 0.545706];
        let output = viridis(0.25);
        for c in 0..3 {
            assert!((output[c] - target[c]).abs() < 2.0 / 255.0, "{output:?}");
        }
    }

    #[test]
    fn viridis_rgb8_samples() {
        use super::*;

        assert!(viridis_rgb8(0).is_empty());
        assert_eq!(viridis_rgb8(1), vec![[68, 1, 84]]);

        let colors = viridis_rgb8(3);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], [68, 1, 84]);
        assert_eq!(colors[2], [253, 231, 36]);
    }
}
