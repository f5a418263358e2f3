//! 3DGS scene import implementation.

pub use super::*;

use crate::polygon::{Element, Header, Object, ScalarKind};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    fs,
    io::{BufReader, Read},
    path::Path,
};

impl PolygonVariant {
    /// Detecting the variant from the header.
    ///
    /// The file has no version field, so the variant is told by the width of
    /// float properties and the presence of RGB colors.
    pub fn detect(header: &Header) -> Result<Self, Error> {
        let element = header
            .get("vertex")
            .ok_or_else(|| Error::MissingPolygonElement("vertex".into()))?;
        let position = element
            .properties
            .get("x")
            .ok_or_else(|| Error::MissingPolygonProperty("vertex.x".into()))?;

        if position.kind == ScalarKind::Half {
            return Ok(Self::Half);
        }
        let has_colors_rgb = ["red", "green", "blue"]
            .iter()
            .all(|name| element.properties.contains_key(*name));

        Ok(if has_colors_rgb {
            Self::Viewer
        } else {
            Self::Standard
        })
    }
}

/// Scene importers
impl<B: Backend> Gaussian3dScene<B> {
    /// Import the scene in the 3DGS PLY format.
    ///
    /// The properties are matched by name, so all variants are accepted.
    ///
    /// ## Errors
    ///
    /// It fails if any required property is missing or the count of SH
    /// coefficients mismatches the degree in `config`.
    pub fn decode_polygon(
        reader: &mut impl Read,
        config: &Gaussian3dSceneConfig,
        device: &B::Device,
    ) -> Result<Self, Error> {
        let mut scene = config.init::<B>(device)?;
        let degree = scene.colors_sh_degree();

        let reader = &mut BufReader::new(reader);
        let object = Object::decode(reader)?;
        let element = object
            .elem("vertex")
            .ok_or_else(|| Error::MissingPolygonElement("vertex".into()))?;
        let point_count = element.count;

        // [P, N] <- [N, P]
        let take_tensor = |names: &[String]| -> Result<Tensor<B, 2>, Error> {
            let mut values = Vec::with_capacity(names.len() * point_count);
            for name in names {
                values.extend(object.elem_prop("vertex", name)?.to_f32s());
            }
            let data = TensorData::new(values, [names.len(), point_count]);
            Ok(Tensor::<B, 2>::from_data(data, device)
                .swap_dims(0, 1)
                .set_require_grad(true))
        };

        let names_dc = take_names(element, "f_dc_")?;
        let names_rest = take_names(element, "f_rest_")?;
        let names_scale = take_names(element, "scale_")?;
        let names_rot = take_names(element, "rot")?;

        let channel_count = names_dc.len();
        if (degree > 0 && channel_count != 3) || channel_count == 0 {
            return Err(Error::MismatchedPropertyCount(
                "f_dc".into(),
                if degree > 0 { 3 } else { 1 },
                channel_count,
            ));
        }
        if degree > 0 {
            let count_target = 3 * (sh_count(degree) - 1);
            if names_rest.len() != count_target {
                return Err(Error::MismatchedPropertyCount(
                    "f_rest".into(),
                    count_target,
                    names_rest.len(),
                ));
            }
        } else if !names_rest.is_empty() {
            log::warn!(
                target: "gausplat::scene::gaussian_3d::import",
                "decode_polygon > {} f_rest properties are ignored for SH degree 0",
                names_rest.len(),
            );
        }
        if names_scale.len() != 3 {
            return Err(Error::MismatchedPropertyCount("scale".into(), 3, names_scale.len()));
        }
        if names_rot.len() != 4 {
            return Err(Error::MismatchedPropertyCount("rot".into(), 4, names_rot.len()));
        }

        // [P, 1, C]
        let colors_sh_dc = take_tensor(&names_dc)?.reshape([point_count, 1, channel_count]);
        // [P, K, C]
        let colors_sh = if degree > 0 {
            // [P, K - 1, 3] <- [P, 3, K - 1] (channel-major)
            let colors_sh_rest = take_tensor(&names_rest)?
                .reshape([point_count, 3, sh_count(degree) - 1])
                .swap_dims(1, 2);
            Tensor::cat(vec![colors_sh_dc, colors_sh_rest], 1)
        } else {
            colors_sh_dc
        };
        // [P, 1]
        let opacities = take_tensor(&["opacity".to_owned()])?;
        // [P, 3]
        let positions = take_tensor(&["x", "y", "z"].map(String::from))?;
        // [P, 4] (w, x, y, z)
        let rotations = take_tensor(&names_rot)?;
        // [P, 3]
        let scalings = scene
            .scaling_activation()
            .from_log_scalings(take_tensor(&names_scale)?);

        scene.set_data(positions, colors_sh, scalings, rotations, opacities)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::import",
            "decode_polygon > point_count ({point_count})",
        );

        Ok(scene)
    }

    /// Loading the scene from a polygon file.
    pub fn load_polygon(
        path: impl AsRef<Path>,
        config: &Gaussian3dSceneConfig,
        device: &B::Device,
    ) -> Result<Self, Error> {
        Self::decode_polygon(&mut fs::File::open(path)?, config, device)
    }

    /// Import the scene from the point cloud.
    ///
    /// - The colors are converted into the zeroth SH coefficients.
    /// - The opacities are `0.1`.
    /// - The rotations are identities.
    /// - The scalings are sampled from a log-normal distribution with a fixed seed.
    pub fn from_points(
        points: Points,
        config: &Gaussian3dSceneConfig,
        device: &B::Device,
    ) -> Result<Self, Error> {
        let mut scene = config.init::<B>(device)?;
        let degree = scene.colors_sh_degree();
        // P
        let point_count = points.len();
        if point_count == 0 {
            return Ok(scene);
        }

        // ([P, 3], [P, 3])
        let (colors_rgb, positions) = points.iter().fold(
            (
                Vec::<f64>::with_capacity(point_count * 3),
                Vec::<f64>::with_capacity(point_count * 3),
            ),
            |(mut colors_rgb, mut positions), point| {
                colors_rgb.extend(point.color_rgb);
                positions.extend(point.position);
                (colors_rgb, positions)
            },
        );

        // [P, 1, 3]
        let colors_rgb =
            Tensor::<B, 3>::from_data(TensorData::new(colors_rgb, [point_count, 1, 3]), device);

        // [P, K, 3]
        let colors_sh = if degree > 0 {
            let colors_sh_rest = Tensor::zeros([point_count, sh_count(degree) - 1, 3], device);
            Tensor::cat(vec![rgb_to_sh(colors_rgb), colors_sh_rest], 1)
        } else {
            // The inverse of sigmoid
            let colors_rgb = colors_rgb.clamp(f32::EPSILON, 1.0 - f32::EPSILON);
            colors_rgb.to_owned().div(-colors_rgb + 1.0).log()
        };

        // [P, 1]
        let opacities = Self::make_inner_opacities(Tensor::full([point_count, 1], 0.1, device));

        // [P, 3]
        let positions =
            Tensor::from_data(TensorData::new(positions, [point_count, 3]), device);

        // [P, 4] (w, x, y, z)
        let rotations = Tensor::from_data(
            TensorData::new([1.0, 0.0, 0.0, 0.0_f32].repeat(point_count), [point_count, 4]),
            device,
        );

        // [P, 3]
        let distribution = rand_distr::LogNormal::new(0.0, std::f32::consts::E)
            .map_err(|err| Error::Validation(format!("The distribution ({err})"), "valid".into()))?;
        let mut sample_max = f32::EPSILON;
        let samples = StdRng::seed_from_u64(SEED)
            .sample_iter(distribution)
            .take(point_count)
            .map(|mut sample| {
                sample = sample.max(f32::EPSILON);
                sample_max = sample_max.max(sample);
                sample
            })
            .collect::<Vec<_>>();
        let scalings = scene.make_inner_scalings(
            Tensor::from_data(TensorData::new(samples, [point_count, 1]), device)
                .div_scalar(sample_max)
                .sqrt()
                .clamp_min(f32::EPSILON)
                .repeat_dim(1, 3),
        );

        scene.set_data(positions, colors_sh, scalings, rotations, opacities)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::import",
            "from_points > point_count ({point_count})",
        );

        Ok(scene)
    }
}

/// Collecting the property names with `prefix`, sorted by their numeric suffixes.
fn take_names(
    element: &Element,
    prefix: &str,
) -> Result<Vec<String>, Error> {
    let mut names = element
        .properties
        .keys()
        .filter(|name| name.starts_with(prefix))
        .map(|name| {
            let index = name
                .rsplit('_')
                .next()
                .and_then(|suffix| suffix.parse::<usize>().ok())
                .ok_or_else(|| Error::MalformedPropertyName(name.to_owned()))?;
            Ok((index, name.to_owned()))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    names.sort_by_key(|(index, _)| *index);

    Ok(names.into_iter().map(|(_, name)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use std::io::Cursor;

    type B = NdArray<f32>;

    fn points_sample() -> Points {
        vec![
            Point {
                color_rgb: [1.0, 0.5, 0.0],
                position: [0.0, -0.5, 0.25],
            },
            Point {
                color_rgb: [0.5, 1.0, 0.25],
                position: [1.0, 0.0, -0.25],
            },
        ]
    }

    #[test]
    fn from_and_to_points() {
        let device = Default::default();
        let source = points_sample();

        for degree in [0, 3] {
            let config = Gaussian3dSceneConfig::new(degree);
            let scene = Gaussian3dScene::<B>::from_points(source.to_owned(), &config, &device)
                .unwrap();

            let colors_sh = scene.get_colors_sh();
            assert_eq!(colors_sh.dims(), [2, sh_count(degree), 3]);
            assert_eq!(scene.get_opacities().dims(), [2, 1]);
            assert_eq!(scene.get_positions().dims(), [2, 3]);
            assert_eq!(scene.get_rotations().dims(), [2, 4]);
            assert_eq!(scene.get_scalings().dims(), [2, 3]);
            assert_eq!(scene.point_count(), 2);

            let target = Tensor::<B, 2>::from_data([[0.1], [0.1]], &device);
            let output = scene.get_opacities();
            output.into_data().assert_approx_eq(&target.into_data(), 6);

            let target = Tensor::<B, 2>::from_data([[1.0, 0.0, 0.0, 0.0]; 2], &device);
            let output = scene.get_rotations();
            output.into_data().assert_eq(&target.into_data(), true);

            let scalings = scene.get_scalings().into_f32s().unwrap();
            assert!(scalings.iter().all(|s| *s > 0.0 && *s <= 1.0 + 1e-6), "{scalings:?}");
            assert_eq!(scalings[0], scalings[1]);
            assert_eq!(scalings[0], scalings[2]);

            let output = scene.to_points().unwrap();
            for (output, target) in output.iter().zip(&source) {
                assert_eq!(output.position, target.position);
                for c in 0..3 {
                    assert!((output.color_rgb[c] - target.color_rgb[c]).abs() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn from_points_deterministic() {
        let device = Default::default();
        let config = Gaussian3dSceneConfig::new(1)
            .with_scaling_activation(ScalingActivationKind::Softplus);

        let scene_1 =
            Gaussian3dScene::<B>::from_points(points_sample(), &config, &device).unwrap();
        let scene_2 =
            Gaussian3dScene::<B>::from_points(points_sample(), &config, &device).unwrap();

        scene_1
            .scalings
            .val()
            .into_data()
            .assert_eq(&scene_2.scalings.val().into_data(), true);
    }

    #[test]
    fn detect_variant() {
        let mut element = Element::new("vertex", 0);
        element.push_property("x", ScalarKind::Float);
        let mut header = Header::default();
        header.push_element(element.to_owned());
        assert_eq!(PolygonVariant::detect(&header).unwrap(), PolygonVariant::Standard);

        element
            .push_property("red", ScalarKind::UChar)
            .push_property("green", ScalarKind::UChar)
            .push_property("blue", ScalarKind::UChar);
        header.push_element(element.to_owned());
        assert_eq!(PolygonVariant::detect(&header).unwrap(), PolygonVariant::Viewer);

        element.push_property("x", ScalarKind::Half);
        header.push_element(element);
        assert_eq!(PolygonVariant::detect(&header).unwrap(), PolygonVariant::Half);

        PolygonVariant::detect(&Header::default()).unwrap_err();
    }

    #[test]
    fn take_names_sorted_numerically() {
        let mut element = Element::new("vertex", 0);
        for name in ["f_rest_10", "f_rest_2", "opacity", "f_rest_1", "rot_0"] {
            element.push_property(name, ScalarKind::Float);
        }

        let output = take_names(&element, "f_rest_").unwrap();
        assert_eq!(output, vec!["f_rest_1", "f_rest_2", "f_rest_10"]);

        element.push_property("f_rest_x", ScalarKind::Float);
        assert!(matches!(
            take_names(&element, "f_rest_"),
            Err(Error::MalformedPropertyName(name)) if name == "f_rest_x"
        ));
    }

    #[test]
    fn decode_polygon_invalid() {
        let device = Default::default();
        let config = Gaussian3dSceneConfig::new(1);
        let scene = Gaussian3dScene::<B>::from_points(points_sample(), &config, &device).unwrap();

        let mut bytes = vec![];
        scene.encode_polygon(&mut bytes, PolygonVariant::Standard).unwrap();

        // The count of f_rest mismatches
        let config_other = Gaussian3dSceneConfig::new(2);
        let result =
            Gaussian3dScene::<B>::decode_polygon(&mut Cursor::new(&bytes), &config_other, &device);
        assert!(matches!(
            result,
            Err(Error::MismatchedPropertyCount(name, 24, 9)) if name == "f_rest"
        ));

        // The property is missing
        let mut object = Object::decode(&mut Cursor::new(&bytes)).unwrap();
        let index = object.elem("vertex").unwrap().properties.get_index_of("opacity").unwrap();
        object.header.get_mut("vertex").unwrap().properties.shift_remove("opacity");
        object.payload.elements["vertex"].remove(index);
        let mut bytes = vec![];
        object.encode(&mut bytes).unwrap();
        let result =
            Gaussian3dScene::<B>::decode_polygon(&mut Cursor::new(&bytes), &config, &device);
        assert!(matches!(result, Err(Error::MissingPolygonProperty(_))));

        // The body is truncated
        let mut bytes = vec![];
        scene.encode_polygon(&mut bytes, PolygonVariant::Standard).unwrap();
        bytes.truncate(bytes.len() - 1);
        Gaussian3dScene::<B>::decode_polygon(&mut Cursor::new(&bytes), &config, &device)
            .unwrap_err();
    }
}
