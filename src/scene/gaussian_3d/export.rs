//! 3DGS scene export implementation.

pub use super::*;

use burn::tensor::activation;
use crate::{
    function::colormap::viridis_rgb8,
    polygon::{Column, Format, Object, ScalarKind},
    transform::RigidTransform,
};
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

/// The layout of a 3DGS polygon file.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum PolygonVariant {
    /// 32-bit floats without RGB colors.
    #[default]
    Standard,
    /// 32-bit floats with RGB colors and SH coefficients padded to degree 3.
    Viewer,
    /// 16-bit floats with RGB colors.
    Half,
}

impl PolygonVariant {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Viewer => "viewer",
            Self::Half => "half",
        }
    }

    /// The scalar kind of float properties.
    #[inline]
    pub const fn float_kind(&self) -> ScalarKind {
        match self {
            Self::Half => ScalarKind::Half,
            _ => ScalarKind::Float,
        }
    }

    #[inline]
    pub const fn has_colors_rgb(&self) -> bool {
        !matches!(self, Self::Standard)
    }
}

/// Scene exporters
impl<B: Backend> Gaussian3dScene<B> {
    /// Export the scene in the 3DGS PLY format.
    ///
    /// ## Errors
    ///
    /// The viewer variant fails if the SH degree is more than [`SH_DEGREE_VIEWER`].
    pub fn encode_polygon(
        &self,
        writer: &mut impl Write,
        variant: PolygonVariant,
    ) -> Result<(), Error> {
        let colors_rgb = if variant.has_colors_rgb() {
            Some(self.get_colors_rgb8()?)
        } else {
            None
        };

        let object = self.to_polygon(variant, colors_rgb)?;
        encode_object(writer, &object)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::export",
            "encode_polygon > {}",
            variant.as_str(),
        );

        Ok(())
    }

    /// Export the scene with colors coding the point indices.
    ///
    /// The colors are sampled from the viridis colormap.
    ///
    /// ## Errors
    ///
    /// The standard variant fails since it has no RGB colors.
    pub fn encode_polygon_color_coded(
        &self,
        writer: &mut impl Write,
        variant: PolygonVariant,
    ) -> Result<(), Error> {
        if !variant.has_colors_rgb() {
            return Err(Error::Validation(
                format!("The variant of color-coded export ({})", variant.as_str()),
                "either viewer or half".into(),
            ));
        }

        let colors_rgb = viridis_rgb8(self.point_count());
        let object = self.to_polygon(variant, Some(colors_rgb))?;
        encode_object(writer, &object)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::export",
            "encode_polygon_color_coded > {}",
            variant.as_str(),
        );

        Ok(())
    }

    /// Export the scene for visualization in Y-up viewers.
    ///
    /// The positions and rotations are transformed by [`RigidTransform::FLIP_YZ`].
    /// There are no RGB colors or SH coefficients of higher degrees.
    pub fn encode_polygon_visual(
        &self,
        writer: &mut impl Write,
    ) -> Result<(), Error> {
        let transform = RigidTransform::FLIP_YZ;
        let kind = ScalarKind::Float;

        let mut positions = self.positions.val().into_rows::<3>()?;
        transform.apply_to_positions(&mut positions);
        let mut rotations = self.rotations.val().into_rows::<4>()?;
        transform.apply_to_rotations(&mut rotations);

        let mut properties = Vec::new();
        properties.extend(rows_to_properties(&positions, ["x", "y", "z"], kind));
        properties.extend(self.colors_sh_dc_properties(kind)?);
        properties.extend(self.opacity_properties(kind)?);
        properties.extend(self.scale_properties(kind)?);
        properties.extend(rows_to_properties(
            &rotations,
            ["rot_0", "rot_1", "rot_2", "rot_3"],
            kind,
        ));

        let mut object = Object::new(Format::BinaryLittleEndian);
        object.push_element("vertex", properties)?;
        encode_object(writer, &object)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::export",
            "encode_polygon_visual",
        );

        Ok(())
    }

    /// Saving the scene to a polygon file.
    ///
    /// The parent directories are created if missing.
    pub fn save_polygon(
        &self,
        path: impl AsRef<Path>,
        variant: PolygonVariant,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        self.encode_polygon(&mut fs::File::create(path)?, variant)
    }

    /// Building the polygon object of the scene.
    ///
    /// The attribute order is `x y z`, `red green blue` (if `colors_rgb` is given),
    /// `f_dc_*`, `f_rest_*`, `opacity`, `scale_*` and `rot_*`.
    pub fn to_polygon(
        &self,
        variant: PolygonVariant,
        colors_rgb: Option<Vec<[u8; 3]>>,
    ) -> Result<Object, Error> {
        let degree = self.colors_sh_degree();
        if variant == PolygonVariant::Viewer && degree > SH_DEGREE_VIEWER {
            return Err(Error::UnsupportedViewerDegree(degree));
        }
        let kind = variant.float_kind();

        let mut properties = Vec::new();
        properties.extend(columns_to_properties(
            self.positions.val().into_columns()?,
            ["x", "y", "z"].map(String::from),
            kind,
        ));
        if let Some(colors_rgb) = colors_rgb {
            properties.extend(["red", "green", "blue"].into_iter().enumerate().map(
                |(channel, name)| {
                    let values = colors_rgb.iter().map(|rgb| rgb[channel]).collect::<Vec<_>>();
                    (name.to_owned(), Column::from_u8s(&values))
                },
            ));
        }
        properties.extend(self.colors_sh_dc_properties(kind)?);
        properties.extend(self.colors_sh_rest_properties(
            kind,
            variant == PolygonVariant::Viewer,
        )?);
        properties.extend(self.opacity_properties(kind)?);
        properties.extend(self.scale_properties(kind)?);
        properties.extend(columns_to_properties(
            self.rotations.val().into_columns()?,
            (0..4).map(|i| format!("rot_{i}")),
            kind,
        ));

        let mut object = Object::new(Format::BinaryLittleEndian);
        object.push_element("vertex", properties)?;

        Ok(object)
    }

    /// Export the scene as a point cloud.
    ///
    /// The colors are normalized RGB from the zeroth SH coefficients.
    pub fn to_points(&self) -> Result<Points, Error> {
        let [point_count, _, channel_count] = self.colors_sh_dc.dims();
        if channel_count == 0 {
            return Err(Error::Validation(
                "The channel count of colors (0)".into(),
                "positive".into(),
            ));
        }

        // [P, C]
        let colors_sh_dc = self.colors_sh_dc.val().reshape([point_count, channel_count]);
        let colors_rgb = if self.colors_sh_degree() > 0 {
            sh_to_rgb(colors_sh_dc)
        } else {
            activation::sigmoid(colors_sh_dc)
        }
        .into_f32s()?;
        let positions = self.get_positions().into_rows::<3>()?;

        Ok(colors_rgb
            .chunks_exact(channel_count)
            .zip(positions)
            .map(|(color_rgb, position)| Point {
                color_rgb: [0, 1, 2].map(|c| color_rgb[c.min(channel_count - 1)] as f64),
                position: position.map(f64::from),
            })
            .collect())
    }

    /// 8-bit RGB colors from the zeroth SH coefficients.
    ///
    /// The missing channels repeat the last one.
    pub fn get_colors_rgb8(&self) -> Result<Vec<[u8; 3]>, Error> {
        let [point_count, _, channel_count] = self.colors_sh_dc.dims();
        if channel_count == 0 {
            return Ok(vec![[0; 3]; point_count]);
        }

        let values = sh_to_rgb(self.colors_sh_dc.val().reshape([point_count, channel_count]))
            .mul_scalar(255.0)
            .clamp(0.0, 255.0)
            .into_f32s()?;

        Ok(values
            .chunks_exact(channel_count)
            .map(|color| [0, 1, 2].map(|c| color[c.min(channel_count - 1)] as u8))
            .collect())
    }
}

/// Property builders
impl<B: Backend> Gaussian3dScene<B> {
    fn colors_sh_dc_properties(
        &self,
        kind: ScalarKind,
    ) -> Result<Vec<(String, Column)>, Error> {
        let [point_count, _, channel_count] = self.colors_sh_dc.dims();

        // [P, C] <- [P, 1, C]
        let colors_sh_dc = self.colors_sh_dc.val().reshape([point_count, channel_count]);

        Ok(columns_to_properties(
            colors_sh_dc.into_columns()?,
            (0..channel_count).map(|i| format!("f_dc_{i}")),
            kind,
        ))
    }

    fn colors_sh_rest_properties(
        &self,
        kind: ScalarKind,
        is_padded: bool,
    ) -> Result<Vec<(String, Column)>, Error> {
        let Some(colors_sh_rest) = &self.colors_sh_rest else {
            return Ok(vec![]);
        };
        let [point_count, coefficient_count, channel_count] = colors_sh_rest.dims();

        // [P, 3, K - 1] <- [P, K - 1, 3]
        let mut colors_sh_rest = colors_sh_rest.val().swap_dims(1, 2);

        let coefficient_count_target = if is_padded {
            sh_count(SH_DEGREE_VIEWER) - 1
        } else {
            coefficient_count
        };
        if coefficient_count_target > coefficient_count {
            let padding = Tensor::zeros(
                [
                    point_count,
                    channel_count,
                    coefficient_count_target - coefficient_count,
                ],
                &colors_sh_rest.device(),
            );
            colors_sh_rest = Tensor::cat(vec![colors_sh_rest, padding], 2);
        }

        // [P, 3 * (K - 1)], channel-major
        let count = channel_count * coefficient_count_target;
        let colors_sh_rest = colors_sh_rest.reshape([point_count, count]);

        Ok(columns_to_properties(
            colors_sh_rest.into_columns()?,
            (0..count).map(|i| format!("f_rest_{i}")),
            kind,
        ))
    }

    fn opacity_properties(
        &self,
        kind: ScalarKind,
    ) -> Result<Vec<(String, Column)>, Error> {
        Ok(columns_to_properties(
            self.opacities.val().into_columns()?,
            ["opacity".to_owned()],
            kind,
        ))
    }

    fn scale_properties(
        &self,
        kind: ScalarKind,
    ) -> Result<Vec<(String, Column)>, Error> {
        let scalings = self.scaling_activation.to_log_scalings(self.scalings.val());

        Ok(columns_to_properties(
            scalings.into_columns()?,
            (0..3).map(|i| format!("scale_{i}")),
            kind,
        ))
    }
}

fn columns_to_properties(
    columns: Vec<Vec<f32>>,
    names: impl IntoIterator<Item = String>,
    kind: ScalarKind,
) -> Vec<(String, Column)> {
    names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| (name, Column::from_f32s(kind, &values)))
        .collect()
}

fn rows_to_properties<const N: usize>(
    rows: &[[f32; N]],
    names: [&str; N],
    kind: ScalarKind,
) -> Vec<(String, Column)> {
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let values = rows.iter().map(|row| row[index]).collect::<Vec<_>>();
            (name.to_owned(), Column::from_f32s(kind, &values))
        })
        .collect()
}

fn encode_object(
    writer: &mut impl Write,
    object: &Object,
) -> Result<(), Error> {
    let writer = &mut BufWriter::new(writer);
    object.encode(writer)?;
    writer.flush()?;
    Ok(())
}
