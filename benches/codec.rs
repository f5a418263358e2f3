use divan::Bencher;
use gausplat_scene::{
    backend::Cpu,
    scene::gaussian_3d::{Gaussian3dScene, Gaussian3dSceneConfig, Point, PolygonVariant},
};
use std::io::Cursor;

fn main() {
    divan::main();
}

mod polygon {
    use super::*;

    #[divan::bench(sample_count = 20)]
    fn encode_standard(bencher: Bencher) {
        encode(bencher, PolygonVariant::Standard);
    }

    #[divan::bench(sample_count = 20)]
    fn encode_half(bencher: Bencher) {
        encode(bencher, PolygonVariant::Half);
    }

    fn encode(
        bencher: Bencher,
        variant: PolygonVariant,
    ) {
        bencher
            .with_inputs(data::scene)
            .bench_local_refs(|scene| {
                let mut bytes = Vec::with_capacity(1 << 24);
                scene.encode_polygon(&mut bytes, variant).map(|_| bytes)
            });
    }

    #[divan::bench(sample_count = 20)]
    fn decode(bencher: Bencher) {
        let config = Gaussian3dSceneConfig::new(data::DEGREE);

        bencher
            .with_inputs(|| {
                let mut bytes = vec![];
                data::scene()
                    .encode_polygon(&mut bytes, PolygonVariant::Standard)
                    .map(|_| bytes)
            })
            .bench_local_values(|bytes| {
                let bytes = bytes.ok()?;
                Gaussian3dScene::<Cpu>::decode_polygon(
                    &mut Cursor::new(bytes),
                    &config,
                    &Default::default(),
                )
                .ok()
            });
    }
}

mod data {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    pub const DEGREE: u32 = 3;
    const SIZE: usize = 1 << 16;

    pub fn scene() -> Gaussian3dScene<Cpu> {
        let mut rng = StdRng::seed_from_u64(0);
        let points = (0..SIZE)
            .map(|_| Point {
                color_rgb: rng.gen(),
                position: rng.gen(),
            })
            .collect();

        Gaussian3dScene::from_points(
            points,
            &Gaussian3dSceneConfig::new(DEGREE),
            &Default::default(),
        )
        .unwrap_or_else(|err| panic!("{err}"))
    }
}
