//! Scene model: objects, layout sampling, greedy paths and questions.

pub mod layout;
pub mod path;
pub mod questions;
pub mod vocab;

// Re-export key types
pub use layout::sample_positions;
pub use path::{dist_squared, greedy_path};
pub use questions::{synthesize_questions, Question};
pub use vocab::{vocabulary, Vocabulary, COLORS, MARKERS, N_SYMBOLS};

use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One point in a scene. Field names are the dataset's wire format: `p` for
/// position, `c` for color name, `m` for marker code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub p: [f64; 2],
    pub c: String,
    pub m: String,
}

/// An ordered set of objects with pairwise-separated positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene {
    pub objects: Vec<Object>,
}

impl Scene {
    /// Sample a scene of `n` objects.
    ///
    /// Positions come from rejection sampling under `min_sep_sq`; colors are
    /// a random draw of `n` distinct colors; markers are assigned in the
    /// fixed canonical order, so marker identity encodes object order.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, n: usize, min_sep_sq: f64) -> Result<Self> {
        if n > COLORS.len() {
            bail!("scene needs {} colors but only {} are defined", n, COLORS.len());
        }
        if n > MARKERS.len() {
            bail!("scene needs {} markers but only {} are defined", n, MARKERS.len());
        }

        let mut colors: Vec<&str> = COLORS.to_vec();
        colors.shuffle(rng);

        let objects = sample_positions(rng, n, min_sep_sq)
            .into_iter()
            .zip(colors)
            .zip(MARKERS)
            .map(|((p, c), m)| Object {
                p,
                c: c.to_string(),
                m: m.to_string(),
            })
            .collect();

        Ok(Self { objects })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object positions in scene order.
    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.objects.iter().map(|o| o.p).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sampled_scene_has_distinct_colors_and_canonical_markers() {
        let mut rng = StdRng::seed_from_u64(3);
        let scene = Scene::sample(&mut rng, 8, 0.1).unwrap();
        assert_eq!(scene.len(), 8);

        let mut colors: Vec<&str> = scene.objects.iter().map(|o| o.c.as_str()).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), 8);

        for (obj, marker) in scene.objects.iter().zip(MARKERS) {
            assert_eq!(obj.m, marker);
        }
    }

    #[test]
    fn test_sample_rejects_oversized_scene() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(Scene::sample(&mut rng, 9, 0.1).is_err());
    }

    #[test]
    fn test_scene_json_roundtrip() {
        let mut rng = StdRng::seed_from_u64(11);
        let scene = Scene::sample(&mut rng, 4, 0.1).unwrap();
        let json = serde_json::to_string(&scene).unwrap();
        let reloaded: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, scene);
    }

    #[test]
    fn test_scene_serializes_as_bare_object_list() {
        let scene = Scene {
            objects: vec![Object {
                p: [0.25, 0.75],
                c: "blue".to_string(),
                m: "o".to_string(),
            }],
        };
        let json = serde_json::to_string(&scene).unwrap();
        assert_eq!(json, r#"[{"p":[0.25,0.75],"c":"blue","m":"o"}]"#);
    }
}
