//! Question synthesis over greedy paths.

use serde::{Deserialize, Serialize};

use super::path::greedy_path;
use super::Scene;

/// A single navigation question: starting from the object whose color or
/// marker is `anchor`, after `hops` greedy hops, the landing object's
/// opposite attribute is `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub anchor: String,
    pub hops: usize,
    pub target: String,
}

/// Emit every question a scene supports.
///
/// For each of the N objects as start, a greedy path with budget N-1 is
/// built; for each hop count in `0..N` one color-anchored and one
/// marker-anchored question is emitted, so the result always holds
/// N * N * 2 questions.
pub fn synthesize_questions(scene: &Scene) -> Vec<Question> {
    let positions = scene.positions();
    let n = scene.len();
    let mut questions = Vec::with_capacity(n * n * 2);

    for start in 0..n {
        let path = greedy_path(&positions, n - 1, start);
        let start_obj = &scene.objects[start];
        for hops in 0..n {
            let landed = &scene.objects[path[hops]];
            questions.push(Question {
                anchor: start_obj.c.clone(),
                hops,
                target: landed.m.clone(),
            });
            questions.push(Question {
                anchor: start_obj.m.clone(),
                hops,
                target: landed.c.clone(),
            });
        }
    }

    questions
}
