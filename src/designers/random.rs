use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::errors::Result;
use crate::types::{Designer, ProblemStatement, Suggestion, Trial};

/// A designer sampling parameter configurations uniformly over the
/// search space.
///
/// Serves as the stock baseline algorithm in comparison tests; its
/// `update` is a no-op since suggestions do not depend on observed
/// outcomes.
pub struct RandomDesigner {
    problem: ProblemStatement,
    rng: Xoshiro256Plus,
}

impl RandomDesigner {
    pub fn new(problem: ProblemStatement, seed: u64) -> Self {
        RandomDesigner {
            problem,
            rng: Xoshiro256Plus::seed_from_u64(seed),
        }
    }
}

impl Designer for RandomDesigner {
    fn suggest(&mut self, count: usize) -> Result<Vec<Suggestion>> {
        let bounds = &self.problem.search_space.bounds;
        let suggestions = (0..count)
            .map(|_| {
                let parameters = bounds
                    .iter()
                    .map(|(lo, up)| self.rng.gen_range(*lo..=*up))
                    .collect();
                Suggestion::new(parameters)
            })
            .collect();
        Ok(suggestions)
    }

    fn update(&mut self, _completed: &mut [Trial], _active: &[Trial]) -> Result<()> {
        Ok(())
    }
}
