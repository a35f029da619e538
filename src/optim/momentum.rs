use crate::math::params::{Gradient, Parameters, Velocity};
use crate::model::UpdateSign;

/// Momentum-accelerated gradient step.
///
/// The velocity starts unset; the first update assigns `lr * g`, every later
/// one `m * v + lr * g`.
#[derive(Debug, Clone, Default)]
pub struct Momentum {
    velocity: Option<Velocity>,
}

impl Momentum {
    pub fn new() -> Momentum {
        Momentum { velocity: None }
    }

    pub fn velocity(&self) -> Option<&Velocity> {
        self.velocity.as_ref()
    }

    /// Forgets the accumulated velocity.
    pub fn reset(&mut self) {
        self.velocity = None;
    }

    pub fn update(&mut self, gradient: &Gradient, learning_rate: f64, momentum: f64) -> &Velocity {
        let scaled = gradient.scale(learning_rate);
        let next = match self.velocity.take() {
            None => scaled,
            Some(previous) => previous.scale(momentum).add(&scaled),
        };
        self.velocity.insert(next)
    }

    /// Moves `parameters` along the velocity in the model's direction.
    pub fn apply(parameters: &Parameters, velocity: &Velocity, sign: UpdateSign) -> Parameters {
        match sign {
            UpdateSign::Descend => parameters.sub(velocity),
            UpdateSign::Ascend => parameters.add(velocity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use approx::assert_abs_diff_eq;

    fn grad(values: [f64; 2]) -> Gradient {
        Parameters::new(vec![Matrix::from_data(vec![values.to_vec()])])
    }

    #[test]
    fn velocity_follows_the_geometric_recurrence() {
        let (lr, m) = (0.1, 0.5);
        let gs = [grad([1.0, -2.0]), grad([0.5, 4.0]), grad([-3.0, 1.0])];
        let mut momentum = Momentum::new();
        assert!(momentum.velocity().is_none());

        for k in 1..=gs.len() {
            let v = momentum.update(&gs[k - 1], lr, m).clone();
            for c in 0..2 {
                let expected: f64 = (1..=k)
                    .map(|i| m.powi((k - i) as i32) * lr * gs[i - 1].layers[0].data[0][c])
                    .sum();
                assert_abs_diff_eq!(v.layers[0].data[0][c], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn reset_makes_the_next_update_plain() {
        let mut momentum = Momentum::new();
        momentum.update(&grad([1.0, 1.0]), 1.0, 0.9);
        momentum.reset();
        let v = momentum.update(&grad([2.0, 0.0]), 0.5, 0.9);
        assert_eq!(v, &grad([1.0, 0.0]));
    }

    #[test]
    fn sign_picks_the_direction() {
        let p = grad([1.0, 1.0]);
        let v = grad([0.25, -0.5]);
        assert_eq!(Momentum::apply(&p, &v, UpdateSign::Descend), grad([0.75, 1.5]));
        assert_eq!(Momentum::apply(&p, &v, UpdateSign::Ascend), grad([1.25, 0.5]));
    }
}
