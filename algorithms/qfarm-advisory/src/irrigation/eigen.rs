//! Exact minimum-eigenvalue solver for small binary programs
//!
//! A binary linear program with `<=` constraints is rewritten as a QUBO: the constraints become
//! a quadratic penalty over the original variables plus binary slack variables. The cost of a
//! QUBO is diagonal in the computational basis, so its minimum eigenvalue is the smallest
//! diagonal entry and the matching basis state is an optimal assignment. The diagonal holds
//! `2^n` entries, which limits the solver to a handful of variables.
use ndarray::{Array1, Array2};
use rand::RngCore;
use tracing::debug;

use super::{IrrigationSchedule, IrrigationScheduler, Slot};
use crate::error::{AdvisoryError, Result};

/// Largest number of QUBO variables the solver enumerates
pub const MAX_QUBO_VARIABLES: usize = 20;

/// Value of irrigating in the morning, at noon and in the evening
pub const SLOT_EFFICIENCY: [f64; 3] = [1.0, 0.7, 0.4];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// `coefficients · x <= rhs`, with integer coefficients and right hand side
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    coefficients: Vec<f64>,
    rhs: f64,
}

/// A linear objective over binary variables, subject to `<=` constraints
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraticProgram {
    variables: Vec<String>,
    objective: Vec<f64>,
    sense: Sense,
    constraints: Vec<LinearConstraint>,
}

impl Default for QuadraticProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadraticProgram {
    pub fn new() -> Self {
        QuadraticProgram {
            variables: Vec::new(),
            objective: Vec::new(),
            sense: Sense::Minimize,
            constraints: Vec::new(),
        }
    }

    /// Add a binary variable and return its index
    pub fn binary_var(&mut self, name: &str) -> Result<usize> {
        if self.variable_index(name).is_some() {
            return Err(AdvisoryError::Program(format!(
                "variable `{}` is declared twice",
                name
            )));
        }

        self.variables.push(name.to_string());
        self.objective.push(0.0);
        for constraint in &mut self.constraints {
            constraint.coefficients.push(0.0);
        }

        Ok(self.variables.len() - 1)
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|var| var == name)
    }

    fn set_objective(&mut self, sense: Sense, linear: &[f64]) -> Result<()> {
        if linear.len() != self.variables.len() {
            return Err(AdvisoryError::Program(format!(
                "objective has {} coefficients for {} variables",
                linear.len(),
                self.variables.len()
            )));
        }

        self.sense = sense;
        self.objective = linear.to_vec();
        Ok(())
    }

    /// Maximize `linear · x`, coefficients in variable order
    pub fn maximize(&mut self, linear: &[f64]) -> Result<()> {
        self.set_objective(Sense::Maximize, linear)
    }

    /// Minimize `linear · x`, coefficients in variable order
    pub fn minimize(&mut self, linear: &[f64]) -> Result<()> {
        self.set_objective(Sense::Minimize, linear)
    }

    /// Add the constraint `sum(coefficient * variable) <= rhs`
    ///
    /// Coefficients and right hand side must be integers, so that the slack can be encoded in
    /// binary.
    pub fn linear_constraint_le(&mut self, linear: &[(&str, f64)], rhs: f64) -> Result<()> {
        let mut coefficients = vec![0.0; self.variables.len()];
        for (name, coefficient) in linear {
            let idx = self.variable_index(name).ok_or_else(|| {
                AdvisoryError::Program(format!("unknown variable `{}` in constraint", name))
            })?;
            coefficients[idx] += coefficient;
        }

        if coefficients.iter().chain(Some(&rhs)).any(|x| x.fract() != 0.0) {
            return Err(AdvisoryError::Program(
                "constraints need integer coefficients".to_string(),
            ));
        }

        self.constraints.push(LinearConstraint { coefficients, rhs });
        Ok(())
    }

    /// Objective value of an assignment
    pub fn objective_value(&self, x: &[u8]) -> f64 {
        self.objective
            .iter()
            .zip(x)
            .map(|(c, x)| c * f64::from(*x))
            .sum()
    }

    /// Whether an assignment satisfies every constraint
    pub fn is_feasible(&self, x: &[u8]) -> bool {
        x.len() == self.variables.len()
            && self.constraints.iter().all(|constraint| {
                let lhs: f64 = constraint
                    .coefficients
                    .iter()
                    .zip(x)
                    .map(|(a, x)| a * f64::from(*x))
                    .sum();
                lhs <= constraint.rhs
            })
    }

    /// Rewrite the program as a QUBO to be minimized
    ///
    /// Every constraint `a · x <= b` becomes `penalty * (a · x + s - b)^2`, where the slack `s`
    /// is encoded by binary variables appended after the program variables. Without an explicit
    /// penalty, one plus the sum of absolute objective coefficients is used, which is larger
    /// than any gain a violated constraint could bring.
    pub fn to_qubo(&self, penalty: Option<f64>) -> Result<Qubo> {
        let penalty =
            penalty.unwrap_or_else(|| 1.0 + self.objective.iter().map(|c| c.abs()).sum::<f64>());

        // slack weights of every constraint
        let mut slacks = Vec::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            let lowest = constraint
                .coefficients
                .iter()
                .map(|a| a.min(0.0))
                .sum::<f64>();
            let range = constraint.rhs - lowest;
            if range < 0.0 {
                return Err(AdvisoryError::Program(format!(
                    "constraint with right hand side {} can never be satisfied",
                    constraint.rhs
                )));
            }
            slacks.push(slack_weights(range as u64));
        }

        let nvars = self.variables.len() + slacks.iter().map(|s| s.len()).sum::<usize>();
        if nvars > MAX_QUBO_VARIABLES {
            return Err(AdvisoryError::Program(format!(
                "the QUBO needs {} variables, at most {} are supported",
                nvars, MAX_QUBO_VARIABLES
            )));
        }

        let sign = match self.sense {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        };
        let mut linear = Array1::zeros(nvars);
        for (idx, c) in self.objective.iter().enumerate() {
            linear[idx] = sign * c;
        }
        let mut quadratic = Array2::zeros((nvars, nvars));
        let mut offset = 0.0;

        let mut next_slack = self.variables.len();
        for (constraint, weights) in self.constraints.iter().zip(&slacks) {
            // (g · z - b)^2 with z_i^2 = z_i for binary z
            let mut terms = constraint
                .coefficients
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, g)| *g != 0.0)
                .collect::<Vec<_>>();
            for weight in weights {
                terms.push((next_slack, *weight));
                next_slack += 1;
            }

            let b = constraint.rhs;
            for (i, &(zi, gi)) in terms.iter().enumerate() {
                linear[zi] += penalty * (gi * gi - 2.0 * b * gi);
                for &(zj, gj) in &terms[i + 1..] {
                    let (lo, hi) = if zi < zj { (zi, zj) } else { (zj, zi) };
                    quadratic[(lo, hi)] += penalty * 2.0 * gi * gj;
                }
            }
            offset += penalty * b * b;
        }

        Ok(Qubo {
            num_program_variables: self.variables.len(),
            linear,
            quadratic,
            offset,
        })
    }
}

/// Binary weights able to represent every integer slack in `0..=range`
///
/// Powers of two, with the last weight shortened so that the weights sum up to `range`.
fn slack_weights(range: u64) -> Vec<f64> {
    let mut weights = Vec::new();
    let mut covered = 0;
    let mut next = 1;
    while covered < range {
        let weight = next.min(range - covered);
        weights.push(weight as f64);
        covered += weight;
        next *= 2;
    }

    weights
}

/// Minimize `offset + linear · z + z^T Q z` over binary `z`, with `Q` upper triangular
#[derive(Clone, Debug, PartialEq)]
pub struct Qubo {
    num_program_variables: usize,
    linear: Array1<f64>,
    quadratic: Array2<f64>,
    offset: f64,
}

impl Qubo {
    /// Number of binary variables, slack variables included
    pub fn nvars(&self) -> usize {
        self.linear.len()
    }

    /// Cost of an assignment of all variables
    pub fn energy(&self, z: &[u8]) -> f64 {
        let mut energy = self.offset;
        for i in (0..self.nvars()).filter(|i| z[*i] == 1) {
            energy += self.linear[i];
            for j in (i + 1..self.nvars()).filter(|j| z[*j] == 1) {
                energy += self.quadratic[(i, j)];
            }
        }

        energy
    }

    /// Diagonal of the cost operator
    ///
    /// Entry `k` is the energy of the basis state whose bit `i` assigns variable `i`.
    pub fn cost_diagonal(&self) -> Array1<f64> {
        let nvars = self.nvars();
        (0..1usize << nvars)
            .map(|state| self.energy(&basis_state(state, nvars)))
            .collect()
    }

    /// Basis state of minimum energy, and that energy
    ///
    /// Among states of equal energy the one with the lowest index wins.
    pub fn minimum_eigenstate(&self) -> (Vec<u8>, f64) {
        let diagonal = self.cost_diagonal();
        let (state, energy) = diagonal.iter().enumerate().fold(
            (0, f64::INFINITY),
            |(best, lowest), (state, energy)| {
                if *energy < lowest {
                    (state, *energy)
                } else {
                    (best, lowest)
                }
            },
        );

        (basis_state(state, self.nvars()), energy)
    }

    /// Drop the slack variables of a QUBO assignment
    pub fn decode(&self, z: &[u8]) -> Vec<u8> {
        z[..self.num_program_variables].to_vec()
    }
}

fn basis_state(state: usize, nvars: usize) -> Vec<u8> {
    (0..nvars).map(|i| ((state >> i) & 1) as u8).collect()
}

/// The daily irrigation program
///
/// One binary variable per slot, the objective rewards earlier irrigation and at most one
/// slot may be used.
pub fn irrigation_program() -> Result<QuadraticProgram> {
    let mut program = QuadraticProgram::new();
    for slot in &Slot::ALL {
        program.binary_var(slot.name())?;
    }
    program.maximize(&SLOT_EFFICIENCY)?;

    let one_slot = Slot::ALL
        .iter()
        .map(|slot| (slot.name(), 1.0))
        .collect::<Vec<_>>();
    program.linear_constraint_le(&one_slot, 1.0)?;

    Ok(program)
}

/// Solves the irrigation program exactly through the minimum eigenstate of its QUBO
#[derive(Clone, Debug)]
pub struct EigenSolverScheduler {
    program: QuadraticProgram,
}

impl EigenSolverScheduler {
    pub fn new() -> Result<Self> {
        Ok(EigenSolverScheduler {
            program: irrigation_program()?,
        })
    }

    pub fn program(&self) -> &QuadraticProgram {
        &self.program
    }

    /// Solve the program, returning the optimal assignment of the program variables
    pub fn solve(&self) -> Result<Vec<u8>> {
        let qubo = self.program.to_qubo(None)?;
        let (state, eigenvalue) = qubo.minimum_eigenstate();
        let x = qubo.decode(&state);
        debug!(
            qubo_variables = qubo.nvars(),
            eigenvalue,
            objective = self.program.objective_value(&x),
            "solved irrigation program"
        );

        if !self.program.is_feasible(&x) {
            return Err(AdvisoryError::Infeasible(x));
        }

        Ok(x)
    }
}

impl IrrigationScheduler for EigenSolverScheduler {
    fn name(&self) -> &'static str {
        "eigen-solver"
    }

    fn schedule(&self, _rng: &mut dyn RngCore) -> Result<IrrigationSchedule> {
        IrrigationSchedule::from_bits(&self.solve()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn slack_weights_cover_the_range() {
        assert!(slack_weights(0).is_empty());
        assert_eq!(slack_weights(1), vec![1.0]);
        assert_eq!(slack_weights(5), vec![1.0, 2.0, 2.0]);
        assert_eq!(slack_weights(7), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn irrigation_qubo_has_one_slack_variable() {
        let program = irrigation_program().unwrap();
        let qubo = program.to_qubo(None).unwrap();

        assert_eq!(program.variables(), &["morning", "noon", "evening"]);
        assert_eq!(qubo.nvars(), 4);
        assert_eq!(qubo.cost_diagonal().len(), 16);
    }

    #[test]
    fn feasible_states_keep_their_objective() {
        let program = irrigation_program().unwrap();
        let qubo = program.to_qubo(None).unwrap();

        // the slack absorbs the unused capacity, so the penalty vanishes
        assert_abs_diff_eq!(qubo.energy(&[1, 0, 0, 0]), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(qubo.energy(&[0, 1, 0, 0]), -0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(qubo.energy(&[0, 0, 1, 0]), -0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(qubo.energy(&[0, 0, 0, 1]), 0.0, epsilon = 1e-12);

        // two slots violate the constraint
        assert!(qubo.energy(&[1, 1, 0, 0]) > 0.0);
    }

    #[test]
    fn minimum_eigenstate_irrigates_in_the_morning() {
        let program = irrigation_program().unwrap();
        let qubo = program.to_qubo(None).unwrap();
        let (state, eigenvalue) = qubo.minimum_eigenstate();

        assert_eq!(state, vec![1, 0, 0, 0]);
        assert_abs_diff_eq!(eigenvalue, -1.0, epsilon = 1e-12);
        assert_eq!(qubo.decode(&state), vec![1, 0, 0]);
    }

    #[test]
    fn scheduler_returns_morning() {
        let scheduler = EigenSolverScheduler::new().unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..3 {
            assert_eq!(scheduler.schedule(&mut rng).unwrap().bits(), [1, 0, 0]);
        }
    }

    #[test]
    fn minimization_picks_the_cheapest_slot() {
        let mut program = QuadraticProgram::new();
        let a = program.binary_var("a").unwrap();
        let b = program.binary_var("b").unwrap();
        program.minimize(&[3.0, -2.0]).unwrap();
        program.linear_constraint_le(&[("a", 1.0), ("b", 1.0)], 1.0).unwrap();

        let qubo = program.to_qubo(None).unwrap();
        let x = qubo.decode(&qubo.minimum_eigenstate().0);

        assert_eq!(x[a], 0);
        assert_eq!(x[b], 1);
    }

    #[test]
    fn invalid_programs_are_rejected() {
        let mut program = QuadraticProgram::new();
        program.binary_var("a").unwrap();

        assert!(program.binary_var("a").is_err());
        assert!(program.maximize(&[1.0, 2.0]).is_err());
        assert!(program.linear_constraint_le(&[("b", 1.0)], 1.0).is_err());
        assert!(program.linear_constraint_le(&[("a", 0.5)], 1.0).is_err());
        assert!(program.linear_constraint_le(&[("a", 1.0)], -1.0).is_ok());
        assert!(program.to_qubo(None).is_err());
    }
}
