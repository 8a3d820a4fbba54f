//! Randomised checks against a brute-force oracle.
//!
//! In dimension `d` every extreme ray of a pointed cone is the unique direction tight on
//! `d - 1` independent rows. The oracle tries every such row subset, so the engine's output
//! must match it as a set.

use conic::dd::{AdjacencyTest, ConeState, Constraint, EnumerationOptions, Enumerator};
use proptest::prelude::*;

fn det(m: &[Vec<i128>]) -> i128 {
    match m.len() {
        0 => 1,
        1 => m[0][0],
        n => (0..n)
            .map(|col| {
                let minor: Vec<Vec<i128>> = m[1..]
                    .iter()
                    .map(|row| {
                        row.iter()
                            .enumerate()
                            .filter(|&(c, _)| c != col)
                            .map(|(_, &x)| x)
                            .collect()
                    })
                    .collect();
                let sign = if col % 2 == 0 { 1 } else { -1 };
                sign * m[0][col] * det(&minor)
            })
            .sum(),
    }
}

/// Direction orthogonal to `d - 1` rows of length `d`.
fn null_direction(rows: &[&Vec<i64>], d: usize) -> Vec<i128> {
    (0..d)
        .map(|k| {
            let minor: Vec<Vec<i128>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .filter(|&(c, _)| c != k)
                        .map(|(_, &x)| i128::from(x))
                        .collect()
                })
                .collect();
            let sign = if k % 2 == 0 { 1 } else { -1 };
            sign * det(&minor)
        })
        .collect()
}

fn gcd(a: i128, b: i128) -> i128 {
    if b == 0 { a.abs() } else { gcd(b, a % b) }
}

fn feasible(v: &[i128], constraints: &[Constraint]) -> bool {
    v.iter().all(|&x| x >= 0)
        && constraints.iter().all(|c| {
            let value: i128 = c
                .coefficients()
                .iter()
                .zip(v)
                .map(|(&a, &x)| i128::from(a) * x)
                .sum();
            if c.is_equality() { value == 0 } else { value >= 0 }
        })
}

fn subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if n < k {
        return Vec::new();
    }
    let mut out = subsets(n - 1, k);
    for mut s in subsets(n - 1, k - 1) {
        s.push(n - 1);
        out.push(s);
    }
    out
}

fn oracle(d: usize, constraints: &[Constraint]) -> Vec<Vec<i64>> {
    let mut rows: Vec<Vec<i64>> = (0..d)
        .map(|i| (0..d).map(|j| i64::from(i == j)).collect())
        .collect();
    rows.extend(constraints.iter().map(|c| c.coefficients().to_vec()));

    let mut rays = Vec::new();
    for subset in subsets(rows.len(), d - 1) {
        let picked: Vec<&Vec<i64>> = subset.iter().map(|&i| &rows[i]).collect();
        let v = null_direction(&picked, d);
        let g = v.iter().fold(0, |acc, &x| gcd(acc, x));
        if g == 0 {
            continue;
        }
        for sign in [1, -1] {
            let w: Vec<i128> = v.iter().map(|&x| sign * x / g).collect();
            if feasible(&w, constraints) {
                rays.push(w.iter().map(|&x| x as i64).collect::<Vec<i64>>());
            }
        }
    }
    rays.sort();
    rays.dedup();
    rays
}

fn run(d: usize, constraints: &[Constraint], options: EnumerationOptions) -> Vec<Vec<i64>> {
    Enumerator::<i64>::new(d)
        .constraints(constraints.iter().cloned())
        .options(options)
        .run()
        .unwrap()
        .into_vectors()
}

fn sorted(mut rays: Vec<Vec<i64>>) -> Vec<Vec<i64>> {
    rays.sort();
    rays
}

fn system() -> impl Strategy<Value = (usize, Vec<Constraint>)> {
    (3usize..=4).prop_flat_map(|d| {
        prop::collection::vec((prop::collection::vec(-3i64..=3, d), any::<bool>()), 0..=4)
            .prop_map(move |rows| {
                let constraints = rows
                    .into_iter()
                    .map(|(row, eq)| {
                        if eq {
                            Constraint::equality(row)
                        } else {
                            Constraint::inequality(row)
                        }
                    })
                    .collect();
                (d, constraints)
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn rank_test_matches_oracle((d, constraints) in system()) {
        let rays = run(d, &constraints, EnumerationOptions::default());
        prop_assert_eq!(sorted(rays), oracle(d, &constraints));
    }

    #[test]
    fn combinatorial_test_matches_oracle((d, constraints) in system()) {
        let opts = EnumerationOptions::default().with_adjacency_test(AdjacencyTest::Combinatorial);
        let rays = run(d, &constraints, opts);
        prop_assert_eq!(sorted(rays), oracle(d, &constraints));
    }

    #[test]
    fn runs_are_deterministic((d, constraints) in system()) {
        let first = run(d, &constraints, EnumerationOptions::default());
        let second = run(d, &constraints, EnumerationOptions::default());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_step_keeps_the_store_consistent((d, constraints) in system()) {
        let mut state = ConeState::<i64>::new(d, EnumerationOptions::default()).unwrap();
        for c in &constraints {
            state.apply(c).unwrap();
            state.assert_consistent();
        }
    }

    #[test]
    fn equality_matches_a_pair_of_inequalities((d, constraints) in system()) {
        let split: Vec<Constraint> = constraints
            .iter()
            .flat_map(|c| {
                if c.is_equality() {
                    let neg: Vec<i64> = c.coefficients().iter().map(|&a| -a).collect();
                    vec![
                        Constraint::inequality(c.coefficients().to_vec()),
                        Constraint::inequality(neg),
                    ]
                } else {
                    vec![c.clone()]
                }
            })
            .collect();
        let direct = run(d, &constraints, EnumerationOptions::default());
        let via_pairs = run(d, &split, EnumerationOptions::default());
        prop_assert_eq!(sorted(direct), sorted(via_pairs));
    }
}
