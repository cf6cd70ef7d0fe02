//! Tests for noise generation, bred vectors and perturbation strategies

use approx::assert_relative_eq;
use chrono::NaiveDateTime;
use gridcast::perturbation::noise::{spectral_filter, standard_normal};
use gridcast::perturbation::{
    brown_noise, fftfreq, generate_bred_vector, generate_noise_correlated,
    generate_noise_gaussian, BredVectorConfig, EnsembleState, Perturbation,
    PerturbationStrategy, TimeStepper,
};
use gridcast::{GridcastError, Result};
use ndarray::{ArrayD, ArrayView5, Axis, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Returns its input unchanged
struct Persistence;

impl TimeStepper for Persistence {
    fn step(&self, x: ArrayView5<'_, f32>, _time: Option<NaiveDateTime>) -> Result<ArrayD<f32>> {
        Ok(x.to_owned().into_dyn())
    }
}

/// Returns the last time step only, collapsing the time axis
struct LastStep;

impl TimeStepper for LastStep {
    fn step(&self, x: ArrayView5<'_, f32>, _time: Option<NaiveDateTime>) -> Result<ArrayD<f32>> {
        let last = x.len_of(Axis(1)) - 1;
        Ok(x.index_axis(Axis(1), last).to_owned().into_dyn())
    }
}

struct Failing;

impl TimeStepper for Failing {
    fn step(&self, _x: ArrayView5<'_, f32>, _time: Option<NaiveDateTime>) -> Result<ArrayD<f32>> {
        Err(GridcastError::ModelError("diverged".to_string()))
    }
}

fn initial_state(members: usize, steps: usize) -> EnsembleState {
    EnsembleState::from_shape_fn((members, steps, 2, 8, 16), |(_, t, c, i, j)| {
        1.0 + 0.1 * t as f32 + c as f32 + 0.01 * (i * 16 + j) as f32
    })
}

#[test]
fn test_fftfreq_ordering() {
    assert_eq!(fftfreq(4), vec![0.0, 0.25, -0.5, -0.25]);
    assert_eq!(fftfreq(5), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    assert_eq!(fftfreq(1), vec![0.0]);
}

#[test]
fn test_spectral_filter_normalised() {
    let filter = spectral_filter(8, 16, 2.0);
    assert_eq!(filter.len(), 128);
    assert_eq!(filter[0], 0.0);

    let mean_sq = filter.iter().map(|v| v * v).sum::<f64>() / filter.len() as f64;
    assert_relative_eq!(mean_sq, 1.0, epsilon = 1e-12);

    // redder noise weights the lowest wavenumber above the highest
    assert!(filter[1] > filter[8]);

    // a single point has no non-zero frequency
    assert_eq!(spectral_filter(1, 1, 2.0), vec![0.0]);
}

#[test]
fn test_brown_noise_removes_plane_mean() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = brown_noise(&[3, 2, 16, 32], 2.0, &mut rng)?;
    assert_eq!(noise.shape(), &[3, 2, 16, 32]);

    for plane in noise.exact_chunks(IxDyn(&[1, 1, 16, 32])) {
        let mean = plane.iter().map(|&v| f64::from(v)).sum::<f64>() / 512.0;
        assert!(mean.abs() < 1e-5, "plane mean {mean}");
    }
    assert!(noise.iter().all(|v| v.is_finite()));
    assert!(noise.iter().any(|&v| v != 0.0));
    Ok(())
}

#[test]
fn test_brown_noise_is_smoother_than_white() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(3);
    let brown = brown_noise(&[1, 32, 64], 2.0, &mut rng)?;
    let white = generate_noise_gaussian(&[1, 32, 64], 1.0, &mut rng);

    // mean squared difference between zonal neighbours
    let roughness = |a: &ArrayD<f32>| {
        let lanes = a.lanes(Axis(2));
        let mut sum = 0.0f64;
        let mut n = 0usize;
        for lane in lanes {
            for pair in lane.to_vec().windows(2) {
                sum += f64::from(pair[1] - pair[0]).powi(2);
                n += 1;
            }
        }
        sum / n as f64
    };
    assert!(roughness(&brown) < roughness(&white));
    Ok(())
}

#[test]
fn test_brown_noise_shape_errors() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        brown_noise(&[16], 2.0, &mut rng),
        Err(GridcastError::InvalidParameter(_))
    ));
    assert!(brown_noise(&[2, 0, 8], 2.0, &mut rng).is_err());

    let single = brown_noise(&[2, 1, 1], 2.0, &mut rng).unwrap();
    assert!(single.iter().all(|&v| v == 0.0));
}

#[test]
fn test_seeded_noise_is_reproducible() -> Result<()> {
    let a = generate_noise_correlated(&[2, 8, 8], 1.5, 0.1, &mut StdRng::seed_from_u64(9))?;
    let b = generate_noise_correlated(&[2, 8, 8], 1.5, 0.1, &mut StdRng::seed_from_u64(9))?;
    assert_eq!(a, b);

    let unit = brown_noise(&[2, 8, 8], 1.5, &mut StdRng::seed_from_u64(9))?;
    for (scaled, base) in a.iter().zip(unit.iter()) {
        assert_relative_eq!(*scaled, base * 0.1, epsilon = 1e-6);
    }

    let g = generate_noise_gaussian(&[4, 4], 0.0, &mut StdRng::seed_from_u64(1));
    assert!(g.iter().all(|&v| v == 0.0));
    Ok(())
}

#[test]
fn test_bred_vector_with_persistence_model() -> Result<()> {
    let x = initial_state(1, 1);
    let x = x
        .broadcast((3, 1, 2, 8, 16))
        .ok_or("initial state does not broadcast")?
        .to_owned();

    let zero_steps = BredVectorConfig {
        integration_steps: 0,
        ..BredVectorConfig::default()
    };
    let many_steps = BredVectorConfig {
        integration_steps: 5,
        ..BredVectorConfig::default()
    };

    // identical members under persistence leave the initial noise unchanged
    let a = generate_bred_vector(&x, &Persistence, &zero_steps, &mut StdRng::seed_from_u64(5))?;
    let b = generate_bred_vector(&x, &Persistence, &many_steps, &mut StdRng::seed_from_u64(5))?;
    assert_eq!(a.shape(), x.shape());
    for (u, v) in a.iter().zip(b.iter()) {
        assert_relative_eq!(*u, *v, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn test_bred_vector_rescaling() -> Result<()> {
    let x = initial_state(2, 1);
    let config = BredVectorConfig {
        integration_steps: 0,
        noise_amplitude: 0.15,
        ..BredVectorConfig::default()
    };

    let dx = generate_bred_vector(&x, &Persistence, &config, &mut StdRng::seed_from_u64(11))?;

    // with no breeding steps dx = amp * noise * ||x|| / ||x + amp * noise||
    let noise = standard_normal(x.shape(), &mut StdRng::seed_from_u64(11));
    let noise = noise * 0.15;
    let norm = |a: &ArrayD<f32>| a.iter().map(|&v| f64::from(v).powi(2)).sum::<f64>().sqrt();
    let xd = x.clone().into_dyn();
    let gamma = norm(&xd) / norm(&(&xd + &noise));
    let expected = noise * (0.15 * gamma as f32);

    for (u, v) in dx.iter().zip(expected.iter()) {
        assert_relative_eq!(*u, *v, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn test_bred_vector_collapsed_time_output() -> Result<()> {
    let x = initial_state(2, 2);
    let config = BredVectorConfig {
        integration_steps: 3,
        ..BredVectorConfig::default()
    };
    let dx = generate_bred_vector(&x, &LastStep, &config, &mut StdRng::seed_from_u64(1))?;
    assert_eq!(dx.shape(), &[2, 1, 2, 8, 16]);
    assert!(dx.iter().all(|v| v.is_finite()));
    Ok(())
}

#[test]
fn test_bred_vector_inflation() -> Result<()> {
    let x = initial_state(4, 1);
    let plain = BredVectorConfig {
        integration_steps: 2,
        ..BredVectorConfig::default()
    };
    let inflated = BredVectorConfig {
        inflate: true,
        ..plain.clone()
    };

    let a = generate_bred_vector(&x, &Persistence, &plain, &mut StdRng::seed_from_u64(8))?;
    let b = generate_bred_vector(&x, &Persistence, &inflated, &mut StdRng::seed_from_u64(8))?;
    assert_eq!(a.shape(), b.shape());
    assert_ne!(a, b);
    Ok(())
}

#[test]
fn test_bred_vector_errors() {
    let x = initial_state(2, 1);
    let config = BredVectorConfig::default();
    let result = generate_bred_vector(&x, &Failing, &config, &mut StdRng::seed_from_u64(0));
    assert!(matches!(result, Err(GridcastError::ModelError(_))));

    let empty = EnsembleState::zeros((0, 1, 2, 8, 16));
    assert!(generate_bred_vector(&empty, &Persistence, &config, &mut StdRng::seed_from_u64(0)).is_err());

    let zeros = EnsembleState::zeros((1, 1, 1, 2, 2));
    let no_noise = BredVectorConfig {
        noise_amplitude: 0.0,
        integration_steps: 1,
        ..BredVectorConfig::default()
    };
    assert!(generate_bred_vector(&zeros, &Persistence, &no_noise, &mut StdRng::seed_from_u64(0)).is_err());
}

#[test]
fn test_strategy_names() -> Result<()> {
    assert_eq!("bred_vector".parse::<PerturbationStrategy>()?, PerturbationStrategy::Bred);
    assert_eq!(PerturbationStrategy::Correlated.to_string(), "correlated");
    assert!("spherical_grf".parse::<PerturbationStrategy>().is_err());
    Ok(())
}

#[test]
fn test_perturbation_keeps_control_member() -> Result<()> {
    let x = initial_state(3, 1);
    let perturbation = Perturbation {
        seed: Some(21),
        ..Perturbation::new(PerturbationStrategy::Gaussian, 0.5)
    };

    let noise = perturbation.generate(&x, None)?;
    assert!(noise.index_axis(Axis(0), 0).iter().all(|&v| v == 0.0));
    assert!(noise.index_axis(Axis(0), 1).iter().any(|&v| v != 0.0));

    let mut perturbed = x.clone();
    perturbation.apply(&mut perturbed, None)?;
    assert_eq!(perturbed.index_axis(Axis(0), 0), x.index_axis(Axis(0), 0));
    assert_eq!(perturbed, &x + &noise);
    Ok(())
}

#[test]
fn test_perturbation_strategies() -> Result<()> {
    let x = initial_state(2, 1);

    let none = Perturbation::new(PerturbationStrategy::None, 1.0).generate(&x, None)?;
    assert!(none.iter().all(|&v| v == 0.0));

    let bred = Perturbation::new(PerturbationStrategy::Bred, 0.1);
    assert!(matches!(
        bred.generate(&x, None),
        Err(GridcastError::InvalidParameter(_))
    ));
    let bred = Perturbation {
        integration_steps: 2,
        keep_control: false,
        seed: Some(4),
        ..bred
    };
    let dx = bred.generate(&x, Some(&Persistence))?;
    assert_eq!(dx.shape(), x.shape());

    let correlated = Perturbation {
        seed: Some(2),
        keep_control: false,
        ..Perturbation::default()
    };
    let first = correlated.generate(&x, None)?;
    let second = correlated.generate(&x, None)?;
    assert_eq!(first, second);
    Ok(())
}
