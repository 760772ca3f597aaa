//! Noise Shaping Spectrum Tests
//!
//! Validates that error feedback actually moves requantization noise:
//! - Constant input without dither: shaping removes the DC error
//! - Sine input with triangular dither: shaped noise leaves the low band
//!   and reappears near Nyquist
//! - Every supported filter lowers the mean error on a constant input
//! - Highpass dither itself carries little low-frequency energy

use rand::rngs::StdRng;
use rand::SeedableRng;
use requant_dsp::{dither, DitherMode, Requantizer};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

const N: usize = 4096;

/// Requantize `input` on channel 0 and return the error signal (output - input)
fn requantization_error(input: &[f32], configure: impl FnOnce(&mut Requantizer)) -> Vec<f32> {
    let mut requantizer = Requantizer::seeded(0x5eed);
    configure(&mut requantizer);

    let mut output = input.to_vec();
    requantizer.process(0, &mut output);

    output.iter().zip(input).map(|(y, x)| y - x).collect()
}

/// Power spectrum (|X[k]|^2) of the first N/2 + 1 bins
fn power_spectrum(signal: &[f32]) -> Vec<f64> {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(signal.len());

    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    fft.process(&mut buffer);

    buffer[..=signal.len() / 2]
        .iter()
        .map(|c| c.norm_sqr())
        .collect()
}

fn band_energy(spectrum: &[f64], from: usize, to: usize) -> f64 {
    spectrum[from..to].iter().sum()
}

fn generate_sine(bin: usize, amplitude: f32) -> Vec<f32> {
    (0..N)
        .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / N as f32).sin())
        .collect()
}

#[test]
fn test_constant_input_error_is_all_dc_without_shaping() {
    let input = vec![0.1_f32; N];
    let error = requantization_error(&input, |rq| rq.set_step_size(0.25));

    // Every sample rounds to 0.0, so the error is a constant -0.1
    assert!(error.iter().all(|e| (e + 0.1).abs() < 1e-6));

    let spectrum = power_spectrum(&error);
    let dc = spectrum[0];
    let rest: f64 = spectrum[1..].iter().sum();
    assert!(rest < dc * 1e-6, "DC {} vs rest {}", dc, rest);
}

#[test]
fn test_shaping_lowers_low_frequency_error_on_constant_input() {
    let input = vec![0.1_f32; N];
    let low_band = N / 32;

    let plain = requantization_error(&input, |rq| rq.set_step_size(0.25));
    let plain_low = band_energy(&power_spectrum(&plain), 0, low_band);

    for order in [1, 2] {
        let shaped = requantization_error(&input, |rq| {
            rq.set_step_size(0.25);
            rq.set_noise_shape_order(order);
        });
        let shaped_low = band_energy(&power_spectrum(&shaped), 0, low_band);

        println!(
            "order {}: low-band error energy {:.3e} (unshaped {:.3e})",
            order, shaped_low, plain_low
        );
        assert!(
            shaped_low < plain_low * 0.1,
            "order {} did not lower low-frequency error: {} vs {}",
            order,
            shaped_low,
            plain_low
        );
    }
}

#[test]
fn test_every_filter_lowers_mean_error() {
    let input = vec![0.1_f32; N];

    let plain = requantization_error(&input, |rq| rq.set_step_size(0.25));
    let plain_mean = (plain.iter().map(|&e| e as f64).sum::<f64>() / N as f64).abs();

    for order in [1, 2, 3, 5, 9] {
        let shaped = requantization_error(&input, |rq| {
            rq.set_step_size(0.25);
            rq.set_noise_shape_order(order);
        });
        let shaped_mean = (shaped.iter().map(|&e| e as f64).sum::<f64>() / N as f64).abs();

        assert!(
            shaped_mean < plain_mean,
            "order {}: mean error {} not below unshaped {}",
            order,
            shaped_mean,
            plain_mean
        );
    }
}

#[test]
fn test_dithered_noise_moves_to_high_frequencies() {
    let input = generate_sine(37, 0.5);
    let q = 1.0 / 256.0;

    let plain = requantization_error(&input, |rq| {
        rq.set_step_size(q);
        rq.set_dither_mode(DitherMode::Triangular);
    });
    let shaped = requantization_error(&input, |rq| {
        rq.set_step_size(q);
        rq.set_dither_mode(DitherMode::Triangular);
        rq.set_noise_shape_order(2);
    });

    let plain_spectrum = power_spectrum(&plain);
    let shaped_spectrum = power_spectrum(&shaped);

    let low = (0, N / 32);
    let high = (N / 4, N / 2 + 1);

    let plain_low = band_energy(&plain_spectrum, low.0, low.1);
    let shaped_low = band_energy(&shaped_spectrum, low.0, low.1);
    let plain_high = band_energy(&plain_spectrum, high.0, high.1);
    let shaped_high = band_energy(&shaped_spectrum, high.0, high.1);

    println!(
        "low band: {:.3e} -> {:.3e}, high band: {:.3e} -> {:.3e}",
        plain_low, shaped_low, plain_high, shaped_high
    );

    assert!(shaped_low < plain_low * 0.1);
    assert!(shaped_high > plain_high);
}

#[test]
fn test_highpass_dither_sequence_is_highpass() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut previous = 0.0;
    let rect: Vec<f32> = (0..N)
        .map(|_| dither::rectangular(&mut previous, &mut rng))
        .collect();

    let mut rng = StdRng::seed_from_u64(42);
    let mut previous = 0.0;
    let highpass: Vec<f32> = (0..N)
        .map(|_| dither::highpass(&mut previous, &mut rng))
        .collect();

    let rect_spectrum = power_spectrum(&rect);
    let highpass_spectrum = power_spectrum(&highpass);

    let low_band = N / 32;
    let rect_low = band_energy(&rect_spectrum, 0, low_band);
    let highpass_low = band_energy(&highpass_spectrum, 0, low_band);
    assert!(
        highpass_low < rect_low * 0.1,
        "highpass dither low band {} vs rectangular {}",
        highpass_low,
        rect_low
    );

    let high = (N / 4, N / 2 + 1);
    assert!(
        band_energy(&highpass_spectrum, high.0, high.1)
            > band_energy(&rect_spectrum, high.0, high.1)
    );
}
