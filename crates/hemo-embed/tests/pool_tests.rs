#![cfg(feature = "local-model")]

use candle_core::{Device, Tensor};
use hemo_embed::masked_mean_l2;

fn pooled(hidden: &[f32], shape: (usize, usize, usize), mask: &[u32]) -> Vec<Vec<f32>> {
    let dev = Device::Cpu;
    let h = Tensor::from_slice(hidden, shape, &dev).unwrap();
    let m = Tensor::from_slice(mask, (shape.0, shape.1), &dev).unwrap();
    masked_mean_l2(&h, &m).unwrap().to_vec2().unwrap()
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    for (a, b) in actual.iter().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={a} b={b}");
    }
}

#[test]
fn padding_tokens_are_ignored() {
    // token 1 is padding
    let out = pooled(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], (1, 2, 4), &[1, 0]);
    let norm = 30f32.sqrt();
    assert_close(&out[0], &[1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm]);
}

#[test]
fn rows_are_pooled_independently_and_unit_length() {
    let hidden = [
        3.0, 0.0, 1.0, 0.0, // row 0
        0.0, 2.0, 0.0, 9.0, // row 1, second token padded
    ];
    let out = pooled(&hidden, (2, 2, 2), &[1, 1, 1, 0]);
    // row 0 mean [2, 0]; row 1 keeps only [0, 2]
    assert_close(&out[0], &[1.0, 0.0]);
    assert_close(&out[1], &[0.0, 1.0]);
    for row in &out {
        let len: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }
}
