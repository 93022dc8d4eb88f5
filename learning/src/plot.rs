//! Training-curve rendering.

use image::{Rgb, RgbImage};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const RAW: Rgb<u8> = Rgb([160, 190, 230]);
const SMOOTHED: Rgb<u8> = Rgb([20, 60, 170]);
const MARGIN: u32 = 24;

/// Episodes averaged by the smoothed curve.
pub const MOVING_AVERAGE_WINDOW: usize = 10;

/// Trailing mean over at most `window` values ending at each position.
#[must_use]
pub fn moving_average(values: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(1);
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            sum += value;
            if index >= window {
                sum -= values[index - window];
            }
            sum / (index + 1).min(window) as f32
        })
        .collect()
}

/// Draws per-episode scores and their moving average.
#[must_use]
pub fn training_curve(scores: &[f32], width: u32, height: u32) -> RgbImage {
    let width = width.max(MARGIN * 2 + 2);
    let height = height.max(MARGIN * 2 + 2);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    let left = MARGIN as i64;
    let right = (width - MARGIN) as i64;
    let top = MARGIN as i64;
    let bottom = (height - MARGIN) as i64;
    line(&mut image, (left, bottom), (right, bottom), AXIS);
    line(&mut image, (left, top), (left, bottom), AXIS);

    if scores.is_empty() {
        return image;
    }

    let smoothed = moving_average(scores, MOVING_AVERAGE_WINDOW);
    let (low, high) = scores
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), &score| {
            (low.min(score), high.max(score))
        });
    let span = (high - low).max(f32::EPSILON);
    let last = (scores.len() - 1).max(1) as f32;
    let project = |index: usize, value: f32| {
        let x = left + ((right - left) as f32 * index as f32 / last).round() as i64;
        let y = bottom - ((bottom - top) as f32 * (value - low) / span).round() as i64;
        (x, y)
    };

    for (series, colour) in [(scores, RAW), (smoothed.as_slice(), SMOOTHED)] {
        let mut previous = project(0, series[0]);
        plot(&mut image, previous, colour);
        for (index, &value) in series.iter().enumerate().skip(1) {
            let point = project(index, value);
            line(&mut image, previous, point, colour);
            previous = point;
        }
    }
    image
}

fn plot(image: &mut RgbImage, (x, y): (i64, i64), colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(image.width()) && y < i64::from(image.height()) {
        image.put_pixel(x as u32, y as u32, colour);
    }
}

/// Bresenham line between two points, clipped to the image.
fn line(image: &mut RgbImage, from: (i64, i64), to: (i64, i64), colour: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let step_x = if x < to.0 { 1 } else { -1 };
    let step_y = if y < to.1 { 1 } else { -1 };
    let mut error = dx + dy;
    loop {
        plot(image, (x, y), colour);
        if (x, y) == to {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }
}
