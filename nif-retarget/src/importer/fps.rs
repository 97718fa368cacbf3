use log::info;
use nif_blocks::{Interpolator, KeyframeData, NifDocument};

use crate::DEFAULT_FPS;

/// Picks the frame rate whose frame grid best fits the given key times.
///
/// NIF files don't record a frame rate, but their key times usually sit on
/// the grid of whatever rate the animation was authored at. Starting from
/// the default of 30, each candidate rate replaces the current pick only
/// when it strictly lowers the total rounding error, so a tie keeps 30.
pub fn estimate_fps(times: &[f32]) -> u32 {
    if times.is_empty() {
        return DEFAULT_FPS;
    }
    let mut fps = DEFAULT_FPS;
    let mut lowest_diff = grid_error(times, fps);
    for candidate in [20, 25, 35] {
        let diff = grid_error(times, candidate);
        if diff < lowest_diff {
            lowest_diff = diff;
            fps = candidate;
        }
    }
    fps
}

/// Total distance of the key times from the frame grid of `fps`.
fn grid_error(times: &[f32], fps: u32) -> f32 {
    times
        .iter()
        .map(|time| {
            let scaled = time * fps as f32;
            ((scaled + 0.5) as i32 as f32 - scaled).abs()
        })
        .sum()
}

/// Maps a key time to a 1-based frame number. Time 0.0 is frame 1.
pub(crate) fn frame_for_time(time: f32, fps: u32) -> u32 {
    1 + (time * fps as f32 + 0.5) as u32
}

/// Estimates the frame rate from every key time in the document.
pub(crate) fn document_frame_rate(document: &NifDocument) -> u32 {
    let mut times = Vec::new();
    for (_, object) in document.objects() {
        let controller = match object.controller.and_then(|id| document.controller(id)) {
            Some(controller) => controller,
            None => continue,
        };
        // every reachable data block contributes, whichever reference
        // carries it
        if let Some(data) = controller.data.and_then(|id| document.keyframe_data(id)) {
            collect_data_times(data, &mut times);
        }
        match &controller.interpolator {
            Some(Interpolator::Transform(interpolator)) => {
                if let Some(data) = interpolator.data.and_then(|id| document.keyframe_data(id)) {
                    collect_data_times(data, &mut times);
                }
            }
            Some(Interpolator::BSpline(bspline)) => times.extend(bspline.sample_times()),
            None => {}
        }
    }
    let fps = estimate_fps(&times);
    info!("animation estimated at {fps} frames per second");
    fps
}

fn collect_data_times(data: &KeyframeData, times: &mut Vec<f32>) {
    times.extend(data.translations.keys.iter().map(|key| key.time));
    times.extend(data.quaternion_keys.iter().map(|key| key.time));
    times.extend(data.scales.keys.iter().map(|key| key.time));
    for channel in &data.xyz_rotations {
        times.extend(channel.keys.iter().map(|key| key.time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use nif_blocks::{AvObject, Key, KeyframeController, TransformInterpolator};

    #[test]
    fn no_keys_means_default() {
        assert_eq!(estimate_fps(&[]), DEFAULT_FPS);
    }

    #[test]
    fn tie_keeps_the_default() {
        // exact on the 30 grid and on the 20 grid; only a strict
        // improvement may replace the default
        assert_eq!(estimate_fps(&[0.1, 0.2, 0.3]), 30);
    }

    #[test]
    fn quarter_second_grid_picks_25() {
        let times: Vec<f32> = (1..=10).map(|n| n as f32 / 25.0).collect();
        assert_eq!(estimate_fps(&times), 25);
    }

    #[test]
    fn time_zero_is_frame_one() {
        for fps in [20, 25, 30, 35] {
            assert_eq!(frame_for_time(0.0, fps), 1);
        }
        assert_eq!(frame_for_time(1.0, 30), 31);
        // rounds to the nearest frame
        assert_eq!(frame_for_time(0.49 / 30.0, 30), 1);
        assert_eq!(frame_for_time(0.51 / 30.0, 30), 2);
    }

    #[test]
    fn document_scan_reads_quaternion_keys() {
        let mut document = NifDocument::new();
        let data = document.add_keyframe_data(KeyframeData {
            quaternion_keys: (1..=10)
                .map(|n| Key::new(n as f32 / 25.0, Quat::IDENTITY))
                .collect(),
            ..Default::default()
        });
        let controller = document.add_controller(KeyframeController {
            data: Some(data),
            ..Default::default()
        });
        let mut node = AvObject::node("Bip01");
        node.controller = Some(controller);
        document.add_root(node);
        assert_eq!(document_frame_rate(&document), 25);
    }

    #[test]
    fn document_scan_reads_data_behind_an_empty_interpolator() {
        // the scan walks data blocks wherever they sit; an interpolator
        // that masks the controller's data for playback does not hide
        // its times from the estimate
        let mut document = NifDocument::new();
        let data = document.add_keyframe_data(KeyframeData {
            quaternion_keys: (1..=10)
                .map(|n| Key::new(n as f32 / 25.0, Quat::IDENTITY))
                .collect(),
            ..Default::default()
        });
        let controller = document.add_controller(KeyframeController {
            data: Some(data),
            interpolator: Some(Interpolator::Transform(TransformInterpolator::default())),
            ..Default::default()
        });
        let mut node = AvObject::node("Bip01");
        node.controller = Some(controller);
        document.add_root(node);
        assert_eq!(document_frame_rate(&document), 25);
    }
}
