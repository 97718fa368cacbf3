use glam::{Mat3, Vec3};

/// The six bone corrections, one per signed axis in +X, +Y, +Z, -X, -Y, -Z
/// order. Each maps its axis onto +Y, the direction hosts point bones
/// along. Written row-major for readability and transposed on use.
const AXIS_CORRECTIONS: [[f32; 9]; 6] = [
    [0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0],
    [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    [-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0],
];

fn correction_matrix(axis: usize) -> Mat3 {
    Mat3::from_cols_array(&AXIS_CORRECTIONS[axis]).transpose()
}

/// Picks the axis correction that best matches a bone's child offset.
///
/// The offset - for a bone with children, the summed local translations of
/// its bone children - is scored against the six signed axes. The dominant
/// axis wins only when the two remaining components are small next to it:
/// their combined magnitude must stay under a quarter of the dominant one.
/// Anything less collinear gets no correction, so bones that fan out keep
/// their stored orientation rather than snapping to a misleading axis.
pub fn select_correction(offset: Vec3) -> Option<Mat3> {
    let scores = [
        offset.x, offset.y, offset.z, -offset.x, -offset.y, -offset.z,
    ]
    .map(|component| (component * 200.0) as i32);

    // first index wins a tie
    let mut axis = 0;
    for (index, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[axis] {
            axis = index;
        }
    }

    let (x, y, z) = (offset.x.abs(), offset.y.abs(), offset.z.abs());
    let alignment_offset = if (axis == 0 || axis == 3) && x > 0.0 {
        (y + z) / x
    } else if (axis == 1 || axis == 4) && y > 0.0 {
        (z + x) / y
    } else if z > 0.0 {
        (x + y) / z
    } else {
        0.0
    };

    (alignment_offset < 0.25).then(|| correction_matrix(axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn corrections_rotate_their_axis_onto_y() {
        let axes = [Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X, -Vec3::Y, -Vec3::Z];
        for (index, axis) in axes.iter().enumerate() {
            let correction = correction_matrix(index);
            assert_relative_eq!(correction * *axis, Vec3::Y, epsilon = 1e-6);
            // proper rotations, not reflections
            assert_relative_eq!(correction.determinant(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn well_aligned_offsets_select_their_axis() {
        // +Y is the identity correction
        let correction = select_correction(Vec3::new(0.1, 5.0, 0.0)).unwrap();
        assert_relative_eq!(correction, Mat3::IDENTITY, epsilon = 1e-6);

        // children along -Z
        let correction = select_correction(Vec3::new(0.0, 0.0, -4.0)).unwrap();
        assert_relative_eq!(correction * -Vec3::Z, Vec3::Y, epsilon = 1e-6);
    }

    #[test]
    fn threshold_is_exclusive() {
        // (0.2 + 0.0) / 1.0 is under the quarter threshold
        assert!(select_correction(Vec3::new(1.0, 0.2, 0.0)).is_some());
        // 0.125 + 0.125 is exactly 0.25 in binary floats: rejected
        assert!(select_correction(Vec3::new(1.0, 0.125, 0.125)).is_none());
        assert!(select_correction(Vec3::new(1.0, 0.3, 0.0)).is_none());
    }

    #[test]
    fn selection_is_idempotent() {
        let offset = Vec3::new(0.01, -3.0, 0.2);
        assert_eq!(select_correction(offset), select_correction(offset));
    }

    #[test]
    fn zero_offset_defaults_to_the_first_axis() {
        // all six scores tie at zero; the +X entry wins
        let correction = select_correction(Vec3::ZERO).unwrap();
        assert_relative_eq!(correction * Vec3::X, Vec3::Y, epsilon = 1e-6);
    }
}
