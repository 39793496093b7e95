//! Circular interpolation.
//!
//! Expands a G2/G3 block into short linear waypoints for the motion queue.
//! Arcs are traced in the XY plane (G17); Z interpolates linearly across
//! the sweep and the K offset is ignored.

use super::state::Position;

/// Target chord length in mm; one queue waypoint per chord.
pub const CHORD_MM: f64 = 1.0;

/// Below this radius the arc degenerates to a straight line to the endpoint.
const MIN_RADIUS_MM: f64 = 1e-3;

/// Sweeps shorter than this are treated as a full revolution, so a block
/// whose endpoint equals its start point traces the whole circle.
const FULL_CIRCLE_EPSILON: f64 = 1e-4;

/// Expands an arc from `start` to `end` around the centre offset (i, j)
/// into waypoints ending exactly on the arc. `clockwise` selects G2
/// traversal; the returned list excludes `start`.
pub fn expand(start: Position, end: Position, i: f64, j: f64, clockwise: bool) -> Vec<Position> {
    let cx = start.x + i;
    let cy = start.y + j;
    let radius = (start.x - cx).hypot(start.y - cy);

    if radius < MIN_RADIUS_MM {
        return vec![end];
    }

    let start_angle = (start.y - cy).atan2(start.x - cx);
    let mut end_angle = (end.y - cy).atan2(end.x - cx);

    if clockwise {
        while end_angle > start_angle {
            end_angle -= 2.0 * std::f64::consts::PI;
        }
    } else {
        while end_angle < start_angle {
            end_angle += 2.0 * std::f64::consts::PI;
        }
    }

    if (end_angle - start_angle).abs() < FULL_CIRCLE_EPSILON {
        if clockwise {
            end_angle = start_angle - 2.0 * std::f64::consts::PI;
        } else {
            end_angle = start_angle + 2.0 * std::f64::consts::PI;
        }
    }

    let sweep = (end_angle - start_angle).abs();
    let segments = ((radius * sweep / CHORD_MM) as usize).max(2);

    let mut waypoints = Vec::with_capacity(segments);
    for n in 1..=segments {
        let t = n as f64 / segments as f64;
        let angle = start_angle + (end_angle - start_angle) * t;
        waypoints.push(Position {
            x: cx + radius * angle.cos(),
            y: cy + radius * angle.sin(),
            z: start.z + (end.z - start.z) * t,
        });
    }
    waypoints
}
