//! Ray and overlap tests against the two supported shapes.
//!
//! All ray functions take a unit direction and return the distance along it.
//! A ray that starts inside a shape hits at distance zero.

use glam::DVec3;

use planetz_core::types::Transform;

use crate::body::Shape;

const EPSILON: f64 = 1e-12;

/// Entry point of a ray into a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f64,
    /// Outward surface normal at the hit, in world space.
    pub normal: DVec3,
}

/// Penetration between a sphere and a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Point on the shape surface.
    pub point: DVec3,
    /// Points from the shape toward the sphere.
    pub normal: DVec3,
    pub depth: f64,
}

pub fn ray_sphere(
    origin: DVec3,
    dir: DVec3,
    center: DVec3,
    radius: f64,
    max_distance: f64,
) -> Option<RayHit> {
    let m = origin - center;
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(RayHit {
            distance: 0.0,
            normal: -dir,
        });
    }
    let b = m.dot(dir);
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    if t > max_distance {
        return None;
    }
    let t = t.max(0.0);
    Some(RayHit {
        distance: t,
        normal: (origin + dir * t - center).normalize_or_zero(),
    })
}

/// Slab test against an oriented box.
pub fn ray_obb(
    origin: DVec3,
    dir: DVec3,
    transform: &Transform,
    half_extents: DVec3,
    max_distance: f64,
) -> Option<RayHit> {
    let inverse = transform.orientation.inverse();
    let o = inverse * (origin - transform.position);
    let d = inverse * dir;
    let (o, d, h) = (o.to_array(), d.to_array(), half_extents.to_array());

    let mut t_min = 0.0_f64;
    let mut t_max = max_distance;
    let mut hit_axis: Option<(usize, f64)> = None;

    for axis in 0..3 {
        if d[axis].abs() < EPSILON {
            if o[axis] < -h[axis] || o[axis] > h[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d[axis];
        let t1 = (-h[axis] - o[axis]) * inv;
        let t2 = (h[axis] - o[axis]) * inv;
        let (near, far, sign) = if t1 < t2 {
            (t1, t2, -1.0)
        } else {
            (t2, t1, 1.0)
        };
        if near > t_min {
            t_min = near;
            hit_axis = Some((axis, sign));
        }
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }

    let normal = match hit_axis {
        Some((axis, sign)) => {
            let mut local = [0.0; 3];
            local[axis] = sign;
            transform.orientation * DVec3::from_array(local)
        }
        None => -dir,
    };
    Some(RayHit {
        distance: t_min,
        normal,
    })
}

/// Ray against a shape grown by `inflate` (Minkowski sum with a sphere,
/// approximated for boxes by growing the half extents).
pub fn ray_shape(
    origin: DVec3,
    dir: DVec3,
    shape: &Shape,
    transform: &Transform,
    inflate: f64,
    max_distance: f64,
) -> Option<RayHit> {
    match shape {
        Shape::Sphere { radius } => ray_sphere(
            origin,
            dir,
            transform.position,
            radius + inflate,
            max_distance,
        ),
        Shape::Box { half_extents } => ray_obb(
            origin,
            dir,
            transform,
            *half_extents + DVec3::splat(inflate),
            max_distance,
        ),
    }
}

/// Earliest fraction in `[0, 1]` of `displacement` at which a sphere starting
/// at `start` touches the shape.
pub fn sweep_sphere(
    start: DVec3,
    displacement: DVec3,
    radius: f64,
    shape: &Shape,
    transform: &Transform,
) -> Option<(f64, RayHit)> {
    let length = displacement.length();
    if length < EPSILON {
        return sphere_contact(start, radius, shape, transform).map(|c| {
            (
                0.0,
                RayHit {
                    distance: 0.0,
                    normal: c.normal,
                },
            )
        });
    }
    let dir = displacement / length;
    ray_shape(start, dir, shape, transform, radius, length).map(|hit| (hit.distance / length, hit))
}

/// Discrete overlap of a sphere with a shape.
pub fn sphere_contact(
    center: DVec3,
    radius: f64,
    shape: &Shape,
    transform: &Transform,
) -> Option<Contact> {
    match shape {
        Shape::Sphere { radius: other } => {
            let delta = center - transform.position;
            let distance = delta.length();
            let reach = radius + other;
            if distance >= reach {
                return None;
            }
            let normal = if distance > EPSILON {
                delta / distance
            } else {
                DVec3::Y
            };
            Some(Contact {
                point: transform.position + normal * *other,
                normal,
                depth: reach - distance,
            })
        }
        Shape::Box { half_extents } => {
            let inverse = transform.orientation.inverse();
            let local = inverse * (center - transform.position);
            let closest = local.clamp(-*half_extents, *half_extents);
            let diff = local - closest;
            let distance = diff.length();
            if distance >= radius {
                return None;
            }
            let (local_normal, depth) = if distance > EPSILON {
                (diff / distance, radius - distance)
            } else {
                // Center inside the box: push out through the nearest face.
                let gaps = *half_extents - local.abs();
                let axis = if gaps.x <= gaps.y && gaps.x <= gaps.z {
                    DVec3::X * local.x.signum()
                } else if gaps.y <= gaps.z {
                    DVec3::Y * local.y.signum()
                } else {
                    DVec3::Z * local.z.signum()
                };
                (axis, radius + gaps.min_element())
            };
            Some(Contact {
                point: transform.position + transform.orientation * closest,
                normal: transform.orientation * local_normal,
                depth,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;

    #[test]
    fn ray_hits_sphere_front_face() {
        let hit = ray_sphere(DVec3::ZERO, DVec3::X, DVec3::new(10.0, 0.0, 0.0), 2.0, 100.0)
            .expect("hit");
        assert!((hit.distance - 8.0).abs() < 1e-9);
        assert!((hit.normal - DVec3::NEG_X).length() < 1e-9);
    }

    #[test]
    fn ray_misses_sphere_behind_or_beyond() {
        assert!(ray_sphere(DVec3::ZERO, DVec3::NEG_X, DVec3::new(10.0, 0.0, 0.0), 2.0, 100.0).is_none());
        assert!(ray_sphere(DVec3::ZERO, DVec3::X, DVec3::new(10.0, 0.0, 0.0), 2.0, 5.0).is_none());
    }

    #[test]
    fn ray_hits_rotated_box() {
        let transform = Transform::new(
            DVec3::new(0.0, 0.0, -10.0),
            DQuat::from_rotation_y(std::f64::consts::FRAC_PI_4),
        );
        let hit = ray_obb(DVec3::ZERO, DVec3::NEG_Z, &transform, DVec3::splat(1.0), 50.0)
            .expect("hit");
        // Diagonal of a unit box rotated 45 degrees.
        assert!((hit.distance - (10.0 - 2f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn sweep_catches_tunneling_motion() {
        let target = Transform::at(DVec3::new(0.0, 0.0, -5.0));
        let shape = Shape::Sphere { radius: 0.4 };
        // Moves 20 units in one step, straight through the target.
        let (fraction, _) =
            sweep_sphere(DVec3::ZERO, DVec3::new(0.0, 0.0, -20.0), 0.4, &shape, &target)
                .expect("swept hit");
        assert!((fraction - (5.0 - 0.8) / 20.0).abs() < 1e-9);
    }

    #[test]
    fn sphere_inside_box_pushes_out_nearest_face() {
        let contact = sphere_contact(
            DVec3::new(0.9, 0.0, 0.0),
            0.5,
            &Shape::Box {
                half_extents: DVec3::splat(1.0),
            },
            &Transform::default(),
        )
        .expect("overlap");
        assert!((contact.normal - DVec3::X).length() < 1e-9);
        assert!((contact.depth - 0.6).abs() < 1e-9);
    }
}
