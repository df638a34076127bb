use glam::Vec3;

use super::{Hit, LayerMask, Ray, SceneQuery};

/// A primitive collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// An infinite plane through `point` with unit `normal`.
    Plane { point: Vec3, normal: Vec3 },
    Sphere { center: Vec3, radius: f32 },
    /// An axis-aligned box.
    Cuboid { min: Vec3, max: Vec3 },
}

impl Shape {
    /// A plane through `point` facing `normal`. The normal is normalized.
    pub fn plane(point: Vec3, normal: Vec3) -> Self {
        Shape::Plane {
            point,
            normal: normal.normalize_or(Vec3::Y),
        }
    }

    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Shape::Sphere { center, radius }
    }

    /// An axis-aligned box centered on `center` with the given half extents.
    pub fn cuboid(center: Vec3, half_size: Vec3) -> Self {
        let half_size = half_size.abs();
        Shape::Cuboid {
            min: center - half_size,
            max: center + half_size,
        }
    }

    /// Distance along the ray and the surface normal facing the ray, if the ray hits.
    fn intersect(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        match *self {
            Shape::Plane { point, normal } => {
                let denom = normal.dot(ray.direction);
                if denom.abs() <= f32::EPSILON {
                    return None;
                }
                let distance = normal.dot(point - ray.origin) / denom;
                let facing = if denom < 0.0 { normal } else { -normal };
                (distance >= 0.0).then_some((distance, facing))
            }
            Shape::Sphere { center, radius } => {
                let offset = ray.origin - center;
                let b = offset.dot(ray.direction);
                let c = offset.length_squared() - radius * radius;
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let root = discriminant.sqrt();
                // The origin is inside the sphere when the near root is behind it.
                let distance = if -b - root >= 0.0 { -b - root } else { -b + root };
                if distance < 0.0 {
                    return None;
                }
                let mut normal = (ray.at(distance) - center) / radius;
                if normal.dot(ray.direction) > 0.0 {
                    normal = -normal;
                }
                Some((distance, normal))
            }
            Shape::Cuboid { min, max } => {
                let inverse = ray.direction.recip();
                let t1 = (min - ray.origin) * inverse;
                let t2 = (max - ray.origin) * inverse;
                let near = t1.min(t2);
                let far = t1.max(t2);
                let t_near = near.max_element();
                let t_far = far.min_element();
                if t_near > t_far || t_far < 0.0 {
                    return None;
                }
                let (distance, axis) = if t_near >= 0.0 {
                    (t_near, axis_of(near, t_near))
                } else {
                    (t_far, axis_of(far, t_far))
                };
                let mut normal = Vec3::ZERO;
                normal[axis] = -ray.direction[axis].signum();
                Some((distance, normal))
            }
        }
    }
}

fn axis_of(values: Vec3, value: f32) -> usize {
    (0..3).find(|&axis| values[axis] == value).unwrap_or(0)
}

#[derive(Debug, Clone, Copy)]
struct Collider {
    shape: Shape,
    layers: LayerMask,
}

/// A scene made of primitive colliders, each on its own layers.
#[derive(Debug, Clone, Default)]
pub struct Shapes {
    colliders: Vec<Collider>,
}

impl Shapes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider on `layers`.
    pub fn push(&mut self, shape: Shape, layers: LayerMask) -> &mut Self {
        self.colliders.push(Collider { shape, layers });
        self
    }

    /// Builder form of [`Shapes::push`].
    pub fn with(mut self, shape: Shape, layers: LayerMask) -> Self {
        self.push(shape, layers);
        self
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl SceneQuery for Shapes {
    fn cast(&self, ray: Ray, max_distance: f32, layers: LayerMask) -> Option<Hit> {
        self.colliders
            .iter()
            .filter(|collider| collider.layers.intersects(layers))
            .filter_map(|collider| collider.shape.intersect(&ray))
            .filter(|(distance, _)| *distance <= max_distance)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(distance, normal)| Hit {
                point: ray.at(distance),
                normal,
                distance,
            })
    }
}
