use core::ops::{Add, Mul, Neg, Sub};

/// Below this magnitude the ray direction is considered parallel to a triangle's plane.
const EPS10: f64 = 1e-10;
/// Slack on barycentric bounds so points on a shared edge hit at least one of the triangles.
const EDGE_EPS: f64 = 1e-9;

/// A 3-dimensional vector of `f64`.
///
/// Terrain queries put the height on the Y axis, `(lon, height, lat)`, so a ray cast straight down is `-Y`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const DOWN: Self = Self::new(0.0, -1.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// The result of intersecting a `Ray` with a triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RayHit {
    /// The ray meets the triangle's plane at the given point, inside the triangle (borders included).
    Inside(Vec3),
    /// The ray meets the plane outside of the triangle, or never meets it.
    Outside,
    /// The ray lies in the triangle's plane.
    InPlane,
    /// The plane is behind the ray origin.
    Away,
}

/// A half-line from `origin` along `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    #[inline]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn point_at(&self, distance: f64) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Intersects the ray with triangle `(v0, v1, v2)` using barycentric coordinates relative to `v0`.
    pub fn hit_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> RayHit {
        let u = v1 - v0;
        let v = v2 - v0;
        let n = u.cross(v);

        let w0 = self.origin - v0;
        let a = -n.dot(w0);
        let b = n.dot(self.direction);

        if b.abs() < EPS10 {
            return if a == 0.0 {
                RayHit::InPlane
            } else {
                RayHit::Outside
            };
        }

        let r = a / b;
        if r < 0.0 {
            return RayHit::Away;
        }
        let hit = self.point_at(r);

        let uu = u.dot(u);
        let uv = u.dot(v);
        let vv = v.dot(v);
        let w = hit - v0;
        let wu = w.dot(u);
        let wv = w.dot(v);
        let d = uv * uv - uu * vv;

        let s = (uv * wv - vv * wu) / d;
        if s < -EDGE_EPS || s > 1.0 + EDGE_EPS {
            return RayHit::Outside;
        }
        let t = (uv * wu - uu * wv) / d;
        if t < -EDGE_EPS || s + t > 1.0 + EDGE_EPS {
            return RayHit::Outside;
        }

        RayHit::Inside(hit)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
