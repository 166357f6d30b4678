//! Interception solver - closed-form время удара
//!
//! Входы относительные: позиция/скорость projectile относительно root part
//! агента, постоянное вертикальное ускорение (ось Y). Выход - `Some(t >= 0)`
//! или `None` (пересечения нет - штатный исход, не ошибка).
//!
//! Никаких итераций: только квадратные уравнения.

use bevy::math::Vec3;

/// Допуск для проверок "на границе" (горизонтальный радиус на cap-кандидате)
const BOUNDARY_TOLERANCE: f32 = 1e-4;

/// Корни `a t² + b t + c = 0`, по возрастанию. Линейный случай только при
/// `a == 0` (оба корня совпадают). `None` - отрицательный дискриминант или
/// нет решений.
///
/// Форма без катастрофического вычитания: `q = -(b + sign(b)·√D) / 2`,
/// корни `q / a` и `c / q`. Малое ненулевое `a` (медленный projectile)
/// остаётся квадратным уравнением.
pub fn quadratic_roots(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || !discriminant.is_finite() {
        return None;
    }

    let q = -0.5 * (b + discriminant.sqrt().copysign(b));
    if q == 0.0 {
        // b = 0 и D = 0 → c = 0: двойной корень в нуле
        return Some((0.0, 0.0));
    }

    let t1 = q / a;
    let t2 = c / q;
    Some((t1.min(t2), t1.max(t2)))
}

/// Наименьший строго положительный корень; если ранний корень ≤ 0 -
/// поздний, если он > 0; иначе `None`.
pub fn earliest_positive_root(a: f32, b: f32, c: f32) -> Option<f32> {
    let (early, late) = quadratic_roots(a, b, c)?;
    if early > 0.0 {
        Some(early)
    } else if late > 0.0 {
        Some(late)
    } else {
        None
    }
}

/// Удар о статическую сферу радиуса `radius` с центром в начале координат.
///
/// Гравитация внутри короткого окна не учитывается. Точка уже внутри
/// сферы → `Some(0.0)`.
pub fn sphere_impact_time(position: Vec3, velocity: Vec3, radius: f32) -> Option<f32> {
    let c = position.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let a = velocity.length_squared();
    let b = 2.0 * position.dot(velocity);
    earliest_positive_root(a, b, c)
}

/// Вход для цилиндрического (gravity-aware) варианта
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderQuery {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Вертикальное ускорение (со знаком; гравитация вниз = отрицательное)
    pub vertical_acceleration: f32,
    pub radius: f32,
    pub half_height: f32,
}

impl CylinderQuery {
    pub fn height_at(&self, t: f32) -> f32 {
        self.position.y + self.velocity.y * t + 0.5 * self.vertical_acceleration * t * t
    }

    pub fn horizontal_distance_at(&self, t: f32) -> f32 {
        let x = self.position.x + self.velocity.x * t;
        let z = self.position.z + self.velocity.z * t;
        (x * x + z * z).sqrt()
    }

    fn contains_start(&self) -> bool {
        self.horizontal_distance_at(0.0) <= self.radius && self.position.y.abs() <= self.half_height
    }
}

/// Удар о вертикальный цилиндр (radius, ±half_height) вокруг начала координат.
///
/// 1. Уже внутри → 0
/// 2. Radius-first: время, когда горизонтальная дистанция = R (вертикальное
///    ускорение на горизонталь не влияет); принимаем, если высота в полосе
/// 3. Иначе пересечение верхней/нижней крышки не раньше radius-кандидата
///    (clamp к нулю), с горизонталью внутри R
pub fn cylinder_impact_time(query: &CylinderQuery) -> Option<f32> {
    if query.contains_start() {
        return Some(0.0);
    }

    let p = query.position;
    let v = query.velocity;
    let r = query.radius;
    let d = query.half_height;

    // Горизонтальная плоскость (XZ)
    let a = v.x * v.x + v.z * v.z;
    let b = 2.0 * (p.x * v.x + p.z * v.z);
    let c = p.x * p.x + p.z * p.z - r * r;

    // Уже внутри по горизонтали: входить можно только через крышку, с t = 0
    let radius_candidate = if c <= 0.0 {
        None
    } else {
        earliest_positive_root(a, b, c)
    };

    if let Some(t) = radius_candidate {
        if query.height_at(t).abs() <= d {
            return Some(t);
        }
    } else if c > 0.0 {
        // Горизонтально никогда не доходим до R - крышки не помогут
        return None;
    }

    let lower_bound = radius_candidate.unwrap_or(0.0).max(0.0);
    let half_a = 0.5 * query.vertical_acceleration;

    let mut cap_times: Vec<f32> = [d, -d]
        .into_iter()
        .filter_map(|cap| quadratic_roots(half_a, v.y, p.y - cap))
        .flat_map(|(t1, t2)| [t1, t2])
        .filter(|t| t.is_finite() && *t >= lower_bound)
        .collect();
    cap_times.sort_by(|x, y| x.total_cmp(y));

    cap_times
        .into_iter()
        .find(|t| query.horizontal_distance_at(*t) <= r + BOUNDARY_TOLERANCE)
}
