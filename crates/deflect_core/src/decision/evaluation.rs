//! Per-projectile evaluation.
//!
//! Pure: кинематика + gravity + config → Verdict. Никаких registries,
//! никакого actuator - это делает decision loop.

use bevy::math::Vec3;

use crate::config::{DeflectConfig, VolumeModel};
use crate::host::Kinematics;
use crate::intercept::{cylinder_impact_time, sphere_impact_time, CylinderQuery};

/// Результат оценки одного projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Уже внутри радиуса - fire без солвера
    Contained,
    /// Удар через `t` секунд, попадает в actionable window
    Imminent(f32),
    /// Удар через `t` секунд, но threshold policy пока не пропускает
    Pending(f32),
    /// Пересечения нет
    Miss,
}

impl Verdict {
    pub fn fires(&self) -> bool {
        matches!(self, Verdict::Contained | Verdict::Imminent(_))
    }

    /// Время до удара (Contained = 0), `None` для Miss
    pub fn impact_time(&self) -> Option<f32> {
        match self {
            Verdict::Contained => Some(0.0),
            Verdict::Imminent(t) | Verdict::Pending(t) => Some(*t),
            Verdict::Miss => None,
        }
    }
}

/// Вертикальное ускорение projectile: собственное, если объект его
/// сообщает, иначе гравитация окружения (вниз) × scale
fn vertical_acceleration(projectile: &Kinematics, gravity: f32, config: &DeflectConfig) -> f32 {
    projectile
        .acceleration
        .map(|acceleration| acceleration.y)
        .unwrap_or(-gravity * config.gravity_scale)
}

pub fn evaluate(
    projectile: &Kinematics,
    agent_root: &Kinematics,
    gravity: f32,
    config: &DeflectConfig,
) -> Verdict {
    let relative_position = projectile.position - agent_root.position;

    // Short-circuit: уже в радиусе
    if relative_position.length() < config.volume_radius {
        return Verdict::Contained;
    }

    // Только closing velocity: горизонтальное движение агента вычитаем,
    // вертикальное (прыжки) игнорируем
    let agent_horizontal = Vec3::new(agent_root.velocity.x, 0.0, agent_root.velocity.z);
    let relative_velocity = projectile.velocity - agent_horizontal;

    let impact_time = match config.volume {
        VolumeModel::Sphere => {
            sphere_impact_time(relative_position, relative_velocity, config.volume_radius)
        }
        VolumeModel::Cylinder => cylinder_impact_time(&CylinderQuery {
            position: relative_position,
            velocity: relative_velocity,
            vertical_acceleration: vertical_acceleration(projectile, gravity, config),
            radius: config.volume_radius,
            half_height: config.volume_half_height,
        }),
    };

    match impact_time {
        None => Verdict::Miss,
        Some(t) if config.threshold_policy.admits(t, config.latency_compensation) => {
            Verdict::Imminent(t)
        }
        Some(t) => Verdict::Pending(t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdPolicy;

    fn sphere_config(compensation: f32) -> DeflectConfig {
        DeflectConfig {
            volume: VolumeModel::Sphere,
            volume_radius: 2.0,
            latency_compensation: compensation,
            ..Default::default()
        }
    }

    #[test]
    fn test_incoming_within_window_is_imminent() {
        let projectile = Kinematics::moving(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -10.0));
        let agent = Kinematics::at(Vec3::ZERO);

        let verdict = evaluate(&projectile, &agent, 9.81, &sphere_config(0.35));
        let Verdict::Imminent(t) = verdict else {
            panic!("expected Imminent, got {:?}", verdict);
        };
        assert!((t - 0.3).abs() < 1e-5);
        assert!(verdict.fires());
    }

    #[test]
    fn test_incoming_outside_window_is_pending() {
        let projectile = Kinematics::moving(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -10.0));
        let agent = Kinematics::at(Vec3::ZERO);

        let verdict = evaluate(&projectile, &agent, 9.81, &sphere_config(0.1));
        assert!(matches!(verdict, Verdict::Pending(_)));
        assert!(!verdict.fires());
        let t = verdict.impact_time().expect("pending still carries impact time");
        assert!((t - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_at_or_above_policy_inverts_window() {
        let projectile = Kinematics::moving(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -10.0));
        let agent = Kinematics::at(Vec3::ZERO);
        let config = DeflectConfig {
            threshold_policy: ThresholdPolicy::AtOrAbove,
            ..sphere_config(0.1)
        };

        assert!(evaluate(&projectile, &agent, 9.81, &config).fires());
    }

    #[test]
    fn test_contained_short_circuits() {
        let projectile = Kinematics::moving(Vec3::new(0.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 50.0));
        let agent = Kinematics::at(Vec3::ZERO);

        let verdict = evaluate(&projectile, &agent, 9.81, &sphere_config(0.0));
        assert_eq!(verdict, Verdict::Contained);
        assert_eq!(verdict.impact_time(), Some(0.0));
    }

    #[test]
    fn test_receding_is_miss() {
        let projectile = Kinematics::moving(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 10.0));
        let agent = Kinematics::at(Vec3::ZERO);

        let verdict = evaluate(&projectile, &agent, 9.81, &sphere_config(1.0));
        assert_eq!(verdict, Verdict::Miss);
        assert_eq!(verdict.impact_time(), None);
    }

    #[test]
    fn test_agent_horizontal_velocity_is_subtracted() {
        // Агент убегает с той же скоростью - сближения нет
        let projectile = Kinematics::moving(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -10.0));
        let agent = Kinematics::moving(Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(evaluate(&projectile, &agent, 9.81, &sphere_config(5.0)), Verdict::Miss);

        // Вертикальная скорость агента не учитывается
        let jumping = Kinematics::moving(Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
        assert!(evaluate(&projectile, &jumping, 9.81, &sphere_config(5.0)).fires());
    }

    #[test]
    fn test_cylinder_uses_environment_gravity_without_own_acceleration() {
        // Летит горизонтально над головой: без гравитации мимо, с гравитацией - в крышку
        let projectile = Kinematics::moving(Vec3::new(0.0, 4.0, 4.0), Vec3::new(0.0, 0.0, -4.0));
        let agent = Kinematics::at(Vec3::ZERO);
        let config = DeflectConfig {
            volume: VolumeModel::Cylinder,
            volume_radius: 2.0,
            volume_half_height: 3.0,
            latency_compensation: 5.0,
            ..Default::default()
        };

        assert_eq!(evaluate(&projectile, &agent, 0.0, &config), Verdict::Miss);
        assert!(evaluate(&projectile, &agent, 2.0, &config).fires());

        // Собственное ускорение projectile перекрывает гравитацию окружения
        let floating = projectile.with_acceleration(Vec3::ZERO);
        assert_eq!(evaluate(&floating, &agent, 2.0, &config), Verdict::Miss);
    }
}
