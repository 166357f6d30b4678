//! Tuning + naming config (Resource, грузится из RON)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Форма защищаемого объёма вокруг root part агента
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeModel {
    /// Статическая сфера, гравитация внутри окна игнорируется
    Sphere,
    /// Вертикальный цилиндр (radius + half_height), учитывает гравитацию
    Cylinder,
}

/// Как сравнивать предсказанное время удара с latency compensation.
///
/// Два поколения логики использовали противоположные неравенства;
/// обе политики оставлены явными.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// Fire когда `t <= compensation` (удар не дальше окна задержки)
    AtOrBelow,
    /// Fire когда `t >= compensation` (откладываем до последнего момента)
    AtOrAbove,
}

impl ThresholdPolicy {
    pub fn admits(self, impact_time: f32, compensation: f32) -> bool {
        match self {
            ThresholdPolicy::AtOrBelow => impact_time <= compensation,
            ThresholdPolicy::AtOrAbove => impact_time >= compensation,
        }
    }
}

/// Какие projectiles decision loop рассматривает каждый тик
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetingMode {
    /// Только projectile, занимающий live-слот (максимум один)
    SingleLive,
    /// Все tracked projectiles с `live == true`
    AllLive,
}

/// Имена контейнеров, частей и атрибутов в дереве host-объектов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldNames {
    pub players_container: String,
    pub projectile_container: String,
    pub in_play_container: String,
    pub root_part: String,
    pub live_attribute: String,
    pub target_attribute: String,
    pub gravity_attribute: String,
}

impl Default for WorldNames {
    fn default() -> Self {
        Self {
            players_container: "Players".to_string(),
            projectile_container: "Projectiles".to_string(),
            in_play_container: "InPlay".to_string(),
            root_part: "Root".to_string(),
            live_attribute: "live".to_string(),
            target_attribute: "target".to_string(),
            gravity_attribute: "Gravity".to_string(),
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeflectConfig {
    pub volume: VolumeModel,
    /// Радиус объёма (world units)
    pub volume_radius: f32,
    /// Половина высоты цилиндра (только для `Cylinder`)
    pub volume_half_height: f32,
    /// Input + network latency (секунды)
    pub latency_compensation: f32,
    pub threshold_policy: ThresholdPolicy,
    pub targeting: TargetingMode,
    /// Множитель гравитации для projectiles без собственного ускорения
    pub gravity_scale: f32,
    /// Требовать присутствия агента в in-play контейнере
    pub require_in_play: bool,
    pub names: WorldNames,
}

impl Default for DeflectConfig {
    fn default() -> Self {
        Self {
            volume: VolumeModel::Cylinder,
            volume_radius: 4.0,
            volume_half_height: 3.0,
            latency_compensation: 0.25,
            threshold_policy: ThresholdPolicy::AtOrBelow,
            targeting: TargetingMode::SingleLive,
            gravity_scale: 1.0,
            require_in_play: false,
            names: WorldNames::default(),
        }
    }
}

impl DeflectConfig {
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }
}
