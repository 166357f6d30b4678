//! Error taxonomy ядра
//!
//! Всё, что не попало сюда, - штатный исход (нет цели, нет пересечения),
//! а не ошибка.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeflectError {
    /// Обязательный sub-object отсутствует (например, у character нет root part).
    /// Объект считается битым до конца жизни, повторных попыток нет.
    #[error("{owner}: required part `{part}` not found")]
    MissingPart { owner: String, part: String },

    /// Статически привязанный контейнер отсутствует на старте
    #[error("{parent}: container `{name}` not found")]
    MissingContainer { parent: String, name: String },

    /// Атрибут пришёл с типом, отличным от объявленного
    #[error("attribute `{attribute}`: expected {expected}, found {found}")]
    AttributeType {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Объект уже отслеживается компонентом того же типа
    #[error("{kind} `{instance}` is already tracked")]
    AlreadyTracked { kind: &'static str, instance: String },

    /// Вторая сессия в том же процессе
    #[error("deflect session is already running in this process")]
    AlreadyInitialized,

    #[error("invalid config: {0}")]
    Config(#[from] ron::error::SpannedError),
}

pub type Result<T> = std::result::Result<T, DeflectError>;
