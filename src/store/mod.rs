//! Абстракция драйвера внешнего хранилища "ключ-значение".
//!
//! Обвязка не реализует протокол кластера, пул соединений или
//! управление сессиями: все это принадлежит библиотеке драйвера.
//! Здесь описан только необходимый ей набор возможностей: сессия выдает
//! обработчики бакетов, бакет выдает обработчики объектов, объект
//! сохраняется и читается. Трейты объектно-безопасны, поэтому обвязка
//! работает с любой реализацией через `Box<dyn ...>`.
//!
//! Реализация в памяти процесса находится в модуле [`memory`].

pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// Сессия для выполнения операций против хранилища.
///
/// Сессия ограничена областью видимости: освобождение происходит при
/// уничтожении значения.
pub trait Session: Send + Sync {
    /// Возвращает обработчик бакета с названием `name`.
    fn bucket(&self, name: &str) -> Box<dyn Bucket>;
}

/// Пространство имен, группирующее объекты по ключам.
pub trait Bucket: Send + Sync {
    /// Возвращает обработчик объекта с ключом `key` в этом бакете.
    fn object(&self, key: &str) -> Box<dyn ObjectHandle>;
}

/// Адресуемая единица хранения: объект с ключом внутри бакета.
#[async_trait]
pub trait ObjectHandle: Send + Sync {
    /// Сохраняет `value` под ключом объекта.
    async fn store(&self, value: Bytes) -> Result<(), StoreError>;

    /// Читает объект из хранилища.
    async fn fetch(&self) -> Result<Fetched, FetchError>;
}

/// Прочитанный объект.
///
/// Хранилище может вернуть несколько конкурентно записанных версий
/// значения. Обвязка читает только первую; разрешение конфликтов
/// версий не поддерживается.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub contents: Vec<Content>,
}

/// Одна из версий значения объекта.
#[derive(Debug, Clone)]
pub struct Content {
    pub value: Bytes,
}

/// Ошибка подключения к кластеру. Фатальна: без соединения обвязке
/// нечего проверять, процесс завершается на старте.
#[derive(Debug)]
pub enum DialError {
    /// Список адресов узлов пуст.
    NoNodes,

    /// Количество соединений на узел равно нулю.
    NoConnections,

    /// Ни один из перечисленных узлов недоступен.
    Unreachable(String),
}

/// Ошибка записи значения. Восстановимая: пара логируется и не
/// публикуется для проверки.
#[derive(Debug)]
pub enum StoreError {
    /// Хранилище не приняло запись.
    Unavailable(String),
}

/// Ошибка чтения объекта. Восстановимая: проверка этого розыгрыша
/// пропускается.
#[derive(Debug)]
pub enum FetchError {
    /// Объект с таким ключом отсутствует.
    NotFound(String),

    /// Хранилище не ответило на чтение.
    Unavailable(String),
}

impl fmt::Display for DialError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialError::NoNodes => "Не указан ни один узел кластера.".fmt(fmt),
            DialError::NoConnections => {
                "Количество соединений на узел должно быть больше нуля.".fmt(fmt)
            }
            DialError::Unreachable(msg) => write!(fmt, "Все узлы недоступны: {}", msg),
        }
    }
}

impl std::error::Error for DialError {}

impl fmt::Display for StoreError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(fmt, "Запись отклонена: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl fmt::Display for FetchError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound(key) => write!(fmt, "Объект `{}` не найден.", key),
            FetchError::Unavailable(msg) => write!(fmt, "Чтение не удалось: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}
