//! Обвязка проверки кругового обхода для хранилища "ключ-значение".
//!
//! Две задачи работают вокруг одного ограниченного канала: писатель
//! ([`Producer`]) сохраняет случайные пары "ключ-значение" во внешнем
//! хранилище и после успешной записи публикует их в канал; читатель
//! ([`Consumer`]) накапливает опубликованные пары и в моменты простоя
//! перечитывает случайную из них, сверяя полученное значение с исходным
//! байт в байт.
//!
//! Само хранилище является внешним участником. Его возможности описаны трейтами
//! модуля [`store`]; крейт поставляет реализацию в памяти процесса
//! ([`store::memory`]), на которой работают демонстрационный запуск и
//! тесты.

pub mod keygen;
pub use keygen::KeyGen;

pub mod store;

mod producer;
pub use producer::{Producer, ProducerReport};

mod consumer;
pub use consumer::{Consumer, ConsumerReport};

mod shutdown;

pub mod harness;

use std::time::Duration;

/// Пара "ключ-значение", сохраненная писателем.
///
/// Неизменяема после создания: читатель сверяет значение из хранилища
/// именно с тем, что было записано.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Название бакета, в котором хранятся проверяемые пары.
pub const DEFAULT_BUCKET: &str = "pool";

/// Длина генерируемого ключа.
pub const KEY_LEN: usize = 20;

/// Длина генерируемого значения.
pub const VALUE_LEN: usize = 5;

/// Емкость очереди ожидающих проверки пар. При заполнении писатель
/// приостанавливается, а не отбрасывает пары.
pub const QUEUE_DEPTH: usize = 10;

/// Пауза писателя между итерациями.
pub const STORE_PACE: Duration = Duration::from_millis(10);

/// Окно простоя читателя, после которого запускается проверка.
pub const IDLE_TIMEOUT: Duration = Duration::from_millis(10);

/// Ошибка, возвращаемая большинством функций.
///
/// Специализированный тип ошибки был бы избыточен: обвязка
/// останавливается только на ошибке подключения, все остальные ошибки
/// логируются на месте возникновения. `std::error::Error` реализуется
/// почти всеми типами ошибок, и этого достаточно.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Специализированный тип `Result` для операций обвязки.
pub type Result<T> = std::result::Result<T, Error>;
