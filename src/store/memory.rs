//! Хранилище в памяти процесса.
//!
//! Заменяет настоящий кластер в демонстрационном запуске и тестах:
//! ни протокола, ни пула соединений, ни устойчивости здесь нет, только
//! таблица под мьютексом. Для тестов восстановимых путей предусмотрен
//! ввод отказов: следующие `n` операций записи или чтения завершатся
//! ошибкой.

use crate::store::{
    Bucket, Content, DialError, FetchError, Fetched, ObjectHandle, Session, StoreError,
};

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Состояние, разделяемое кластером, сессиями и обработчиками.
#[derive(Debug)]
struct Shared {
    /// Объекты, индексированные парой (бакет, ключ).
    entries: Mutex<HashMap<(String, String), Bytes>>,

    /// Сколько ближайших записей должно провалиться.
    store_failures: AtomicUsize,

    /// Сколько ближайших чтений должно провалиться.
    fetch_failures: AtomicUsize,
}

/// Кластер в памяти процесса.
///
/// # Примеры
///
/// ```
/// use kv_verify::store::memory::MemoryCluster;
/// use kv_verify::store::{Bucket, ObjectHandle, Session};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let addrs = vec!["127.0.0.1:8083".to_string()];
///     let cluster = MemoryCluster::dial(&addrs, 1).await.unwrap();
///
///     let session = cluster.session();
///     let bucket = session.bucket("pool");
///
///     let object = bucket.object("hello");
///     object.store(Bytes::from("world")).await.unwrap();
///
///     let fetched = object.fetch().await.unwrap();
///     assert_eq!(fetched.contents[0].value, "world");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCluster {
    shared: Arc<Shared>,
}

/// Сессия кластера в памяти. Освобождается при уничтожении.
#[derive(Debug)]
pub struct MemorySession {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct MemoryBucket {
    name: String,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct MemoryObject {
    bucket: String,
    key: String,
    shared: Arc<Shared>,
}

impl MemoryCluster {
    /// "Подключается" к кластеру.
    ///
    /// Сетевых узлов нет, но контракт подключения сохранен: пустой
    /// список адресов или нулевое количество соединений на узел дают
    /// ошибку [`DialError`].
    pub async fn dial(
        addrs: &[String],
        connections_per_node: usize,
    ) -> Result<MemoryCluster, DialError> {
        if addrs.is_empty() {
            return Err(DialError::NoNodes);
        }

        if connections_per_node == 0 {
            return Err(DialError::NoConnections);
        }

        debug!(
            nodes = addrs.len(),
            connections_per_node, "подключение к хранилищу в памяти"
        );

        Ok(MemoryCluster {
            shared: Arc::new(Shared {
                entries: Mutex::new(HashMap::new()),
                store_failures: AtomicUsize::new(0),
                fetch_failures: AtomicUsize::new(0),
            }),
        })
    }

    /// Открывает сессию для работы с хранилищем.
    pub fn session(&self) -> MemorySession {
        MemorySession {
            shared: self.shared.clone(),
        }
    }

    /// Количество сохраненных объектов.
    pub fn len(&self) -> usize {
        self.shared.entries.lock().unwrap().len()
    }

    /// Проверяет, что хранилище пусто.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Читает значение напрямую, минуя сессию и обработчики.
    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.shared
            .entries
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Записывает значение напрямую, минуя сессию и обработчики.
    ///
    /// Тесты используют это для перезаписи объекта "за спиной"
    /// читателя.
    pub fn insert(&self, bucket: &str, key: &str, value: Bytes) {
        self.shared
            .entries
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), value);
    }

    /// Следующие `n` записей завершатся ошибкой [`StoreError`].
    pub fn fail_stores(&self, n: usize) {
        self.shared.store_failures.store(n, Ordering::SeqCst);
    }

    /// Следующие `n` чтений завершатся ошибкой [`FetchError`].
    pub fn fail_fetches(&self, n: usize) {
        self.shared.fetch_failures.store(n, Ordering::SeqCst);
    }
}

impl Session for MemorySession {
    fn bucket(&self, name: &str) -> Box<dyn Bucket> {
        Box::new(MemoryBucket {
            name: name.to_string(),
            shared: self.shared.clone(),
        })
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        debug!("сессия освобождена");
    }
}

impl Bucket for MemoryBucket {
    fn object(&self, key: &str) -> Box<dyn ObjectHandle> {
        Box::new(MemoryObject {
            bucket: self.name.clone(),
            key: key.to_string(),
            shared: self.shared.clone(),
        })
    }
}

#[async_trait]
impl ObjectHandle for MemoryObject {
    async fn store(&self, value: Bytes) -> Result<(), StoreError> {
        if take_failure(&self.shared.store_failures) {
            return Err(StoreError::Unavailable("введен отказ записи".to_string()));
        }

        self.shared
            .entries
            .lock()
            .unwrap()
            .insert((self.bucket.clone(), self.key.clone()), value);

        Ok(())
    }

    async fn fetch(&self) -> Result<Fetched, FetchError> {
        if take_failure(&self.shared.fetch_failures) {
            return Err(FetchError::Unavailable("введен отказ чтения".to_string()));
        }

        let entries = self.shared.entries.lock().unwrap();

        match entries.get(&(self.bucket.clone(), self.key.clone())) {
            Some(value) => Ok(Fetched {
                contents: vec![Content {
                    value: value.clone(),
                }],
            }),
            None => Err(FetchError::NotFound(self.key.clone())),
        }
    }
}

/// Атомарно списывает один введенный отказ, если они остались.
fn take_failure(remaining: &AtomicUsize) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
