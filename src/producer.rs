//! Писатель: генерирует пары "ключ-значение" и сохраняет их в хранилище.

use crate::shutdown::Shutdown;
use crate::store::{Bucket, ObjectHandle};
use crate::{KeyGen, KeyValue, KEY_LEN, STORE_PACE, VALUE_LEN};

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::{debug, error, info};

/// Задача записи.
///
/// На каждой итерации генерирует ключ и значение, сохраняет значение в
/// бакете и после успешной записи публикует пару в очередь проверки.
/// Неудачная запись логируется, и пара не публикуется: проверять нечего,
/// раз значение могло не попасть в хранилище. Если очередь заполнена,
/// отправка блокируется, пока читатель не освободит место.
pub struct Producer {
    /// Бакет, в который пишутся значения.
    bucket: Box<dyn Bucket>,

    /// Общий источник случайности.
    keygen: Arc<KeyGen>,

    /// Отправляющая половина очереди ожидающих проверки пар.
    queue: mpsc::Sender<KeyValue>,

    /// Слушатель сигнала останова.
    shutdown: Shutdown,

    /// Количество успешно сохраненных пар.
    stored: u64,

    /// Количество проваленных записей.
    store_failures: u64,
}

/// Итог работы писателя.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    pub stored: u64,
    pub store_failures: u64,
}

impl Producer {
    /// Создает писателя поверх бакета и очереди.
    pub fn new(
        bucket: Box<dyn Bucket>,
        keygen: Arc<KeyGen>,
        queue: mpsc::Sender<KeyValue>,
        notify: broadcast::Receiver<()>,
    ) -> Producer {
        Producer {
            bucket,
            keygen,
            queue,
            shutdown: Shutdown::new(notify),
            stored: 0,
            store_failures: 0,
        }
    }

    /// Запускает цикл записи.
    ///
    /// Работает до получения сигнала останова или закрытия очереди
    /// читателем, после чего возвращает итог.
    pub async fn run(mut self) -> ProducerReport {
        while !self.shutdown.is_received() {
            let key = self.keygen.next_string(KEY_LEN);
            let value = self.keygen.next_string(VALUE_LEN);

            match self.bucket.object(&key).store(Bytes::from(value.clone())).await {
                Ok(()) => {
                    self.stored += 1;
                    info!(%key, %value, "значение сохранено");

                    // Публикация строго после успешной записи. Заполненная
                    // очередь приостанавливает писателя, пары не теряются.
                    let pair = KeyValue { key, value };
                    tokio::select! {
                        res = self.queue.send(pair) => {
                            if res.is_err() {
                                // Читатель уничтожил принимающую половину.
                                debug!("очередь закрыта");
                                break;
                            }
                        }
                        _ = self.shutdown.recv() => break,
                    }
                }
                Err(err) => {
                    // Пара навсегда остается непроверяемой.
                    self.store_failures += 1;
                    error!(%key, cause = %err, "ошибка записи");
                }
            }

            // Пауза между итерациями.
            tokio::select! {
                _ = time::sleep(STORE_PACE) => {}
                _ = self.shutdown.recv() => break,
            }
        }

        let report = ProducerReport {
            stored: self.stored,
            store_failures: self.store_failures,
        };

        debug!(?report, "писатель остановлен");

        report
    }
}
