//! Читатель: накапливает опубликованные пары и выборочно их проверяет.

use crate::shutdown::Shutdown;
use crate::store::{Bucket, ObjectHandle};
use crate::{KeyGen, KeyValue, IDLE_TIMEOUT};

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::{debug, error, info, instrument};

/// Задача проверки.
///
/// Читатель в цикле ожидает одно из двух событий: приход пары из
/// очереди или истечение окна простоя. Пришедшая пара добавляется в
/// буфер наблюдений. По простою из буфера выбирается случайная пара
/// (с возвращением: одна и та же пара может проверяться многократно),
/// ее ключ перечитывается из хранилища, и полученное значение
/// сравнивается с исходным байт в байт.
///
/// Буфер наблюдений только растет: для короткоживущей демонстрации
/// этого достаточно.
pub struct Consumer {
    /// Бакет, из которого перечитываются значения.
    bucket: Box<dyn Bucket>,

    /// Общий источник случайности.
    keygen: Arc<KeyGen>,

    /// Принимающая половина очереди ожидающих проверки пар.
    queue: mpsc::Receiver<KeyValue>,

    /// Слушатель сигнала останова.
    shutdown: Shutdown,

    /// Популяция для выборочных проверок.
    observed: Vec<KeyValue>,

    /// Счетчики исходов.
    report: ConsumerReport,
}

/// Итог работы читателя.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerReport {
    /// Пар принято из очереди.
    pub observed: u64,

    /// Проверок, завершившихся совпадением.
    pub verified: u64,

    /// Проверок, выявивших расхождение значений.
    pub mismatches: u64,

    /// Проверок, сорвавшихся из-за ошибки чтения.
    pub fetch_failures: u64,
}

impl Consumer {
    /// Создает читателя поверх бакета и очереди.
    pub fn new(
        bucket: Box<dyn Bucket>,
        keygen: Arc<KeyGen>,
        queue: mpsc::Receiver<KeyValue>,
        notify: broadcast::Receiver<()>,
    ) -> Consumer {
        Consumer {
            bucket,
            keygen,
            queue,
            shutdown: Shutdown::new(notify),
            observed: Vec::new(),
            report: ConsumerReport::default(),
        }
    }

    /// Запускает цикл проверки.
    ///
    /// Работает до получения сигнала останова или закрытия очереди
    /// писателем, после чего возвращает итог.
    pub async fn run(mut self) -> ConsumerReport {
        loop {
            tokio::select! {
                pair = self.queue.recv() => match pair {
                    Some(pair) => {
                        self.report.observed += 1;
                        self.observed.push(pair);
                    }
                    // Писатель уничтожил отправляющую половину.
                    None => break,
                },
                // Окно простоя отсчитывается заново после каждого события.
                _ = time::sleep(IDLE_TIMEOUT) => self.verify_one().await,
                _ = self.shutdown.recv() => break,
            }
        }

        debug!(report = ?self.report, "читатель остановлен");

        self.report
    }

    /// Перечитывает одну ранее наблюдавшуюся пару и сверяет значение.
    ///
    /// Любая ошибка чтения логируется и не прерывает цикл. Расхождение
    /// значений тоже не является исключением, это зафиксированный провал
    /// проверки: в лог попадают оба значения, полученное и ожидаемое.
    #[instrument(skip(self))]
    async fn verify_one(&mut self) {
        // Пустая популяция: выбирать не из чего, цикл пропускается.
        if self.observed.is_empty() {
            debug!("накопленных пар нет, проверка пропущена");
            return;
        }

        let pair = &self.observed[self.keygen.next_index(self.observed.len())];

        let fetched = match self.bucket.object(&pair.key).fetch().await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.report.fetch_failures += 1;
                error!(key = %pair.key, cause = %err, "ошибка чтения");
                return;
            }
        };

        // Читается только первая версия значения; объект без
        // содержимого проверить невозможно.
        let have = match fetched.contents.first() {
            Some(content) => &content.value,
            None => {
                self.report.fetch_failures += 1;
                error!(key = %pair.key, "объект без содержимого");
                return;
            }
        };

        if have.as_ref() != pair.value.as_bytes() {
            self.report.mismatches += 1;
            error!(
                key = %pair.key,
                have = %String::from_utf8_lossy(have),
                want = %pair.value,
                "расхождение значений"
            );
        } else {
            self.report.verified += 1;
            info!(key = %pair.key, value = %pair.value, "значение подтверждено");
        }
    }
}
