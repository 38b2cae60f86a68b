//! Сборка и запуск обвязки проверки.

use crate::store::Session;
use crate::{Consumer, ConsumerReport, KeyGen, Producer, ProducerReport, QUEUE_DEPTH};

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

/// Сводка по завершенному запуску.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub producer: ProducerReport,
    pub consumer: ConsumerReport,
}

/// Запускает писателя и читателя и работает до завершения `shutdown`.
///
/// Писатель и читатель получают по обработчику бакета `bucket` и общий
/// источник случайности. Между ними создается ограниченная очередь
/// пар, ожидающих проверки. Когда будущее `shutdown` завершается
/// (обычно это `ctrl_c`), обе задачи кооперативно останавливаются, и
/// их итоги возвращаются одной сводкой.
///
/// # Примеры
///
/// ```no_run
/// use kv_verify::harness;
/// use kv_verify::store::memory::MemoryCluster;
/// use kv_verify::KeyGen;
/// use std::sync::Arc;
/// use tokio::signal;
///
/// #[tokio::main]
/// async fn main() -> kv_verify::Result<()> {
///     let addrs = vec!["127.0.0.1:8083".to_string()];
///     let cluster = MemoryCluster::dial(&addrs, 1).await?;
///     let session = cluster.session();
///
///     let summary =
///         harness::run(&session, "pool", Arc::new(KeyGen::new()), signal::ctrl_c()).await?;
///     println!("{:?}", summary);
///
///     Ok(())
/// }
/// ```
pub async fn run(
    session: &dyn Session,
    bucket: &str,
    keygen: Arc<KeyGen>,
    shutdown: impl Future,
) -> crate::Result<Summary> {
    // Очередь ограничена: при заполнении писатель приостанавливается,
    // а не отбрасывает пары.
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);

    // Канал оповещения об останове. Каждая задача держит свою подписку.
    let (notify_shutdown, _) = broadcast::channel(1);

    let producer = Producer::new(
        session.bucket(bucket),
        keygen.clone(),
        tx,
        notify_shutdown.subscribe(),
    );
    let consumer = Consumer::new(
        session.bucket(bucket),
        keygen,
        rx,
        notify_shutdown.subscribe(),
    );

    let producer = tokio::spawn(producer.run());
    let consumer = tokio::spawn(consumer.run());

    shutdown.await;
    info!("получен сигнал останова");

    // Уничтожение отправителя оповещает обе задачи.
    drop(notify_shutdown);

    let summary = Summary {
        producer: producer.await?,
        consumer: consumer.await?,
    };

    info!(?summary, "запуск завершен");

    Ok(summary)
}
