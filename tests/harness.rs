use kv_verify::store::memory::MemoryCluster;
use kv_verify::store::Session;
use kv_verify::{harness, Consumer, KeyGen, KeyValue, Producer, QUEUE_DEPTH};

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Duration};

async fn cluster() -> MemoryCluster {
    let addrs = vec!["127.0.0.1:8083".to_string()];
    MemoryCluster::dial(&addrs, 1).await.unwrap()
}

/// Писатель публикует пару только после успешной записи: к моменту
/// появления пары в очереди значение уже лежит в хранилище.
#[tokio::test(start_paused = true)]
async fn producer_publishes_only_stored_pairs() {
    let cluster = cluster().await;
    let session = cluster.session();

    let (tx, mut rx) = mpsc::channel(QUEUE_DEPTH);
    let (notify, _) = broadcast::channel(1);

    let producer = Producer::new(
        session.bucket("pool"),
        Arc::new(KeyGen::seeded(1)),
        tx,
        notify.subscribe(),
    );
    let handle = tokio::spawn(producer.run());

    let pair = rx.recv().await.unwrap();
    assert_eq!(pair.key.len(), 20);
    assert_eq!(pair.value.len(), 5);
    assert_eq!(
        cluster.get("pool", &pair.key).unwrap(),
        pair.value.as_bytes()
    );

    drop(notify);
    let report = handle.await.unwrap();
    assert!(report.stored >= 1);
    assert_eq!(report.store_failures, 0);
}

/// Проваленная запись логируется, и пара не публикуется: читатель
/// никогда не попытается проверить этот ключ.
#[tokio::test(start_paused = true)]
async fn failed_store_is_never_published() {
    let cluster = cluster().await;
    let session = cluster.session();
    cluster.fail_stores(1);

    let (tx, mut rx) = mpsc::channel(QUEUE_DEPTH);
    let (notify, _) = broadcast::channel(1);

    let producer = Producer::new(
        session.bucket("pool"),
        Arc::new(KeyGen::seeded(2)),
        tx,
        notify.subscribe(),
    );
    let handle = tokio::spawn(producer.run());

    // Первая пришедшая пара приходит со второй итерации: первая запись
    // провалилась, и в хранилище ровно один объект.
    let pair = rx.recv().await.unwrap();
    assert_eq!(cluster.len(), 1);
    assert_eq!(
        cluster.get("pool", &pair.key).unwrap(),
        pair.value.as_bytes()
    );

    drop(notify);
    let report = handle.await.unwrap();
    assert_eq!(report.store_failures, 1);
}

/// Очередь держит не более десяти непотребленных пар; одиннадцатая
/// запись проходит, но ее отправка блокирует писателя.
#[tokio::test(start_paused = true)]
async fn full_queue_stalls_producer() {
    let cluster = cluster().await;
    let session = cluster.session();

    let (tx, mut rx) = mpsc::channel(QUEUE_DEPTH);
    let (notify, _) = broadcast::channel(1);

    let producer = Producer::new(
        session.bucket("pool"),
        Arc::new(KeyGen::seeded(3)),
        tx,
        notify.subscribe(),
    );
    let handle = tokio::spawn(producer.run());

    // Никто не читает очередь. Даем писателю виртуальное время с
    // запасом: он должен остановиться, а не продолжать писать.
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(cluster.len(), QUEUE_DEPTH + 1);

    drop(notify);
    let report = handle.await.unwrap();
    assert_eq!(report.stored, (QUEUE_DEPTH + 1) as u64);

    // В очереди ровно десять пар: одиннадцатая так и не была отправлена.
    let mut drained = 0;
    while rx.try_recv().is_ok() {
        drained += 1;
    }
    assert_eq!(drained, QUEUE_DEPTH);
}

/// Таймер простоя на пустом буфере не приводит ни к панике, ни к
/// ложным проверкам.
#[tokio::test(start_paused = true)]
async fn idle_timeout_with_empty_buffer_is_harmless() {
    let cluster = cluster().await;
    let session = cluster.session();

    // Отправляющая половина удерживается, чтобы очередь оставалась
    // открытой, но пустой.
    let (_tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let (notify, _) = broadcast::channel(1);

    let consumer = Consumer::new(
        session.bucket("pool"),
        Arc::new(KeyGen::seeded(4)),
        rx,
        notify.subscribe(),
    );
    let handle = tokio::spawn(consumer.run());

    // Десяток пустых окон простоя.
    time::sleep(Duration::from_millis(100)).await;

    drop(notify);
    let report = handle.await.unwrap();
    assert_eq!(report.observed, 0);
    assert_eq!(report.verified, 0);
    assert_eq!(report.mismatches, 0);
    assert_eq!(report.fetch_failures, 0);
}

/// Ошибка чтения при проверке не фатальна: розыгрыш пропускается, а
/// последующее чтение того же ключа проходит.
#[tokio::test(start_paused = true)]
async fn fetch_failure_skips_one_draw() {
    let cluster = cluster().await;
    let session = cluster.session();

    let pair = KeyValue {
        key: "AAAAAAAAAAAAAAAAAAAA".to_string(),
        value: "bbbbb".to_string(),
    };
    cluster.insert("pool", &pair.key, Bytes::from(pair.value.clone()));
    cluster.fail_fetches(1);

    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let (notify, _) = broadcast::channel(1);

    let consumer = Consumer::new(
        session.bucket("pool"),
        Arc::new(KeyGen::seeded(5)),
        rx,
        notify.subscribe(),
    );
    let handle = tokio::spawn(consumer.run());

    tx.send(pair).await.unwrap();
    time::sleep(Duration::from_millis(200)).await;

    drop(notify);
    let report = handle.await.unwrap();
    assert_eq!(report.observed, 1);
    assert_eq!(report.fetch_failures, 1);
    assert!(report.verified >= 1);
    assert_eq!(report.mismatches, 0);
}

/// Перезапись значения за спиной читателя фиксируется как расхождение,
/// но не прерывает работу.
#[tokio::test(start_paused = true)]
async fn mismatch_is_counted_not_fatal() {
    let cluster = cluster().await;
    let session = cluster.session();

    let pair = KeyValue {
        key: "AAAAAAAAAAAAAAAAAAAA".to_string(),
        value: "bbbbb".to_string(),
    };
    cluster.insert("pool", &pair.key, Bytes::from("zzzzz"));

    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let (notify, _) = broadcast::channel(1);

    let consumer = Consumer::new(
        session.bucket("pool"),
        Arc::new(KeyGen::seeded(6)),
        rx,
        notify.subscribe(),
    );
    let handle = tokio::spawn(consumer.run());

    tx.send(pair).await.unwrap();
    time::sleep(Duration::from_millis(100)).await;

    drop(notify);
    let report = handle.await.unwrap();
    assert!(report.mismatches >= 1);
    assert_eq!(report.verified, 0);
}

/// Круговой обход целиком: писатель и читатель работают вместе, все
/// проверки сходятся.
#[tokio::test(start_paused = true)]
async fn round_trip_verifies_without_mismatches() {
    let cluster = cluster().await;
    let session = cluster.session();

    let summary = harness::run(
        &session,
        "pool",
        Arc::new(KeyGen::new()),
        time::sleep(Duration::from_secs(2)),
    )
    .await
    .unwrap();

    assert!(summary.producer.stored > 0);
    assert_eq!(summary.producer.store_failures, 0);
    assert!(summary.consumer.observed > 0);
    assert!(summary.consumer.verified > 0);
    assert_eq!(summary.consumer.mismatches, 0);
    assert_eq!(summary.consumer.fetch_failures, 0);
}
