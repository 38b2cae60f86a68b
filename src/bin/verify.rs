//! Демонстрационный запуск обвязки проверки.
//!
//! Этот файл представляет собой входную точку программы. Здесь
//! выполняется разбор командной строки, подключение к хранилищу и
//! передача управления в `kv_verify::harness`.
//!
//! Для разбора командной строки используется крейт `clap`.
//!
//! Команда для запуска:
//!
//!     cargo run --bin kv-verify
//!
//! Программа работает до нажатия `Ctrl-C`, после чего в лог попадает
//! сводка по запуску.

use kv_verify::store::memory::MemoryCluster;
use kv_verify::{harness, KeyGen, DEFAULT_BUCKET};

use clap::Parser;
use std::sync::Arc;
use tokio::signal;

#[derive(Parser, Debug)]
#[clap(
    name = "kv-verify",
    version,
    author,
    about = "Проверка кругового обхода хранилища ключ-значение"
)]
struct Cli {
    /// Адреса узлов кластера, через запятую.
    #[clap(long, default_value = "127.0.0.1:8083", value_delimiter = ',')]
    addr: Vec<String>,

    /// Количество соединений на узел.
    #[clap(long, default_value_t = 1)]
    connections: usize,

    /// Название бакета.
    #[clap(long, default_value = DEFAULT_BUCKET)]
    bucket: String,
}

#[tokio::main]
pub async fn main() -> kv_verify::Result<()> {
    set_up_logging()?;

    let cli = Cli::parse();

    // Недоступность кластера фатальна: процесс завершается на старте.
    let cluster = MemoryCluster::dial(&cli.addr, cli.connections).await?;

    // Сессия освобождается при выходе из `main`.
    let session = cluster.session();

    harness::run(
        &session,
        &cli.bucket,
        Arc::new(KeyGen::new()),
        signal::ctrl_c(),
    )
    .await?;

    Ok(())
}

fn set_up_logging() -> kv_verify::Result<()> {
    // См. https://docs.rs/tracing
    tracing_subscriber::fmt::try_init()
}
