use tokio::sync::broadcast;

/// Следит за сигналом останова.
///
/// Сигнал рассылается через `broadcast`-канал: отправляется не более
/// одного значения, а уничтожение отправляющей половины равносильно
/// отправке. Каждая задача обвязки держит собственный экземпляр
/// `Shutdown` и опрашивает его в точках приостановки, поэтому бесконечные
/// циклы писателя и читателя завершаются кооперативно.
#[derive(Debug)]
pub(crate) struct Shutdown {
    /// `true`, если сигнал останова уже получен.
    received: bool,

    /// Подписка на канал оповещения об останове.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Создает `Shutdown` поверх переданной подписки.
    pub(crate) fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            received: false,
            notify,
        }
    }

    /// Возвращает `true`, если сигнал останова уже получен.
    pub(crate) fn is_received(&self) -> bool {
        self.received
    }

    /// Ждет сигнал останова.
    pub(crate) async fn recv(&mut self) {
        // Повторный вызов после полученного сигнала возвращается сразу.
        if self.received {
            return;
        }

        // И значение, и закрытие канала означают останов.
        let _ = self.notify.recv().await;

        self.received = true;
    }
}
