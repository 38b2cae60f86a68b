//! Генератор случайных ключей и значений.
//!
//! Один экземпляр [`KeyGen`] разделяется между писателем и читателем.
//! Внутреннее состояние генератора защищено мьютексом, поэтому
//! конкурентные обращения из нескольких задач безопасны.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Алфавит из 52 латинских букв в верхнем и нижнем регистрах.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Источник случайности для генерации ключей и выборки пар.
///
/// Создается явно и передается по ссылке, а не прячется в глобальном
/// состоянии. Генератор не криптографический: воспроизводимость и
/// непредсказуемость не являются целями.
///
/// # Примеры
///
/// ```
/// use kv_verify::keygen::KeyGen;
///
/// let keygen = KeyGen::new();
/// let key = keygen.next_string(20);
/// assert_eq!(key.len(), 20);
/// ```
#[derive(Debug)]
pub struct KeyGen {
    rng: Mutex<StdRng>,
}

impl KeyGen {
    /// Создает генератор, засеянный энтропией операционной системы.
    pub fn new() -> KeyGen {
        KeyGen {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Создает генератор с фиксированным зерном.
    ///
    /// Выдает одну и ту же последовательность для одного и того же
    /// зерна, что делает тесты детерминированными.
    pub fn seeded(seed: u64) -> KeyGen {
        KeyGen {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Возвращает строку длиной ровно `len` символов.
    ///
    /// Каждый символ выбирается из [`ALPHABET`] независимо и равномерно,
    /// с возвращением.
    pub fn next_string(&self, len: usize) -> String {
        let mut rng = self.rng.lock().unwrap();

        (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Возвращает равномерно распределенный индекс из `0..n`.
    ///
    /// # Паника
    ///
    /// Паникует, если `n` равно нулю: пустая популяция не допускает
    /// выборки, вызывающая сторона обязана проверить это заранее.
    pub fn next_index(&self, n: usize) -> usize {
        assert!(n > 0, "Выборка из пустой популяции!");

        self.rng.lock().unwrap().gen_range(0..n)
    }
}

impl Default for KeyGen {
    fn default() -> KeyGen {
        KeyGen::new()
    }
}
