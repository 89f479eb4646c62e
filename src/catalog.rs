//! Canned replies grouped by intent category.
//!
//! Selection goes through a [`Selector`] so tests can pin the choice while the
//! runtime draws uniformly at random (with replacement).

use crate::lock_or_recover;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCategory {
    Greeting,
    Status,
    WifiOn,
    WifiOff,
    SoundOn,
    SoundOff,
    FlashlightOn,
    FlashlightOff,
    Unknown,
    Witty,
}

impl ResponseCategory {
    pub const ALL: [ResponseCategory; 10] = [
        ResponseCategory::Greeting,
        ResponseCategory::Status,
        ResponseCategory::WifiOn,
        ResponseCategory::WifiOff,
        ResponseCategory::SoundOn,
        ResponseCategory::SoundOff,
        ResponseCategory::FlashlightOn,
        ResponseCategory::FlashlightOff,
        ResponseCategory::Unknown,
        ResponseCategory::Witty,
    ];

    /// Built-in reply set. Every set is non-empty.
    pub fn replies(self) -> &'static [&'static str] {
        match self {
            ResponseCategory::Greeting => GREETING,
            ResponseCategory::Status => STATUS,
            ResponseCategory::WifiOn => WIFI_ON,
            ResponseCategory::WifiOff => WIFI_OFF,
            ResponseCategory::SoundOn => SOUND_ON,
            ResponseCategory::SoundOff => SOUND_OFF,
            ResponseCategory::FlashlightOn => FLASHLIGHT_ON,
            ResponseCategory::FlashlightOff => FLASHLIGHT_OFF,
            ResponseCategory::Unknown => UNKNOWN,
            ResponseCategory::Witty => WITTY,
        }
    }
}

const GREETING: &[&str] = &[
    "Приветствую, господин! Чем могу служить?",
    "Здравствуйте, господин. Системы в норме, жду указаний.",
    "О, вы вернулись! Я почти соскучился.",
    "Добрый день, господин. Джарвис к вашим услугам.",
];

const STATUS: &[&str] = &[
    "Все системы работают в штатном режиме, господин.",
    "Лучше не бывает, особенно когда вы рядом.",
    "Процессор холодный, настроение тёплое. А у вас?",
    "Работаю без сбоев, чего и вам желаю.",
];

const WIFI_ON: &[&str] = &[
    "Wi-Fi включён, господин. Интернет снова ваш.",
    "Сеть подключена. Можете продолжать листать котиков.",
    "Wi-Fi активирован, господин!",
];

const WIFI_OFF: &[&str] = &[
    "Wi-Fi выключен, господин. Наслаждайтесь тишиной.",
    "Сеть отключена. Время пожить офлайн.",
    "Wi-Fi деактивирован, господин!",
];

const SOUND_ON: &[&str] = &[
    "Звук включён, господин. Теперь вы всё услышите.",
    "Громкость восстановлена, господин!",
    "Звук снова с нами.",
];

const SOUND_OFF: &[&str] = &[
    "Перевёл в режим вибрации, господин.",
    "Тишина установлена. Никто не помешает.",
    "Звук выключен, господин!",
];

const FLASHLIGHT_ON: &[&str] = &[
    "Фонарик включён, господин. Да будет свет!",
    "Свет включён, тьма отступает.",
];

const FLASHLIGHT_OFF: &[&str] = &[
    "Фонарик выключен, господин.",
    "Свет погашен. Экономим батарею.",
];

const UNKNOWN: &[&str] = &[
    "Простите, господин, я не понял команду.",
    "Эта команда мне пока не по силам.",
    "Не расслышал, господин. Повторите, пожалуйста.",
    "Я всего лишь ассистент, а не волшебник. Попробуйте иначе.",
];

const WITTY: &[&str] = &[
    "Кстати, я умнее, чем кажусь.",
    "Не благодарите, это моя работа.",
    "Ещё немного, и я попрошу зарплату.",
    "Я бы закатил глаза, если бы они у меня были.",
    "Записываю это в список ваших гениальных идей.",
];

/// Source of indices into a non-empty reply set.
pub trait Selector: Send {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// Uniform random choice backed by a seedable RNG.
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Selector for RandomSelector {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Cycles through a fixed list of indices (wrapping each into range).
#[derive(Debug, Clone)]
pub struct SequenceSelector {
    indices: Vec<usize>,
    cursor: usize,
}

impl SequenceSelector {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices, cursor: 0 }
    }

    /// Always picks the first entry.
    pub fn first() -> Self {
        Self::new(vec![0])
    }
}

impl Selector for SequenceSelector {
    fn pick_index(&mut self, len: usize) -> usize {
        if self.indices.is_empty() {
            return 0;
        }
        let raw = self.indices[self.cursor % self.indices.len()];
        self.cursor = self.cursor.wrapping_add(1);
        raw % len
    }
}

pub struct ResponseCatalog {
    selector: Mutex<Box<dyn Selector>>,
}

impl ResponseCatalog {
    pub fn new(selector: Box<dyn Selector>) -> Self {
        Self {
            selector: Mutex::new(selector),
        }
    }

    pub fn random() -> Self {
        Self::new(Box::new(RandomSelector::from_entropy()))
    }

    pub fn pick(&self, category: ResponseCategory) -> String {
        let replies = category.replies();
        let index =
            lock_or_recover(&self.selector, "ResponseCatalog::pick").pick_index(replies.len());
        replies[index.min(replies.len() - 1)].to_string()
    }

    pub fn contains(category: ResponseCategory, text: &str) -> bool {
        category.replies().contains(&text)
    }
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        Self::random()
    }
}
