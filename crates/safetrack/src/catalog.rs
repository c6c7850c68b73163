//! Fixed choice lists offered by the inspection forms.
//!
//! The repositories do not restrict free-text fields to these lists; they
//! exist for the form layer and for the one derived value, `kpb_detected`.

/// KPB ("ключевые правила безопасности") categories that count as a detected
/// violation. Anything else, including "Нет", does not.
pub const KPB_AFFIRMATIVE: [&str; 4] = [
    "Нет алкоголю и наркотикам",
    "Сообщай о происшествиях",
    "Получи допуск",
    "Защити себя от падения",
];

/// The "no KPB violation" choice.
pub const KPB_NONE: &str = "Нет";

/// All KPB choices in form order.
pub const KPB_CHOICES: [&str; 5] = [
    KPB_NONE,
    "Нет алкоголю и наркотикам",
    "Сообщай о происшествиях",
    "Получи допуск",
    "Защити себя от падения",
];

/// Derives `kpb_detected` from a `kpb_violation` value. Exact match only.
pub fn kpb_detected(kpb_violation: &str) -> bool {
    KPB_AFFIRMATIVE.contains(&kpb_violation)
}

pub const RISK_LEVELS: [&str; 3] = ["высокий", "средний", "низкий"];

pub const ELIMINATION_STATUSES: [&str; 2] = ["не устранено", "устранено"];

pub const VIOLATION_TYPES: [&str; 11] = [
    "Работы на высоте",
    "Огневые работы/Пожарная безопасность",
    "Грузоподъёмные работы/Работа с ПС",
    "Электробезопасность",
    "Работы в газоопасн. местах/замкнутом простр-ве",
    "Земляные работы",
    "Документы/Допуски и удостоверения",
    "Исправность инструментов и приспособлений",
    "Применение/Исправность СИЗ",
    "Содержание территории/рабочих мест",
    "Безопасность дорожного движения",
];

/// Extra violation type available on site checks only.
pub const NO_VIOLATIONS_FOUND: &str = "Нарушений не выявлено";

pub const VIOLATION_CATEGORIES: [&str; 6] = [
    "Применение СИЗ",
    "Обучение и аттестации",
    "ППР",
    "Леса",
    "Анкерные линии",
    "Другое",
];
