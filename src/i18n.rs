use actix_web::HttpRequest;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

pub fn detect_locale(req: &HttpRequest) -> Locale {
    if let Some(lang) = req.query_string().split('&').find_map(|kv| {
        let mut it = kv.splitn(2, '=');
        let k = it.next()?;
        let v = it.next()?;
        if k == "lang" { Some(v) } else { None }
    }) {
        return match lang.to_ascii_lowercase().as_str() { "ru" | "ru-ru" => Locale::Ru, _ => Locale::En };
    }

    if let Some(h) = req.headers().get("Accept-Language").and_then(|v| v.to_str().ok()) {
        let hl = h.to_ascii_lowercase();
        if hl.starts_with("ru") { return Locale::Ru; }
    }

    Locale::En
}

/// User-facing messages that carry a translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    InvalidInput,
    Required,
    NotNull,
    InvalidInteger,
    MinValue(i64),
    MaxValue(i64),
    InvalidChoice(String),
    InvalidString,
    Blank,
    MaxLength(usize),
    InvalidBoolean,
    DoesNotExist(String),
    AlreadyExists,
    ExpectedObject,
    ColivingNotFound,
    UserNotFound,
}

impl Message {
    pub fn render(&self, locale: Locale) -> String {
        match (locale, self) {
            (Locale::Ru, Message::InvalidInput) => "Некорректные данные".to_string(),
            (Locale::En, Message::InvalidInput) => "Invalid input".to_string(),
            (Locale::Ru, Message::Required) => "Обязательное поле.".to_string(),
            (Locale::En, Message::Required) => "This field is required.".to_string(),
            (Locale::Ru, Message::NotNull) => "Это поле не может быть null.".to_string(),
            (Locale::En, Message::NotNull) => "This field may not be null.".to_string(),
            (Locale::Ru, Message::InvalidInteger) => "Введите правильное число.".to_string(),
            (Locale::En, Message::InvalidInteger) => "A valid integer is required.".to_string(),
            (Locale::Ru, Message::MinValue(n)) => {
                format!("Убедитесь, что это значение больше либо равно {}.", n)
            }
            (Locale::En, Message::MinValue(n)) => {
                format!("Ensure this value is greater than or equal to {}.", n)
            }
            (Locale::Ru, Message::MaxValue(n)) => {
                format!("Убедитесь, что это значение меньше либо равно {}.", n)
            }
            (Locale::En, Message::MaxValue(n)) => {
                format!("Ensure this value is less than or equal to {}.", n)
            }
            (Locale::Ru, Message::InvalidChoice(v)) => {
                format!("Значения \"{}\" нет среди допустимых вариантов.", v)
            }
            (Locale::En, Message::InvalidChoice(v)) => format!("\"{}\" is not a valid choice.", v),
            (Locale::Ru, Message::InvalidString) => "Введите правильную строку.".to_string(),
            (Locale::En, Message::InvalidString) => "Not a valid string.".to_string(),
            (Locale::Ru, Message::Blank) => "Это поле не может быть пустым.".to_string(),
            (Locale::En, Message::Blank) => "This field may not be blank.".to_string(),
            (Locale::Ru, Message::MaxLength(n)) => {
                format!("Убедитесь, что это значение содержит не более {} символов.", n)
            }
            (Locale::En, Message::MaxLength(n)) => {
                format!("Ensure this field has no more than {} characters.", n)
            }
            (Locale::Ru, Message::InvalidBoolean) => "Требуется логическое значение.".to_string(),
            (Locale::En, Message::InvalidBoolean) => "Must be a valid boolean.".to_string(),
            (Locale::Ru, Message::DoesNotExist(v)) => format!("Объект \"{}\" не существует.", v),
            (Locale::En, Message::DoesNotExist(v)) => format!("Object \"{}\" does not exist.", v),
            (Locale::Ru, Message::AlreadyExists) => {
                "Объект с таким значением уже существует.".to_string()
            }
            (Locale::En, Message::AlreadyExists) => {
                "An object with this value already exists.".to_string()
            }
            (Locale::Ru, Message::ExpectedObject) => "Ожидался JSON-объект.".to_string(),
            (Locale::En, Message::ExpectedObject) => "Expected a JSON object.".to_string(),
            (Locale::Ru, Message::ColivingNotFound) => "Коливинг не найден".to_string(),
            (Locale::En, Message::ColivingNotFound) => "Coliving not found".to_string(),
            (Locale::Ru, Message::UserNotFound) => "Пользователь не найден".to_string(),
            (Locale::En, Message::UserNotFound) => "User not found".to_string(),
        }
    }
}
